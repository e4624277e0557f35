//! # Audio Module
//!
//! Obtains the optional soundtrack for a morph job: uploaded bytes are
//! parsed and staged, remote URLs are resolved to their best audio-only
//! stream, downloaded and converted. Every failure in this module is
//! recoverable; the pipeline downgrades to a silent video instead of
//! failing the job.

pub mod acquirer;
pub mod fetcher;
pub mod probe;
pub mod types;

pub use acquirer::{AudioAcquirer, AudioCapability};
pub use fetcher::RemoteAudioFetcher;
pub use probe::AudioProbe;
pub use types::{AudioClip, AudioSource};
