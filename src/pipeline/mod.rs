//! # Pipeline Module
//!
//! The pipeline engine sequences validation, normalization, interpolation,
//! encoding and the optional audio stages for a single job, owns the
//! audio-downgrade policy, and is the only entry point external callers use.

pub mod engine;
pub mod job;
pub mod progress;
pub mod workspace;

pub use engine::PipelineEngine;
pub use job::{JobOutcome, JobStatus, PipelineJob};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter, Stage};
pub use workspace::Workspace;
