use std::path::PathBuf;

/// Where a job's soundtrack comes from
///
/// Upload and remote URL are mutually exclusive by construction; a job
/// carries exactly one variant.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Raw audio bytes supplied by the caller together with the name the
    /// file was uploaded under (the extension drives format detection)
    Upload { bytes: Vec<u8>, file_name: String },

    /// A remote video URL whose best audio-only stream should be extracted
    RemoteUrl(String),

    /// No soundtrack requested
    None,
}

impl AudioSource {
    pub fn is_none(&self) -> bool {
        matches!(self, AudioSource::None)
    }

    /// Short label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            AudioSource::Upload { .. } => "upload",
            AudioSource::RemoteUrl(_) => "remote url",
            AudioSource::None => "none",
        }
    }
}

/// An audio clip staged on disk, ready for the muxer
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Location inside the job workspace
    pub path: PathBuf,

    /// Clip length in seconds, when the source reports one
    pub duration: Option<f64>,

    /// Container extension the clip is staged with
    pub format: String,
}
