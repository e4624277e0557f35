use std::sync::Mutex;

/// Pipeline stages visible to progress consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    Normalizing,
    Interpolating,
    Encoding,
    AcquiringAudio,
    Muxing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Interpolating => "interpolating",
            Stage::Encoding => "encoding",
            Stage::AcquiringAudio => "acquiring audio",
            Stage::Muxing => "muxing",
        };
        write!(f, "{name}")
    }
}

/// A single progress observation for one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Fraction of the stage completed, always within `[0, 1]`
    pub fraction: f64,
}

/// Callback invoked for every published progress event
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Fans stage progress out to an optional callback
///
/// Fractions are clamped to `[0, 1]` and kept monotonic within a stage:
/// an observation below the last published fraction for the same stage is
/// dropped. Frame workers may finish out of order, so regressions are
/// expected and must not reach the consumer.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: Mutex<Option<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            last: Mutex::new(None),
        }
    }

    /// A reporter that swallows every event
    pub fn silent() -> Self {
        Self {
            callback: None,
            last: Mutex::new(None),
        }
    }

    /// Publish a progress observation for the given stage.
    pub fn report(&self, stage: Stage, fraction: f64) {
        let Some(callback) = &self.callback else {
            return;
        };

        let event = ProgressEvent {
            stage,
            fraction: fraction.clamp(0.0, 1.0),
        };

        // The callback runs under the lock so concurrent reporters cannot
        // deliver accepted events out of order.
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = *last {
            if previous.stage == event.stage && event.fraction < previous.fraction {
                return;
            }
        }
        *last = Some(event);

        callback(event);
    }

    /// Mark a stage as entered (fraction 0).
    pub fn stage_started(&self, stage: Stage) {
        self.report(stage, 0.0);
    }

    /// Mark a stage as completed (fraction 1).
    pub fn stage_finished(&self, stage: Stage) {
        self.report(stage, 1.0);
    }
}
