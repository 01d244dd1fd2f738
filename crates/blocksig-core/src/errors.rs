//! Pipeline failures, the cross-thread collector, and the aggregated error.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Broad class of a failure, used for logging and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid arguments or configuration; the pipeline never starts.
    Usage,
    /// The input could not be opened or read.
    InputAccess,
    /// A digest computation failed inside a worker.
    Algorithm,
    /// Writing results to the output stream failed.
    Output,
    /// A stage thread panicked.
    Panic,
}

/// A single failure captured by one pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed at block #{index}: {source}")]
    Read {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("digest of block #{index} failed: {reason}")]
    Algorithm { index: u64, reason: String },

    #[error("writing results failed: {0}")]
    Output(#[source] io::Error),

    #[error("{role} thread panicked: {message}")]
    WorkerPanicked { role: String, message: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Usage(_) => ErrorKind::Usage,
            PipelineError::Open { .. } | PipelineError::Read { .. } => ErrorKind::InputAccess,
            PipelineError::Algorithm { .. } => ErrorKind::Algorithm,
            PipelineError::Output(_) => ErrorKind::Output,
            PipelineError::WorkerPanicked { .. } => ErrorKind::Panic,
        }
    }

    /// Build a `WorkerPanicked` from a `JoinHandle::join` payload.
    pub(crate) fn from_panic(role: impl Into<String>, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        PipelineError::WorkerPanicked {
            role: role.into(),
            message,
        }
    }
}

/// Thread-safe append-only list of failures. Drained once, after all stages joined.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Mutex<Vec<PipelineError>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, err: PipelineError) {
        tracing::warn!(kind = ?err.kind(), "pipeline failure: {}", err);
        self.errors
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(err);
    }

    pub fn len(&self) -> usize {
        self.errors
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold the captured failures into one aggregate, or `Ok` if none.
    pub fn into_result(self) -> Result<(), AggregateError> {
        let errors = self
            .errors
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AggregateError { errors })
        }
    }
}

/// Every failure captured during one run.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<PipelineError>,
}

impl AggregateError {
    pub fn single(err: PipelineError) -> Self {
        Self { errors: vec![err] }
    }

    pub fn errors(&self) -> &[PipelineError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "{}", only);
        }
        write!(f, "{} errors occurred:", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, e)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_is_ok() {
        let c = ErrorCollector::new();
        assert!(c.is_empty());
        assert!(c.into_result().is_ok());
    }

    #[test]
    fn collector_aggregates_every_error() {
        let c = ErrorCollector::new();
        c.record(PipelineError::Algorithm {
            index: 3,
            reason: "bad".into(),
        });
        c.record(PipelineError::Read {
            index: 7,
            source: io::Error::new(io::ErrorKind::Other, "disk gone"),
        });
        assert_eq!(c.len(), 2);

        let agg = c.into_result().unwrap_err();
        assert_eq!(agg.len(), 2);
        assert!(agg.contains_kind(ErrorKind::Algorithm));
        assert!(agg.contains_kind(ErrorKind::InputAccess));
        assert!(!agg.contains_kind(ErrorKind::Output));

        let text = agg.to_string();
        assert!(text.starts_with("2 errors occurred:"));
        assert!(text.contains("1. digest of block #3 failed: bad"));
        assert!(text.contains("2. read failed at block #7: disk gone"));
    }

    #[test]
    fn single_error_displays_without_list() {
        let agg = AggregateError::single(PipelineError::Usage(
            "Block size should be a positive number".into(),
        ));
        assert_eq!(agg.to_string(), "Block size should be a positive number");
        assert_eq!(agg.errors()[0].kind(), ErrorKind::Usage);
    }

    #[test]
    fn panic_payloads_are_described() {
        let e = PipelineError::from_panic("hasher-0", Box::new("boom"));
        assert_eq!(e.to_string(), "hasher-0 thread panicked: boom");
        let e = PipelineError::from_panic("sink", Box::new(String::from("owned")));
        assert_eq!(e.to_string(), "sink thread panicked: owned");
        let e = PipelineError::from_panic("reader", Box::new(42u32));
        assert_eq!(e.kind(), ErrorKind::Panic);
        assert!(e.to_string().contains("non-string"));
    }

    #[test]
    fn collector_is_shared_across_threads() {
        let c = std::sync::Arc::new(ErrorCollector::new());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let c = std::sync::Arc::clone(&c);
                std::thread::spawn(move || {
                    c.record(PipelineError::Algorithm {
                        index: i,
                        reason: "x".into(),
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let c = std::sync::Arc::try_unwrap(c).unwrap();
        assert_eq!(c.into_result().unwrap_err().len(), 8);
    }
}
