use serde::Serialize;
use std::io;
use yelp_core::{Cap, RecordKind};

/// Per-kind bookkeeping reported after the archive has been drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub kind: RecordKind,
    pub cap: Cap,
    /// Records that reached the aggregator and were counted.
    pub processed: u64,
    /// Records rejected by the filters or the business index.
    pub skipped_unmatched: u64,
    /// Records dropped for a missing or unparsable required field, or a
    /// repeated business id.
    pub skipped_invalid: u64,
    /// True once the member was found and consumed (fully or up to the cap).
    pub completed: bool,
}

impl PassStats {
    pub fn new(kind: RecordKind, cap: Cap) -> Self {
        Self {
            kind,
            cap,
            processed: 0,
            skipped_unmatched: 0,
            skipped_invalid: 0,
            completed: false,
        }
    }

    /// `"Reviews counted: 1,204 (all)"`, `"Tips: skipped"`, ...
    pub fn context_line(&self) -> String {
        self.context_line_counting(self.processed)
    }

    /// Same wording as [`PassStats::context_line`] with a caller-supplied
    /// count, for kinds whose unit is not the record (check-in timestamps).
    pub fn context_line_counting(&self, counted: u64) -> String {
        let mut label = self.kind.label().to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        match self.cap {
            Cap::Skip => format!("{label}: skipped"),
            Cap::Unbounded => format!(
                "{label} counted: {} (all)",
                yelp_core::group_thousands(counted)
            ),
            Cap::Limit(limit) => format!(
                "{label} counted: {} (max_{}={})",
                yelp_core::group_thousands(counted),
                self.kind.label().replace('-', ""),
                yelp_core::group_thousands(limit)
            ),
        }
    }
}

/// Errors emitted by the archive reader and the aggregation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("not found: {what}")]
    NotFound { what: String },
    #[error("corrupt archive {archive}: {message}")]
    CorruptArchive { archive: String, message: String },
    #[error("invalid utf-8 in {source_name} at line {line}")]
    Encoding { source_name: String, line: u64 },
    #[error("malformed record in {source_name} at line {line}: {error}")]
    MalformedRecord {
        source_name: String,
        line: u64,
        #[source]
        error: serde_json::Error,
    },
    #[error("{kind} appeared before the business file; the business index is required first")]
    PrecedesDependency { kind: RecordKind },
    #[error("no businesses matched your filters ({filters}); try removing filters")]
    NoMatchingRecords { filters: String },
    #[error("unsafe member path: {path}")]
    UnsafePath { path: String },
    #[error("io error: {0}")]
    Io(io::Error),
}

/// Read failure inside the packed dataset stream, carried through
/// `io::Error` until it reaches [`IngestError`].
#[derive(Debug, thiserror::Error)]
#[error("{archive}: {message}")]
pub(crate) struct StreamFault {
    pub archive: String,
    pub message: String,
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        let fault = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<StreamFault>());
        match fault {
            Some(fault) => Self::CorruptArchive {
                archive: fault.archive.clone(),
                message: fault.message.clone(),
            },
            None => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
