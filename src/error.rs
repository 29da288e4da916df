use std::path::PathBuf;

/// Errors surfaced to callers of the crate.
///
/// Invalid individual items are not errors: they are reported per item as
/// [`Classification::Invalid`](crate::classifier::Classification::Invalid).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("batch contains no candidate items")]
    EmptyBatch,

    #[error("incompatible merge: expected {expected}, found {found}")]
    IncompatibleMerge { expected: String, found: String },

    #[error("source {} is unavailable: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
