//! Errors raised while decoding persisted GM state.

use thiserror::Error;

/// Why a persisted snapshot was rejected as a whole.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot root is not a JSON object")]
    NotAnObject,

    #[error("snapshot has no usable schema version")]
    MissingVersion,

    #[error("snapshot schema {found} is newer than supported schema {supported}")]
    SchemaTooNew { found: u64, supported: u32 },

    #[error("snapshot has no usable run seed")]
    MissingSeed,

    #[error("snapshot belongs to run seed {found:#010x}, current run is {expected:#010x}")]
    SeedMismatch { found: u64, expected: u32 },
}
