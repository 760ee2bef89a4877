use crate::types::{CreatorId, Platform};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Handle '{handle}' on {platform} already belongs to '{existing}', cannot register it for '{incoming}'")]
    DuplicateHandle {
        platform: Platform,
        handle:   String,
        existing: CreatorId,
        incoming: CreatorId,
    },

    #[error("Creator '{creator_id}' registered twice")]
    DuplicateCreator { creator_id: CreatorId },

    #[error("Deduplication expects one creator: got '{found}' in a batch for '{expected}'")]
    MixedCreators { expected: CreatorId, found: CreatorId },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Roster line {line}: {reason}")]
    Roster { line: usize, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PayoutResult<T> = Result<T, PayoutError>;
