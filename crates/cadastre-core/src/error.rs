use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to parse unit records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend rejected the unit listing: {0}")]
    Rejected(String),
}
