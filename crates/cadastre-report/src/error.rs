use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Select at least one unit before generating a report")]
    NothingSelected,

    #[error("Map image unavailable: {0}")]
    MapImage(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
