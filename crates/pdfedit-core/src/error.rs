use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Unsupported PDF structure: {0}")]
    UnsupportedStructure(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Invalid edit request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
