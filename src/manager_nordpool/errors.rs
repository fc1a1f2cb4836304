use thiserror::Error;

#[derive(Error, Debug)]
pub enum NordPoolError {
    #[error("NordPoolError::Network: {0}")]
    Network(String),
    #[error("NordPoolError::Document: {0}")]
    Document(String),
    #[error("NordPoolError::NoContent")]
    NoContent,
    #[error("NordPoolError::ShortContent: expected 24 hourly rows, got {0}")]
    ShortContent(usize),
}

impl From<ureq::Error> for NordPoolError {
    fn from(e: ureq::Error) -> Self {
        NordPoolError::Network(e.to_string())
    }
}
impl From<serde_json::Error> for NordPoolError {
    fn from(e: serde_json::Error) -> Self {
        NordPoolError::Document(e.to_string())
    }
}
impl From<std::io::Error> for NordPoolError {
    fn from(e: std::io::Error) -> Self {
        NordPoolError::Document(e.to_string())
    }
}
