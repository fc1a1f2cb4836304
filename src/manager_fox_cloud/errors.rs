use thiserror::Error;

#[derive(Error, Debug)]
pub enum FoxError {
    #[error("error reading {0} from Fox Cloud: {1}")]
    GetError(&'static str, String),
    #[error("error writing {0} to Fox Cloud: {1}")]
    SetError(&'static str, String),
    #[error("error posting request to Fox Cloud: {0}")]
    PostRequestError(String),
}
