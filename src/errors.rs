use std::fmt;
use std::fmt::Formatter;
use std::sync::PoisonError;
use crate::guard::GuardError;
use crate::manager_fox_cloud::errors::FoxError;
use crate::manager_mail::errors::MailError;
use crate::manager_nordpool::errors::NordPoolError;
use crate::planner::PlannerError;
use crate::projector::ProjectorError;

/// Error depicting failures during initialization of the main program.
#[derive(Debug)]
pub struct InitError(pub String);

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InitError: {}", self.0)
    }
}
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<MailError> for InitError {
    fn from(e: MailError) -> Self { InitError(e.to_string()) }
}
impl From<&str> for InitError {
    fn from(e: &str) -> Self { InitError(e.to_string()) }
}
impl std::error::Error for InitError {}

/// Error depicting failures while loading configuration.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for ConfigError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { ConfigError(e.to_string()) }
}
impl From<log::SetLoggerError> for ConfigError {
    fn from(e: log::SetLoggerError) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl std::error::Error for ConfigError {}

/// The five error kinds of the control loop, per the error handling design. Component
/// leaf errors convert into this via the `From` impls below; validation and invariant
/// errors are constructed directly.
#[derive(Debug)]
pub enum GridError {
    InvalidInput(String),
    NoPrices(String),
    InverterTransient(String),
    InverterFatal(String),
    InternalInvariant(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            GridError::InvalidInput(e) => write!(f, "InvalidInput: {}", e),
            GridError::NoPrices(e) => write!(f, "NoPrices: {}", e),
            GridError::InverterTransient(e) => write!(f, "InverterTransient: {}", e),
            GridError::InverterFatal(e) => write!(f, "InverterFatal: {}", e),
            GridError::InternalInvariant(e) => write!(f, "InternalInvariant: {}", e),
        }
    }
}
impl std::error::Error for GridError {}

impl From<PlannerError> for GridError {
    fn from(e: PlannerError) -> Self { GridError::InvalidInput(e.to_string()) }
}
impl From<ProjectorError> for GridError {
    fn from(e: ProjectorError) -> Self { GridError::InternalInvariant(e.to_string()) }
}
impl From<GuardError> for GridError {
    fn from(e: GuardError) -> Self { GridError::InverterTransient(e.to_string()) }
}
impl From<NordPoolError> for GridError {
    fn from(e: NordPoolError) -> Self {
        match e {
            NordPoolError::NoContent | NordPoolError::ShortContent(_) => GridError::NoPrices(e.to_string()),
            _ => GridError::InverterTransient(e.to_string()),
        }
    }
}
impl From<FoxError> for GridError {
    fn from(e: FoxError) -> Self { GridError::InverterTransient(e.to_string()) }
}
impl<T> From<PoisonError<T>> for GridError {
    fn from(e: PoisonError<T>) -> Self { GridError::InternalInvariant(e.to_string()) }
}
