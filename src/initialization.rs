use std::env;

use log::info;

use crate::config::{Config, load_config};
use crate::errors::InitError;
use crate::logging::setup_logger;
use crate::manager_fox_cloud::Fox;
use crate::manager_mail::Mail;
use crate::manager_nordpool::NordPool;

pub struct Mgr {
    pub nordpool: NordPool,
    pub fox: Fox,
    pub mail: Mail,
}

/// Parses the `--config=` CLI argument, loads configuration, sets up logging, and
/// constructs the port adapters and mail notifier. Everything the process needs
/// before it can build the control facade.
pub fn init() -> Result<(Config, Mgr), InitError> {
    let args: Vec<String> = env::args().collect();
    let config_path = args
        .iter()
        .find(|p| p.starts_with("--config="))
        .ok_or(InitError("missing required --config=<path> argument".to_string()))?
        .split_once('=')
        .ok_or(InitError("malformed --config argument".to_string()))?
        .1;

    let config = load_config(config_path)?;

    setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;

    info!("starting gridarb version: {}", env!("CARGO_PKG_VERSION"));

    let nordpool = NordPool::new(config.price.clone());
    let fox = Fox::new(&config.fox_ess);
    let mail = Mail::new(&config.mail)?;

    Ok((config, Mgr { nordpool, fox, mail }))
}
