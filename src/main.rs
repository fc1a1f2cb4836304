use std::sync::Arc;
use std::thread;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

use crate::errors::InitError;
use crate::facade::BessFacade;
use crate::initialization::init;

mod config;
mod consumption;
mod errors;
mod facade;
mod guard;
mod http;
mod initialization;
mod logging;
mod macros;
mod manager_fox_cloud;
mod manager_mail;
mod manager_nordpool;
pub mod models;
mod planner;
mod ports;
mod projector;
mod schedule;
mod scheduler_loop;

fn main() -> Result<(), InitError> {
    // Load config and set up logging/adapters. If this fails, we are pretty much out
    // of luck and can't even log or send a notification mail.
    let (config, mgr) = init()?;

    let facade = Arc::new(
        BessFacade::new(
            mgr.nordpool,
            mgr.fox,
            config.battery.clone(),
            config.price.clone(),
            config.home.clone(),
            config.fox_ess.max_tou_segments,
            config.default_consumption_kwh,
        )
        .map_err(|e| InitError(format!("failed to build control facade: {}", e)))?,
    );

    let scheduler_facade = Arc::clone(&facade);
    thread::spawn(move || scheduler_loop::run(&scheduler_facade, &mgr.mail));

    let runtime = Runtime::new().map_err(|e| InitError(format!("failed to start tokio runtime: {}", e)))?;

    runtime.block_on(async {
        let app = http::router(facade);
        let addr = format!("{}:{}", config.http.host, config.http.port);

        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("failed to bind http listener on {}: {}", addr, e);
                return;
            }
        };

        info!("http host listening on {}", addr);
        if let Err(e) = axum::serve(listener, app).await {
            error!("http host exited: {}", e);
        }
    });

    Ok(())
}

