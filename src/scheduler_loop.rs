//! Wall-clock scheduler: a single dedicated thread driving the control facade's
//! operations at the fixed instants of §5 — top-of-hour `update_state` (which itself
//! applies the hour's schedule), 15-minute settings verification, 5-minute charging-
//! power adjustment, the 23:55 day rollover, and one `run_optimization` at startup.
//! Running every tick from one thread is what gives the "single-owner mutex, no
//! overlapping ticks" guarantee: there is only ever one tick in flight.

use std::thread;
use std::time::Duration;

use chrono::{Local, Timelike};
use log::{error, info};

use crate::errors::GridError;
use crate::facade::BessFacade;
use crate::manager_mail::Mail;
use crate::ports::{InverterController, PriceSource};

/// Notifies on `InverterFatal` escalation, the one error kind that means retries are
/// exhausted and a human should look. Other kinds are logged-and-continue only.
fn notify_if_fatal(mail: &Mail, context: &str, err: &GridError) {
    if let GridError::InverterFatal(_) = err {
        if let Err(mail_err) = mail.send_mail(
            format!("gridarb: {} failed", context),
            format!("{} failed after exhausting retries: {}", context, err),
        ) {
            error!("failed to send failure notification mail: {}", mail_err);
        }
    }
}

/// Runs forever, ticking once a minute and dispatching whichever operations are due.
/// Never panics out of a tick: a failed operation is logged and the loop continues,
/// per §7's "the control loop never throws upward" policy.
pub fn run<P: PriceSource, I: InverterController>(facade: &BessFacade<P, I>, mail: &Mail) -> ! {
    let today = Local::now().date_naive();
    if let Err(e) = facade.run_optimization(today) {
        error!("startup optimization failed: {}", e);
        notify_if_fatal(mail, "startup optimization", &e);
    }

    loop {
        sleep_until_next_minute();

        let now = Local::now();
        let hour = now.hour() as usize;
        let minute = now.minute();

        if minute == 0 {
            if let Err(e) = facade.update_state(hour) {
                error!("update_state({}) failed: {}", hour, e);
                notify_if_fatal(mail, "update_state", &e);
            }
        }

        if minute % 15 == 0 {
            if let Err(e) = facade.verify_inverter_settings(hour) {
                error!("verify_inverter_settings({}) failed: {}", hour, e);
                notify_if_fatal(mail, "verify_inverter_settings", &e);
            }
        }

        if minute % 5 == 0 {
            if let Err(e) = facade.adjust_charging_power() {
                error!("adjust_charging_power failed: {}", e);
                notify_if_fatal(mail, "adjust_charging_power", &e);
            }
        }

        if hour == 23 && minute == 55 {
            match facade.prepare_next_day() {
                Ok(true) => info!("tomorrow's schedule prepared and written to the inverter"),
                Ok(false) => info!("tomorrow's prices not yet available, staying on today's plan"),
                Err(e) => {
                    error!("prepare_next_day failed: {}", e);
                    notify_if_fatal(mail, "prepare_next_day", &e);
                }
            }
        }
    }
}

fn sleep_until_next_minute() {
    let now = Local::now();
    let nanos_into_minute =
        (now.second() as u32) * 1_000_000_000 + now.timestamp_subsec_nanos();
    let remaining = 60_000_000_000u64.saturating_sub(nanos_into_minute as u64);
    thread::sleep(Duration::from_nanos(remaining.max(1)));
}
