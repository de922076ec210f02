//! Workload arithmetic based on Little's law:
//! `users = throughput × (response time + think time + pacing)`.
//!
//! Times are seconds and throughput is iterations per second.

use super::*;
use serde::Serialize;

/// A computed quantity plus the iteration time it was derived from and a
/// printable form of the formula with the inputs substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub value: f64,
    pub iteration_time: f64,
    pub breakdown: String,
}

pub fn iteration_time(response_time: f64, think_time: f64, pacing: f64) -> f64 {
    response_time + think_time + pacing
}

/// Unrounded concurrency for `tps` iterations per second.
pub fn virtual_users(tps: f64, response_time: f64, think_time: f64, pacing: f64) -> Estimate {
    let iteration_time = iteration_time(response_time, think_time, pacing);
    let vus = tps * iteration_time;
    Estimate {
        value: vus,
        iteration_time,
        breakdown: format!("{tps} × ({response_time:.2} + {think_time:.2} + {pacing}) = {vus:.2}"),
    }
}

/// Users needed to sustain `tps`, rounded up.
pub fn required_users(tps: f64, response_time: f64, think_time: f64, pacing: f64) -> u64 {
    let vus = virtual_users(tps, response_time, think_time, pacing).value;
    if vus <= 0.0 { 0 } else { vus.ceil() as u64 }
}

pub fn throughput(users: f64, response_time: f64, think_time: f64, pacing: f64) -> Result<Estimate> {
    let iteration_time = iteration_time(response_time, think_time, pacing);
    if iteration_time <= 0.0 {
        return Err(Error::Validation(
            "Iteration time must be greater than 0".into(),
        ));
    }
    let tps = users / iteration_time;
    Ok(Estimate {
        value: tps,
        iteration_time,
        breakdown: format!(
            "{users} / ({response_time:.2} + {think_time:.2} + {pacing}) = {tps:.2}"
        ),
    })
}

/// Delay per iteration that holds `users` at `tps`. Never negative.
pub fn pacing(users: f64, tps: f64, response_time: f64, think_time: f64) -> Result<Estimate> {
    if tps <= 0.0 {
        return Err(Error::Validation("Target TPS must be greater than 0".into()));
    }
    let pacing = (users / tps - response_time - think_time).max(0.0);
    Ok(Estimate {
        value: pacing,
        iteration_time: iteration_time(response_time, think_time, pacing),
        breakdown: format!(
            "({users} / {tps}) - {response_time:.2} - {think_time:.2} = {pacing:.2}"
        ),
    })
}

/// Think time to put between `pages` consecutive pages so that `users`
/// produce `tps` page views per second.
pub fn think_time_per_page(
    users: f64,
    tps: f64,
    pages: u32,
    response_time: f64,
    pacing: f64,
) -> Result<f64> {
    if tps <= 0.0 {
        return Err(Error::Validation("Target TPS must be greater than 0".into()));
    }
    if pages < 2 {
        return Err(Error::Validation("At least two pages are required".into()));
    }
    let pages = f64::from(pages);
    let iterations_per_second = tps / pages;
    let total_response_time = response_time * pages;
    let total_think_time = users / iterations_per_second - total_response_time - pacing;
    Ok((total_think_time / (pages - 1.0)).max(0.0))
}

/// Concurrent users from business volume: sessions per hour times the average
/// session length in seconds, over one hour. Rounded up.
pub fn concurrent_users(sessions_per_hour: f64, average_session_secs: f64) -> u64 {
    let users = sessions_per_hour * average_session_secs / 3600.0;
    if users <= 0.0 { 0 } else { users.ceil() as u64 }
}

pub fn throughput_from_count(requests: f64, total_secs: f64) -> Result<f64> {
    if total_secs <= 0.0 {
        return Err(Error::Validation("Total time must be greater than 0".into()));
    }
    Ok(requests / total_secs)
}
