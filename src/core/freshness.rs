//! Wall-clock filtering for "upcoming" style queries.
//!
//! The upstream feed lags reality: a launch that lifted off a few minutes
//! ago can still sit at the top of `/launch/upcoming/`. Everything here takes
//! `now` explicitly and must run per request, after any cache lookup.

use crate::domain::model::Launch;
use chrono::{DateTime, Utc};

/// True when the launch has a NET strictly after `now`.
pub fn is_future(launch: &Launch, now: DateTime<Utc>) -> bool {
    launch.net.is_some_and(|net| net > now)
}

/// Keeps launches whose NET is strictly after `now`, preserving order.
/// Launches without a NET are dropped.
pub fn retain_future(launches: Vec<Launch>, now: DateTime<Utc>) -> Vec<Launch> {
    launches
        .into_iter()
        .filter(|launch| is_future(launch, now))
        .collect()
}

/// Next launch by the strict-future policy: the first candidate still in the
/// future, otherwise the first candidate at all.
pub fn select_next(candidates: Vec<Launch>, now: DateTime<Utc>) -> Option<Launch> {
    let position = candidates
        .iter()
        .position(|launch| is_future(launch, now))
        .unwrap_or(0);
    candidates.into_iter().nth(position)
}
