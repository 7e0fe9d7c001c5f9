use std::time;

use tokio::time::{Interval, MissedTickBehavior};

/// A timer firing immediately and then once per `period`.  Ticks missed while the owner was
/// busy are skipped rather than delivered in a burst.
pub fn every(log: &slog::Logger, name: &str, period: time::Duration) -> Interval {
    debug!(log, "starting timer"; "name" => name, "period" => ?period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
