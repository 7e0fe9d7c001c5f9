//! Reconstruction of hydration periods from the `start`/`end` markers in the sample stream.
//!
//! The scan is a two-state machine over the marker channel: either no interval is open, or the
//! last interval of the list is open.  `START` opens a new interval, `END` closes the open one
//! (inclusive of its own timestamp), and every sample seen while an interval is open extends its
//! `to` bound.  State carries across chunks through the interval list itself, so an interval
//! opened by one poll is still extended by the next.

use crate::model;

#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    /// The full updated interval list, replacing the prior one.
    pub intervals: Vec<model::HydrationInterval>,
    /// Timestamps of `START` markers that arrived while an interval was already open.  They
    /// extend the open interval but do not open a second one.
    pub redundant_starts: Vec<chrono::NaiveDateTime>,
}

/// Applies one ordered chunk of samples to the prior interval list.
///
/// The prior list is not modified; at most one interval of the result is active, and it is
/// always the last one.
pub fn reconstruct(
    prior: &[model::HydrationInterval],
    samples: &[model::Sample],
) -> Reconstruction {
    let mut intervals = prior.to_vec();
    let mut redundant_starts = Vec::new();

    for sample in samples {
        let timestamp = sample.timestamp;
        let open = intervals.last().map_or(false, |interval| interval.active);

        match (sample.hydration, open) {
            (model::HydrationMarker::Start, false) => {
                intervals.push(model::HydrationInterval::opened_at(timestamp));
            }
            (marker, true) => {
                if let Some(interval) = intervals.last_mut() {
                    interval.to = timestamp;
                    match marker {
                        model::HydrationMarker::End => interval.active = false,
                        model::HydrationMarker::Start => redundant_starts.push(timestamp),
                        model::HydrationMarker::None => {}
                    }
                }
            }
            (_, false) => {}
        }
    }

    Reconstruction {
        intervals,
        redundant_starts,
    }
}
