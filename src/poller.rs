//! Periodic polling of the historical-data feed for the selected device.
//!
//! Everything runs on one task.  The only suspension point is the fetch itself; decoding,
//! reconstruction and the store append of a completed fetch happen in one synchronous step, so
//! observers only ever see whole batches.  A fetch is tagged with the selection it was issued
//! under, and its result is dropped if a device has been selected since, even the same one.

use std::future::Future;
use std::pin;
use std::sync;
use std::time;

use futures::future::OptionFuture;
use tokio::sync::mpsc;
use tokio::sync::watch;

use crate::chart;
use crate::config;
use crate::decode;
use crate::feed;
use crate::hydration;
use crate::model;
use crate::schema;
use crate::series;
use crate::util;

/// What became of a completed fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Applied { samples: usize, skipped: usize },
    /// A full page arrived and none of it decoded, so the cursor cannot move past it.
    Stuck { skipped: usize },
    Failed,
    Stale,
}

type FetchResult = Result<Vec<schema::RawRecord>, feed::FeedError>;
type PendingFetch = pin::Pin<Box<dyn Future<Output = (feed::FetchRequest, FetchResult)> + Send>>;

/// The selection a fetch was issued under.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Issued {
    device_id: model::DeviceId,
    selection: u64,
}

pub struct Poller<F> {
    log: slog::Logger,
    feed: sync::Arc<F>,
    store: series::SeriesStore,
    in_flight: Option<Issued>,
    period: time::Duration,
    page_size: u32,
}

impl<F> Poller<F>
where
    F: feed::HistoricalFeed + 'static,
{
    pub fn new(log: slog::Logger, feed: sync::Arc<F>, settings: &config::Poll) -> Self {
        Poller {
            log,
            feed,
            store: series::SeriesStore::new(),
            in_flight: None,
            period: settings.period,
            page_size: settings.page_size,
        }
    }

    pub fn store(&self) -> &series::SeriesStore {
        &self.store
    }

    pub fn in_flight(&self) -> Option<&model::DeviceId> {
        self.in_flight.as_ref().map(|issued| &issued.device_id)
    }

    /// Switches to `device_id`, discarding every series of the previous device.
    ///
    /// A fetch already in flight keeps its slot until it resolves; its result is then dropped
    /// as stale.
    pub fn select_device(&mut self, device_id: model::DeviceId) {
        info!(self.log, "selected device"; "device" => %device_id);
        self.store.select_device(device_id);
    }

    /// Starts a fetch unless one is already in flight or no device is selected.
    pub fn begin_fetch(&mut self) -> Option<feed::FetchRequest> {
        if let Some(pending) = &self.in_flight {
            debug!(self.log, "fetch still in flight, skipping tick"; "device" => %pending.device_id);
            return None;
        }

        let device_id = self.store.device_id()?.clone();
        let request = feed::FetchRequest {
            device_id: device_id.clone(),
            cursor: self.store.tail_timestamp(),
            limit: self.page_size,
        };
        self.in_flight = Some(Issued {
            device_id,
            selection: self.store.selection(),
        });
        Some(request)
    }

    /// Applies the outcome of the fetch started for `request`.
    pub fn complete_fetch(
        &mut self,
        request: &feed::FetchRequest,
        result: FetchResult,
    ) -> Completion {
        let issued = self.in_flight.take();
        let current = issued.map_or(false, |issued| {
            issued.selection == self.store.selection()
                && self.store.device_id() == Some(&issued.device_id)
        });

        if !current {
            debug!(self.log, "discarding result issued under a previous selection";
                   "device" => %request.device_id);
            return Completion::Stale;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                warn!(self.log, "fetch failed, will retry on next tick";
                      "device" => %request.device_id, "error" => %e);
                return Completion::Failed;
            }
        };

        let (samples, errors) = decode::decode_batch(&records);
        for e in &errors {
            warn!(self.log, "skipping undecodable record"; "device" => %request.device_id, "error" => %e);
        }
        if samples.is_empty() && request.limit > 0 && records.len() >= request.limit as usize {
            error!(self.log, "no record of a full page decoded, polling is stuck at this cursor";
                   "device" => %request.device_id,
                   "cursor" => ?request.cursor,
                   "skipped" => errors.len());
            return Completion::Stuck {
                skipped: errors.len(),
            };
        }

        let prior = self
            .store
            .current()
            .map(|state| state.intervals.as_slice())
            .unwrap_or(&[]);
        let reconstruction = hydration::reconstruct(prior, &samples);
        for at in &reconstruction.redundant_starts {
            warn!(self.log, "hydration start while a period is already open, extending it";
                  "device" => %request.device_id, "at" => %at);
        }

        let batch = series::Batch::from_samples(&samples, reconstruction.intervals);
        if let Err(e) = self.store.append_batch(batch) {
            warn!(self.log, "dropping batch"; "device" => %request.device_id, "error" => %e);
            return Completion::Stale;
        }

        debug!(self.log, "applied batch";
               "device" => %request.device_id,
               "samples" => samples.len(),
               "skipped" => errors.len(),
               "cursor" => ?self.store.tail_timestamp());

        Completion::Applied {
            samples: samples.len(),
            skipped: errors.len(),
        }
    }

    pub fn chart(&self) -> Option<chart::Chart> {
        self.store.current().map(chart::project)
    }

    /// Drives the poller until the task is dropped.
    ///
    /// Device ids arriving on `selections` switch the selected device; closing that channel
    /// just stops listening.  Every applied non-empty batch and every switch publishes a new
    /// chart on `charts`.
    pub async fn run(
        &mut self,
        mut selections: mpsc::Receiver<model::DeviceId>,
        charts: watch::Sender<Option<chart::Chart>>,
    ) {
        let mut ticker = util::every(&self.log, "poll", self.period);
        let mut pending: Option<PendingFetch> = None;
        let mut listening = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(request) = self.begin_fetch() {
                        pending = Some(self.fetch_future(request));
                    }
                }
                selection = selections.recv(), if listening => match selection {
                    Some(device_id) => {
                        self.select_device(device_id);
                        charts.send_replace(self.chart());
                    }
                    None => {
                        debug!(self.log, "device selection closed");
                        listening = false;
                    }
                },
                Some((request, result)) = OptionFuture::from(pending.as_mut()), if pending.is_some() => {
                    pending = None;
                    if let Completion::Applied { samples, .. } = self.complete_fetch(&request, result) {
                        if samples > 0 {
                            charts.send_replace(self.chart());
                        }
                    }
                }
            }
        }
    }

    fn fetch_future(&self, request: feed::FetchRequest) -> PendingFetch {
        let feed = self.feed.clone();
        Box::pin(async move {
            let result = feed.fetch_historical_data(&request).await;
            (request, result)
        })
    }
}
