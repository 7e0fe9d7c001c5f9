extern crate failure;
extern crate hydrawatch;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_envlogger;
extern crate slog_scope;
extern crate slog_stdlog;
extern crate slog_term;
extern crate structopt;
extern crate tokio;

use std::path;
use std::sync;

use slog::Drain;
use structopt::StructOpt;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio::sync::watch;

use hydrawatch::config;
use hydrawatch::feed;
use hydrawatch::feed::HistoricalFeed;
use hydrawatch::model;
use hydrawatch::poller;
use hydrawatch::publish;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "hydrawatch",
    about = "Follows a gas-injection device's telemetry and charts its hydration periods."
)]
struct Opt {
    /// Configuration file; `hydrawatch.toml` in the working directory is used when present
    #[structopt(short, long, parse(from_os_str))]
    config: Option<path::PathBuf>,

    /// Device to follow instead of the first one the feed lists
    #[structopt(short, long)]
    device: Option<String>,
}

fn main() -> Result<(), failure::Error> {
    let opt = Opt::from_args();

    let log = init_logging();
    let _scope_guard = slog_scope::set_global_logger(log.clone());
    slog_stdlog::init()
        .map_err(|e| failure::err_msg(format!("could not install log bridge: {}", e)))?;

    let config = config::Config::load(opt.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(log, config, opt.device.map(model::DeviceId)))
}

fn init_logging() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

async fn run(
    log: slog::Logger,
    config: config::Config,
    device: Option<model::DeviceId>,
) -> Result<(), failure::Error> {
    let feed = sync::Arc::new(feed::HttpFeed::new(&config.feed)?);
    let mut poller = poller::Poller::new(
        log.new(o!("component" => "poller")),
        feed.clone(),
        &config.poll,
    );

    let (charts_tx, charts_rx) = watch::channel(None);
    if let Some(path) = config.output.chart_path.clone() {
        let publish_log = log.new(o!("component" => "publish"));
        tokio::spawn(async move {
            if let Err(e) = publish::write_charts(publish_log.clone(), charts_rx, path).await {
                error!(publish_log, "chart publisher failed"; "error" => %e);
            }
        });
    }

    let initial = match device {
        Some(device_id) => Some(device_id),
        None => default_device(&log, &*feed).await,
    };
    match initial {
        Some(device_id) => {
            poller.select_device(device_id);
            charts_tx.send_replace(poller.chart());
        }
        None => warn!(log, "no device selected, enter a device id on stdin"),
    }

    let (selections_tx, selections_rx) = mpsc::channel(8);
    tokio::spawn(read_selections(
        log.new(o!("component" => "selector")),
        selections_tx,
    ));

    info!(log, "started"; "feed" => %config.feed.base_url, "period" => ?config.poll.period);

    tokio::select! {
        _ = poller.run(selections_rx, charts_tx) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(log, "shutting down");
        }
    }

    Ok(())
}

/// The first device the feed lists, if any.
async fn default_device<F>(log: &slog::Logger, feed: &F) -> Option<model::DeviceId>
where
    F: HistoricalFeed,
{
    match feed.list_devices().await {
        Ok(devices) => {
            info!(log, "listed devices"; "count" => devices.len());
            devices.into_iter().next().map(|device| device.device_id)
        }
        Err(e) => {
            error!(log, "could not list devices"; "error" => %e);
            None
        }
    }
}

/// Each non-empty line on stdin selects the device with that id.
async fn read_selections(log: slog::Logger, selections: mpsc::Sender<model::DeviceId>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let device_id = line.trim();
                if device_id.is_empty() {
                    continue;
                }
                if selections.send(model::DeviceId::new(device_id)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(log, "could not read device selection"; "error" => %e);
                break;
            }
        }
    }

    debug!(log, "stopped reading device selections");
}
