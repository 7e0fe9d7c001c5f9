use std::path;

use tokio::sync::watch;

use crate::chart;

/// Writes every chart published on `charts` to `path` as JSON, until the publisher goes away.
///
/// Intermediate charts may be skipped when writes are slower than updates; only the latest one
/// matters.  A failed write is logged and retried with the next update.
pub async fn write_charts(
    log: slog::Logger,
    mut charts: watch::Receiver<Option<chart::Chart>>,
    path: path::PathBuf,
) -> Result<(), failure::Error> {
    while charts.changed().await.is_ok() {
        let chart_json = {
            let chart = charts.borrow_and_update();
            match &*chart {
                Some(chart) => serde_json::to_vec(chart)?,
                None => continue,
            }
        };

        if let Err(e) = write_atomically(&path, &chart_json).await {
            warn!(log, "writing chart failed, will retry on next update";
                  "path" => %path.display(), "error" => %e);
        } else {
            debug!(log, "wrote chart"; "path" => %path.display(), "bytes" => chart_json.len());
        }
    }

    Ok(())
}

async fn write_atomically(path: &path::Path, contents: &[u8]) -> std::io::Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = path::PathBuf::from(staging);

    tokio::fs::write(&staging, contents).await?;
    tokio::fs::rename(&staging, path).await
}
