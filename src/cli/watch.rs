use crate::core::models::{PollConfig, PollSnapshot};
use crate::core::settings::Settings;
use crate::poller::Poller;
use crate::transport::RestFetcher;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    url: String,
    interval_ms: Option<u64>,
    params: Vec<String>,
    cycles: Option<u32>,
) -> Result<()> {
    let settings = Settings::load()?;
    settings.validate()?;

    let interval_ms = interval_ms.unwrap_or(settings.poll.interval_ms);
    anyhow::ensure!(interval_ms > 0, "--interval-ms must be greater than 0");

    let key = super::parse_params(&params)?;
    let fetcher = Arc::new(RestFetcher::new(
        &url,
        Duration::from_secs(settings.http.timeout_secs),
    )?);
    let poller = Poller::new(fetcher);

    poller.start(key, PollConfig::from_millis(interval_ms)).await;

    let mut last: Option<PollSnapshot<serde_json::Value>> = None;
    let mut settled: u32 = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            _ = ticker.tick() => {
                let snapshot = poller.snapshot().await;
                if last.as_ref() != Some(&snapshot) {
                    print_snapshot(&snapshot)?;
                    if !snapshot.loading {
                        settled += 1;
                    }
                    last = Some(snapshot);
                }
                if let Some(limit) = cycles {
                    if settled >= limit {
                        break;
                    }
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}

fn print_snapshot(snapshot: &PollSnapshot<serde_json::Value>) -> Result<()> {
    if snapshot.has_error() {
        println!("{}", snapshot.error);
    } else if let Some(data) = &snapshot.data {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        println!("loading...");
    }
    Ok(())
}
