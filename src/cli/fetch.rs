use crate::core::settings::Settings;
use crate::transport::{Fetcher, RestFetcher};
use anyhow::Result;
use std::time::Duration;

pub async fn run(url: String, params: Vec<String>, json: bool) -> Result<()> {
    let settings = Settings::load()?;
    settings.validate()?;

    let key = super::parse_params(&params)?;
    let fetcher = RestFetcher::new(&url, Duration::from_secs(settings.http.timeout_secs))?;

    let value = fetcher.issue(&key).await?;

    if json {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    Ok(())
}
