use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::retry::with_retry;

/// Fetches the cumulative player statistics payload for one season path,
/// buffering the whole body before parsing. Transport and HTTP-status
/// failures are retried a bounded number of times with a fixed delay; the
/// final error is surfaced to the caller.
pub fn fetch_season_payload(
    client: &Client,
    provider: &ProviderConfig,
    path: &str,
) -> Result<Value> {
    let url = format!("{}{}", provider.base_url(), path);
    with_retry(
        &format!("fetch {path}"),
        provider.fetch_attempts,
        provider.fetch_retry_delay,
        |_| fetch_once(client, provider, &url),
    )
}

fn fetch_once(client: &Client, provider: &ProviderConfig, url: &str) -> Result<Value> {
    let resp = client
        .get(url)
        .basic_auth(&provider.username, Some(&provider.password))
        .send()
        .context("stats request failed")?;

    let status = resp.status();
    let body = resp.text().context("failed reading stats body")?;
    if !status.is_success() {
        return Err(anyhow!("provider http {}: {}", status, truncate(&body, 200)));
    }

    serde_json::from_str::<Value>(body.trim()).context("invalid provider json")
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
