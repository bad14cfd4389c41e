//! Client build number discovery
//!
//! The gateway silently drops identifies that carry a stale build number,
//! so the current one is scraped from the web app page at startup.

use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::BuildNumberError;

/// Fallback when the web app page cannot be read
pub const DEFAULT_BUILD_NUMBER: u64 = 499_123;

/// Page carrying `"BUILD_NUMBER":"<digits>"` in its global environment
pub const APP_URL: &str = "https://discord.com/app";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const BUILD_NUMBER_KEY: &str = "\"BUILD_NUMBER\"";

/// Extract the build number from the web app HTML
pub fn extract_build_number(html: &str) -> Option<u64> {
    let mut rest = html;
    while let Some(pos) = rest.find(BUILD_NUMBER_KEY) {
        rest = &rest[pos + BUILD_NUMBER_KEY.len()..];
        if let Some(number) = parse_quoted_value(rest) {
            return Some(number);
        }
    }
    None
}

/// Parse `\s*:\s*"<digits>"`
fn parse_quoted_value(input: &str) -> Option<u64> {
    let value = input.trim_start().strip_prefix(':')?.trim_start().strip_prefix('"')?;
    let end = value.find('"')?;
    let digits = &value[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Fetch the current build number from [`APP_URL`]
pub async fn fetch_build_number(user_agent: &str) -> Result<u64, BuildNumberError> {
    let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;

    let response = client
        .get(APP_URL)
        .header("User-Agent", user_agent)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BuildNumberError::Status(status));
    }

    let body = response.text().await?;
    extract_build_number(&body).ok_or(BuildNumberError::NotFound)
}

/// Build number to identify with: configured override, then the live
/// value, then [`DEFAULT_BUILD_NUMBER`]
pub async fn resolve_build_number(configured: Option<u64>, user_agent: &str) -> u64 {
    if let Some(number) = configured {
        info!(build_number = number, "Using configured build number");
        return number;
    }

    match fetch_build_number(user_agent).await {
        Ok(number) => {
            info!(build_number = number, "Fetched client build number");
            number
        }
        Err(e) => {
            warn!(
                error = %e,
                build_number = DEFAULT_BUILD_NUMBER,
                "Failed to fetch build number, using default"
            );
            DEFAULT_BUILD_NUMBER
        }
    }
}
