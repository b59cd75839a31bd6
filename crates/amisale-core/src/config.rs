use std::path::PathBuf;

use reqwest::Url;

use crate::app_config::{
    CrawlConfig, DEFAULT_LISTING_URL, DEFAULT_PAGE_PARAM, DEFAULT_WEBDRIVER_URL, MIN_ATTEMPTS,
};
use crate::ConfigError;

/// Load crawl configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but invalid.
pub fn load_crawl_config() -> Result<CrawlConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_crawl_config_from_env()
}

/// Load crawl configuration from environment variables already in the process.
///
/// Unlike [`load_crawl_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but invalid.
pub fn load_crawl_config_from_env() -> Result<CrawlConfig, ConfigError> {
    build_crawl_config(|key| std::env::var(key))
}

/// Build crawl configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the real environment so
/// tests can drive it with a plain `HashMap`.
fn build_crawl_config<F>(lookup: F) -> Result<CrawlConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of 1, 0, true, false, yes, no".to_string(),
            )
        })
    };

    let listing_url = or_default("AMISALE_LISTING_URL", DEFAULT_LISTING_URL);
    if !is_http_url(&listing_url) {
        return Err(invalid(
            "AMISALE_LISTING_URL",
            format!("\"{listing_url}\" is not an absolute http(s) URL"),
        ));
    }

    let page_param = or_default("AMISALE_PAGE_PARAM", DEFAULT_PAGE_PARAM);
    if page_param.trim().is_empty() {
        return Err(invalid("AMISALE_PAGE_PARAM", "must not be empty".to_string()));
    }

    let webdriver_url = or_default("AMISALE_WEBDRIVER_URL", DEFAULT_WEBDRIVER_URL);
    if !is_http_url(&webdriver_url) {
        return Err(invalid(
            "AMISALE_WEBDRIVER_URL",
            format!("\"{webdriver_url}\" is not an absolute http(s) URL"),
        ));
    }

    let headless = parse_flag("AMISALE_HEADLESS", "true")?;

    let max_attempts = parse_u32("AMISALE_MAX_ATTEMPTS", "3")?;
    if max_attempts < MIN_ATTEMPTS {
        return Err(invalid(
            "AMISALE_MAX_ATTEMPTS",
            format!("must be at least {MIN_ATTEMPTS}, got {max_attempts}"),
        ));
    }

    let retry_delay_min_ms = parse_u64("AMISALE_RETRY_DELAY_MIN_MS", "2000")?;
    let retry_delay_max_ms = parse_u64("AMISALE_RETRY_DELAY_MAX_MS", "6000")?;
    if retry_delay_min_ms > retry_delay_max_ms {
        return Err(invalid(
            "AMISALE_RETRY_DELAY_MIN_MS",
            format!("{retry_delay_min_ms} exceeds AMISALE_RETRY_DELAY_MAX_MS ({retry_delay_max_ms})"),
        ));
    }

    let inter_page_delay_min_ms = parse_u64("AMISALE_INTER_PAGE_DELAY_MIN_MS", "1000")?;
    let inter_page_delay_max_ms = parse_u64("AMISALE_INTER_PAGE_DELAY_MAX_MS", "3000")?;
    if inter_page_delay_min_ms > inter_page_delay_max_ms {
        return Err(invalid(
            "AMISALE_INTER_PAGE_DELAY_MIN_MS",
            format!(
                "{inter_page_delay_min_ms} exceeds AMISALE_INTER_PAGE_DELAY_MAX_MS ({inter_page_delay_max_ms})"
            ),
        ));
    }

    let page_load_timeout_secs = parse_u64("AMISALE_PAGE_LOAD_TIMEOUT_SECS", "20")?;
    if page_load_timeout_secs == 0 {
        return Err(invalid(
            "AMISALE_PAGE_LOAD_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let scroll_to_bottom = parse_flag("AMISALE_SCROLL_TO_BOTTOM", "true")?;

    let max_pages = parse_u32("AMISALE_MAX_PAGES", "200")?;
    if max_pages == 0 {
        return Err(invalid(
            "AMISALE_MAX_PAGES",
            "must be greater than zero".to_string(),
        ));
    }

    let dedupe_links = parse_flag("AMISALE_DEDUPE_LINKS", "false")?;
    let output_dir = PathBuf::from(or_default("AMISALE_OUTPUT_DIR", "."));
    let log_level = or_default("AMISALE_LOG_LEVEL", "info");

    Ok(CrawlConfig {
        listing_url,
        page_param,
        webdriver_url,
        headless,
        max_attempts,
        retry_delay_min_ms,
        retry_delay_max_ms,
        inter_page_delay_min_ms,
        inter_page_delay_max_ms,
        page_load_timeout_secs,
        scroll_to_bottom,
        max_pages,
        dedupe_links,
        output_dir,
        log_level,
    })
}

/// Parse the boolean spellings accepted in env vars.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// True for an absolute `http`/`https` URL with a host.
fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
