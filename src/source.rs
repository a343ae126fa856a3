//! Loading of the two input feeds (tabular rows and country geography).
//!
//! A source is either a local path or an `http(s)://` URL. Both feeds are fetched
//! concurrently and startup waits for both; if either one fails nothing is built
//! and the caller gets [`AtlasError::LoadFailure`].
//!
//! ### Notes
//! - Transient HTTP failures (5xx / network errors) are retried three times with a
//!   short backoff; any other failure is final.
//! - Timeouts use a sane default (30s) like any other blocking request in this crate.
//!
//! Typical usage:
//! ```no_run
//! # use climate_atlas::source::load_sources;
//! let loaded = load_sources("data/temperatures.csv", "data/world.geojson")?;
//! let atlas = climate_atlas::Atlas::from_parsed(loaded.rows);
//! # Ok::<(), climate_atlas::AtlasError>(())
//! ```

use crate::error::AtlasError;
use crate::models::Geography;
use crate::storage::{self, ParsedRows};
use anyhow::{Context, Result, bail};
use log::info;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::thread;
use std::time::Duration;

/// Both feeds, parsed.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub rows: ParsedRows,
    pub geography: Geography,
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn http_client() -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(Duration::from_secs(30)) // total request timeout
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .user_agent(concat!("climate_atlas/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")
}

/// Read a source into text: local file or HTTP GET.
pub fn fetch_text(source: &str) -> Result<String> {
    if !is_url(source) {
        return std::fs::read_to_string(source).with_context(|| format!("read {source}"));
    }

    let http = http_client()?;
    let mut last_err: Option<anyhow::Error> = None;
    for backoff_ms in [100u64, 300, 700] {
        match http.get(source).send() {
            Ok(r) if r.status().is_success() => {
                return r.text().with_context(|| format!("decode body of {source}"));
            }
            Ok(r) if r.status().is_server_error() => {
                last_err = Some(anyhow::anyhow!("HTTP {}", r.status()));
            }
            Ok(r) => bail!("GET {source} failed with HTTP {}", r.status()),
            Err(e) => last_err = Some(e.into()),
        }
        thread::sleep(Duration::from_millis(backoff_ms));
    }
    bail!("network error for {source}: {:?}", last_err);
}

pub fn load_rows(source: &str) -> Result<ParsedRows> {
    let text = fetch_text(source)?;
    storage::read_rows(&text).with_context(|| format!("parse rows from {source}"))
}

pub fn load_geography(source: &str) -> Result<Geography> {
    let text = fetch_text(source)?;
    storage::parse_geography(&text).with_context(|| format!("parse geography from {source}"))
}

/// Fetch the tabular and geographic feeds concurrently; fails if either fails.
pub fn load_sources(tabular: &str, geography: &str) -> Result<LoadedSources, AtlasError> {
    let (rows, geo) = thread::scope(|s| {
        let rows = s.spawn(|| load_rows(tabular));
        let geo = s.spawn(|| load_geography(geography));
        (join(rows), join(geo))
    });

    let rows = rows.map_err(|e| AtlasError::load_failure(tabular, format!("{e:#}")))?;
    let geography = geo.map_err(|e| AtlasError::load_failure(geography, format!("{e:#}")))?;
    info!(
        "loaded {} rows ({} unreadable) and {} countries",
        rows.rows.len(),
        rows.errors.len(),
        geography.len()
    );
    Ok(LoadedSources { rows, geography })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow::anyhow!("loader thread panicked")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn urls_are_recognized() {
        assert!(is_url("https://example.org/world.json"));
        assert!(!is_url("data/world.json"));
    }

    #[test]
    fn loads_both_local_feeds() {
        let dir = tempdir().unwrap();
        let rows = dir.path().join("rows.csv");
        let geo = dir.path().join("world.json");
        std::fs::write(&rows, "year,id,temperature\n2000,4,14.0\n").unwrap();
        std::fs::write(&geo, r#"{"features":[{"id":"004"}]}"#).unwrap();

        let loaded =
            load_sources(rows.to_str().unwrap(), geo.to_str().unwrap()).unwrap();
        assert_eq!(loaded.rows.rows.len(), 1);
        assert_eq!(loaded.geography.len(), 1);
    }

    #[test]
    fn failing_feed_is_named() {
        let dir = tempdir().unwrap();
        let rows = dir.path().join("rows.csv");
        std::fs::write(&rows, "year,id,temperature\n2000,4,14.0\n").unwrap();
        let missing = dir.path().join("missing.json");

        let err = load_sources(rows.to_str().unwrap(), missing.to_str().unwrap()).unwrap_err();
        match err {
            AtlasError::LoadFailure { source_name, .. } => {
                assert!(source_name.ends_with("missing.json"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
