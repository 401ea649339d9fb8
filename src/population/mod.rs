//! Country population lookups for per-capita statistics.
//!
//! Populations come from the REST Countries API, one request per country,
//! throttled by a bounded concurrency. A lookup that fails for any reason
//! resolves to `None` and the country simply drops out of the per-capita
//! ranking. An offline table can replace the API entirely.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Default REST Countries endpoint queried per country name.
pub const DEFAULT_ENDPOINT: &str = "https://restcountries.com/v3.1/name";

/// Dataset country names that the API knows under a different name.
const NAME_ALIASES: &[(&str, &str)] = &[
    ("Russia", "Russian Federation"),
    ("South Korea", "Korea, Republic of"),
];

/// Territories the API has no entry for, with approximate populations.
const FIXED_POPULATIONS: &[(&str, u64)] = &[("West Bank and Gaza Strip", 5_044_000)];

#[derive(Debug, Deserialize)]
struct CountryRecord {
    population: u64,
}

/// Resolves country populations, either over HTTP or from a fixed table.
pub struct PopulationClient {
    client: Client,
    endpoint: String,
    table: Option<HashMap<String, u64>>,
}

impl PopulationClient {
    /// Builds an HTTP-backed client. When `table_file` is given, the file's
    /// entries are authoritative and no requests are made.
    pub fn new(endpoint: &str, timeout: Duration, table_file: Option<&Path>) -> Result<Self> {
        let table = match table_file {
            Some(path) => Some(load_table(path)?),
            None => None,
        };
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gtdlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            table,
        })
    }

    /// Population of one country, `None` when it cannot be resolved.
    pub async fn lookup(&self, country: &str) -> Option<u64> {
        if let Some(population) = fixed_population(country) {
            return Some(population);
        }
        if let Some(table) = &self.table {
            let found = table.get(country).copied();
            if found.is_none() {
                debug!(country, "country missing from population table");
            }
            return found;
        }
        self.fetch(country).await
    }

    /// Resolves every country in `countries`, showing a progress bar.
    /// Countries that cannot be resolved are absent from the result.
    pub async fn populations_for(
        &self,
        countries: &[String],
        concurrency: usize,
    ) -> HashMap<String, u64> {
        let bar = Arc::new(ProgressBar::new(countries.len() as u64));
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );

        let resolved: Vec<(String, Option<u64>)> = stream::iter(countries.iter().cloned())
            .map(|country| {
                let bar = Arc::clone(&bar);
                async move {
                    let population = self.lookup(&country).await;
                    bar.inc(1);
                    (country, population)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        bar.finish_and_clear();

        let found: HashMap<String, u64> = resolved
            .into_iter()
            .filter_map(|(country, population)| population.map(|p| (country, p)))
            .collect();
        info!(
            resolved = found.len(),
            requested = countries.len(),
            "population lookups finished"
        );
        found
    }

    async fn fetch(&self, country: &str) -> Option<u64> {
        let query_name = api_name(country);
        let url = format!("{}/{}", self.endpoint, query_name);
        let response = self
            .client
            .get(&url)
            .query(&[("fullText", "true"), ("fields", "population")])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let records: Vec<CountryRecord> = resp.json().await.ok()?;
                records.first().map(|record| record.population)
            }
            Ok(resp) => {
                debug!(country, status = %resp.status(), "population lookup rejected");
                None
            }
            Err(e) if e.is_timeout() => {
                debug!(country, "population lookup timed out");
                None
            }
            Err(e) if e.is_connect() => {
                debug!(country, "could not reach population API");
                None
            }
            Err(e) => {
                debug!(country, error = %e, "population lookup failed");
                None
            }
        }
    }
}

/// Name the API expects for a dataset country name.
pub fn api_name(country: &str) -> &str {
    NAME_ALIASES
        .iter()
        .find(|(from, _)| *from == country)
        .map(|(_, to)| *to)
        .unwrap_or(country)
}

/// Hardcoded population for territories outside the API.
pub fn fixed_population(country: &str) -> Option<u64> {
    FIXED_POPULATIONS
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, population)| *population)
}

fn load_table(path: &Path) -> Result<HashMap<String, u64>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read population file: {}", path.display()))?;
    let table: HashMap<String, u64> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid population file: {}", path.display()))?;
    info!(entries = table.len(), source = %path.display(), "loaded population table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table_client(table: HashMap<String, u64>) -> PopulationClient {
        PopulationClient {
            client: Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            table: Some(table),
        }
    }

    #[test]
    fn test_api_name_aliases() {
        assert_eq!(api_name("Russia"), "Russian Federation");
        assert_eq!(api_name("South Korea"), "Korea, Republic of");
        assert_eq!(api_name("Kazakhstan"), "Kazakhstan");
    }

    #[test]
    fn test_fixed_population() {
        assert_eq!(fixed_population("West Bank and Gaza Strip"), Some(5_044_000));
        assert_eq!(fixed_population("France"), None);
    }

    #[test]
    fn test_response_parsing_takes_first_record() {
        let records: Vec<CountryRecord> =
            serde_json::from_str(r#"[{"population":19398000}]"#).unwrap();
        assert_eq!(records.first().map(|r| r.population), Some(19_398_000));

        let several: Vec<CountryRecord> =
            serde_json::from_str(r#"[{"population":146000000},{"population":9500000}]"#).unwrap();
        assert_eq!(several.first().map(|r| r.population), Some(146_000_000));

        let empty: Vec<CountryRecord> = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.first().map(|r| r.population), None);
    }

    #[tokio::test]
    async fn test_table_lookup_is_authoritative() {
        let mut table = HashMap::new();
        table.insert("Kazakhstan".to_string(), 18_000_000_u64);
        let client = make_table_client(table);

        assert_eq!(client.lookup("Kazakhstan").await, Some(18_000_000));
        assert_eq!(client.lookup("Atlantis").await, None);
        // Fixed territories resolve even with a table installed.
        assert_eq!(
            client.lookup("West Bank and Gaza Strip").await,
            Some(5_044_000)
        );
    }

    #[tokio::test]
    async fn test_populations_for_drops_unresolved() {
        let mut table = HashMap::new();
        table.insert("Kazakhstan".to_string(), 18_000_000_u64);
        table.insert("Iraq".to_string(), 40_000_000_u64);
        let client = make_table_client(table);

        let countries = vec![
            "Kazakhstan".to_string(),
            "Iraq".to_string(),
            "Atlantis".to_string(),
        ];
        let found = client.populations_for(&countries, 4).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("Kazakhstan"), Some(&18_000_000));
        assert!(!found.contains_key("Atlantis"));
    }
}
