//! Analysis passes over the loaded dataset.
//!
//! Each submodule owns one pass: a set of pure aggregation functions plus a
//! `run` entry point that prints the console report and renders its charts.
//! The passes share the [`AnalysisContext`] handed down from the CLI.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;
use tracing::warn;

use crate::dataset::Dataset;
use crate::models::Incident;
use crate::population::PopulationClient;

pub mod deadliest;
pub mod decades;
pub mod groups;
pub mod overview;
pub mod per_capita;
pub mod rankings;
pub mod seasonal;
pub mod spotlight;
pub mod success_rates;

/// The analysis passes, in the order a full run executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AnalysisKind {
    /// Dataset shape, regional totals and the long-run attack trend.
    Overview,
    /// Attack rates normalized by country population.
    PerCapita,
    /// Success rates by attack type, region, weapon and group.
    SuccessRates,
    /// Monthly, daily and seasonal attack patterns.
    Seasonal,
    /// The deadliest attacks, regions and groups.
    Deadliest,
    /// Profiles of the most active terrorist groups.
    Groups,
    /// Decade-by-decade evolution of terrorism.
    Decades,
    /// Country rankings by attacks and casualties.
    Rankings,
    /// A close look at the focus country.
    Spotlight,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 9] = [
        AnalysisKind::Overview,
        AnalysisKind::PerCapita,
        AnalysisKind::SuccessRates,
        AnalysisKind::Seasonal,
        AnalysisKind::Deadliest,
        AnalysisKind::Groups,
        AnalysisKind::Decades,
        AnalysisKind::Rankings,
        AnalysisKind::Spotlight,
    ];

    /// CLI-facing name, matching the `ValueEnum` kebab-case form.
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::Overview => "overview",
            AnalysisKind::PerCapita => "per-capita",
            AnalysisKind::SuccessRates => "success-rates",
            AnalysisKind::Seasonal => "seasonal",
            AnalysisKind::Deadliest => "deadliest",
            AnalysisKind::Groups => "groups",
            AnalysisKind::Decades => "decades",
            AnalysisKind::Rankings => "rankings",
            AnalysisKind::Spotlight => "spotlight",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            AnalysisKind::Overview => "dataset shape, regional totals and attack trends",
            AnalysisKind::PerCapita => "attacks per million inhabitants by country",
            AnalysisKind::SuccessRates => "success rates by attack type, region, weapon and group",
            AnalysisKind::Seasonal => "monthly, daily and seasonal patterns",
            AnalysisKind::Deadliest => "deadliest attacks, regions and groups",
            AnalysisKind::Groups => "most active groups, their methods and reach",
            AnalysisKind::Decades => "decade-by-decade comparison",
            AnalysisKind::Rankings => "country rankings by attacks and casualties",
            AnalysisKind::Spotlight => "detailed report on the focus country",
        }
    }

    /// Expands an optional user selection into the passes a run executes.
    /// Registry order applies regardless of the order requested, and
    /// duplicates collapse.
    pub fn selection(requested: Option<&[AnalysisKind]>) -> Vec<AnalysisKind> {
        match requested {
            Some(kinds) => Self::ALL
                .into_iter()
                .filter(|kind| kinds.contains(kind))
                .collect(),
            None => Self::ALL.to_vec(),
        }
    }
}

/// Settings shared by every analysis pass.
pub struct AnalysisContext<'a> {
    pub dataset: &'a Dataset,
    pub out_dir: PathBuf,
    pub focus_country: String,
    pub focus_region: String,
    pub top: usize,
    pub min_group_attacks: u64,
    pub min_spread_attacks: u64,
    pub concurrency: usize,
    pub skip_charts: bool,
}

impl AnalysisContext<'_> {
    pub fn chart_path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }
}

/// Runs one analysis pass. Only the per-capita pass performs I/O beyond
/// chart files; it looks up country populations through `populations`.
pub async fn run(
    kind: AnalysisKind,
    ctx: &AnalysisContext<'_>,
    populations: &PopulationClient,
) -> Result<()> {
    match kind {
        AnalysisKind::Overview => overview::run(ctx),
        AnalysisKind::PerCapita => per_capita::run(ctx, populations).await,
        AnalysisKind::SuccessRates => success_rates::run(ctx),
        AnalysisKind::Seasonal => seasonal::run(ctx),
        AnalysisKind::Deadliest => deadliest::run(ctx),
        AnalysisKind::Groups => groups::run(ctx),
        AnalysisKind::Decades => decades::run(ctx),
        AnalysisKind::Rankings => rankings::run(ctx),
        AnalysisKind::Spotlight => spotlight::run(ctx),
    }
}

/// Counts incidents per key. Incidents whose key extractor returns `None`
/// are left out of the tally.
pub fn count_by<'a, K, F, I>(incidents: I, key: F) -> HashMap<K, u64>
where
    K: Eq + Hash,
    F: Fn(&Incident) -> Option<K>,
    I: IntoIterator<Item = &'a Incident>,
{
    let mut counts = HashMap::new();
    for incident in incidents {
        if let Some(k) = key(incident) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

/// Sums a per-incident value per key.
pub fn sum_by<'a, K, F, I>(incidents: I, entry: F) -> HashMap<K, f64>
where
    K: Eq + Hash,
    F: Fn(&Incident) -> Option<(K, f64)>,
    I: IntoIterator<Item = &'a Incident>,
{
    let mut sums = HashMap::new();
    for incident in incidents {
        if let Some((k, v)) = entry(incident) {
            *sums.entry(k).or_insert(0.0) += v;
        }
    }
    sums
}

/// Flattens a tally into a vector ordered by value descending. Ties keep a
/// stable alphabetical order so repeated runs print identical tables.
pub fn sorted_desc<K, V>(map: HashMap<K, V>) -> Vec<(K, V)>
where
    K: Ord,
    V: PartialOrd + Copy,
{
    let mut entries: Vec<(K, V)> = map.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries
}

/// Keeps the first `n` entries of a ranking.
pub fn top_n<T>(mut entries: Vec<T>, n: usize) -> Vec<T> {
    entries.truncate(n);
    entries
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Name column of a ranked `(name, value)` list.
pub fn names_of(entries: &[(String, u64)]) -> Vec<String> {
    entries.iter().map(|(name, _)| name.clone()).collect()
}

/// Turns a country or region name into a chart file name stem.
pub fn file_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Logs a failed render and carries on. One chart that cannot be written
/// should not abort an otherwise complete run.
pub fn chart_saved(path: &Path, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to render {}: {:#}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_GROUP;

    fn make_incident(country: &str, killed: Option<f64>) -> Incident {
        Incident {
            year: 2001,
            month: 9,
            day: 11,
            country: Some(country.to_string()),
            region: Some("Middle East & North Africa".to_string()),
            group: UNKNOWN_GROUP.to_string(),
            killed,
            ..Default::default()
        }
    }

    #[test]
    fn test_count_by_skips_none_keys() {
        let mut incidents = vec![
            make_incident("Iraq", Some(3.0)),
            make_incident("Iraq", None),
            make_incident("France", Some(1.0)),
        ];
        incidents.push(Incident {
            country: None,
            ..make_incident("ignored", None)
        });

        let by_country = count_by(&incidents, |i| i.country.clone());
        assert_eq!(by_country.len(), 2);
        assert_eq!(by_country.get("Iraq"), Some(&2));
        assert_eq!(by_country.get("France"), Some(&1));

        let with_fatalities = count_by(&incidents, |i| i.killed.and(i.country.clone()));
        assert_eq!(with_fatalities.get("Iraq"), Some(&1));
    }

    #[test]
    fn test_sum_by_accumulates() {
        let incidents = vec![
            make_incident("Iraq", Some(3.0)),
            make_incident("Iraq", Some(2.0)),
            make_incident("France", None),
        ];
        let killed = sum_by(&incidents, |i| {
            i.country.clone().map(|c| (c, i.killed_or_zero()))
        });
        assert_eq!(killed.get("Iraq"), Some(&5.0));
        assert_eq!(killed.get("France"), Some(&0.0));
    }

    #[test]
    fn test_sorted_desc_breaks_ties_alphabetically() {
        let mut map = HashMap::new();
        map.insert("Beta".to_string(), 5_u64);
        map.insert("Alpha".to_string(), 5_u64);
        map.insert("Gamma".to_string(), 9_u64);
        let ranked = sorted_desc(map);
        assert_eq!(ranked[0].0, "Gamma");
        assert_eq!(ranked[1].0, "Alpha");
        assert_eq!(ranked[2].0, "Beta");
    }

    #[test]
    fn test_top_n_truncates() {
        let ranked = top_n(vec![1, 2, 3, 4], 2);
        assert_eq!(ranked, vec![1, 2]);
        assert_eq!(top_n(vec![1], 5), vec![1]);
    }

    #[test]
    fn test_percentage_guards_empty_whole() {
        assert_eq!(percentage(1.0, 0.0), 0.0);
        assert!((percentage(25.0, 200.0) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_kind_names_are_stable() {
        assert_eq!(AnalysisKind::ALL.len(), 9);
        assert_eq!(AnalysisKind::ALL[0].name(), "overview");
        assert_eq!(AnalysisKind::PerCapita.name(), "per-capita");
        assert_eq!(AnalysisKind::Spotlight.name(), "spotlight");
        for kind in AnalysisKind::ALL {
            assert!(!kind.summary().is_empty());
        }
    }

    #[test]
    fn test_selection_keeps_registry_order() {
        let requested = vec![
            AnalysisKind::Spotlight,
            AnalysisKind::Overview,
            AnalysisKind::Spotlight,
        ];
        let selected = AnalysisKind::selection(Some(&requested));
        assert_eq!(
            selected,
            vec![AnalysisKind::Overview, AnalysisKind::Spotlight]
        );

        assert_eq!(AnalysisKind::selection(None), AnalysisKind::ALL.to_vec());
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("Kazakhstan"), "kazakhstan");
        assert_eq!(file_slug("Central Asia"), "central_asia");
        assert_eq!(file_slug("Korea, Republic of"), "korea_republic_of");
    }
}
