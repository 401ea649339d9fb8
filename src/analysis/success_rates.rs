//! Success-rate analysis across attack types, regions, weapons and groups.
//!
//! Rates only consider incidents with a recorded outcome, so the totals
//! here can be smaller than raw attack counts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use anyhow::Result;
use tracing::info;

use crate::analysis::{chart_saved, AnalysisContext};
use crate::charts;
use crate::models::Incident;
use crate::report::{banner, fmt_count, fmt_pct};

/// Successful and recorded attack counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuccessStats {
    pub successful: u64,
    pub total: u64,
}

impl SuccessStats {
    /// Share of recorded attacks that succeeded, 0..1.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }
}

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let incidents = &ctx.dataset.incidents;

    let by_type = ranked_rates(success_by(incidents, |i| i.attack_type.clone()));
    println!("{}", banner("SUCCESS RATE BY ATTACK TYPE", 60));
    print_rates(&by_type);

    let by_region = ranked_rates(success_by(incidents, |i| i.region.clone()));
    println!("{}", banner("SUCCESS RATE BY REGION", 60));
    print_rates(&by_region);

    let by_weapon = ranked_rates(success_by(incidents, |i| i.weapon_type.clone()));

    let known = ctx.dataset.with_known_group();
    let by_group = major_group_rates(
        success_by(known.iter().copied(), |i| Some(i.group.clone())),
        ctx.min_group_attacks,
        ctx.top,
    );

    let trend = yearly_success(incidents);
    let average = if trend.is_empty() {
        0.0
    } else {
        trend.iter().map(|(_, rate)| rate).sum::<f64>() / trend.len() as f64
    };

    if ctx.skip_charts {
        return Ok(());
    }

    for (file, title, entries) in [
        (
            "success_by_attack_type.png",
            "Success Rate by Attack Type".to_string(),
            &by_type,
        ),
        (
            "success_by_region.png",
            "Success Rate by Region".to_string(),
            &by_region,
        ),
        (
            "success_by_weapon.png",
            "Success Rate by Weapon Type".to_string(),
            &by_weapon,
        ),
        (
            "success_by_group.png",
            format!(
                "Success Rate of Major Terrorist Groups (min {} attacks)",
                ctx.min_group_attacks
            ),
            &by_group,
        ),
    ] {
        let path = ctx.chart_path(file);
        if chart_saved(
            &path,
            charts::rate_barh(&path, &title, &rates_for_chart(entries), (1200, 700)),
        ) {
            info!(chart = %path.display(), "saved");
        }
    }

    let trend_chart = ctx.chart_path("success_trends.png");
    if chart_saved(
        &trend_chart,
        charts::trend_with_average(
            &trend_chart,
            "Terrorist Attack Success Rate Over Time",
            "Year",
            "Success Rate (%)",
            &trend,
            average,
            &format!("Average: {average:.1}%"),
            (1200, 600),
        ),
    ) {
        info!(chart = %trend_chart.display(), "saved");
    }

    println!(
        "\nSuccess rate analysis complete. Plots saved to '{}' directory.",
        ctx.out_dir.display()
    );
    Ok(())
}

/// Success tallies per key over incidents with a recorded outcome.
pub fn success_by<'a, K, F, I>(incidents: I, key: F) -> HashMap<K, SuccessStats>
where
    K: Eq + Hash,
    F: Fn(&Incident) -> Option<K>,
    I: IntoIterator<Item = &'a Incident>,
{
    let mut stats: HashMap<K, SuccessStats> = HashMap::new();
    for incident in incidents {
        if let (Some(success), Some(k)) = (incident.success, key(incident)) {
            let entry = stats.entry(k).or_default();
            entry.total += 1;
            if success {
                entry.successful += 1;
            }
        }
    }
    stats
}

/// Rates ordered best-first, ties alphabetical.
pub fn ranked_rates(stats: HashMap<String, SuccessStats>) -> Vec<(String, SuccessStats)> {
    let mut entries: Vec<(String, SuccessStats)> = stats.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.rate()
            .partial_cmp(&a.1.rate())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries
}

/// The `top` groups with at least `min_attacks` recorded outcomes, picked
/// by volume and then ordered worst-to-best so the chart reads upward.
pub fn major_group_rates(
    stats: HashMap<String, SuccessStats>,
    min_attacks: u64,
    top: usize,
) -> Vec<(String, SuccessStats)> {
    let mut entries: Vec<(String, SuccessStats)> = stats
        .into_iter()
        .filter(|(_, stats)| stats.total >= min_attacks)
        .collect();
    entries.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(top);
    entries.sort_by(|a, b| {
        a.1.rate()
            .partial_cmp(&b.1.rate())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries
}

/// Yearly success percentage, ascending by year.
pub fn yearly_success(incidents: &[Incident]) -> Vec<(f64, f64)> {
    let per_year = success_by(incidents, |i| Some(i.year));
    let mut years: Vec<(i32, SuccessStats)> = per_year.into_iter().collect();
    years.sort_by_key(|(year, _)| *year);
    years
        .into_iter()
        .map(|(year, stats)| (year as f64, stats.rate() * 100.0))
        .collect()
}

fn print_rates(entries: &[(String, SuccessStats)]) {
    for (name, stats) in entries {
        println!(
            "{name}: {} ({}/{})",
            fmt_pct(stats.rate()),
            fmt_count(stats.successful),
            fmt_count(stats.total)
        );
    }
}

fn rates_for_chart(entries: &[(String, SuccessStats)]) -> Vec<(String, f64)> {
    entries
        .iter()
        .map(|(name, stats)| (name.clone(), stats.rate()))
        .collect()
}
