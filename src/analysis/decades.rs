//! How terrorism evolved decade over decade.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, names_of, sorted_desc, top_n, AnalysisContext};
use crate::charts;
use crate::models::{decade_label, Incident};
use crate::report::{aligned_table, banner, fmt_count, fmt_rounded, subhead};

/// Regions followed in the hotspot-shift chart.
const TOP_REGIONS: usize = 6;
/// Target types followed in the target-evolution chart.
const TOP_TARGET_TYPES: usize = 8;

/// Aggregate figures for one decade.
#[derive(Debug, Clone, PartialEq)]
pub struct DecadeStats {
    pub decade: i32,
    pub attacks: u64,
    pub killed: f64,
    pub wounded: f64,
    pub countries: u64,
    pub groups: u64,
}

impl DecadeStats {
    /// Average killed per attack.
    pub fn avg_killed(&self) -> f64 {
        if self.attacks == 0 {
            0.0
        } else {
            self.killed / self.attacks as f64
        }
    }
}

/// Per-decade share of each category, as row percentages.
///
/// `values[decade][category]` pairs with `decades` and `categories`;
/// categories sort alphabetically and decades ascend.
#[derive(Debug, Default, PartialEq)]
pub struct DecadeShares {
    pub decades: Vec<String>,
    pub categories: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let incidents = &ctx.dataset.incidents;
    let stats = decade_stats(incidents);

    println!("{}", banner("TERRORISM BY DECADE - OVERVIEW", 70));
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|decade| {
            vec![
                decade_label(decade.decade),
                fmt_count(decade.attacks),
                fmt_rounded(decade.killed),
                fmt_rounded(decade.wounded),
                decade.countries.to_string(),
                decade.groups.to_string(),
                format!("{:.2}", decade.avg_killed()),
            ]
        })
        .collect();
    println!(
        "{}",
        aligned_table(
            &[
                "Decade",
                "Attacks",
                "Killed",
                "Wounded",
                "Countries_Affected",
                "Active_Groups",
                "Avg_Killed_Per_Attack",
            ],
            &rows
        )
    );

    if ctx.skip_charts {
        return Ok(());
    }

    println!("--- Comparing Overall Attack Trends Across Decades ---");
    let labels: Vec<String> = stats.iter().map(|d| decade_label(d.decade)).collect();
    let attacks: Vec<f64> = stats.iter().map(|d| d.attacks as f64).collect();
    let path = ctx.chart_path("attacks_by_decade.png");
    if chart_saved(
        &path,
        charts::vertical_bars(
            &path,
            "Terrorist Attacks by Decade",
            "Decade",
            "Number of Attacks",
            &labels,
            &attacks,
            &charts::reds(labels.len()),
            None,
            true,
            (1200, 600),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    let killed: Vec<f64> = stats.iter().map(|d| d.killed).collect();
    let wounded: Vec<f64> = stats.iter().map(|d| d.wounded).collect();
    let casualty_series = [
        ("Killed".to_string(), killed, charts::DARK_RED),
        ("Wounded".to_string(), wounded, charts::ORANGE),
    ];
    let path = ctx.chart_path("casualties_by_decade.png");
    if chart_saved(
        &path,
        charts::grouped_bars(
            &path,
            "Terrorism Casualties by Decade",
            "Decade",
            "Count",
            &labels,
            &casualty_series,
            (1200, 600),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    println!(
        "{}",
        subhead("Analyzing Regional Shifts in Terrorism Across Decades")
    );
    let shares = evolution_shares(incidents.iter(), |i| i.region.clone());
    let top_regions = ranked_names(incidents, TOP_REGIONS, |i| i.region.clone());
    let path = ctx.chart_path("regional_shift_by_decade.png");
    if chart_saved(
        &path,
        charts::category_lines(
            &path,
            "Shifting Terrorism Hotspots by Decade",
            "Decade",
            "Percentage of Global Attacks",
            &shares.decades,
            &series_for(&shares, &top_regions),
            (1400, 600),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    println!(
        "{}",
        subhead("Analyzing Evolution of Attack Types Across Decades")
    );
    let shares = evolution_shares(incidents.iter(), |i| i.attack_type.clone());
    let path = ctx.chart_path("attack_type_evolution.png");
    if chart_saved(
        &path,
        charts::stacked_percent_bars(
            &path,
            "Evolution of Attack Types by Decade",
            "Decade",
            &shares.decades,
            &series_for(&shares, &shares.categories),
            (1400, 800),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    println!(
        "{}",
        subhead("Analyzing Evolution of Weapon Types Across Decades")
    );
    let shares = evolution_shares(incidents.iter(), |i| i.weapon_type.clone());
    let path = ctx.chart_path("weapon_evolution.png");
    if chart_saved(
        &path,
        charts::stacked_percent_bars(
            &path,
            "Evolution of Weapon Types by Decade",
            "Decade",
            &shares.decades,
            &series_for(&shares, &shares.categories),
            (1400, 800),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    println!(
        "{}",
        subhead("Analyzing Evolution of Target Types Across Decades")
    );
    let top_targets = ranked_names(incidents, TOP_TARGET_TYPES, |i| i.target_type.clone());
    let wanted: HashSet<&str> = top_targets.iter().map(String::as_str).collect();
    let shares = evolution_shares(incidents.iter(), |i| {
        i.target_type
            .clone()
            .filter(|target| wanted.contains(target.as_str()))
    });
    let path = ctx.chart_path("target_evolution.png");
    if chart_saved(
        &path,
        charts::category_lines(
            &path,
            "Evolution of Target Types by Decade",
            "Decade",
            "Percentage of Attacks",
            &shares.decades,
            &series_for(&shares, &top_targets),
            (1400, 600),
        ),
    ) {
        println!("Saved: {}", path.display());
    }

    println!(
        "\nDecade comparison analysis complete. Plots saved to '{}' directory.",
        ctx.out_dir.display()
    );
    Ok(())
}

/// Aggregates the whole dataset by decade, earliest first. Distinct
/// group counts include the unattributed `"Unknown"` bucket.
pub fn decade_stats(incidents: &[Incident]) -> Vec<DecadeStats> {
    let mut per_decade: BTreeMap<i32, (u64, f64, f64, HashSet<&str>, HashSet<&str>)> =
        BTreeMap::new();
    for incident in incidents {
        let entry = per_decade.entry(incident.decade()).or_default();
        entry.0 += 1;
        entry.1 += incident.killed_or_zero();
        entry.2 += incident.wounded_or_zero();
        if let Some(country) = incident.country.as_deref() {
            entry.3.insert(country);
        }
        entry.4.insert(incident.group.as_str());
    }

    per_decade
        .into_iter()
        .map(|(decade, (attacks, killed, wounded, countries, groups))| DecadeStats {
            decade,
            attacks,
            killed,
            wounded,
            countries: countries.len() as u64,
            groups: groups.len() as u64,
        })
        .collect()
}

/// Cross-tabulates decades against a category as row percentages.
/// Incidents the category closure rejects stay out of the denominator.
pub fn evolution_shares<'a, I, F>(incidents: I, category_of: F) -> DecadeShares
where
    I: IntoIterator<Item = &'a Incident>,
    F: Fn(&Incident) -> Option<String>,
{
    let mut categories: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<i32, HashMap<String, u64>> = BTreeMap::new();
    for incident in incidents {
        let Some(category) = category_of(incident) else {
            continue;
        };
        categories.insert(category.clone());
        *cells
            .entry(incident.decade())
            .or_default()
            .entry(category)
            .or_insert(0) += 1;
    }

    let mut shares = DecadeShares {
        categories: categories.into_iter().collect(),
        ..DecadeShares::default()
    };
    for (decade, row) in cells {
        let total: u64 = row.values().sum();
        let values: Vec<f64> = shares
            .categories
            .iter()
            .map(|category| {
                let count = row.get(category).copied().unwrap_or(0) as f64;
                count / total as f64 * 100.0
            })
            .collect();
        shares.decades.push(decade_label(decade));
        shares.values.push(values);
    }
    shares
}

/// Extracts one per-decade series per requested category, in the order
/// given. Categories absent from the table are dropped.
pub fn series_for(shares: &DecadeShares, order: &[String]) -> Vec<(String, Vec<f64>)> {
    order
        .iter()
        .filter_map(|name| {
            let column = shares.categories.iter().position(|c| c == name)?;
            let values: Vec<f64> = shares.values.iter().map(|row| row[column]).collect();
            Some((name.clone(), values))
        })
        .collect()
}

fn ranked_names<F>(incidents: &[Incident], n: usize, key: F) -> Vec<String>
where
    F: Fn(&Incident) -> Option<String>,
{
    names_of(&top_n(sorted_desc(count_by(incidents.iter(), key)), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(year: i32, group: &str, attack_type: &str) -> Incident {
        Incident {
            year,
            country: Some("Peru".to_string()),
            region: Some("South America".to_string()),
            attack_type: Some(attack_type.to_string()),
            group: group.to_string(),
            killed: Some(1.0),
            wounded: Some(3.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_decade_stats_ascending() {
        let incidents = vec![
            make_incident(1994, "Alpha", "Armed Assault"),
            make_incident(1971, "Beta", "Armed Assault"),
            make_incident(1978, "Unknown", "Armed Assault"),
        ];
        let stats = decade_stats(&incidents);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].decade, 1970);
        assert_eq!(stats[0].attacks, 2);
        assert_eq!(stats[0].groups, 2);
        assert_eq!(stats[0].killed, 2.0);
        assert_eq!(stats[1].decade, 1990);
        assert_eq!(stats[1].avg_killed(), 1.0);
    }

    #[test]
    fn test_evolution_shares_row_percentages() {
        let incidents = vec![
            make_incident(1975, "Alpha", "Armed Assault"),
            make_incident(1977, "Alpha", "Bombing/Explosion"),
            make_incident(1978, "Alpha", "Bombing/Explosion"),
            make_incident(1985, "Alpha", "Armed Assault"),
        ];
        let shares = evolution_shares(incidents.iter(), |i| i.attack_type.clone());
        assert_eq!(shares.decades, vec!["1970s".to_string(), "1980s".to_string()]);
        assert_eq!(
            shares.categories,
            vec!["Armed Assault".to_string(), "Bombing/Explosion".to_string()]
        );
        assert!((shares.values[0][0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((shares.values[0][1] - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(shares.values[1], vec![100.0, 0.0]);
    }

    #[test]
    fn test_series_for_keeps_requested_order() {
        let shares = DecadeShares {
            decades: vec!["1970s".to_string()],
            categories: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![25.0, 75.0]],
        };
        let order = vec!["B".to_string(), "Missing".to_string(), "A".to_string()];
        let series = series_for(&shares, &order);
        assert_eq!(
            series,
            vec![
                ("B".to_string(), vec![75.0]),
                ("A".to_string(), vec![25.0]),
            ]
        );
    }
}
