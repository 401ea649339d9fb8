//! Terrorist group profiles.
//!
//! Covers the most active organizations, their activity over time, the
//! methods and targets they prefer, and how far each has spread. Every
//! section ignores incidents without an attributed group.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::Result;

use crate::analysis::{
    chart_saved, count_by, file_slug, names_of, sorted_desc, top_n, AnalysisContext,
};
use crate::charts;
use crate::models::Incident;
use crate::report::{banner, fmt_count};

/// Series drawn in the activity timeline and heatmap rows.
const TIMELINE_GROUPS: usize = 10;
/// Columns kept in the target-preference heatmap.
const TOP_TARGET_TYPES: usize = 8;
/// Rows in the geographic spread section.
const SPREAD_GROUPS: usize = 15;

/// Activity profile of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProfile {
    pub name: String,
    pub attacks: u64,
    pub first_year: i32,
    pub last_year: i32,
    pub killed: f64,
    pub countries: u64,
}

impl GroupProfile {
    /// Years from the first to the last recorded attack, inclusive.
    pub fn active_years(&self) -> i32 {
        self.last_year - self.first_year + 1
    }

    /// Attacks per active year, rounded to one decimal.
    pub fn attacks_per_year(&self) -> f64 {
        let rate = self.attacks as f64 / f64::from(self.active_years());
        (rate * 10.0).round() / 10.0
    }
}

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let incidents = &ctx.dataset.incidents;
    let top_profiles = top_n(group_profiles(incidents.iter()), ctx.top);

    if !ctx.skip_charts {
        let items: Vec<(String, f64)> = top_profiles
            .iter()
            .map(|profile| (profile.name.clone(), profile.attacks as f64))
            .collect();
        let path = ctx.chart_path("most_active_groups.png");
        if chart_saved(
            &path,
            charts::ranked_barh(
                &path,
                &format!("Top {} Most Active Terrorist Groups", ctx.top),
                "Number of Attacks",
                &items,
                (1200, 1000),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!(
        "{}",
        banner(
            &format!("TOP {} MOST ACTIVE TERRORIST GROUPS", ctx.top),
            70
        )
    );
    for profile in &top_profiles {
        println!("\n{}", profile.name);
        println!(
            "  Attacks: {} | Active: {}-{}",
            fmt_count(profile.attacks),
            profile.first_year,
            profile.last_year
        );
        println!(
            "  Killed: {} | Countries: {} | Attacks/year: {:.1}",
            fmt_count(profile.killed.max(0.0) as u64),
            profile.countries,
            profile.attacks_per_year()
        );
    }

    if !ctx.skip_charts {
        let names = top_group_names(incidents, TIMELINE_GROUPS);

        let series = activity_timeline(incidents, &names);
        let path = ctx.chart_path("group_activity_timeline.png");
        if chart_saved(
            &path,
            charts::multi_line(
                &path,
                "Activity Timeline of Major Terrorist Groups",
                "Year",
                "Number of Attacks",
                &series,
                (1400, 800),
            ),
        ) {
            println!("Saved: {}", path.display());
        }

        let (rows, columns, shares) =
            share_matrix(incidents.iter(), &names, |i| i.attack_type.clone());
        let path = ctx.chart_path("group_methods_heatmap.png");
        if chart_saved(
            &path,
            charts::heatmap(
                &path,
                "Attack Methods by Terrorist Group (%)",
                "Attack Type",
                "Group",
                &columns,
                &rows,
                &shares,
                true,
                charts::HeatPalette::YellowOrangeRed,
                (1400, 1000),
            ),
        ) {
            println!("Saved: {}", path.display());
        }

        let target_types = top_target_types(incidents, TOP_TARGET_TYPES);
        let wanted: HashSet<&str> = target_types.iter().map(String::as_str).collect();
        let (rows, columns, shares) = share_matrix(incidents.iter(), &names, |i| {
            i.target_type
                .clone()
                .filter(|target| wanted.contains(target.as_str()))
        });
        let path = ctx.chart_path("group_targets_heatmap.png");
        if chart_saved(
            &path,
            charts::heatmap(
                &path,
                "Target Preferences by Terrorist Group (%)",
                "Target Type",
                "Group",
                &columns,
                &rows,
                &shares,
                true,
                charts::HeatPalette::Blues,
                (1400, 1000),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    let spread = geographic_spread(incidents, ctx.min_spread_attacks, SPREAD_GROUPS);
    if !ctx.skip_charts {
        let items: Vec<(String, f64, f64)> = spread
            .iter()
            .map(|(name, countries, regions)| (name.clone(), *countries as f64, *regions as f64))
            .collect();
        let path = ctx.chart_path("group_geographic_spread.png");
        if chart_saved(
            &path,
            charts::paired_barh(
                &path,
                "Geographic Spread of Terrorist Groups",
                "Count",
                ("Countries", "Regions"),
                &items,
                (1200, 800),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }
    println!("{}", banner("MOST GEOGRAPHICALLY SPREAD GROUPS", 60));
    for (name, countries, regions) in &spread {
        println!("{name}: {countries} countries, {regions} regions");
    }

    let regional = group_profiles(
        incidents
            .iter()
            .filter(|i| i.region.as_deref() == Some(ctx.focus_region.as_str())),
    );
    if regional.is_empty() {
        println!("No known group data for {}.", ctx.focus_region);
        return Ok(());
    }
    if !ctx.skip_charts {
        let items: Vec<(String, f64)> = regional
            .iter()
            .map(|profile| (profile.name.clone(), profile.attacks as f64))
            .collect();
        let path = ctx.chart_path(&format!("{}_groups.png", file_slug(&ctx.focus_region)));
        if chart_saved(
            &path,
            charts::ranked_barh(
                &path,
                &format!("Terrorist Groups in {}", ctx.focus_region),
                "Number of Attacks",
                &items,
                (1200, 600),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }
    println!(
        "{}",
        banner(
            &format!("TERRORIST GROUPS IN {}", ctx.focus_region.to_uppercase()),
            60
        )
    );
    for profile in &regional {
        println!(
            "{}: {} attacks, {} killed",
            profile.name,
            profile.attacks,
            profile.killed.max(0.0) as i64
        );
    }
    Ok(())
}

/// Aggregates each known group's activity, most attacks first.
pub fn group_profiles<'a, I>(incidents: I) -> Vec<GroupProfile>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut stats: HashMap<String, (u64, i32, i32, f64, HashSet<&'a str>)> = HashMap::new();
    for incident in incidents {
        if !incident.has_known_group() {
            continue;
        }
        let entry = stats
            .entry(incident.group.clone())
            .or_insert((0, incident.year, incident.year, 0.0, HashSet::new()));
        entry.0 += 1;
        entry.1 = entry.1.min(incident.year);
        entry.2 = entry.2.max(incident.year);
        entry.3 += incident.killed_or_zero();
        if let Some(country) = incident.country.as_deref() {
            entry.4.insert(country);
        }
    }

    let mut profiles: Vec<GroupProfile> = stats
        .into_iter()
        .map(|(name, (attacks, first_year, last_year, killed, countries))| GroupProfile {
            name,
            attacks,
            first_year,
            last_year,
            killed,
            countries: countries.len() as u64,
        })
        .collect();
    profiles.sort_by(|a, b| b.attacks.cmp(&a.attacks).then_with(|| a.name.cmp(&b.name)));
    profiles
}

/// Names of the `n` known groups with the most attacks.
pub fn top_group_names(incidents: &[Incident], n: usize) -> Vec<String> {
    let counts = count_by(incidents.iter(), |i| {
        i.has_known_group().then(|| i.group.clone())
    });
    names_of(&top_n(sorted_desc(counts), n))
}

/// Attack counts per year for each listed group, zero-filled over the
/// years any of them was active. Groups absent from the data are dropped.
pub fn activity_timeline(
    incidents: &[Incident],
    groups: &[String],
) -> Vec<(String, Vec<(f64, f64)>)> {
    let wanted: HashSet<&str> = groups.iter().map(String::as_str).collect();
    let mut years: BTreeSet<i32> = BTreeSet::new();
    let mut counts: HashMap<&str, HashMap<i32, u64>> = HashMap::new();
    for incident in incidents {
        if !wanted.contains(incident.group.as_str()) {
            continue;
        }
        years.insert(incident.year);
        *counts
            .entry(incident.group.as_str())
            .or_default()
            .entry(incident.year)
            .or_insert(0) += 1;
    }

    groups
        .iter()
        .filter(|name| counts.contains_key(name.as_str()))
        .map(|name| {
            let by_year = &counts[name.as_str()];
            let points: Vec<(f64, f64)> = years
                .iter()
                .map(|&year| {
                    let count = by_year.get(&year).copied().unwrap_or(0);
                    (f64::from(year), count as f64)
                })
                .collect();
            (name.clone(), points)
        })
        .collect()
}

/// Cross-tabulates the listed groups against a category, as row
/// percentages. Returns `(row_labels, column_labels, values)` with both
/// label sets sorted alphabetically; rows with no categorized incidents
/// are omitted.
pub fn share_matrix<'a, I, F>(
    incidents: I,
    groups: &[String],
    category_of: F,
) -> (Vec<String>, Vec<String>, Vec<Vec<f64>>)
where
    I: IntoIterator<Item = &'a Incident>,
    F: Fn(&Incident) -> Option<String>,
{
    let wanted: HashSet<&str> = groups.iter().map(String::as_str).collect();
    let mut columns: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<String, HashMap<String, u64>> = BTreeMap::new();
    for incident in incidents {
        if !wanted.contains(incident.group.as_str()) {
            continue;
        }
        let Some(category) = category_of(incident) else {
            continue;
        };
        columns.insert(category.clone());
        *cells
            .entry(incident.group.clone())
            .or_default()
            .entry(category)
            .or_insert(0) += 1;
    }

    let column_labels: Vec<String> = columns.into_iter().collect();
    let mut row_labels = Vec::with_capacity(cells.len());
    let mut values = Vec::with_capacity(cells.len());
    for (group, row) in cells {
        let total: u64 = row.values().sum();
        let shares: Vec<f64> = column_labels
            .iter()
            .map(|column| {
                let count = row.get(column).copied().unwrap_or(0) as f64;
                count / total as f64 * 100.0
            })
            .collect();
        row_labels.push(group);
        values.push(shares);
    }
    (row_labels, column_labels, values)
}

/// The `n` most common target type categories among attributed attacks.
pub fn top_target_types(incidents: &[Incident], n: usize) -> Vec<String> {
    let counts = count_by(incidents.iter().filter(|i| i.has_known_group()), |i| {
        i.target_type.clone()
    });
    names_of(&top_n(sorted_desc(counts), n))
}

/// Countries and regions reached by each group with at least
/// `min_attacks` attacks, widest reach first.
pub fn geographic_spread(
    incidents: &[Incident],
    min_attacks: u64,
    n: usize,
) -> Vec<(String, u64, u64)> {
    let mut stats: HashMap<String, (u64, HashSet<&str>, HashSet<&str>)> = HashMap::new();
    for incident in incidents {
        if !incident.has_known_group() {
            continue;
        }
        let entry = stats.entry(incident.group.clone()).or_default();
        entry.0 += 1;
        if let Some(country) = incident.country.as_deref() {
            entry.1.insert(country);
        }
        if let Some(region) = incident.region.as_deref() {
            entry.2.insert(region);
        }
    }

    let mut spread: Vec<(String, u64, u64)> = stats
        .into_iter()
        .filter(|(_, (attacks, _, _))| *attacks >= min_attacks)
        .map(|(name, (_, countries, regions))| {
            (name, countries.len() as u64, regions.len() as u64)
        })
        .collect();
    spread.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    spread.truncate(n);
    spread
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(year: i32, group: &str, country: &str) -> Incident {
        Incident {
            year,
            country: Some(country.to_string()),
            region: Some("South Asia".to_string()),
            group: group.to_string(),
            killed: Some(2.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_profiles_aggregates() {
        let incidents = vec![
            make_incident(1995, "Alpha", "India"),
            make_incident(2001, "Alpha", "Pakistan"),
            make_incident(1998, "Alpha", "India"),
            make_incident(2005, "Beta", "India"),
            make_incident(2006, "Unknown", "India"),
        ];
        let profiles = group_profiles(incidents.iter());
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Alpha");
        assert_eq!(profiles[0].attacks, 3);
        assert_eq!(profiles[0].first_year, 1995);
        assert_eq!(profiles[0].last_year, 2001);
        assert_eq!(profiles[0].killed, 6.0);
        assert_eq!(profiles[0].countries, 2);
        assert_eq!(profiles[1].name, "Beta");
    }

    #[test]
    fn test_attacks_per_year_rounds_to_one_decimal() {
        let incidents = vec![
            make_incident(1995, "Alpha", "India"),
            make_incident(1997, "Alpha", "India"),
            make_incident(2004, "Beta", "India"),
            make_incident(2004, "Beta", "India"),
        ];
        let profiles = group_profiles(incidents.iter());
        // Alpha: 2 attacks across the 1995-1997 span.
        assert_eq!(profiles[0].name, "Alpha");
        assert_eq!(profiles[0].active_years(), 3);
        assert_eq!(profiles[0].attacks_per_year(), 0.7);
        // A single active year divides by one.
        assert_eq!(profiles[1].active_years(), 1);
        assert_eq!(profiles[1].attacks_per_year(), 2.0);
    }

    #[test]
    fn test_activity_timeline_zero_fills_quiet_years() {
        let incidents = vec![
            make_incident(1999, "Alpha", "India"),
            make_incident(2001, "Alpha", "India"),
            make_incident(2000, "Beta", "India"),
        ];
        let groups = vec!["Alpha".to_string(), "Beta".to_string(), "Gamma".to_string()];
        let series = activity_timeline(&incidents, &groups);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "Alpha");
        assert_eq!(
            series[0].1,
            vec![(1999.0, 1.0), (2000.0, 0.0), (2001.0, 1.0)]
        );
        assert_eq!(
            series[1].1,
            vec![(1999.0, 0.0), (2000.0, 1.0), (2001.0, 0.0)]
        );
    }

    #[test]
    fn test_share_matrix_row_percentages() {
        let mut incidents = Vec::new();
        for attack_type in ["Bombing/Explosion", "Bombing/Explosion", "Armed Assault"] {
            incidents.push(Incident {
                attack_type: Some(attack_type.to_string()),
                ..make_incident(2000, "Beta", "India")
            });
        }
        incidents.push(Incident {
            attack_type: Some("Armed Assault".to_string()),
            ..make_incident(2000, "Alpha", "India")
        });
        let groups = vec!["Alpha".to_string(), "Beta".to_string()];
        let (rows, columns, values) =
            share_matrix(incidents.iter(), &groups, |i| i.attack_type.clone());
        assert_eq!(rows, vec!["Alpha".to_string(), "Beta".to_string()]);
        assert_eq!(
            columns,
            vec!["Armed Assault".to_string(), "Bombing/Explosion".to_string()]
        );
        assert_eq!(values[0], vec![100.0, 0.0]);
        assert!((values[1][0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((values[1][1] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_spread_filters_small_groups() {
        let mut incidents = Vec::new();
        for country in ["India", "Pakistan", "Nepal"] {
            incidents.push(make_incident(2000, "Alpha", country));
        }
        incidents.push(make_incident(2001, "Beta", "India"));
        let spread = geographic_spread(&incidents, 2, 10);
        assert_eq!(spread, vec![("Alpha".to_string(), 3, 1)]);
    }
}
