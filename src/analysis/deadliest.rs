//! The deadliest attacks, regions and groups, and lethality over time.

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, sorted_desc, sum_by, AnalysisContext};
use crate::charts;
use crate::models::Incident;
use crate::report::{banner, fmt_count};

/// How many groups the deadliest-groups section reports.
const TOP_GROUPS: usize = 15;

/// Casualty totals attributed to one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCasualties {
    pub name: String,
    pub attacks: u64,
    pub killed: f64,
    pub wounded: f64,
}

/// Casualty series per year, all aligned with `years`.
#[derive(Debug, Default, PartialEq)]
pub struct YearlyLethality {
    pub years: Vec<f64>,
    pub total_killed: Vec<f64>,
    pub total_wounded: Vec<f64>,
    pub avg_killed: Vec<f64>,
    pub avg_wounded: Vec<f64>,
}

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let incidents = &ctx.dataset.incidents;

    println!(
        "{}",
        banner(
            &format!("TOP {} DEADLIEST TERRORIST ATTACKS IN HISTORY", ctx.top),
            60
        )
    );
    for (index, incident) in top_deadliest(incidents, ctx.top).iter().enumerate() {
        let country = incident.country.as_deref().unwrap_or("Unknown");
        let city = incident.city.as_deref().unwrap_or("Unknown");
        println!("\n{}. {country}, {city} ({})", index + 1, incident.year);
        println!("   Group: {}", incident.group);
        println!(
            "   Attack Type: {}",
            incident.attack_type.as_deref().unwrap_or("Unknown")
        );
        println!(
            "   Killed: {}, Wounded: {}",
            incident.killed_or_zero() as i64,
            incident.wounded_or_zero() as i64
        );
    }

    if !ctx.skip_charts {
        let averages = region_deadliness(incidents);
        let totals = region_casualties(incidents);
        let path = ctx.chart_path("deadliest_by_region.png");
        if chart_saved(
            &path,
            charts::regional_deadliness_panels(&path, &averages, &totals),
        ) {
            println!("\nSaved: {}", path.display());
        }
    }

    let groups = deadliest_groups(incidents, TOP_GROUPS);
    if !ctx.skip_charts {
        let items: Vec<(String, f64, f64)> = groups
            .iter()
            .map(|group| (group.name.clone(), group.killed, group.wounded))
            .collect();
        let path = ctx.chart_path("deadliest_groups.png");
        if chart_saved(
            &path,
            charts::stacked_barh(
                &path,
                &format!("Top {TOP_GROUPS} Deadliest Terrorist Groups"),
                "Total Casualties",
                ("Killed", "Wounded"),
                &items,
                (1200, 800),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!(
        "{}",
        banner(&format!("TOP {TOP_GROUPS} DEADLIEST TERRORIST GROUPS"), 60)
    );
    for (index, group) in groups.iter().enumerate() {
        println!("{:2}. {}", index + 1, group.name);
        println!(
            "    Attacks: {} | Killed: {} | Wounded: {}",
            fmt_count(group.attacks),
            fmt_count(group.killed.max(0.0) as u64),
            fmt_count(group.wounded.max(0.0) as u64)
        );
    }

    if !ctx.skip_charts {
        let trend = lethality_by_year(incidents);
        let path = ctx.chart_path("lethality_trends.png");
        if chart_saved(
            &path,
            charts::lethality_panels(
                &path,
                &trend.years,
                &trend.total_killed,
                &trend.total_wounded,
                &trend.avg_killed,
                &trend.avg_wounded,
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }
    Ok(())
}

/// The `n` incidents with the highest death toll, deadliest first.
pub fn top_deadliest(incidents: &[Incident], n: usize) -> Vec<&Incident> {
    let mut ranked: Vec<&Incident> = incidents.iter().collect();
    ranked.sort_by(|a, b| {
        b.killed_or_zero()
            .partial_cmp(&a.killed_or_zero())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// Average casualties per attack for each region, deadliest first.
pub fn region_deadliness(incidents: &[Incident]) -> Vec<(String, f64)> {
    let counts = count_by(incidents, |i| i.region.clone());
    let casualties = sum_by(incidents, |i| {
        i.region.clone().map(|region| (region, i.casualties()))
    });
    let averages: std::collections::HashMap<String, f64> = casualties
        .into_iter()
        .map(|(region, total)| {
            let attacks = counts.get(&region).copied().unwrap_or(1) as f64;
            (region, total / attacks)
        })
        .collect();
    sorted_desc(averages)
}

/// Total killed and wounded per region, ordered by killed.
pub fn region_casualties(incidents: &[Incident]) -> Vec<(String, f64, f64)> {
    let killed = sum_by(incidents, |i| {
        i.region.clone().map(|region| (region, i.killed_or_zero()))
    });
    let wounded = sum_by(incidents, |i| {
        i.region.clone().map(|region| (region, i.wounded_or_zero()))
    });
    let mut totals: Vec<(String, f64, f64)> = killed
        .into_iter()
        .map(|(region, killed_total)| {
            let wounded_total = wounded.get(&region).copied().unwrap_or(0.0);
            (region, killed_total, wounded_total)
        })
        .collect();
    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    totals
}

/// The `n` named groups with the most kills, deadliest first.
pub fn deadliest_groups(incidents: &[Incident], n: usize) -> Vec<GroupCasualties> {
    let mut per_group: std::collections::HashMap<String, GroupCasualties> =
        std::collections::HashMap::new();
    for incident in incidents {
        if !incident.has_known_group() {
            continue;
        }
        let entry = per_group
            .entry(incident.group.clone())
            .or_insert_with(|| GroupCasualties {
                name: incident.group.clone(),
                attacks: 0,
                killed: 0.0,
                wounded: 0.0,
            });
        entry.attacks += 1;
        entry.killed += incident.killed_or_zero();
        entry.wounded += incident.wounded_or_zero();
    }

    let mut groups: Vec<GroupCasualties> = per_group.into_values().collect();
    groups.sort_by(|a, b| {
        b.killed
            .partial_cmp(&a.killed)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    groups.truncate(n);
    groups
}

/// Casualty totals and per-attack averages by year, ascending.
pub fn lethality_by_year(incidents: &[Incident]) -> YearlyLethality {
    let mut per_year: std::collections::BTreeMap<i32, (u64, f64, f64)> =
        std::collections::BTreeMap::new();
    for incident in incidents {
        let entry = per_year.entry(incident.year).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += incident.killed_or_zero();
        entry.2 += incident.wounded_or_zero();
    }

    let mut trend = YearlyLethality::default();
    for (year, (attacks, killed, wounded)) in per_year {
        let attacks = attacks as f64;
        trend.years.push(year as f64);
        trend.total_killed.push(killed);
        trend.total_wounded.push(wounded);
        trend.avg_killed.push(killed / attacks);
        trend.avg_wounded.push(wounded / attacks);
    }
    trend
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(year: i32, group: &str, killed: f64, wounded: f64) -> Incident {
        Incident {
            year,
            country: Some("Iraq".to_string()),
            region: Some("Middle East & North Africa".to_string()),
            group: group.to_string(),
            killed: Some(killed),
            wounded: Some(wounded),
            ..Default::default()
        }
    }

    #[test]
    fn test_top_deadliest_orders_by_killed() {
        let incidents = vec![
            make_incident(1998, "A", 10.0, 0.0),
            make_incident(1999, "B", 300.0, 0.0),
            make_incident(2000, "C", 50.0, 0.0),
        ];
        let top = top_deadliest(&incidents, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].killed, Some(300.0));
        assert_eq!(top[1].killed, Some(50.0));
    }

    #[test]
    fn test_region_deadliness_averages() {
        let mut incidents = vec![
            make_incident(1998, "A", 10.0, 10.0),
            make_incident(1999, "A", 0.0, 0.0),
        ];
        incidents.push(Incident {
            region: Some("Western Europe".to_string()),
            ..make_incident(2000, "B", 3.0, 0.0)
        });
        let averages = region_deadliness(&incidents);
        assert_eq!(averages[0].0, "Middle East & North Africa");
        assert_eq!(averages[0].1, 10.0);
        assert_eq!(averages[1], ("Western Europe".to_string(), 3.0));
    }

    #[test]
    fn test_deadliest_groups_skip_unknown() {
        let incidents = vec![
            make_incident(1998, "Unknown", 500.0, 0.0),
            make_incident(1999, "Alpha", 30.0, 5.0),
            make_incident(2000, "Alpha", 20.0, 5.0),
            make_incident(2000, "Beta", 40.0, 0.0),
        ];
        let groups = deadliest_groups(&incidents, 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Alpha");
        assert_eq!(groups[0].attacks, 2);
        assert_eq!(groups[0].killed, 50.0);
        assert_eq!(groups[0].wounded, 10.0);
        assert_eq!(groups[1].name, "Beta");
    }

    #[test]
    fn test_lethality_by_year_ascending() {
        let incidents = vec![
            make_incident(2001, "A", 4.0, 2.0),
            make_incident(1999, "B", 1.0, 1.0),
            make_incident(2001, "C", 0.0, 0.0),
        ];
        let trend = lethality_by_year(&incidents);
        assert_eq!(trend.years, vec![1999.0, 2001.0]);
        assert_eq!(trend.total_killed, vec![1.0, 4.0]);
        assert_eq!(trend.avg_killed, vec![1.0, 2.0]);
        assert_eq!(trend.avg_wounded, vec![1.0, 1.0]);
    }
}
