//! Detailed weapon and group breakdown for the focus country.

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, file_slug, sorted_desc, AnalysisContext};
use crate::charts;
use crate::models::Incident;
use crate::report::subhead;

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let country = &ctx.focus_country;
    let subset = ctx.dataset.in_country(country);
    if subset.is_empty() {
        println!("No data found for {country} in the dataset.");
        return Ok(());
    }
    println!("Found {} total records for {country}.", subset.len());

    let slug = file_slug(country);

    println!(
        "{}",
        subhead(&format!("Weapon Types Analysis for {country}"))
    );
    let weapons = weapon_counts(&subset);
    if !ctx.skip_charts {
        let items: Vec<(String, f64)> = weapons
            .iter()
            .map(|(name, count)| (name.clone(), *count as f64))
            .collect();
        let path = ctx.chart_path(&format!("{slug}_weapon_types.png"));
        chart_saved(
            &path,
            charts::ranked_barh(
                &path,
                &format!("Weapon Types Used in Attacks in {country}"),
                "Number of Incidents",
                &items,
                (1200, 800),
            ),
        );
    }
    println!("{}", subhead(&format!("Top 3 Weapon Types in {country}")));
    for (name, count) in weapons.iter().take(3) {
        println!("{name}: {count}");
    }

    let known: Vec<&Incident> = subset
        .iter()
        .copied()
        .filter(|incident| incident.has_known_group())
        .collect();
    if known.is_empty() {
        println!("No data available for known terrorist groups in {country}.");
    } else {
        println!(
            "{}",
            subhead(&format!("Terrorist Groups Analysis for {country}"))
        );
        let groups = group_counts(&known);
        if !ctx.skip_charts {
            let items: Vec<(String, f64)> = groups
                .iter()
                .map(|(name, count)| (name.clone(), *count as f64))
                .collect();
            let path = ctx.chart_path(&format!("{slug}_terrorist_groups.png"));
            chart_saved(
                &path,
                charts::ranked_barh(
                    &path,
                    &format!("Terrorist Groups Operating in {country}"),
                    "Number of Attacks",
                    &items,
                    (1200, 800),
                ),
            );
        }
        println!("{}", subhead(&format!("Top 3 Terrorist Groups in {country}")));
        for (name, count) in groups.iter().take(3) {
            println!("{name}: {count}");
        }
    }

    println!(
        "\nDetailed analysis for {country} complete. Plots saved to '{}' directory.",
        ctx.out_dir.display()
    );
    Ok(())
}

/// Weapon type counts for a country subset, most used first.
pub fn weapon_counts(subset: &[&Incident]) -> Vec<(String, u64)> {
    sorted_desc(count_by(subset.iter().copied(), |i| i.weapon_type.clone()))
}

/// Attack counts per named group, most active first.
pub fn group_counts(known: &[&Incident]) -> Vec<(String, u64)> {
    sorted_desc(count_by(known.iter().copied(), |i| Some(i.group.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(weapon: &str, group: &str) -> Incident {
        Incident {
            year: 2011,
            country: Some("Kazakhstan".to_string()),
            weapon_type: Some(weapon.to_string()),
            group: group.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_weapon_counts_ordering() {
        let incidents = vec![
            make_incident("Explosives", "Unknown"),
            make_incident("Firearms", "Unknown"),
            make_incident("Explosives", "Unknown"),
        ];
        let subset: Vec<&Incident> = incidents.iter().collect();
        assert_eq!(
            weapon_counts(&subset),
            vec![("Explosives".to_string(), 2), ("Firearms".to_string(), 1)]
        );
    }

    #[test]
    fn test_group_counts_on_known_subset() {
        let incidents = vec![
            make_incident("Explosives", "Jund al-Khilafah"),
            make_incident("Firearms", "Jund al-Khilafah"),
        ];
        let known: Vec<&Incident> = incidents.iter().collect();
        assert_eq!(
            group_counts(&known),
            vec![("Jund al-Khilafah".to_string(), 2)]
        );
    }
}
