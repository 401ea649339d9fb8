//! Country rankings by attack count and casualties, with a breakdown of
//! the focus country.

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, file_slug, sorted_desc, sum_by, AnalysisContext};
use crate::charts;
use crate::models::Incident;
use crate::report::{aligned_table, fmt_count, fmt_rounded, subhead};

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let incidents = &ctx.dataset.incidents;

    println!("--- Ranking Countries by Number of Attacks ---");
    let by_attacks = attack_ranking(incidents);
    let rows: Vec<Vec<String>> = by_attacks
        .iter()
        .take(ctx.top)
        .map(|(country, count)| vec![country.clone(), fmt_count(*count)])
        .collect();
    println!("{}", aligned_table(&["Country", "Count"], &rows));
    print_rank(
        rank_of(&by_attacks, &ctx.focus_country),
        &ctx.focus_country,
        "Number of Attacks",
    );
    if !ctx.skip_charts {
        let items: Vec<(String, f64)> = by_attacks
            .iter()
            .take(ctx.top)
            .map(|(country, count)| (country.clone(), *count as f64))
            .collect();
        let path = ctx.chart_path(&format!("top_{}_countries_by_attacks.png", ctx.top));
        chart_saved(
            &path,
            charts::ranked_barh(
                &path,
                &format!("Top {} Countries by Number of Terrorist Attacks", ctx.top),
                "Number of Attacks",
                &items,
                (1200, 800),
            ),
        );
    }

    println!("{}", subhead("Ranking Countries by Total Casualties"));
    let by_casualties = casualty_ranking(incidents);
    let rows: Vec<Vec<String>> = by_casualties
        .iter()
        .take(ctx.top)
        .map(|(country, total)| vec![country.clone(), fmt_rounded(*total)])
        .collect();
    println!("{}", aligned_table(&["Country", "Casualties"], &rows));
    print_rank(
        rank_of(&by_casualties, &ctx.focus_country),
        &ctx.focus_country,
        "Total Casualties",
    );
    if !ctx.skip_charts {
        let items: Vec<(String, f64)> = by_casualties
            .iter()
            .take(ctx.top)
            .cloned()
            .collect();
        let path = ctx.chart_path(&format!("top_{}_countries_by_casualties.png", ctx.top));
        chart_saved(
            &path,
            charts::ranked_barh(
                &path,
                &format!("Top {} Countries by Total Casualties from Terrorism", ctx.top),
                "Total Casualties",
                &items,
                (1200, 800),
            ),
        );
    }

    let subset = ctx.dataset.in_country(&ctx.focus_country);
    if subset.is_empty() {
        println!("No data available for {}.", ctx.focus_country);
    } else {
        println!("{}", subhead(&format!("Analysis for {}", ctx.focus_country)));
        if !ctx.skip_charts {
            let slug = file_slug(&ctx.focus_country);
            let breakdowns = [
                (
                    format!("{slug}_attack_types.png"),
                    format!("Attack Types in {}", ctx.focus_country),
                    ranked_counts(&subset, |i| i.attack_type.clone()),
                ),
                (
                    format!("{slug}_target_types.png"),
                    format!("Target Types in {}", ctx.focus_country),
                    ranked_counts(&subset, |i| i.target_type.clone()),
                ),
                (
                    format!("{slug}_attacks_by_city.png"),
                    format!("Attacks by City in {}", ctx.focus_country),
                    ranked_counts(&subset, |i| i.city.clone()),
                ),
            ];
            for (file, title, counts) in &breakdowns {
                let items: Vec<(String, f64)> = counts
                    .iter()
                    .map(|(name, count)| (name.clone(), *count as f64))
                    .collect();
                let path = ctx.chart_path(file);
                chart_saved(
                    &path,
                    charts::ranked_barh(&path, title, "Number of Attacks", &items, (1000, 600)),
                );
            }
        }
    }

    println!("\nAnalysis complete. Plots and rankings have been generated.");
    Ok(())
}

fn print_rank(rank: Option<usize>, country: &str, metric: &str) {
    match rank {
        Some(position) => println!("\n{country}'s Rank ({metric}): {position}"),
        None => println!("\nCould not determine {country}'s rank."),
    }
}

/// Countries by number of recorded attacks, most first.
pub fn attack_ranking(incidents: &[Incident]) -> Vec<(String, u64)> {
    sorted_desc(count_by(incidents.iter(), |i| i.country.clone()))
}

/// Countries by total killed plus wounded, most first.
pub fn casualty_ranking(incidents: &[Incident]) -> Vec<(String, f64)> {
    sorted_desc(sum_by(incidents.iter(), |i| {
        i.country.clone().map(|country| (country, i.casualties()))
    }))
}

/// One-based position of `country` in a ranking, if present.
pub fn rank_of<V>(ranking: &[(String, V)], country: &str) -> Option<usize> {
    ranking
        .iter()
        .position(|(name, _)| name == country)
        .map(|index| index + 1)
}

fn ranked_counts<F>(subset: &[&Incident], key: F) -> Vec<(String, u64)>
where
    F: Fn(&Incident) -> Option<String>,
{
    sorted_desc(count_by(subset.iter().copied(), key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(country: &str, killed: f64) -> Incident {
        Incident {
            year: 2000,
            country: Some(country.to_string()),
            killed: Some(killed),
            wounded: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_attack_ranking_orders_by_count() {
        let incidents = vec![
            make_incident("Iraq", 0.0),
            make_incident("Iraq", 0.0),
            make_incident("Peru", 0.0),
        ];
        assert_eq!(
            attack_ranking(&incidents),
            vec![("Iraq".to_string(), 2), ("Peru".to_string(), 1)]
        );
    }

    #[test]
    fn test_casualty_ranking_sums_killed_and_wounded() {
        let incidents = vec![
            make_incident("Iraq", 2.0),
            make_incident("Peru", 10.0),
            make_incident("Iraq", 1.0),
        ];
        let ranking = casualty_ranking(&incidents);
        assert_eq!(ranking[0], ("Peru".to_string(), 11.0));
        assert_eq!(ranking[1], ("Iraq".to_string(), 5.0));
    }

    #[test]
    fn test_rank_of_is_one_based() {
        let ranking = vec![("Iraq".to_string(), 9), ("Peru".to_string(), 3)];
        assert_eq!(rank_of(&ranking, "Iraq"), Some(1));
        assert_eq!(rank_of(&ranking, "Peru"), Some(2));
        assert_eq!(rank_of(&ranking, "Chad"), None);
    }
}
