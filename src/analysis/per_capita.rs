//! Attack rates normalized by country population.
//!
//! The one pass that goes beyond the spreadsheet: every country in the
//! dataset gets a population lookup, and countries that stay unresolved
//! drop out of the ranking.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, file_slug, sorted_desc, AnalysisContext};
use crate::charts;
use crate::population::PopulationClient;
use crate::report::{aligned_table, fmt_count};

/// One row of the per-capita ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PerCapitaEntry {
    pub country: String,
    pub attacks: u64,
    pub population: u64,
    pub per_million: f64,
}

pub async fn run(ctx: &AnalysisContext<'_>, populations: &PopulationClient) -> Result<()> {
    let started = Instant::now();
    let counts = sorted_desc(count_by(ctx.dataset.incidents.iter(), |i| i.country.clone()));
    println!("Found {} unique countries", counts.len());

    let names: Vec<String> = counts.iter().map(|(country, _)| country.clone()).collect();
    let resolved = populations.populations_for(&names, ctx.concurrency).await;
    println!(
        "Population data collected in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    let ranking = per_capita_ranking(&counts, &resolved);
    println!(
        "Calculations finished in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    if !ctx.skip_charts {
        let labels: Vec<String> = ranking
            .iter()
            .take(ctx.top)
            .map(|entry| entry.country.clone())
            .collect();
        let values: Vec<f64> = ranking
            .iter()
            .take(ctx.top)
            .map(|entry| entry.per_million)
            .collect();
        let path = ctx.chart_path("attacks_per_capita.png");
        if chart_saved(
            &path,
            charts::vertical_bars(
                &path,
                &format!("Top {} Countries by Attacks per 1 Million People", ctx.top),
                "Country",
                "Attacks per 1 Million People",
                &labels,
                &values,
                &vec![charts::TAB_BLUE; labels.len()],
                None,
                false,
                (1200, 800),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    let region_countries: HashSet<&str> = ctx
        .dataset
        .in_region(&ctx.focus_region)
        .iter()
        .filter_map(|incident| incident.country.as_deref())
        .collect();
    let regional: Vec<&PerCapitaEntry> = ranking
        .iter()
        .filter(|entry| region_countries.contains(entry.country.as_str()))
        .collect();

    println!("\nAttacks per 1 million people in {}:", ctx.focus_region);
    for entry in &regional {
        println!("{}: {:.2}", entry.country, entry.per_million);
    }

    if let Some(entry) = ranking
        .iter()
        .find(|entry| entry.country == ctx.focus_country)
    {
        println!(
            "\nAttacks per 1 million people in {}: {:.2}",
            ctx.focus_country, entry.per_million
        );
    }

    if !ctx.skip_charts {
        let labels: Vec<String> = regional.iter().map(|entry| entry.country.clone()).collect();
        let values: Vec<f64> = regional.iter().map(|entry| entry.per_million).collect();
        let path = ctx.chart_path(&format!(
            "attacks_per_capita_{}.png",
            file_slug(&ctx.focus_region)
        ));
        if chart_saved(
            &path,
            charts::vertical_bars(
                &path,
                &format!("Attacks per 1 Million People in {}", ctx.focus_region),
                "Country",
                "Attacks per 1 Million People",
                &labels,
                &values,
                &vec![charts::TAB_BLUE; labels.len()],
                None,
                false,
                (1000, 600),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!(
        "--- Top {} Countries by Attacks Per Capita (per million people) ---",
        ctx.top
    );
    let rows: Vec<Vec<String>> = ranking
        .iter()
        .take(ctx.top)
        .map(|entry| {
            vec![
                entry.country.clone(),
                fmt_count(entry.attacks),
                fmt_count(entry.population),
                format!("{:.2}", entry.per_million),
            ]
        })
        .collect();
    println!(
        "{}",
        aligned_table(
            &["Country", "AttackCount", "Population", "AttacksPerCapita"],
            &rows
        )
    );

    match ranking
        .iter()
        .position(|entry| entry.country == ctx.focus_country)
    {
        Some(index) => println!(
            "\n{}'s Rank (Attacks Per Capita): {}",
            ctx.focus_country,
            index + 1
        ),
        None => println!("\nCould not determine {}'s rank.", ctx.focus_country),
    }
    Ok(())
}

/// Joins attack counts with resolved populations and ranks countries by
/// attacks per million inhabitants. Countries without a population stay
/// out of the ranking.
pub fn per_capita_ranking(
    counts: &[(String, u64)],
    populations: &HashMap<String, u64>,
) -> Vec<PerCapitaEntry> {
    let mut ranking: Vec<PerCapitaEntry> = counts
        .iter()
        .filter_map(|(country, attacks)| {
            let population = populations.get(country).copied()?;
            (population > 0).then(|| PerCapitaEntry {
                country: country.clone(),
                attacks: *attacks,
                population,
                per_million: *attacks as f64 / population as f64 * 1_000_000.0,
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.per_million
            .partial_cmp(&a.per_million)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.country.cmp(&b.country))
    });
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_capita_ranking_drops_unresolved() {
        let counts = vec![
            ("Iraq".to_string(), 100_u64),
            ("Atlantis".to_string(), 50),
            ("Malta".to_string(), 1),
        ];
        let mut populations = HashMap::new();
        populations.insert("Iraq".to_string(), 40_000_000_u64);
        populations.insert("Malta".to_string(), 500_000_u64);

        let ranking = per_capita_ranking(&counts, &populations);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].country, "Iraq");
        assert!((ranking[0].per_million - 2.5).abs() < 1e-9);
        assert_eq!(ranking[1].country, "Malta");
        assert!((ranking[1].per_million - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_capita_rate_is_per_million() {
        let counts = vec![("Kazakhstan".to_string(), 12_u64)];
        let mut populations = HashMap::new();
        populations.insert("Kazakhstan".to_string(), 4_000_000_u64);

        let ranking = per_capita_ranking(&counts, &populations);
        assert_eq!(ranking[0].attacks, 12);
        assert_eq!(ranking[0].population, 4_000_000);
        assert!((ranking[0].per_million - 3.0).abs() < 1e-9);
    }
}
