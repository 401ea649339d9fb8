//! Dataset overview: shape, regional totals and the long-run attack trend.

use anyhow::Result;
use tracing::info;

use crate::analysis::{chart_saved, count_by, sorted_desc, AnalysisContext};
use crate::charts;
use crate::models::Incident;
use crate::report::fmt_count;

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let dataset = ctx.dataset;
    let (rows, columns) = dataset.shape();
    println!("Shape of the dataset: ({rows}, {columns})");
    println!("Columns of the dataset: {:?}", dataset.columns);

    let regions = attacks_by_region(&dataset.incidents);
    println!("\nNumber of attacks by region:");
    for (region, count) in &regions {
        println!("{region}: {}", fmt_count(*count));
    }

    let region_incidents = dataset.in_region(&ctx.focus_region);
    let country_incidents = dataset.in_country(&ctx.focus_country);
    println!(
        "\nNumber of attacks in {}: {}",
        ctx.focus_region,
        fmt_count(region_incidents.len() as u64)
    );
    println!(
        "Number of attacks in {}: {}",
        ctx.focus_country,
        fmt_count(country_incidents.len() as u64)
    );

    if ctx.skip_charts {
        return Ok(());
    }

    let bars: Vec<(String, f64)> = regions
        .iter()
        .map(|(name, count)| (name.clone(), *count as f64))
        .collect();
    let region_chart = ctx.chart_path("attacks_by_region.png");
    if chart_saved(
        &region_chart,
        charts::ranked_barh(
            &region_chart,
            "Number of Terrorist Attacks by Region",
            "Number of Attacks",
            &bars,
            (1200, 600),
        ),
    ) {
        info!(chart = %region_chart.display(), "saved");
    }

    let comparison = vec![
        ("World".to_string(), yearly_counts(&dataset.incidents)),
        (
            ctx.focus_region.clone(),
            yearly_counts(region_incidents.iter().copied()),
        ),
        (
            ctx.focus_country.clone(),
            yearly_counts(country_incidents.iter().copied()),
        ),
    ];
    let trend_chart = ctx.chart_path("attacks_over_time_comparison.png");
    if chart_saved(
        &trend_chart,
        charts::multi_line(
            &trend_chart,
            &format!(
                "Terrorist Attacks Over Time: World vs {} vs {}",
                ctx.focus_region, ctx.focus_country
            ),
            "Year",
            "Number of Attacks",
            &comparison,
            (1200, 600),
        ),
    ) {
        info!(chart = %trend_chart.display(), "saved");
    }
    Ok(())
}

/// Attack counts per region, largest first.
pub fn attacks_by_region(incidents: &[Incident]) -> Vec<(String, u64)> {
    sorted_desc(count_by(incidents, |i| i.region.clone()))
}

/// Attack counts per year, ascending, as chart points.
pub fn yearly_counts<'a, I>(incidents: I) -> Vec<(f64, f64)>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let per_year = count_by(incidents, |i| Some(i.year));
    let mut years: Vec<(i32, u64)> = per_year.into_iter().collect();
    years.sort_by_key(|(year, _)| *year);
    years
        .into_iter()
        .map(|(year, count)| (year as f64, count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(year: i32, region: &str) -> Incident {
        Incident {
            year,
            region: Some(region.to_string()),
            group: "Unknown".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_attacks_by_region_orders_desc() {
        let incidents = vec![
            make_incident(1999, "South Asia"),
            make_incident(2000, "South Asia"),
            make_incident(2001, "Central Asia"),
        ];
        let ranked = attacks_by_region(&incidents);
        assert_eq!(
            ranked,
            vec![("South Asia".to_string(), 2), ("Central Asia".to_string(), 1)]
        );
    }

    #[test]
    fn test_yearly_counts_sorted_by_year() {
        let incidents = vec![
            make_incident(2001, "South Asia"),
            make_incident(1999, "South Asia"),
            make_incident(2001, "Central Asia"),
        ];
        let points = yearly_counts(&incidents);
        assert_eq!(points, vec![(1999.0, 1.0), (2001.0, 2.0)]);
    }
}
