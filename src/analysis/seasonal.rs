//! Monthly, daily and seasonal attack patterns.
//!
//! All of this pass works on incidents with a known month; the day-of-month
//! section additionally requires a known day. Casualty sums treat missing
//! counts as zero, matching the other passes.

use anyhow::Result;

use crate::analysis::{chart_saved, count_by, percentage, sorted_desc, top_n, AnalysisContext};
use crate::charts;
use crate::models::{Incident, Season, MONTH_NAMES};
use crate::report::{aligned_table, banner, fmt_count, fmt_rounded};

/// Per-season attack and casualty totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeasonTotals {
    pub attacks: u64,
    pub killed: f64,
    pub wounded: f64,
}

pub fn run(ctx: &AnalysisContext<'_>) -> Result<()> {
    let dated = with_known_month(&ctx.dataset.incidents);

    // Monthly distribution.
    let counts = monthly_counts(dated.iter().copied());
    let deaths = monthly_deaths(dated.iter().copied());
    let total_attacks: u64 = counts.iter().sum();

    if !ctx.skip_charts {
        let month_labels: Vec<String> = MONTH_NAMES.iter().map(|name| name.to_string()).collect();
        let count_values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
        let path = ctx.chart_path("monthly_patterns.png");
        if chart_saved(
            &path,
            charts::monthly_panels(&path, &month_labels, &count_values, &deaths),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!("{}", banner("MONTHLY ATTACK DISTRIBUTION", 50));
    for (index, count) in counts.iter().enumerate() {
        println!(
            "{}: {} attacks ({:.1}%)",
            MONTH_NAMES[index],
            fmt_count(*count),
            percentage(*count as f64, total_attacks as f64)
        );
    }

    // Day-of-month distribution.
    let with_day: Vec<&Incident> = dated
        .iter()
        .copied()
        .filter(|incident| incident.day >= 1)
        .collect();
    let days = daily_counts(with_day.iter().copied());

    if !ctx.skip_charts {
        let day_labels: Vec<String> = (1..=31).map(|day| day.to_string()).collect();
        let day_values: Vec<f64> = days.iter().map(|c| *c as f64).collect();
        let mean = daily_average(&days);
        let path = ctx.chart_path("daily_patterns.png");
        if chart_saved(
            &path,
            charts::vertical_bars(
                &path,
                "Terrorist Attacks by Day of Month",
                "Day of Month",
                "Number of Attacks",
                &day_labels,
                &day_values,
                &[charts::STEEL_BLUE],
                Some(mean),
                false,
                (1400, 500),
            ),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!("{}", banner("NOTABLE DAYS", 50));
    if let Some((busiest, busiest_count)) = busiest_day(&days) {
        println!(
            "Most attacks on day: {busiest} ({} attacks)",
            fmt_count(busiest_count)
        );
    }
    if let Some((quietest, quietest_count)) = quietest_day(&days) {
        println!(
            "Fewest attacks on day: {quietest} ({} attacks)",
            fmt_count(quietest_count)
        );
    }

    // Seasonal totals.
    let seasons = season_totals(dated.iter().copied());

    if !ctx.skip_charts {
        let season_labels: Vec<String> = Season::ALL.iter().map(|s| s.to_string()).collect();
        let shares: Vec<f64> = seasons
            .iter()
            .map(|(_, totals)| percentage(totals.attacks as f64, total_attacks as f64))
            .collect();
        let killed: Vec<f64> = seasons.iter().map(|(_, totals)| totals.killed).collect();
        let wounded: Vec<f64> = seasons.iter().map(|(_, totals)| totals.wounded).collect();
        let path = ctx.chart_path("seasonal_patterns.png");
        if chart_saved(
            &path,
            charts::seasonal_panels(&path, &season_labels, &shares, &killed, &wounded),
        ) {
            println!("Saved: {}", path.display());
        }
    }

    println!("{}", banner("SEASONAL STATISTICS", 50));
    let rows: Vec<Vec<String>> = seasons
        .iter()
        .map(|(season, totals)| {
            vec![
                season.to_string(),
                fmt_count(totals.attacks),
                fmt_rounded(totals.killed),
                fmt_rounded(totals.wounded),
            ]
        })
        .collect();
    println!(
        "{}",
        aligned_table(&["Season", "Attacks", "Killed", "Wounded"], &rows)
    );

    if !ctx.skip_charts {
        // Year-by-month heatmap, recent decades only.
        let (years, matrix) = yearly_monthly_matrix(dated.iter().copied(), 1990);
        let month_labels: Vec<String> = MONTH_NAMES.iter().map(|name| name.to_string()).collect();
        let year_labels: Vec<String> = years.iter().map(|year| year.to_string()).collect();
        let path = ctx.chart_path("attacks_heatmap.png");
        if chart_saved(
            &path,
            charts::heatmap(
                &path,
                "Terrorist Attacks Heatmap (1990-Present)",
                "Month",
                "Year",
                &month_labels,
                &year_labels,
                &matrix,
                false,
                charts::HeatPalette::YellowOrangeRed,
                (1400, 1000),
            ),
        ) {
            println!("Saved: {}", path.display());
        }

        // Seasonal split of the busiest regions.
        let top_regions = top_n(
            sorted_desc(count_by(dated.iter().copied(), |i| i.region.clone())),
            6,
        );
        let region_names: Vec<String> = top_regions.into_iter().map(|(name, _)| name).collect();
        let shares = regional_season_shares(&dated, &region_names);
        let series: Vec<(String, Vec<f64>, charts::RGBColor)> = Season::ALL
            .iter()
            .zip(shares)
            .enumerate()
            .map(|(index, (season, values))| {
                (season.to_string(), values, charts::SEASON_COLORS[index])
            })
            .collect();
        let path = ctx.chart_path("regional_seasonal_patterns.png");
        if chart_saved(
            &path,
            charts::grouped_bars(
                &path,
                "Seasonal Attack Distribution by Region",
                "Region",
                "Percentage of Attacks",
                &region_names,
                &series,
                (1200, 600),
            ),
        ) {
            println!("Saved: {}", path.display());
        }

        println!(
            "\nSeasonal patterns analysis complete. Plots saved to '{}' directory.",
            ctx.out_dir.display()
        );
    }
    Ok(())
}

/// Incidents whose month is recorded (1-12).
pub fn with_known_month(incidents: &[Incident]) -> Vec<&Incident> {
    incidents
        .iter()
        .filter(|incident| (1..=12).contains(&incident.month))
        .collect()
}

/// Attack counts indexed by month minus one.
pub fn monthly_counts<'a, I>(incidents: I) -> [u64; 12]
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut counts = [0_u64; 12];
    for incident in incidents {
        if (1..=12).contains(&incident.month) {
            counts[(incident.month - 1) as usize] += 1;
        }
    }
    counts
}

/// Killed totals indexed by month minus one.
pub fn monthly_deaths<'a, I>(incidents: I) -> [f64; 12]
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut deaths = [0.0_f64; 12];
    for incident in incidents {
        if (1..=12).contains(&incident.month) {
            deaths[(incident.month - 1) as usize] += incident.killed_or_zero();
        }
    }
    deaths
}

/// Attack counts indexed by day of month minus one.
pub fn daily_counts<'a, I>(incidents: I) -> [u64; 31]
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut counts = [0_u64; 31];
    for incident in incidents {
        if (1..=31).contains(&incident.day) {
            counts[(incident.day - 1) as usize] += 1;
        }
    }
    counts
}

/// Mean attacks across the days that saw any.
pub fn daily_average(days: &[u64; 31]) -> f64 {
    let observed = days.iter().filter(|&&count| count > 0).count();
    if observed == 0 {
        return 0.0;
    }
    let total: u64 = days.iter().sum();
    total as f64 / observed as f64
}

/// Day with the most attacks.
pub fn busiest_day(days: &[u64; 31]) -> Option<(u32, u64)> {
    days.iter()
        .enumerate()
        .max_by_key(|&(index, &count)| (count, std::cmp::Reverse(index)))
        .filter(|(_, &count)| count > 0)
        .map(|(index, &count)| (index as u32 + 1, count))
}

/// Day with the fewest attacks, among days that saw any.
pub fn quietest_day(days: &[u64; 31]) -> Option<(u32, u64)> {
    days.iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .min_by_key(|&(_, &count)| count)
        .map(|(index, &count)| (index as u32 + 1, count))
}

/// Attack and casualty totals per season, in reporting order.
pub fn season_totals<'a, I>(incidents: I) -> Vec<(Season, SeasonTotals)>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut totals = [SeasonTotals::default(); 4];
    for incident in incidents {
        if let Some(season) = incident.season() {
            let slot = Season::ALL
                .iter()
                .position(|s| *s == season)
                .unwrap_or_default();
            totals[slot].attacks += 1;
            totals[slot].killed += incident.killed_or_zero();
            totals[slot].wounded += incident.wounded_or_zero();
        }
    }
    Season::ALL.into_iter().zip(totals).collect()
}

/// Attack counts per year and month from `min_year` on. Years ascend, so
/// the first matrix row is the oldest.
pub fn yearly_monthly_matrix<'a, I>(incidents: I, min_year: i32) -> (Vec<i32>, Vec<Vec<f64>>)
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut per_year: std::collections::BTreeMap<i32, [f64; 12]> = std::collections::BTreeMap::new();
    for incident in incidents {
        if incident.year >= min_year && (1..=12).contains(&incident.month) {
            per_year.entry(incident.year).or_insert([0.0; 12])[(incident.month - 1) as usize] +=
                1.0;
        }
    }
    let years: Vec<i32> = per_year.keys().copied().collect();
    let matrix: Vec<Vec<f64>> = per_year.into_values().map(|row| row.to_vec()).collect();
    (years, matrix)
}

/// Share of each region's attacks falling in each season, one vector per
/// season aligned with `regions`.
pub fn regional_season_shares(incidents: &[&Incident], regions: &[String]) -> Vec<Vec<f64>> {
    let mut attack_totals = vec![0.0_f64; regions.len()];
    let mut per_season = vec![vec![0.0_f64; regions.len()]; 4];

    for incident in incidents {
        let Some(region) = incident.region.as_deref() else {
            continue;
        };
        let Some(column) = regions.iter().position(|name| name == region) else {
            continue;
        };
        let Some(season) = incident.season() else {
            continue;
        };
        let row = Season::ALL.iter().position(|s| *s == season).unwrap_or_default();
        attack_totals[column] += 1.0;
        per_season[row][column] += 1.0;
    }

    for row in &mut per_season {
        for (column, value) in row.iter_mut().enumerate() {
            *value = percentage(*value, attack_totals[column]);
        }
    }
    per_season
}
