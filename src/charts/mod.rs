//! PNG chart rendering.
//!
//! Every public function writes one finished figure to disk. The analyses
//! hand over plain label/value slices, so all plotting decisions (bar
//! geometry, palettes, legends) stay in this module. Category axes are
//! drawn on numeric coordinates with one tick per slot; ranked horizontal
//! bars carry their labels inside the plot area instead of on the axis.

use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::report::fmt_rounded;

pub use plotters::style::RGBColor;

/// Matplotlib's `darkred`.
pub const DARK_RED: RGBColor = RGBColor(139, 0, 0);
/// Matplotlib's `orange`.
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
/// Matplotlib's `steelblue`.
pub const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
/// Matplotlib's default series blue.
pub const TAB_BLUE: RGBColor = RGBColor(31, 119, 180);

/// Winter, spring, summer, autumn.
pub const SEASON_COLORS: [RGBColor; 4] = [
    RGBColor(52, 152, 219),
    RGBColor(46, 204, 113),
    RGBColor(231, 76, 60),
    RGBColor(243, 156, 18),
];

/// Light-to-dark red ramp over `n` slots, darkest last.
pub fn reds(n: usize) -> Vec<RGBColor> {
    ramp(n, (252, 187, 161), (103, 0, 13))
}

/// Cool-to-warm ramp over `n` slots (blue through yellow to red).
pub fn cool_warm(n: usize) -> Vec<RGBColor> {
    (0..n).map(|slot| {
        let t = fraction(slot, n);
        two_stage(t, (69, 117, 180), (254, 224, 144), (215, 48, 39))
    })
    .collect()
}

/// Maps a 0..1 rate onto a red-yellow-green scale.
pub fn red_yellow_green(rate: f64) -> RGBColor {
    two_stage(rate.clamp(0.0, 1.0), (215, 48, 39), (254, 224, 139), (26, 152, 80))
}

fn heat_color(t: f64) -> RGBColor {
    two_stage(t.clamp(0.0, 1.0), (255, 255, 204), (253, 141, 60), (128, 0, 38))
}

fn blues_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    lerp_color(t, (247, 251, 255), (8, 48, 107))
}

fn ramp(n: usize, from: (u8, u8, u8), to: (u8, u8, u8)) -> Vec<RGBColor> {
    (0..n).map(|slot| lerp_color(fraction(slot, n), from, to)).collect()
}

fn fraction(slot: usize, n: usize) -> f64 {
    if n <= 1 {
        0.5
    } else {
        slot as f64 / (n - 1) as f64
    }
}

fn lerp_color(t: f64, from: (u8, u8, u8), to: (u8, u8, u8)) -> RGBColor {
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

fn two_stage(t: f64, low: (u8, u8, u8), mid: (u8, u8, u8), high: (u8, u8, u8)) -> RGBColor {
    if t < 0.5 {
        lerp_color(t * 2.0, low, mid)
    } else {
        lerp_color((t - 0.5) * 2.0, mid, high)
    }
}

/// Axis ceiling with a little headroom above the largest value.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.08
    }
}

fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn label_style(size: u32) -> TextStyle<'static> {
    TextStyle::from(("sans-serif", size).into_font())
        .pos(Pos::new(HPos::Left, VPos::Center))
}

fn heatmap_palette(palette: HeatPalette, t: f64) -> RGBColor {
    match palette {
        HeatPalette::YellowOrangeRed => heat_color(t),
        HeatPalette::Blues => blues_color(t),
    }
}

/// Cell shading for [`heatmap`].
#[derive(Debug, Clone, Copy)]
pub enum HeatPalette {
    YellowOrangeRed,
    Blues,
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// One category-axis bar panel.
struct BarsSpec<'a> {
    title: &'a str,
    x_desc: &'a str,
    y_desc: &'a str,
    labels: &'a [String],
    values: &'a [f64],
    colors: &'a [RGBColor],
    mean_line: Option<(f64, String, RGBColor)>,
    value_formatter: Option<fn(f64) -> String>,
}

/// Ranked horizontal bars on a light-to-dark red ramp, largest first.
pub fn ranked_barh(
    path: &Path,
    title: &str,
    x_desc: &str,
    items: &[(String, f64)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    // Largest bar gets the darkest shade.
    let mut colors = reds(items.len());
    colors.reverse();
    let labels: Vec<String> = items.iter().map(|(_, value)| fmt_rounded(*value)).collect();
    let x_max = axis_max(items.iter().map(|(_, value)| *value));
    ranked_barh_on(&root, title, x_desc, items, &colors, x_max, &labels)?;
    present(&root, path)
}

/// Horizontal bars of 0..1 rates on a red-to-green scale, x axis 0..100.
pub fn rate_barh(
    path: &Path,
    title: &str,
    items: &[(String, f64)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let colors: Vec<RGBColor> = items
        .iter()
        .map(|(_, rate)| red_yellow_green(*rate))
        .collect();
    let scaled: Vec<(String, f64)> = items
        .iter()
        .map(|(name, rate)| (name.clone(), rate * 100.0))
        .collect();
    let labels: Vec<String> = items
        .iter()
        .map(|(_, rate)| format!("{:.1}%", rate * 100.0))
        .collect();
    ranked_barh_on(&root, title, "Success Rate (%)", &scaled, &colors, 100.0, &labels)?;
    present(&root, path)
}

/// Two-segment stacked horizontal bars, one row per item.
pub fn stacked_barh(
    path: &Path,
    title: &str,
    x_desc: &str,
    legend: (&str, &str),
    items: &[(String, f64, f64)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    stacked_barh_on(&root, title, x_desc, legend, items)?;
    present(&root, path)
}

/// Side-by-side horizontal bar pairs, one row per item.
pub fn paired_barh(
    path: &Path,
    title: &str,
    x_desc: &str,
    legend: (&str, &str),
    items: &[(String, f64, f64)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let count = items.len().max(1) as f64;
    let x_max = axis_max(items.iter().flat_map(|(_, a, b)| [*a, *b]));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(0f64..x_max, 0f64..count)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc(x_desc)
        .draw()?;

    let rows: Vec<(usize, &(String, f64, f64))> = items
        .iter()
        .enumerate()
        .map(|(rank, item)| (items.len() - 1 - rank, item))
        .collect();

    chart
        .draw_series(rows.iter().map(|(row, (_, first, _))| {
            let base = *row as f64;
            Rectangle::new([(0.0, base + 0.52), (*first, base + 0.88)], STEEL_BLUE.filled())
        }))?
        .label(legend.0)
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], STEEL_BLUE.filled()));

    chart
        .draw_series(rows.iter().map(|(row, (_, _, second))| {
            let base = *row as f64;
            Rectangle::new([(0.0, base + 0.12), (*second, base + 0.48)], ORANGE.filled())
        }))?
        .label(legend.1)
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], ORANGE.filled()));

    chart.draw_series(rows.iter().map(|(row, (name, _, _))| {
        Text::new(
            truncate_label(name, 48),
            (x_max * 0.01, *row as f64 + 0.5),
            label_style(13),
        )
    }))?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    present(&root, path)
}

/// Vertical bars over category slots. `show_values` prints each bar's
/// value above it; `mean_line` draws a labeled average marker.
#[allow(clippy::too_many_arguments)]
pub fn vertical_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
    colors: &[RGBColor],
    mean_line: Option<f64>,
    show_values: bool,
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    vertical_bars_on(
        &root,
        &BarsSpec {
            title,
            x_desc,
            y_desc,
            labels,
            values,
            colors,
            mean_line: mean_line
                .map(|mean| (mean, format!("Average: {}", fmt_rounded(mean)), RED)),
            value_formatter: show_values.then_some(fmt_rounded as fn(f64) -> String),
        },
    )?;
    present(&root, path)
}

/// Grouped vertical bars: one cluster per label, one bar per series.
pub fn grouped_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    series: &[(String, Vec<f64>, RGBColor)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    grouped_bars_on(&root, title, x_desc, y_desc, labels, series)?;
    present(&root, path)
}

/// Stacked vertical bars of row percentages, one stack per label.
pub fn stacked_percent_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    labels: &[String],
    series: &[(String, Vec<f64>)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let count = labels.len().max(1) as f64;
    let mut chart = category_chart(&root, title, x_desc, "Percentage", labels, count, 105.0)?;

    let mut stacked_base = vec![0.0_f64; labels.len()];
    for (series_index, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(series_index).to_rgba();
        let segments: Vec<Rectangle<(f64, f64)>> = values
            .iter()
            .enumerate()
            .map(|(slot, value)| {
                let bottom = stacked_base[slot];
                let top = bottom + value;
                stacked_base[slot] = top;
                Rectangle::new(
                    [(slot as f64 - 0.35, bottom), (slot as f64 + 0.35, top)],
                    color.filled(),
                )
            })
            .collect();
        chart
            .draw_series(segments)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    present(&root, path)
}

/// One line per series on a shared numeric axis, palette colors, legend.
pub fn multi_line(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(f64, f64)>)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let mut chart = line_chart(&root, title, x_desc, y_desc, series)?;

    for (series_index, (name, points)) in series.iter().enumerate() {
        let color = Palette99::pick(series_index).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    present(&root, path)
}

/// One line per series over a shared category axis, with point markers.
pub fn category_lines(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    series: &[(String, Vec<f64>)],
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let count = labels.len().max(1) as f64;
    let y_max = axis_max(series.iter().flat_map(|(_, values)| values.iter().copied()));
    let mut chart = category_chart(&root, title, x_desc, y_desc, labels, count, y_max)?;

    for (series_index, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(series_index).to_rgba();
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(slot, &value)| (slot as f64, value))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    present(&root, path)
}

/// A filled trend line with a horizontal average marker.
pub fn trend_with_average(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    average: f64,
    average_label: &str,
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let series = [("trend".to_string(), points.to_vec())];
    let mut chart = line_chart(&root, title, x_desc, y_desc, &series)?;

    chart.draw_series(AreaSeries::new(
        points.iter().copied(),
        0.0,
        &STEEL_BLUE.mix(0.3),
    ))?;
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        STEEL_BLUE.stroke_width(2),
    ))?;

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(first.0, average), (last.0, average)],
                RED.stroke_width(2),
            )))?
            .label(average_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    present(&root, path)
}

/// Category-by-category heatmap. Rows render top down in the given order.
#[allow(clippy::too_many_arguments)]
pub fn heatmap(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    x_labels: &[String],
    y_labels: &[String],
    values: &[Vec<f64>],
    annotate: bool,
    palette: HeatPalette,
    size: (u32, u32),
) -> Result<()> {
    let root = bitmap_root(path, size)?;
    let columns = x_labels.len().max(1) as f64;
    let rows = y_labels.len().max(1) as f64;

    let rotate_x = x_labels.iter().map(|label| label.len()).max().unwrap_or(0) > 4;
    let wide_y = y_labels.iter().map(|label| label.len()).max().unwrap_or(0) > 6;
    let mut builder = ChartBuilder::on(&root);
    builder
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(if rotate_x { 90 } else { 40 })
        .y_label_area_size(if wide_y { 220 } else { 60 });
    let mut chart =
        builder.build_cartesian_2d(-0.5..columns - 0.5, -0.5..rows - 0.5)?;

    let x_formatter = |x: &f64| tick_label(x_labels, *x);
    // Row 0 sits at the top, so y ticks read the flipped index.
    let y_formatter = |y: &f64| {
        let flipped = rows - 1.0 - *y;
        tick_label(y_labels, flipped)
    };

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(x_labels.len())
        .y_labels(y_labels.len())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter);
    if rotate_x {
        mesh.x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        );
    }
    mesh.draw()?;

    let peak = values
        .iter()
        .flat_map(|row| row.iter().copied())
        .fold(0.0_f64, f64::max);

    for (row_index, row) in values.iter().enumerate() {
        let y = rows - 1.0 - row_index as f64;
        chart.draw_series(row.iter().enumerate().map(|(column, value)| {
            let t = if peak > 0.0 { value / peak } else { 0.0 };
            Rectangle::new(
                [
                    (column as f64 - 0.5, y - 0.5),
                    (column as f64 + 0.5, y + 0.5),
                ],
                heatmap_palette(palette, t).filled(),
            )
        }))?;

        if annotate {
            let centered = TextStyle::from(("sans-serif", 11).into_font())
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(row.iter().enumerate().map(|(column, value)| {
                Text::new(format!("{value:.0}"), (column as f64, y), centered.clone())
            }))?;
        }
    }
    present(&root, path)
}

/// Attacks and deaths by month, side by side, each with its average marker.
pub fn monthly_panels(
    path: &Path,
    labels: &[String],
    attacks: &[f64],
    deaths: &[f64],
) -> Result<()> {
    let root = bitmap_root(path, (1400, 500))?;
    let panels = root.split_evenly((1, 2));
    let attack_mean = mean_of(attacks);
    let death_mean = mean_of(deaths);

    vertical_bars_on(
        &panels[0],
        &BarsSpec {
            title: "Terrorist Attacks by Month (All Years)",
            x_desc: "Month",
            y_desc: "Number of Attacks",
            labels,
            values: attacks,
            colors: &cool_warm(attacks.len()),
            mean_line: Some((
                attack_mean,
                format!("Average: {}", fmt_rounded(attack_mean)),
                RED,
            )),
            value_formatter: None,
        },
    )?;
    vertical_bars_on(
        &panels[1],
        &BarsSpec {
            title: "Terrorism Deaths by Month (All Years)",
            x_desc: "Month",
            y_desc: "Total Killed",
            labels,
            values: deaths,
            colors: &[DARK_RED],
            mean_line: Some((
                death_mean,
                format!("Average: {}", fmt_rounded(death_mean)),
                ORANGE,
            )),
            value_formatter: None,
        },
    )?;
    present(&root, path)
}

/// Seasonal attack share next to seasonal casualty counts.
pub fn seasonal_panels(
    path: &Path,
    seasons: &[String],
    shares_pct: &[f64],
    killed: &[f64],
    wounded: &[f64],
) -> Result<()> {
    let root = bitmap_root(path, (1200, 500))?;
    let panels = root.split_evenly((1, 2));

    vertical_bars_on(
        &panels[0],
        &BarsSpec {
            title: "Attack Distribution by Season",
            x_desc: "Season",
            y_desc: "Share of Attacks (%)",
            labels: seasons,
            values: shares_pct,
            colors: &SEASON_COLORS,
            mean_line: None,
            value_formatter: Some(percent_label),
        },
    )?;

    grouped_bars_on(
        &panels[1],
        "Casualties by Season",
        "Season",
        "Count",
        seasons,
        &[
            ("Killed".to_string(), killed.to_vec(), DARK_RED),
            ("Wounded".to_string(), wounded.to_vec(), ORANGE),
        ],
    )?;
    present(&root, path)
}

/// Average deadliness per region beside total casualties per region.
pub fn regional_deadliness_panels(
    path: &Path,
    averages: &[(String, f64)],
    totals: &[(String, f64, f64)],
) -> Result<()> {
    let root = bitmap_root(path, (1600, 600))?;
    let panels = root.split_evenly((1, 2));

    let colors = reds(averages.len());
    // Darkest shade belongs to the deadliest region at the top.
    let reversed: Vec<RGBColor> = colors.into_iter().rev().collect();
    let labels: Vec<String> = averages
        .iter()
        .map(|(_, value)| format!("{value:.1}"))
        .collect();
    let x_max = axis_max(averages.iter().map(|(_, value)| *value));
    ranked_barh_on(
        &panels[0],
        "Deadliness by Region (Avg Casualties per Attack)",
        "Average Casualties per Attack",
        averages,
        &reversed,
        x_max,
        &labels,
    )?;

    stacked_barh_on(
        &panels[1],
        "Total Casualties by Region",
        "Total Casualties",
        ("Killed", "Wounded"),
        totals,
    )?;
    present(&root, path)
}

/// Total casualties per year (stacked fills) above average lethality lines.
pub fn lethality_panels(
    path: &Path,
    years: &[f64],
    total_killed: &[f64],
    total_wounded: &[f64],
    avg_killed: &[f64],
    avg_wounded: &[f64],
) -> Result<()> {
    let root = bitmap_root(path, (1400, 1000))?;
    let panels = root.split_evenly((2, 1));

    let killed_points: Vec<(f64, f64)> = years.iter().copied().zip(total_killed.iter().copied()).collect();
    let combined: Vec<(f64, f64)> = years
        .iter()
        .zip(total_killed.iter().zip(total_wounded.iter()))
        .map(|(year, (killed, wounded))| (*year, killed + wounded))
        .collect();

    {
        let series = [("casualties".to_string(), combined.clone())];
        let mut chart = line_chart(
            &panels[0],
            "Total Terrorism Casualties Over Time",
            "Year",
            "Total Casualties",
            &series,
        )?;
        chart
            .draw_series(AreaSeries::new(
                killed_points.iter().copied(),
                0.0,
                &DARK_RED.mix(0.7),
            ))?
            .label("Killed")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], DARK_RED.filled()));

        let mut band: Vec<(f64, f64)> = combined.clone();
        band.extend(killed_points.iter().rev().copied());
        chart
            .draw_series(std::iter::once(Polygon::new(band, ORANGE.mix(0.7).filled())))?
            .label("Wounded")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], ORANGE.filled()));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    {
        let series = [
            (
                "Avg Killed per Attack".to_string(),
                years.iter().copied().zip(avg_killed.iter().copied()).collect::<Vec<_>>(),
            ),
            (
                "Avg Wounded per Attack".to_string(),
                years.iter().copied().zip(avg_wounded.iter().copied()).collect::<Vec<_>>(),
            ),
        ];
        let mut chart = line_chart(
            &panels[1],
            "Attack Lethality Trend Over Time",
            "Year",
            "Average per Attack",
            &series,
        )?;
        for (name, points, color) in [
            ("Avg Killed per Attack", &series[0].1, DARK_RED),
            ("Avg Wounded per Attack", &series[1].1, ORANGE),
        ] {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    present(&root, path)
}

fn bitmap_root<'a>(path: &'a Path, size: (u32, u32)) -> Result<Panel<'a>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create chart directory {}", parent.display()))?;
        }
    }
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    Ok(root)
}

fn present(root: &Panel<'_>, path: &Path) -> Result<()> {
    root.present()
        .with_context(|| format!("failed to write chart {}", path.display()))
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percent_label(value: f64) -> String {
    format!("{value:.1}%")
}

fn tick_label(labels: &[String], position: f64) -> String {
    let nearest = position.round();
    if (position - nearest).abs() > 0.3 || nearest < 0.0 {
        return String::new();
    }
    labels.get(nearest as usize).cloned().unwrap_or_default()
}

fn ranked_barh_on(
    area: &Panel<'_>,
    title: &str,
    x_desc: &str,
    items: &[(String, f64)],
    colors: &[RGBColor],
    x_max: f64,
    value_labels: &[String],
) -> Result<()> {
    let count = items.len().max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(0f64..x_max, 0f64..count)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc(x_desc)
        .draw()?;

    let rows: Vec<(usize, &(String, f64))> = items
        .iter()
        .enumerate()
        .map(|(rank, item)| (items.len() - 1 - rank, item))
        .collect();

    chart.draw_series(rows.iter().enumerate().map(|(rank, (row, (_, value)))| {
        let base = *row as f64;
        let color = colors.get(rank).copied().unwrap_or(DARK_RED);
        Rectangle::new([(0.0, base + 0.12), (*value, base + 0.88)], color.mix(0.85).filled())
    }))?;

    chart.draw_series(rows.iter().map(|(row, (name, _))| {
        Text::new(
            truncate_label(name, 48),
            (x_max * 0.01, *row as f64 + 0.5),
            label_style(13),
        )
    }))?;

    let end_style = label_style(12);
    let inside_style = TextStyle::from(("sans-serif", 12).into_font())
        .pos(Pos::new(HPos::Right, VPos::Center));
    chart.draw_series(rows.iter().enumerate().filter_map(|(rank, (row, (_, value)))| {
        let label = value_labels.get(rank)?.clone();
        let y = *row as f64 + 0.5;
        // Keep the tag inside the frame when the bar runs close to the edge.
        let element = if *value > x_max * 0.85 {
            Text::new(label, (*value - x_max * 0.01, y), inside_style.clone())
        } else {
            Text::new(label, (*value + x_max * 0.01, y), end_style.clone())
        };
        Some(element)
    }))?;
    Ok(())
}

fn stacked_barh_on(
    area: &Panel<'_>,
    title: &str,
    x_desc: &str,
    legend: (&str, &str),
    items: &[(String, f64, f64)],
) -> Result<()> {
    let count = items.len().max(1) as f64;
    let x_max = axis_max(items.iter().map(|(_, first, second)| first + second));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(0f64..x_max, 0f64..count)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc(x_desc)
        .draw()?;

    let rows: Vec<(usize, &(String, f64, f64))> = items
        .iter()
        .enumerate()
        .map(|(rank, item)| (items.len() - 1 - rank, item))
        .collect();

    chart
        .draw_series(rows.iter().map(|(row, (_, first, _))| {
            let base = *row as f64;
            Rectangle::new(
                [(0.0, base + 0.12), (*first, base + 0.88)],
                DARK_RED.mix(0.8).filled(),
            )
        }))?
        .label(legend.0)
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], DARK_RED.filled()));

    chart
        .draw_series(rows.iter().map(|(row, (_, first, second))| {
            let base = *row as f64;
            Rectangle::new(
                [(*first, base + 0.12), (first + second, base + 0.88)],
                ORANGE.mix(0.8).filled(),
            )
        }))?
        .label(legend.1)
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], ORANGE.filled()));

    chart.draw_series(rows.iter().map(|(row, (name, _, _))| {
        Text::new(
            truncate_label(name, 48),
            (x_max * 0.01, *row as f64 + 0.5),
            label_style(13),
        )
    }))?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn vertical_bars_on(area: &Panel<'_>, spec: &BarsSpec<'_>) -> Result<()> {
    let count = spec.labels.len().max(1) as f64;
    let mut y_max = axis_max(spec.values.iter().copied());
    if let Some((mean, _, _)) = &spec.mean_line {
        y_max = y_max.max(mean * 1.2);
    }

    let mut chart = category_chart(
        area,
        spec.title,
        spec.x_desc,
        spec.y_desc,
        spec.labels,
        count,
        y_max,
    )?;

    chart.draw_series(spec.values.iter().enumerate().map(|(slot, value)| {
        let color = spec
            .colors
            .get(slot % spec.colors.len().max(1))
            .copied()
            .unwrap_or(STEEL_BLUE);
        Rectangle::new(
            [(slot as f64 - 0.35, 0.0), (slot as f64 + 0.35, *value)],
            color.mix(0.85).filled(),
        )
    }))?;

    if let Some(formatter) = spec.value_formatter {
        let above = TextStyle::from(("sans-serif", 12).into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(spec.values.iter().enumerate().map(|(slot, value)| {
            Text::new(
                formatter(*value),
                (slot as f64, value + y_max * 0.01),
                above.clone(),
            )
        }))?;
    }

    if let Some((mean, label, color)) = &spec.mean_line {
        let color = *color;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, *mean), (count - 0.5, *mean)],
                color.stroke_width(2),
            )))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

fn grouped_bars_on(
    area: &Panel<'_>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    series: &[(String, Vec<f64>, RGBColor)],
) -> Result<()> {
    let count = labels.len().max(1) as f64;
    let y_max = axis_max(series.iter().flat_map(|(_, values, _)| values.iter().copied()));
    let mut chart = category_chart(area, title, x_desc, y_desc, labels, count, y_max)?;

    let group_width = 0.8 / series.len().max(1) as f64;
    for (series_index, (name, values, color)) in series.iter().enumerate() {
        let color = *color;
        let offset = -0.4 + series_index as f64 * group_width;
        chart
            .draw_series(values.iter().enumerate().map(|(slot, value)| {
                let x0 = slot as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + group_width * 0.9, *value)], color.filled())
            }))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

type XyChart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn category_chart<'a, 'b>(
    area: &'a Panel<'b>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    count: f64,
    y_max: f64,
) -> Result<XyChart<'a, 'b>> {
    let rotate = labels.iter().map(|label| label.len()).max().unwrap_or(0) > 8;

    let mut builder = ChartBuilder::on(area);
    builder
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(if rotate { 150 } else { 40 })
        .y_label_area_size(60);
    let mut chart = builder.build_cartesian_2d(-0.5..count - 0.5, 0f64..y_max)?;

    let formatter = |x: &f64| tick_label(labels, *x);
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(labels.len())
        .x_label_formatter(&formatter);
    if rotate {
        mesh.x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        );
    }
    mesh.draw()?;
    Ok(chart)
}

fn line_chart<'a, 'b>(
    area: &'a Panel<'b>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(f64, f64)>)],
) -> Result<XyChart<'a, 'b>> {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_max = 0.0_f64;
    for (_, points) in series {
        for (x, y) in points {
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            y_max = y_max.max(*y);
        }
    }
    if x_min > x_max {
        x_min = 0.0;
        x_max = 1.0;
    }
    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 0.5;
        x_max += 0.5;
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max * 1.08)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|x: &f64| format!("{x:.0}"))
        .draw()?;
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bitmap_root_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charts").join("blank.png");

        let root = bitmap_root(&path, (80, 60)).unwrap();
        present(&root, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reds_ramp_darkens() {
        let colors = reds(5);
        assert_eq!(colors.len(), 5);
        assert!(colors[0].1 > colors[4].1);
        assert_eq!(colors[4], RGBColor(103, 0, 13));
    }

    #[test]
    fn test_single_slot_ramp() {
        assert_eq!(reds(1).len(), 1);
        assert!(reds(0).is_empty());
    }

    #[test]
    fn test_red_yellow_green_endpoints() {
        let low = red_yellow_green(0.0);
        let high = red_yellow_green(1.0);
        assert!(low.0 > low.1);
        assert!(high.1 > high.0);
        assert_eq!(red_yellow_green(-2.0), red_yellow_green(0.0));
        assert_eq!(red_yellow_green(2.0), red_yellow_green(1.0));
    }

    #[test]
    fn test_axis_max_pads_and_guards_zero() {
        assert_eq!(axis_max([0.0, 0.0].into_iter()), 1.0);
        assert!(axis_max([50.0, 100.0].into_iter()) > 100.0);
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Taliban", 48), "Taliban");
        let long = "Islamic State of Iraq and the Levant (ISIL) plus padding padding";
        let short = truncate_label(long, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_tick_label_rejects_off_grid_positions() {
        let labels = vec!["Jan".to_string(), "Feb".to_string()];
        assert_eq!(tick_label(&labels, 0.0), "Jan");
        assert_eq!(tick_label(&labels, 1.1), "Feb");
        assert_eq!(tick_label(&labels, 0.5), "");
        assert_eq!(tick_label(&labels, -1.0), "");
        assert_eq!(tick_label(&labels, 5.0), "");
    }

    #[test]
    fn test_mean_of() {
        assert_eq!(mean_of(&[]), 0.0);
        assert_eq!(mean_of(&[2.0, 4.0]), 3.0);
    }
}
