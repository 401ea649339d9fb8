//! Console report formatting.
//!
//! The analyses print their findings as plain ruled sections. These helpers
//! keep the rules, counters and aligned tables consistent across them.

/// A ruled section heading, preceded by a blank line.
pub fn banner(title: &str, width: usize) -> String {
    let rule = "=".repeat(width);
    format!("\n{rule}\n{title}\n{rule}")
}

/// A lightweight `--- title ---` sub-heading.
pub fn subhead(title: &str) -> String {
    format!("\n--- {title} ---")
}

/// Formats a count with thousands separators.
pub fn fmt_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, ch) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rounds to a whole number and formats with thousands separators.
pub fn fmt_rounded(value: f64) -> String {
    fmt_count(value.max(0.0).round() as u64)
}

/// Formats a 0..1 rate as a percentage with one decimal place.
pub fn fmt_pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Renders rows as an aligned table. The first column is left-aligned,
/// every other column right-aligned under its header.
pub fn aligned_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (column, cell) in row.iter().take(column_count).enumerate() {
            widths[column] = widths[column].max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let render = |cells: Vec<String>| -> String {
        let mut parts = Vec::with_capacity(column_count);
        for (column, cell) in cells.into_iter().enumerate() {
            if column == 0 {
                parts.push(format!("{cell:<width$}", width = widths[0]));
            } else {
                parts.push(format!("{cell:>width$}", width = widths[column]));
            }
        }
        parts.join("  ").trim_end().to_string()
    };

    lines.push(render(headers.iter().map(|h| h.to_string()).collect()));
    for row in rows {
        lines.push(render(row.clone()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_shape() {
        let rendered = banner("SEASONAL STATISTICS", 50);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "SEASONAL STATISTICS");
        assert_eq!(lines[3], "=".repeat(50));
    }

    #[test]
    fn test_subhead() {
        assert_eq!(subhead("Analysis for Kazakhstan"), "\n--- Analysis for Kazakhstan ---");
    }

    #[test]
    fn test_fmt_count_groups_digits() {
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(1_000), "1,000");
        assert_eq!(fmt_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_fmt_rounded() {
        assert_eq!(fmt_rounded(1999.6), "2,000");
        assert_eq!(fmt_rounded(-3.0), "0");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(0.6234), "62.3%");
        assert_eq!(fmt_pct(1.0), "100.0%");
    }

    #[test]
    fn test_aligned_table_alignment() {
        let rendered = aligned_table(
            &["Season", "Attacks", "Killed"],
            &[
                vec!["Winter".to_string(), "12".to_string(), "30".to_string()],
                vec!["Spring".to_string(), "1,204".to_string(), "7".to_string()],
            ],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Season  Attacks  Killed");
        assert_eq!(lines[1], "Winter       12      30");
        assert_eq!(lines[2], "Spring    1,204       7");
    }
}
