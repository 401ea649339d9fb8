//! Data models for incident analytics.
//!
//! This module contains the core data structures shared by every
//! analysis: the per-row incident record and the values derived
//! from it (casualties, seasons, decades).

use std::fmt;

/// Group name recorded for unattributed incidents.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// A single terrorism incident, one spreadsheet row.
///
/// Optional fields are absent when the source cell was empty. Numeric
/// counts keep their absence distinct from zero so that rate calculations
/// can exclude unrecorded rows while sums treat them as zero.
#[derive(Debug, Clone, Default)]
pub struct Incident {
    /// Year the incident occurred.
    pub year: i32,
    /// Month of the incident (0 = unknown).
    pub month: u32,
    /// Day of the month (0 = unknown).
    pub day: u32,
    /// Country where the incident occurred.
    pub country: Option<String>,
    /// Province or state.
    pub state: Option<String>,
    /// World region.
    pub region: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Primary attack type.
    pub attack_type: Option<String>,
    /// Specific target description.
    pub target: Option<String>,
    /// Target type category.
    pub target_type: Option<String>,
    /// Perpetrator group name (`"Unknown"` when unattributed).
    pub group: String,
    /// Primary weapon type.
    pub weapon_type: Option<String>,
    /// Number of people killed.
    pub killed: Option<f64>,
    /// Number of people wounded.
    pub wounded: Option<f64>,
    /// Whether the attack succeeded.
    pub success: Option<bool>,
    /// Free-text incident summary.
    pub summary: Option<String>,
    /// Recorded motive.
    pub motive: Option<String>,
}

impl Incident {
    /// Killed count with absence treated as zero.
    pub fn killed_or_zero(&self) -> f64 {
        self.killed.unwrap_or(0.0)
    }

    /// Wounded count with absence treated as zero.
    pub fn wounded_or_zero(&self) -> f64 {
        self.wounded.unwrap_or(0.0)
    }

    /// Killed plus wounded, absences counted as zero.
    pub fn casualties(&self) -> f64 {
        self.killed_or_zero() + self.wounded_or_zero()
    }

    /// True when the incident is attributed to a named group.
    pub fn has_known_group(&self) -> bool {
        self.group != UNKNOWN_GROUP
    }

    /// Season derived from the month. `None` when the month is unknown.
    pub fn season(&self) -> Option<Season> {
        Season::from_month(self.month)
    }

    /// Start year of the incident's decade (1993 becomes 1990).
    pub fn decade(&self) -> i32 {
        (self.year / 10) * 10
    }
}

/// Meteorological season of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// All seasons in reporting order.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Maps a month number to its season. Month 0 (unknown) has none;
    /// any other out-of-range value falls into Autumn like the 9-11 range.
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            0 => None,
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            _ => Some(Season::Autumn),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Winter => write!(f, "Winter"),
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Autumn => write!(f, "Autumn"),
        }
    }
}

/// Formats a decade start year as a label (1990 becomes "1990s").
pub fn decade_label(decade: i32) -> String {
    format!("{}s", decade)
}

/// Three-letter month names indexed by month number minus one.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
