//! Raw GTD spreadsheet headers and their canonical working names.
//!
//! The workbook ships with terse lowercase headers (`iyear`, `gname`,
//! `nkill`, ...). Everything downstream of the loader speaks the canonical
//! names instead, so the mapping lives in one place. If the upstream
//! codebook adds a column, extend [`RENAMES`] and [`ColumnIndex`] together.

use crate::error::DatasetError;

/// Raw header names as they appear in the workbook's first row.
pub mod raw {
    /// Four digit year the incident occurred.
    pub const IYEAR: &str = "iyear";
    /// Month 1-12, or 0 when unknown.
    pub const IMONTH: &str = "imonth";
    /// Day of month 1-31, or 0 when unknown.
    pub const IDAY: &str = "iday";
    /// Country name.
    pub const COUNTRY_TXT: &str = "country_txt";
    /// Province or state name.
    pub const PROVSTATE: &str = "provstate";
    /// World region name.
    pub const REGION_TXT: &str = "region_txt";
    /// City name.
    pub const CITY: &str = "city";
    /// Attack type label.
    pub const ATTACKTYPE1_TXT: &str = "attacktype1_txt";
    /// Specific target description.
    pub const TARGET1: &str = "target1";
    /// Target type category.
    pub const TARGTYPE1_TXT: &str = "targtype1_txt";
    /// Perpetrator group name, "Unknown" when unattributed.
    pub const GNAME: &str = "gname";
    /// Weapon type label.
    pub const WEAPTYPE1_TXT: &str = "weaptype1_txt";
    /// Confirmed fatalities.
    pub const NKILL: &str = "nkill";
    /// Confirmed injuries.
    pub const NWOUND: &str = "nwound";
    /// 1 if the attack succeeded, 0 otherwise.
    pub const SUCCESS: &str = "success";
    /// Incident narrative.
    pub const SUMMARY: &str = "summary";
    /// Stated motive, where recorded.
    pub const MOTIVE: &str = "motive";
}

/// Canonical column names used in reports and derived tables.
pub mod canonical {
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const DAY: &str = "Day";
    pub const COUNTRY: &str = "Country";
    pub const STATE: &str = "State";
    pub const REGION: &str = "Region";
    pub const CITY: &str = "City";
    pub const ATTACK_TYPE: &str = "AttackType";
    pub const TARGET: &str = "Target";
    pub const TARGET_TYPE: &str = "Target_type";
    pub const GROUP: &str = "Group";
    pub const WEAPON_TYPE: &str = "Weapon_type";
    pub const KILLED: &str = "Killed";
    pub const WOUNDED: &str = "Wounded";
    pub const SUCCESS: &str = "Success";
    pub const SUMMARY: &str = "Summary";
    pub const MOTIVE: &str = "Motive";
}

/// Raw-to-canonical rename pairs, in codebook order.
pub const RENAMES: &[(&str, &str)] = &[
    (raw::IYEAR, canonical::YEAR),
    (raw::IMONTH, canonical::MONTH),
    (raw::IDAY, canonical::DAY),
    (raw::COUNTRY_TXT, canonical::COUNTRY),
    (raw::PROVSTATE, canonical::STATE),
    (raw::REGION_TXT, canonical::REGION),
    (raw::CITY, canonical::CITY),
    (raw::ATTACKTYPE1_TXT, canonical::ATTACK_TYPE),
    (raw::TARGET1, canonical::TARGET),
    (raw::TARGTYPE1_TXT, canonical::TARGET_TYPE),
    (raw::GNAME, canonical::GROUP),
    (raw::WEAPTYPE1_TXT, canonical::WEAPON_TYPE),
    (raw::NKILL, canonical::KILLED),
    (raw::NWOUND, canonical::WOUNDED),
    (raw::SUCCESS, canonical::SUCCESS),
    (raw::SUMMARY, canonical::SUMMARY),
    (raw::MOTIVE, canonical::MOTIVE),
];

/// Resolved positions of the tracked columns within one workbook's header row.
///
/// Only the year, country and region columns are mandatory. Everything else
/// degrades to absent values so partial exports still load.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    pub year: usize,
    pub country: usize,
    pub region: usize,
    pub month: Option<usize>,
    pub day: Option<usize>,
    pub state: Option<usize>,
    pub city: Option<usize>,
    pub attack_type: Option<usize>,
    pub target: Option<usize>,
    pub target_type: Option<usize>,
    pub group: Option<usize>,
    pub weapon_type: Option<usize>,
    pub killed: Option<usize>,
    pub wounded: Option<usize>,
    pub success: Option<usize>,
    pub summary: Option<usize>,
    pub motive: Option<usize>,
}

impl ColumnIndex {
    /// Resolves column positions from the header row.
    pub fn resolve(headers: &[String]) -> Result<Self, DatasetError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let year = find(raw::IYEAR).ok_or(DatasetError::MissingColumn(raw::IYEAR))?;
        let country =
            find(raw::COUNTRY_TXT).ok_or(DatasetError::MissingColumn(raw::COUNTRY_TXT))?;
        let region = find(raw::REGION_TXT).ok_or(DatasetError::MissingColumn(raw::REGION_TXT))?;

        Ok(Self {
            year,
            country,
            region,
            month: find(raw::IMONTH),
            day: find(raw::IDAY),
            state: find(raw::PROVSTATE),
            city: find(raw::CITY),
            attack_type: find(raw::ATTACKTYPE1_TXT),
            target: find(raw::TARGET1),
            target_type: find(raw::TARGTYPE1_TXT),
            group: find(raw::GNAME),
            weapon_type: find(raw::WEAPTYPE1_TXT),
            killed: find(raw::NKILL),
            wounded: find(raw::NWOUND),
            success: find(raw::SUCCESS),
            summary: find(raw::SUMMARY),
            motive: find(raw::MOTIVE),
        })
    }

    /// Canonical names of the columns present in this workbook, in codebook order.
    pub fn canonical_columns(&self) -> Vec<&'static str> {
        RENAMES
            .iter()
            .filter(|(raw, _)| self.position_of(raw).is_some())
            .map(|(_, name)| *name)
            .collect()
    }

    fn position_of(&self, raw_header: &str) -> Option<usize> {
        match raw_header {
            raw::IYEAR => Some(self.year),
            raw::COUNTRY_TXT => Some(self.country),
            raw::REGION_TXT => Some(self.region),
            raw::IMONTH => self.month,
            raw::IDAY => self.day,
            raw::PROVSTATE => self.state,
            raw::CITY => self.city,
            raw::ATTACKTYPE1_TXT => self.attack_type,
            raw::TARGET1 => self.target,
            raw::TARGTYPE1_TXT => self.target_type,
            raw::GNAME => self.group,
            raw::WEAPTYPE1_TXT => self.weapon_type,
            raw::NKILL => self.killed,
            raw::NWOUND => self.wounded,
            raw::SUCCESS => self.success,
            raw::SUMMARY => self.summary,
            raw::MOTIVE => self.motive,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_headers() -> Vec<String> {
        RENAMES.iter().map(|(raw, _)| raw.to_string()).collect()
    }

    #[test]
    fn test_rename_pair_count() {
        assert_eq!(RENAMES.len(), 17);
    }

    #[test]
    fn test_resolve_full_header_row() {
        let index = ColumnIndex::resolve(&full_headers()).unwrap();
        assert_eq!(index.year, 0);
        assert_eq!(index.country, 3);
        assert_eq!(index.region, 5);
        assert_eq!(index.motive, Some(16));
    }

    #[test]
    fn test_resolve_requires_year_column() {
        let headers: Vec<String> = full_headers()
            .into_iter()
            .filter(|h| h != raw::IYEAR)
            .collect();
        let err = ColumnIndex::resolve(&headers).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("iyear")));
    }

    #[test]
    fn test_resolve_tolerates_missing_optional_columns() {
        let headers = vec![
            raw::IYEAR.to_string(),
            raw::COUNTRY_TXT.to_string(),
            raw::REGION_TXT.to_string(),
        ];
        let index = ColumnIndex::resolve(&headers).unwrap();
        assert!(index.group.is_none());
        assert!(index.killed.is_none());
        assert_eq!(index.canonical_columns(), vec!["Year", "Country", "Region"]);
    }

    #[test]
    fn test_resolve_ignores_case_and_padding() {
        let headers = vec![
            " IYEAR ".to_string(),
            "Country_TXT".to_string(),
            "region_txt".to_string(),
        ];
        assert!(ColumnIndex::resolve(&headers).is_ok());
    }

    #[test]
    fn test_canonical_columns_follow_codebook_order() {
        let index = ColumnIndex::resolve(&full_headers()).unwrap();
        let names: Vec<&str> = RENAMES.iter().map(|(_, canonical)| *canonical).collect();
        assert_eq!(index.canonical_columns(), names);
    }
}
