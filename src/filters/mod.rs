use crate::dates::to_iso_date;
use crate::error::{BPCError, BPCResult};
use crate::patient::PatientRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use log::debug;

/// The toggle filter a checkbox contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    Encounter,
    Site,
    Position,
    Method,
}

/// Checkbox id, the category it controls and the value it enables
pub const CHECKBOXES: [(&str, FilterCategory, &str); 8] = [
    ("chkFilterInpatient", FilterCategory::Encounter, "Inpatient"),
    ("chkFilterAmbulatory", FilterCategory::Encounter, "Ambulatory"),
    ("chkFilterArm", FilterCategory::Site, "Arm"),
    ("chkFilterLeg", FilterCategory::Site, "Leg"),
    ("chkFilterSitting", FilterCategory::Position, "Sitting"),
    ("chkFilterStanding", FilterCategory::Position, "Standing"),
    ("chkFilterAuscultation", FilterCategory::Method, "Auscultation"),
    ("chkFilterMachine", FilterCategory::Method, "Machine"),
];

/// Filters applied by `Patient::apply_filters` unless configured otherwise.
/// Encounter and pediatric filters are deliberately left out.
pub const DEFAULT_CHAIN: [FilterKind; 4] = [
    FilterKind::Site,
    FilterKind::Position,
    FilterKind::Date,
    FilterKind::Method,
];

/// Source of checkbox states. Unknown ids read as unchecked.
pub trait CheckboxSource {
    fn is_checked(&self, id: &str) -> bool;
}

impl CheckboxSource for HashMap<String, bool> {
    fn is_checked(&self, id: &str) -> bool {
        self.get(id).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub encounter: BTreeSet<String>,
    pub site: BTreeSet<String>,
    pub position: BTreeSet<String>,
    pub method: BTreeSet<String>,
    /// Inclusive lower bound, `yyyy-MM-dd`; unset until a date range is chosen
    pub date_from: Option<String>,
    /// Inclusive upper bound, `yyyy-MM-dd`
    pub date_to: Option<String>,
}

impl FilterSettings {
    /// Rebuilds the toggle filters from scratch out of the checkbox states
    pub fn load<C: CheckboxSource + ?Sized>(&mut self, checkboxes: &C) {
        self.encounter.clear();
        self.site.clear();
        self.position.clear();
        self.method.clear();

        for (id, category, value) in CHECKBOXES {
            if !checkboxes.is_checked(id) {
                continue;
            }

            let target = match category {
                FilterCategory::Encounter => &mut self.encounter,
                FilterCategory::Site => &mut self.site,
                FilterCategory::Position => &mut self.position,
                FilterCategory::Method => &mut self.method,
            };
            target.insert(value.to_string());
        }

        debug!(
            "Loaded filter settings: encounter={:?} site={:?} position={:?} method={:?}",
            self.encounter, self.site, self.position, self.method
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Encounter,
    Site,
    Position,
    Method,
    Valid,
    Pediatric,
    Date,
}

impl FilterKind {
    pub fn matches(&self, record: &PatientRecord, settings: &FilterSettings, adult_age: f64) -> BPCResult<bool> {
        let keep = match self {
            FilterKind::Encounter => filter_encounter(record, settings),
            FilterKind::Site => filter_site(record, settings),
            FilterKind::Position => filter_position(record, settings),
            FilterKind::Method => filter_method(record, settings),
            FilterKind::Valid => filter_valid(record),
            FilterKind::Pediatric => filter_pediatric(record, adult_age),
            FilterKind::Date => filter_date(record, settings)?,
        };
        Ok(keep)
    }
}

// Missing values fall through the toggle filters
fn absent_or_member(value: Option<&str>, values: &BTreeSet<String>) -> bool {
    match value {
        None | Some("") => true,
        Some(v) => values.contains(v),
    }
}

pub fn filter_encounter(record: &PatientRecord, settings: &FilterSettings) -> bool {
    absent_or_member(record.encounter.as_deref(), &settings.encounter)
}

/// Sites are matched loosely on "arm" / "leg"; anything else is rejected
pub fn filter_site(record: &PatientRecord, settings: &FilterSettings) -> bool {
    let site = match record.site.as_deref() {
        None | Some("") => return true,
        Some(site) => site.to_lowercase(),
    };

    if site.contains("arm") {
        settings.site.contains("Arm")
    } else if site.contains("leg") {
        settings.site.contains("Leg")
    } else {
        false
    }
}

pub fn filter_position(record: &PatientRecord, settings: &FilterSettings) -> bool {
    absent_or_member(record.position.as_deref(), &settings.position)
}

pub fn filter_method(record: &PatientRecord, settings: &FilterSettings) -> bool {
    absent_or_member(record.method.as_deref(), &settings.method)
}

/// Both percentiles must be present and non-zero
pub fn filter_valid(record: &PatientRecord) -> bool {
    let truthy = |v: Option<f64>| matches!(v, Some(p) if p != 0.0 && !p.is_nan());
    truthy(record.s_percentile) && truthy(record.d_percentile)
}

/// A missing age never counts as pediatric, but an age of zero does
pub fn filter_pediatric(record: &PatientRecord, adult_age: f64) -> bool {
    matches!(record.age, Some(age) if age < adult_age)
}

/// Inclusive `[date_from, date_to]` check on the record's calendar date
pub fn filter_date(record: &PatientRecord, settings: &FilterSettings) -> BPCResult<bool> {
    let unix_time = record.unix_time.ok_or(BPCError::MissingField("unixTime"))?;
    let date = to_iso_date(unix_time)?;

    // ISO dates order lexicographically in calendar order
    let keep = match (&settings.date_from, &settings.date_to) {
        (Some(from), Some(to)) => from.as_str() <= date.as_str() && date.as_str() <= to.as_str(),
        _ => false,
    };
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_record(site: &str) -> PatientRecord {
        PatientRecord {
            site: Some(site.to_string()),
            ..Default::default()
        }
    }

    fn with_sites(sites: &[&str]) -> FilterSettings {
        FilterSettings {
            site: sites.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn checkboxes(ids: &[&str]) -> HashMap<String, bool> {
        ids.iter().map(|id| (id.to_string(), true)).collect()
    }

    #[test]
    fn test_load_filter_settings() {
        let mut settings = FilterSettings::default();
        let mut states = checkboxes(&["chkFilterInpatient", "chkFilterArm", "chkFilterLeg", "chkFilterMachine"]);
        states.insert("chkFilterSitting".to_string(), false);

        settings.load(&states);

        assert_eq!(settings.encounter, BTreeSet::from(["Inpatient".to_string()]));
        assert_eq!(settings.site, BTreeSet::from(["Arm".to_string(), "Leg".to_string()]));
        assert!(settings.position.is_empty());
        assert_eq!(settings.method, BTreeSet::from(["Machine".to_string()]));
    }

    #[test]
    fn test_load_filter_settings_replaces_previous_state() {
        let mut settings = FilterSettings::default();
        settings.load(&checkboxes(&["chkFilterArm", "chkFilterStanding"]));
        settings.date_from = Some("2011-01-01".to_string());

        settings.load(&checkboxes(&["chkFilterLeg"]));

        assert_eq!(settings.site, BTreeSet::from(["Leg".to_string()]));
        assert!(settings.position.is_empty());
        // Date bounds belong to the slider and survive a checkbox reload
        assert_eq!(settings.date_from.as_deref(), Some("2011-01-01"));
    }

    #[test]
    fn test_filter_site_absent_passes() {
        assert!(filter_site(&PatientRecord::default(), &with_sites(&[])));
    }

    #[test]
    fn test_filter_site_case_insensitive() {
        let record = site_record("Left Arm");
        assert!(filter_site(&record, &with_sites(&["Arm"])));
        assert!(!filter_site(&record, &with_sites(&["Leg"])));
        assert!(filter_site(&site_record("RIGHT ARM"), &with_sites(&["Arm"])));
        assert!(filter_site(&site_record("left leg"), &with_sites(&["Leg"])));
    }

    #[test]
    fn test_filter_site_rejects_unrecognized() {
        let record = site_record("Torso");
        assert!(!filter_site(&record, &with_sites(&[])));
        assert!(!filter_site(&record, &with_sites(&["Arm", "Leg"])));
    }

    #[test]
    fn test_toggle_filters_absent_passes() {
        let settings = FilterSettings::default();
        let record = PatientRecord::default();
        assert!(filter_encounter(&record, &settings));
        assert!(filter_position(&record, &settings));
        assert!(filter_method(&record, &settings));
    }

    #[test]
    fn test_toggle_filters_membership() {
        let mut settings = FilterSettings::default();
        settings.load(&checkboxes(&["chkFilterAmbulatory", "chkFilterStanding", "chkFilterAuscultation"]));

        let record = PatientRecord {
            encounter: Some("Ambulatory".to_string()),
            position: Some("Standing".to_string()),
            method: Some("Machine".to_string()),
            ..Default::default()
        };

        assert!(filter_encounter(&record, &settings));
        assert!(filter_position(&record, &settings));
        assert!(!filter_method(&record, &settings));
    }

    #[test]
    fn test_filter_valid() {
        let mut record = PatientRecord {
            s_percentile: Some(50.0),
            d_percentile: Some(40.0),
            ..Default::default()
        };
        assert!(filter_valid(&record));

        record.d_percentile = Some(0.0);
        assert!(!filter_valid(&record));

        record.d_percentile = None;
        assert!(!filter_valid(&record));
    }

    #[test]
    fn test_filter_pediatric() {
        let record = |age: Option<f64>| PatientRecord { age, ..Default::default() };
        assert!(filter_pediatric(&record(Some(0.0)), 18.0));
        assert!(filter_pediatric(&record(Some(17.9)), 18.0));
        assert!(!filter_pediatric(&record(Some(18.0)), 18.0));
        assert!(!filter_pediatric(&record(None), 18.0));
    }

    #[test]
    fn test_filter_date_inclusive_bounds() {
        let settings = FilterSettings {
            date_from: Some("2011-06-27".to_string()),
            date_to: Some("2012-01-01".to_string()),
            ..Default::default()
        };
        let at = |ms: f64| PatientRecord { unix_time: Some(ms), ..Default::default() };

        // 2011-06-27T15:45:09Z
        assert!(filter_date(&at(1309189509000.0), &settings).unwrap());
        // 2012-01-01T00:00:00Z
        assert!(filter_date(&at(1325376000000.0), &settings).unwrap());
        // 2012-12-31T00:00:00Z
        assert!(!filter_date(&at(1356912000000.0), &settings).unwrap());
    }

    #[test]
    fn test_filter_date_unset_range_rejects() {
        let record = PatientRecord { unix_time: Some(0.0), ..Default::default() };
        assert!(!filter_date(&record, &FilterSettings::default()).unwrap());
    }

    #[test]
    fn test_filter_date_missing_time_is_an_error() {
        let result = filter_date(&PatientRecord::default(), &FilterSettings::default());
        assert!(matches!(result, Err(BPCError::MissingField("unixTime"))));
    }

    #[test]
    fn test_default_chain_excludes_encounter_and_pediatric() {
        assert_eq!(DEFAULT_CHAIN, [FilterKind::Site, FilterKind::Position, FilterKind::Date, FilterKind::Method]);
        assert!(!DEFAULT_CHAIN.contains(&FilterKind::Encounter));
        assert!(!DEFAULT_CHAIN.contains(&FilterKind::Pediatric));
    }

    #[test]
    fn test_filter_kind_deserialize() {
        let chain: Vec<FilterKind> = serde_json::from_str(r#"["site", "encounter", "pediatric"]"#).unwrap();
        assert_eq!(chain, vec![FilterKind::Site, FilterKind::Encounter, FilterKind::Pediatric]);
    }
}
