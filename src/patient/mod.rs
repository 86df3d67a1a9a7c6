use crate::error::BPCResult;
use crate::filters::{FilterKind, FilterSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use log::debug;

/// A single blood pressure measurement. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_percentile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d_percentile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    pub start_unix_time: f64,
    pub end_unix_time: f64,
    #[serde(default)]
    pub data: Vec<PatientRecord>,
}

impl Patient {
    pub fn from_file<P: AsRef<Path>>(path: P) -> BPCResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let patient: Patient = serde_json::from_str(&content)?;
        Ok(patient)
    }

    /// Returns a new patient holding only the records the predicate accepts.
    /// The first predicate error aborts the pass.
    pub fn apply_filter<F>(&self, predicate: F) -> BPCResult<Patient>
    where
        F: Fn(&PatientRecord) -> BPCResult<bool>,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for record in &self.data {
            if predicate(record)? {
                data.push(record.clone());
            }
        }

        Ok(Patient {
            name: self.name.clone(),
            birth_date: self.birth_date.clone(),
            start_unix_time: self.start_unix_time,
            end_unix_time: self.end_unix_time,
            data,
        })
    }

    /// Narrows the records through each filter of the chain in order
    pub fn apply_filters(
        &self,
        chain: &[FilterKind],
        settings: &FilterSettings,
        adult_age: f64,
    ) -> BPCResult<Patient> {
        chain.iter().try_fold(self.clone(), |patient, kind| {
            let filtered = patient.apply_filter(|record| kind.matches(record, settings, adult_age))?;
            debug!("Filter {:?} kept {}/{} records", kind, filtered.data.len(), patient.data.len());
            Ok(filtered)
        })
    }
}
