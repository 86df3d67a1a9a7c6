use crate::chart::ChartRenderer;
use crate::config::Zone;
use crate::dates::{get_age, to_iso_date, years_apart};
use crate::error::BPCResult;
use crate::patient::{Patient, PatientRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs::File;
use log::info;

/// Renders the chart views as files in an output directory
pub struct ReportRenderer {
    output_dir: PathBuf,
    label: Option<String>,
}

#[derive(Serialize)]
struct LongView<'a> {
    name: &'a str,
    zones: &'a [Zone],
    data: &'a [PatientRecord],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub name: String,
    pub total_records: usize,
    pub filtered_records: usize,
    pub span_years: f64,
    pub age_at_end: Option<i32>,
    pub date_range: Option<String>,
}

impl PatientSummary {
    pub fn new(original: &Patient, filtered: &Patient, date_range: Option<&str>) -> BPCResult<Self> {
        let span_years = years_apart(original.end_unix_time, original.start_unix_time)?;
        let age_at_end = match &original.birth_date {
            Some(birth_date) => Some(get_age(original.end_unix_time, birth_date)?),
            None => None,
        };

        Ok(Self {
            name: original.name.clone(),
            total_records: original.data.len(),
            filtered_records: filtered.data.len(),
            span_years,
            age_at_end,
            date_range: date_range.map(str::to_string),
        })
    }
}

impl ReportRenderer {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            label: None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn save_summary(&self, summary: &PatientSummary) -> BPCResult<()> {
        let file = File::create(self.output_dir.join("summary.json"))?;
        serde_json::to_writer_pretty(file, summary)?;
        Ok(())
    }
}

impl ChartRenderer for ReportRenderer {
    fn redraw_view_long(&mut self, patient: &Patient, zones: &[Zone]) -> BPCResult<()> {
        let path = self.output_dir.join("long_view.json");
        let view = LongView {
            name: &patient.name,
            zones,
            data: &patient.data,
        };

        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, &view)?;
        info!("Long view written to {:?}", path);
        Ok(())
    }

    fn redraw_view_table(&mut self, patient: &Patient) -> BPCResult<()> {
        let path = self.output_dir.join("table.csv");
        save_table(&patient.data, &path)?;
        info!("Table view written to {:?}", path);
        Ok(())
    }

    fn set_time_range_label(&mut self, text: &str) -> BPCResult<()> {
        info!("Time range: {}", text);
        self.label = Some(text.to_string());
        Ok(())
    }
}

fn save_table<P: AsRef<Path>>(records: &[PatientRecord], path: P) -> BPCResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "DATE", "AGE", "SYSTOLIC", "DIASTOLIC", "S_PERCENTILE", "D_PERCENTILE",
        "HEIGHT", "SITE", "POSITION", "METHOD", "ENCOUNTER",
    ])?;

    for record in records {
        let date = match record.unix_time {
            Some(ms) => to_iso_date(ms)?,
            None => String::new(),
        };

        writer.write_record(&[
            date,
            number(record.age),
            number(record.systolic),
            number(record.diastolic),
            number(record.s_percentile),
            number(record.d_percentile),
            number(record.height),
            text(&record.site),
            text(&record.position),
            text(&record.method),
            text(&record.encounter),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}
