use serde::{Deserialize, Serialize};
use std::path::Path;
use std::collections::HashMap;
use crate::error::{BPCError, BPCResult};
use crate::filters::{FilterKind, CHECKBOXES, DEFAULT_CHAIN};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default = "default_adult_age")]
    pub adult_age: f64,
    /// Checkbox id -> checked
    #[serde(default)]
    pub checkboxes: HashMap<String, bool>,
    #[serde(default)]
    pub slider: SliderRange,
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Overrides the default filter chain when present
    #[serde(default)]
    pub chain: Option<Vec<FilterKind>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    pub date_format: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            date_format: "MMM d, yyyy".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SliderRange {
    pub from: f64,
    pub to: f64,
}

impl Default for SliderRange {
    fn default() -> Self {
        Self { from: 0.0, to: 100.0 }
    }
}

/// Percentile band drawn behind the long view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub label: String,
    pub percentile: f64,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_adult_age() -> f64 {
    18.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view: ViewSettings::default(),
            adult_age: default_adult_age(),
            checkboxes: CHECKBOXES
                .iter()
                .map(|(id, _, _)| (id.to_string(), true))
                .collect(),
            slider: SliderRange::default(),
            zones: Vec::new(),
            chain: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> BPCResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BPCResult<()> {
        if self.view.date_format.trim().is_empty() {
            return Err(BPCError::InvalidConfig(
                "Display date format must not be empty".to_string()
            ));
        }

        if !(self.adult_age > 0.0) {
            return Err(BPCError::InvalidConfig(
                "Adult age must be positive".to_string()
            ));
        }

        validate_slider(self.slider.from, self.slider.to)?;

        for id in self.checkboxes.keys() {
            if !CHECKBOXES.iter().any(|(known, _, _)| *known == id.as_str()) {
                return Err(BPCError::InvalidConfig(
                    format!("Unknown checkbox: {}", id)
                ));
            }
        }

        for zone in &self.zones {
            if !(0.0..=100.0).contains(&zone.percentile) {
                return Err(BPCError::InvalidConfig(
                    format!("Zone {} percentile must be within 0-100", zone.label)
                ));
            }
        }

        Ok(())
    }

    pub fn filter_chain(&self) -> Vec<FilterKind> {
        self.chain.clone().unwrap_or_else(|| DEFAULT_CHAIN.to_vec())
    }
}

/// Slider positions must lie in [0,100] with `from` not past `to`
pub fn validate_slider(from: f64, to: f64) -> BPCResult<()> {
    for value in [from, to] {
        if !(0.0..=100.0).contains(&value) {
            return Err(BPCError::Validation(
                format!("Slider value {} must be within 0-100", value)
            ));
        }
    }

    if from > to {
        return Err(BPCError::Validation(
            format!("Slider start {} is after slider end {}", from, to)
        ));
    }

    Ok(())
}
