use crate::config::{validate_slider, Config, ViewSettings, Zone};
use crate::dates::{format_date, parse_date, scale, ISO_DATE_FORMAT};
use crate::error::BPCResult;
use crate::filters::{CheckboxSource, FilterKind, FilterSettings};
use crate::patient::Patient;
use log::{debug, info};

/// Drawing side of the chart page
pub trait ChartRenderer {
    fn redraw_view_long(&mut self, patient: &Patient, zones: &[Zone]) -> BPCResult<()>;
    fn redraw_view_table(&mut self, patient: &Patient) -> BPCResult<()>;
    fn set_time_range_label(&mut self, text: &str) -> BPCResult<()>;
}

/// State of one chart page: the loaded patient and the active filters
pub struct ChartState {
    pub patient: Patient,
    pub zones: Vec<Zone>,
    pub view: ViewSettings,
    pub filter_settings: FilterSettings,
    pub adult_age: f64,
    pub chain: Vec<FilterKind>,
}

impl ChartState {
    pub fn new(patient: Patient, config: &Config) -> Self {
        Self {
            patient,
            zones: config.zones.clone(),
            view: config.view.clone(),
            filter_settings: FilterSettings::default(),
            adult_age: config.adult_age,
            chain: config.filter_chain(),
        }
    }

    /// Handler for the toggle filter checkboxes
    pub fn update_filters<C, R>(&mut self, checkboxes: &C, renderer: &mut R) -> BPCResult<()>
    where
        C: CheckboxSource + ?Sized,
        R: ChartRenderer + ?Sized,
    {
        self.filter_settings.load(checkboxes);
        self.redraw(renderer)
    }

    /// Handler for the date range slider
    pub fn update_date_range<R>(&mut self, value_from: f64, value_to: f64, renderer: &mut R) -> BPCResult<()>
    where
        R: ChartRenderer + ?Sized,
    {
        self.set_date_range(value_from, value_to, renderer)?;
        self.redraw(renderer)
    }

    /// Maps the slider positions onto the patient's time span, stores the
    /// resulting dates in the filter settings and updates the slider label.
    /// Returns the label text.
    pub fn set_date_range<R>(&mut self, value_from: f64, value_to: f64, renderer: &mut R) -> BPCResult<String>
    where
        R: ChartRenderer + ?Sized,
    {
        validate_slider(value_from, value_to)?;

        let start_time = self.patient.start_unix_time;
        let end_time = self.patient.end_unix_time;

        let from_time = parse_date(scale(value_from, 0.0, 100.0, start_time, end_time))?;
        let to_time = parse_date(scale(value_to, 0.0, 100.0, start_time, end_time))?;

        self.filter_settings.date_from = Some(format_date(&from_time, ISO_DATE_FORMAT));
        self.filter_settings.date_to = Some(format_date(&to_time, ISO_DATE_FORMAT));

        let label = format!(
            "{} - {}",
            format_date(&from_time, &self.view.date_format),
            format_date(&to_time, &self.view.date_format)
        );
        debug!(
            "Date range {:?} - {:?}",
            self.filter_settings.date_from, self.filter_settings.date_to
        );

        renderer.set_time_range_label(&label)?;
        Ok(label)
    }

    pub fn filtered_patient(&self) -> BPCResult<Patient> {
        self.patient.apply_filters(&self.chain, &self.filter_settings, self.adult_age)
    }

    fn redraw<R: ChartRenderer + ?Sized>(&self, renderer: &mut R) -> BPCResult<()> {
        let filtered = self.filtered_patient()?;
        info!("{}/{} records pass the active filters", filtered.data.len(), self.patient.data.len());

        renderer.redraw_view_long(&filtered, &self.zones)?;
        renderer.redraw_view_table(&filtered)
    }
}
