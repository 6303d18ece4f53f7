//! Form validation for farm records
//!
//! Validation never fails hard: each check returns the list of field errors
//! so a form can show them next to the offending inputs.

use serde::{Deserialize, Serialize};

use crate::entities::{CropForm, Customer, Reservoir, Supplier, Warehouse, Worker};
use crate::risk::tables::is_category;

pub const CROP_FORM_STEPS: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

fn require(errors: &mut Vec<FieldError>, value: &str, field: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn is_other(value: &str) -> bool {
    is_category(value, "otro") || is_category(value, "other")
}

/// Validate steps `1..=step` of the crop form. Steps past the last are
/// treated as the last; step 0 checks nothing.
pub fn validate_crop_form(form: &CropForm, step: u8) -> Vec<FieldError> {
    let step = step.min(CROP_FORM_STEPS);
    let mut errors = Vec::new();

    if step >= 1 {
        require(&mut errors, &form.name, "name", "crop name is required");
        require(&mut errors, &form.crop_type, "crop_type", "crop type is required");
        require(&mut errors, &form.variety, "variety", "variety is required");
        if form.planting_date.is_none() {
            errors.push(FieldError::new("planting_date", "planting date is required"));
        }
        match (form.planting_date, form.expected_harvest_date) {
            (_, None) => errors.push(FieldError::new(
                "expected_harvest_date",
                "expected harvest date is required",
            )),
            (Some(planted), Some(harvest)) if harvest <= planted => {
                errors.push(FieldError::new(
                    "expected_harvest_date",
                    "harvest date must be after the planting date",
                ));
            }
            _ => {}
        }
        if !(form.area_ha > 0.0) {
            errors.push(FieldError::new("area_ha", "area must be greater than 0"));
        }
    }

    if step >= 2 {
        require(
            &mut errors,
            &form.irrigation_method,
            "irrigation_method",
            "irrigation method is required",
        );
        if is_other(&form.irrigation_method) {
            require(
                &mut errors,
                &form.irrigation_other,
                "irrigation_other",
                "describe the irrigation method",
            );
        }
        require(
            &mut errors,
            &form.irrigation_frequency,
            "irrigation_frequency",
            "irrigation frequency is required",
        );
        require(
            &mut errors,
            &form.irrigation_time,
            "irrigation_time",
            "irrigation time is required",
        );
        if form.irrigation_times_per_week < 1 {
            errors.push(FieldError::new(
                "irrigation_times_per_week",
                "irrigate at least once per week",
            ));
        }
    }

    if step >= 3 {
        require(
            &mut errors,
            &form.fertilizer_type,
            "fertilizer_type",
            "fertilizer type is required",
        );
        require(
            &mut errors,
            &form.fertilizer_brand,
            "fertilizer_brand",
            "fertilizer brand is required",
        );
        require(
            &mut errors,
            &form.fertilizer_frequency,
            "fertilizer_frequency",
            "fertilizer frequency is required",
        );
    }

    if step >= 4 {
        require(
            &mut errors,
            &form.plot_location,
            "plot_location",
            "plot location is required",
        );
        if is_other(&form.plot_location) {
            require(
                &mut errors,
                &form.plot_location_other,
                "plot_location_other",
                "describe the plot location",
            );
        }
        require(&mut errors, &form.sun_exposure, "sun_exposure", "sun exposure is required");
        require(&mut errors, &form.water_source, "water_source", "water source is required");
        require(&mut errors, &form.soil_type, "soil_type", "soil type is required");
    }

    errors
}

/// Required-field checks for records that are saved in one go.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

impl Validate for CropForm {
    fn validate(&self) -> Vec<FieldError> {
        validate_crop_form(self, CROP_FORM_STEPS)
    }
}

impl Validate for Supplier {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, &self.name, "name", "supplier name is required");
        if self.reliability > 5 {
            errors.push(FieldError::new("reliability", "reliability is rated 1 to 5"));
        }
        errors
    }
}

impl Validate for Customer {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, &self.name, "name", "customer name is required");
        if self.purchases.iter().any(|line| line.quantity_kg < 0.0) {
            errors.push(FieldError::new(
                "purchases",
                "purchase quantities cannot be negative",
            ));
        }
        errors
    }
}

impl Validate for Worker {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, &self.first_name, "first_name", "first name is required");
        require(&mut errors, &self.last_names, "last_names", "last names are required");
        errors
    }
}

impl Validate for Warehouse {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, &self.name, "name", "warehouse name is required");
        if self.total_capacity < 0.0 {
            errors.push(FieldError::new(
                "total_capacity",
                "capacity cannot be negative",
            ));
        }
        if self.used_capacity > self.total_capacity {
            errors.push(FieldError::new(
                "used_capacity",
                "used capacity cannot exceed total capacity",
            ));
        }
        errors
    }
}

impl Validate for Reservoir {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, &self.name, "name", "reservoir name is required");
        if !(0.0..=100.0).contains(&self.current_level_pct) {
            errors.push(FieldError::new(
                "current_level_pct",
                "level must be between 0 and 100 percent",
            ));
        }
        errors
    }
}

/// Step cursor for the four-step crop form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormWizard {
    step: u8,
}

impl Default for FormWizard {
    fn default() -> Self {
        Self { step: 1 }
    }
}

impl FormWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_last(&self) -> bool {
        self.step == CROP_FORM_STEPS
    }

    /// Advance when every step up to the current one validates. On the last
    /// step the cursor stays put.
    pub fn next(&mut self, form: &CropForm) -> Result<u8, Vec<FieldError>> {
        let errors = validate_crop_form(form, self.step);
        if !errors.is_empty() {
            return Err(errors);
        }
        if self.step < CROP_FORM_STEPS {
            self.step += 1;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> u8 {
        if self.step > 1 {
            self.step -= 1;
        }
        self.step
    }
}
