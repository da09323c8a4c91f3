//! Field validation for request bodies.
//!
//! Every form collects its errors per field into [`FormErrors`] rather than
//! stopping at the first one, so a client can show them all at once.

use std::collections::BTreeMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::*;
use crate::store::{CareStore, StoreError};

pub const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const MIN_PASSWORD_LEN: usize = 8;
const NAME_MAX_LEN: usize = 30;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }

    fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            if !EMAIL_RE.is_match(value.trim()) {
                self.add(field, INVALID_EMAIL);
            }
        }
    }

    fn range<T>(&mut self, field: &str, value: Option<T>, min: T, max: T)
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if let Some(v) = value {
            if v < min {
                self.add(
                    field,
                    format!("Ensure this value is greater than or equal to {min}."),
                );
            } else if v > max {
                self.add(
                    field,
                    format!("Ensure this value is less than or equal to {max}."),
                );
            }
        }
    }
}

/// Field checks for a request body. Checks that need other rows (a referenced
/// medication or user) read them from the store.
pub trait Clean {
    fn clean(&self, store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError>;
}

/// Run [`Clean::clean`] and fold the outcome into a single result.
pub fn validate<T: Clean + ?Sized>(
    form: &T,
    store: &CareStore,
) -> Result<Result<(), FormErrors>, StoreError> {
    let mut errors = FormErrors::new();
    form.clean(store, &mut errors)?;
    Ok(errors.into_result())
}

impl Clean for RegistrationForm {
    fn clean(&self, store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("username", &self.username);
        if !self.username.trim().is_empty()
            && store.user_by_username(self.username.trim())?.is_some()
        {
            errors.add("username", "A user with that username already exists.");
        }
        errors.email("email", Some(self.email.as_str()));
        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        if !self.password1.is_empty()
            && !self.password2.is_empty()
            && self.password1 != self.password2
        {
            errors.add("password2", "Passwords don't match");
        }
        Ok(())
    }
}

impl Clean for ProfileForm {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        for (field, value) in [("firstName", &self.first_name), ("lastName", &self.last_name)] {
            errors.require(field, value);
            if value.chars().count() > NAME_MAX_LEN {
                errors.add(
                    field,
                    format!("Ensure this value has at most {NAME_MAX_LEN} characters."),
                );
            }
        }
        errors.require("email", &self.email);
        errors.email("email", Some(self.email.as_str()));
        Ok(())
    }
}

impl Clean for ElderForm {
    fn clean(&self, store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("fullName", &self.full_name);
        if self.date_of_birth > Utc::now().date_naive() {
            errors.add("dateOfBirth", "Date of birth cannot be in the future.");
        }
        errors.email("email", self.email.as_deref());
        if let Some(guardian) = self.guardian {
            if store.user(guardian)?.is_none() {
                errors.add("guardian", "Select a valid choice.");
            }
        }
        Ok(())
    }
}

impl Clean for MedicationForm {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("name", &self.name);
        Ok(())
    }
}

impl Clean for MedicationSchedule {
    fn clean(&self, store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        if store.medication(self.medication)?.is_none() {
            errors.add("medication", "Select a valid choice.");
        }
        errors.require("dosage", &self.dosage);
        if let Some(end) = self.end_date {
            if end < self.start_date {
                errors.add("endDate", "End date cannot be before the start date.");
            }
        }
        Ok(())
    }
}

impl Clean for MedicationLogForm {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        let reason = self.skip_reason.as_deref().unwrap_or_default();
        if self.was_skipped && reason.trim().is_empty() {
            errors.add("skipReason", "Give a reason when a dose is skipped.");
        }
        Ok(())
    }
}

impl Clean for Appointment {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("title", &self.title);
        if self.duration == 0 {
            errors.add("duration", "Ensure this value is greater than or equal to 1.");
        }
        Ok(())
    }
}

impl Clean for CareTask {
    fn clean(&self, store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("title", &self.title);
        if let Some(user) = self.assigned_to {
            if store.user(user)?.is_none() {
                errors.add("assignedTo", "Select a valid choice.");
            }
        }
        Ok(())
    }
}

impl Clean for IncidentReport {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("description", &self.description);
        Ok(())
    }
}

impl Clean for VitalsLog {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.range("bloodPressureSystolic", self.blood_pressure_systolic, 50, 300);
        errors.range("bloodPressureDiastolic", self.blood_pressure_diastolic, 30, 200);
        errors.range("heartRate", self.heart_rate, 30, 200);
        errors.range("temperature", self.temperature, 90.0, 110.0);
        errors.range("weight", self.weight, 0.0, 999.99);
        errors.range("oxygenSaturation", self.oxygen_saturation, 70, 100);
        errors.range("bloodSugar", self.blood_sugar, 20, 600);

        let measured = self.blood_pressure_systolic.is_some()
            || self.blood_pressure_diastolic.is_some()
            || self.heart_rate.is_some()
            || self.temperature.is_some()
            || self.weight.is_some()
            || self.oxygen_saturation.is_some()
            || self.blood_sugar.is_some();
        if !measured {
            errors.add("__all__", "Record at least one measurement.");
        }
        Ok(())
    }
}

impl Clean for EmergencyContact {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("name", &self.name);
        errors.require("phone", &self.phone);
        errors.email("email", self.email.as_deref());
        Ok(())
    }
}

impl Clean for Notification {
    fn clean(&self, _store: &CareStore, errors: &mut FormErrors) -> Result<(), StoreError> {
        errors.require("message", &self.message);
        Ok(())
    }
}
