use std::fmt::Display;

use log::debug;
use num::Num;

use crate::records::PatientRecord;

/// Inclusive range a numeric field must fall in before the record is scored.
#[derive(Debug, Clone, Copy)]
pub struct RangeCheck<T> {
    pub field: &'static str,
    pub min: T,
    pub max: T,
    pub message: &'static str,
}

impl<T: Num + PartialOrd + Copy + Display> RangeCheck<T> {
    /// NaN is never admitted.
    pub fn admits(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    fn check(&self, value: T, errors: &mut Vec<String>) {
        if !self.admits(value) {
            debug!(
                "{} = {} outside [{}, {}]",
                self.field, value, self.min, self.max
            );
            errors.push(self.message.to_string());
        }
    }
}

pub const AGE: RangeCheck<u32> = RangeCheck {
    field: "age",
    min: 20,
    max: 100,
    message: "Age must be between 20 and 100.",
};

pub const RESTING_BLOOD_PRESSURE: RangeCheck<u32> = RangeCheck {
    field: "trestbps",
    min: 80,
    max: 200,
    message: "Resting blood pressure must be between 80 and 200 mm Hg.",
};

pub const CHOLESTEROL: RangeCheck<u32> = RangeCheck {
    field: "chol",
    min: 100,
    max: 600,
    message: "Cholesterol must be between 100 and 600 mg/dl.",
};

pub const MAX_HEART_RATE: RangeCheck<u32> = RangeCheck {
    field: "thalach",
    min: 60,
    max: 220,
    message: "Max heart rate must be between 60 and 220 bpm.",
};

pub const ST_DEPRESSION: RangeCheck<f64> = RangeCheck {
    field: "oldpeak",
    min: 0.0,
    max: 6.0,
    message: "ST depression (oldpeak) must be between 0.0 and 6.0.",
};

/// Checks the five bounded numeric fields and returns one message per
/// violation, in field order. An empty list means the record may be scored.
pub fn validate(record: &PatientRecord) -> Vec<String> {
    let mut errors = Vec::new();
    AGE.check(record.age, &mut errors);
    RESTING_BLOOD_PRESSURE.check(record.trestbps, &mut errors);
    CHOLESTEROL.check(record.chol, &mut errors);
    MAX_HEART_RATE.check(record.thalach, &mut errors);
    ST_DEPRESSION.check(record.oldpeak, &mut errors);
    errors
}
