use std::fmt;

use clap::ValueEnum;
use polars::prelude::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

/// Input columns in the order they appear in the prediction log.
pub const INPUT_COLUMNS: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Full log header: the input columns followed by the outcome columns.
pub const LOG_COLUMNS: [&str; 16] = [
    "age",
    "sex",
    "cp",
    "trestbps",
    "chol",
    "fbs",
    "restecg",
    "thalach",
    "exang",
    "oldpeak",
    "slope",
    "ca",
    "thal",
    "prediction",
    "probability",
    "timestamp",
];

// Closed category sets. The serde names are the literal strings the scoring
// pipeline was trained on, the clap names are their kebab-case forms.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const CATEGORIES: &'static [&'static str] = &[$($label),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical!(Sex {
    Male => "male",
    Female => "female",
});

categorical!(
    /// Chest pain type (`cp`).
    ChestPain {
        TypicalAngina => "typical angina",
        AtypicalAngina => "atypical angina",
        NonAnginalPain => "non-anginal pain",
        Asymptomatic => "asymptomatic",
    }
);

categorical!(
    /// Fasting blood sugar above 120 mg/dl (`fbs`).
    FastingBloodSugar {
        True => "true",
        False => "false",
    }
);

categorical!(
    /// Resting electrocardiographic result (`restecg`).
    RestingEcg {
        Normal => "normal",
        StTAbnormality => "ST-T abnormality",
        LeftVentricularHypertrophy => "left ventricular hypertrophy",
    }
);

categorical!(
    /// Exercise induced angina (`exang`).
    ExerciseAngina {
        Yes => "yes",
        No => "no",
    }
);

categorical!(
    /// Slope of the peak exercise ST segment.
    Slope {
        Upsloping => "upsloping",
        Flat => "flat",
        Downsloping => "downsloping",
    }
);

categorical!(
    /// Thalassemia.
    Thal {
        Normal => "normal",
        FixedDefect => "fixed defect",
        ReversibleDefect => "reversible defect",
    }
);

/// One patient's clinical measurements for a single prediction request.
///
/// Built once from the form and passed by reference through validation,
/// scoring and logging; nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: u32,
    pub sex: Sex,
    pub cp: ChestPain,
    pub trestbps: u32,
    pub chol: u32,
    pub fbs: FastingBloodSugar,
    pub restecg: RestingEcg,
    pub thalach: u32,
    pub exang: ExerciseAngina,
    pub oldpeak: f64,
    pub slope: Slope,
    pub ca: u8,
    pub thal: Thal,
}

impl Default for PatientRecord {
    /// The form's initial values.
    fn default() -> Self {
        PatientRecord {
            age: 45,
            sex: Sex::Male,
            cp: ChestPain::TypicalAngina,
            trestbps: 120,
            chol: 200,
            fbs: FastingBloodSugar::True,
            restecg: RestingEcg::Normal,
            thalach: 150,
            exang: ExerciseAngina::Yes,
            oldpeak: 1.0,
            slope: Slope::Upsloping,
            ca: 0,
            thal: Thal::Normal,
        }
    }
}

impl PatientRecord {
    /// Value of a numeric column, looked up by its log column name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let value = match column {
            "age" => f64::from(self.age),
            "trestbps" => f64::from(self.trestbps),
            "chol" => f64::from(self.chol),
            "thalach" => f64::from(self.thalach),
            "oldpeak" => self.oldpeak,
            "ca" => f64::from(self.ca),
            _ => return None,
        };
        Some(value)
    }

    /// Literal category string of a categorical column.
    pub fn category(&self, column: &str) -> Option<&'static str> {
        let value = match column {
            "sex" => self.sex.as_str(),
            "cp" => self.cp.as_str(),
            "fbs" => self.fbs.as_str(),
            "restecg" => self.restecg.as_str(),
            "exang" => self.exang.as_str(),
            "slope" => self.slope.as_str(),
            "thal" => self.thal.as_str(),
            _ => return None,
        };
        Some(value)
    }
}

/// A persisted prediction: the record's columns plus the outcome.
///
/// Field order is the on-disk column order and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub age: u32,
    pub sex: Sex,
    pub cp: ChestPain,
    pub trestbps: u32,
    pub chol: u32,
    pub fbs: FastingBloodSugar,
    pub restecg: RestingEcg,
    pub thalach: u32,
    pub exang: ExerciseAngina,
    pub oldpeak: f64,
    pub slope: Slope,
    pub ca: u8,
    pub thal: Thal,
    pub prediction: u8,
    pub probability: f64,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(record: &PatientRecord, prediction: u8, probability: f64, timestamp: String) -> Self {
        LogEntry {
            age: record.age,
            sex: record.sex,
            cp: record.cp,
            trestbps: record.trestbps,
            chol: record.chol,
            fbs: record.fbs,
            restecg: record.restecg,
            thalach: record.thalach,
            exang: record.exang,
            oldpeak: record.oldpeak,
            slope: record.slope,
            ca: record.ca,
            thal: record.thal,
            prediction,
            probability,
            timestamp,
        }
    }

    /// Column types of the log file when read back as a data frame.
    pub fn raw_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("age", DataType::Int64),
            Field::new("sex", DataType::Utf8),
            Field::new("cp", DataType::Utf8),
            Field::new("trestbps", DataType::Int64),
            Field::new("chol", DataType::Int64),
            Field::new("fbs", DataType::Utf8),
            Field::new("restecg", DataType::Utf8),
            Field::new("thalach", DataType::Int64),
            Field::new("exang", DataType::Utf8),
            Field::new("oldpeak", DataType::Float64),
            Field::new("slope", DataType::Utf8),
            Field::new("ca", DataType::Int32),
            Field::new("thal", DataType::Utf8),
            Field::new("prediction", DataType::Int32),
            Field::new("probability", DataType::Float64),
            Field::new("timestamp", DataType::Utf8),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_columns_extend_input_columns() {
        assert_eq!(&LOG_COLUMNS[..13], &INPUT_COLUMNS[..]);
        assert_eq!(&LOG_COLUMNS[13..], &["prediction", "probability", "timestamp"]);
    }

    #[test]
    fn schema_follows_log_columns() {
        let schema = LogEntry::raw_schema();
        let names: Vec<&str> = schema.iter_names().map(|name| name.as_str()).collect();
        assert_eq!(names, LOG_COLUMNS.to_vec());
    }

    #[test]
    fn every_input_column_is_numeric_or_categorical() {
        let record = PatientRecord::default();
        for column in INPUT_COLUMNS {
            let numeric = record.numeric(column).is_some();
            let categorical = record.category(column).is_some();
            assert!(numeric ^ categorical, "{column}");
        }
        assert_eq!(record.numeric("prediction"), None);
        assert_eq!(record.category("timestamp"), None);
    }

    #[test]
    fn categories_serialize_as_literal_strings() {
        let json = serde_json::to_string(&RestingEcg::StTAbnormality).unwrap();
        assert_eq!(json, "\"ST-T abnormality\"");
        let thal: Thal = serde_json::from_str("\"reversible defect\"").unwrap();
        assert_eq!(thal, Thal::ReversibleDefect);
        assert_eq!(ChestPain::NonAnginalPain.to_string(), "non-anginal pain");
        assert_eq!(ChestPain::CATEGORIES.len(), 4);
    }

    #[test]
    fn log_entry_keeps_the_record() {
        let record = PatientRecord {
            age: 61,
            cp: ChestPain::Asymptomatic,
            ..PatientRecord::default()
        };
        let entry = LogEntry::new(&record, 0, 0.25, "2024-01-01T00:00:00.000000Z".into());
        assert_eq!(entry.age, 61);
        assert_eq!(entry.cp, ChestPain::Asymptomatic);
        assert_eq!(entry.thal, record.thal);
        assert_eq!(entry.prediction, 0);
        assert_eq!(entry.probability, 0.25);
    }
}
