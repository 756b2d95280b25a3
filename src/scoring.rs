use std::cmp::Ordering;
use std::fmt;

use crate::error::ScoringError;
use crate::records::PatientRecord;

/// Number of features shown in the importance chart.
pub const TOP_FEATURES: usize = 10;

/// Predicted class, encoded as 0/1 in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Low = 0,
    High = 1,
}

impl RiskClass {
    pub fn label(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i32> for RiskClass {
    type Error = ScoringError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RiskClass::Low),
            1 => Ok(RiskClass::High),
            other => Err(ScoringError::Label(other)),
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskClass::Low => f.write_str("Low Risk"),
            RiskClass::High => f.write_str("High Risk"),
        }
    }
}

/// Outcome of scoring one record: the class and the probability of class 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub class: RiskClass,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// A fitted classification pipeline that scores one patient at a time.
///
/// Implementations are built once per process and handed to whoever needs
/// them; tests substitute a stub.
pub trait Scorer {
    fn predict(&self, record: &PatientRecord) -> Result<RiskClass, ScoringError>;

    /// Class probabilities, `[p(class 0), p(class 1)]`.
    fn predict_proba(&self, record: &PatientRecord) -> Result<[f64; 2], ScoringError>;

    /// Accuracy measured on the held-out set when the model was trained.
    fn test_accuracy(&self) -> f64;

    /// Per-feature importances, when the underlying estimator exposes them.
    fn feature_importances(&self) -> Option<Vec<FeatureImportance>> {
        None
    }

    fn assess(&self, record: &PatientRecord) -> Result<Assessment, ScoringError> {
        let class = self.predict(record)?;
        let [_, probability] = self.predict_proba(record)?;
        Ok(Assessment { class, probability })
    }
}

/// Highest `limit` importances, largest first.
pub fn top_importances(mut importances: Vec<FeatureImportance>, limit: usize) -> Vec<FeatureImportance> {
    importances.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
    });
    importances.truncate(limit);
    importances
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Scorer for Fixed {
        fn predict(&self, _: &PatientRecord) -> Result<RiskClass, ScoringError> {
            Ok(RiskClass::High)
        }

        fn predict_proba(&self, _: &PatientRecord) -> Result<[f64; 2], ScoringError> {
            Ok([0.2, 0.8])
        }

        fn test_accuracy(&self) -> f64 {
            0.9
        }
    }

    #[test]
    fn assess_takes_class_one_probability() {
        let assessment = Fixed.assess(&PatientRecord::default()).unwrap();
        assert_eq!(assessment.class, RiskClass::High);
        assert_eq!(assessment.probability, 0.8);
        assert!(Fixed.feature_importances().is_none());
    }

    #[test]
    fn labels_map_to_classes() {
        assert_eq!(RiskClass::try_from(0).unwrap(), RiskClass::Low);
        assert_eq!(RiskClass::try_from(1).unwrap().label(), 1);
        assert!(matches!(RiskClass::try_from(2), Err(ScoringError::Label(2))));
    }

    #[test]
    fn top_importances_sorts_and_truncates() {
        let importances = (0..12u32)
            .map(|i| FeatureImportance {
                feature: format!("f{i}"),
                importance: f64::from(i) / 100.0,
            })
            .collect();

        let top = top_importances(importances, TOP_FEATURES);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].feature, "f11");
        assert_eq!(top[9].feature, "f2");
        assert!(top.windows(2).all(|w| w[0].importance >= w[1].importance));
    }
}
