//! Scoring pipeline loaded from a JSON artifact: a column preprocessor in
//! front of a fitted smartcore logistic regression.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::LogisticRegression;

use crate::error::{ModelError, ScoringError};
use crate::records::PatientRecord;
use crate::scoring::{FeatureImportance, RiskClass, Scorer};

pub type Classifier = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Standardized numeric input: `(value - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// One-hot encoded input. A value outside `categories` encodes as all zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Turns a record into the classifier's feature row: numeric columns first,
/// then the one-hot blocks, each in artifact order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|column| column.categories.len())
                .sum::<usize>()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let numeric = self.numeric.iter().map(|column| column.name.clone());
        let categorical = self.categorical.iter().flat_map(|column| {
            column
                .categories
                .iter()
                .map(move |category| format!("{}={}", column.name, category))
        });
        numeric.chain(categorical).collect()
    }

    /// Fails if the artifact names a column the record does not have.
    pub fn check_columns(&self) -> Result<(), ScoringError> {
        let probe = PatientRecord::default();
        for column in &self.numeric {
            probe
                .numeric(&column.name)
                .ok_or_else(|| ScoringError::Schema(column.name.clone()))?;
        }
        for column in &self.categorical {
            probe
                .category(&column.name)
                .ok_or_else(|| ScoringError::Schema(column.name.clone()))?;
        }
        Ok(())
    }

    pub fn transform(&self, record: &PatientRecord) -> Result<Vec<f64>, ScoringError> {
        let mut row = Vec::with_capacity(self.width());

        for column in &self.numeric {
            let value = record
                .numeric(&column.name)
                .ok_or_else(|| ScoringError::Schema(column.name.clone()))?;
            // zero-variance columns are only centred
            let scale = if column.scale == 0.0 { 1.0 } else { column.scale };
            row.push((value - column.mean) / scale);
        }

        for column in &self.categorical {
            let value = record
                .category(&column.name)
                .ok_or_else(|| ScoringError::Schema(column.name.clone()))?;
            row.extend(
                column
                    .categories
                    .iter()
                    .map(|category| if category == value { 1.0 } else { 0.0 }),
            );
        }

        Ok(row)
    }
}

/// The serialized scoring artifact.
#[derive(Serialize, Deserialize)]
pub struct PipelineModel {
    pub preprocessor: Preprocessor,
    pub classifier: Classifier,
    pub test_accuracy: f64,
    /// Aligned with `Preprocessor::feature_names`; absent for most estimators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

impl fmt::Debug for PipelineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineModel")
            .field("features", &self.preprocessor.width())
            .field("test_accuracy", &self.test_accuracy)
            .field("feature_importances", &self.feature_importances.is_some())
            .finish()
    }
}

impl PipelineModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let model: PipelineModel =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                ModelError::Format {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        model.check()?;

        info!(
            "loaded model pipeline from {:?} ({} features, test accuracy {:.4})",
            path,
            model.preprocessor.width(),
            model.test_accuracy
        );
        Ok(model)
    }

    fn check(&self) -> Result<(), ModelError> {
        self.preprocessor.check_columns()?;

        let (rows, expected) = self.classifier.coefficients().shape();
        if rows != 1 {
            return Err(ModelError::NotBinary(rows));
        }
        let actual = self.preprocessor.width();
        if expected != actual {
            return Err(ModelError::FeatureCount { expected, actual });
        }
        if let Some(importances) = &self.feature_importances {
            if importances.len() != actual {
                return Err(ModelError::FeatureCount {
                    expected: importances.len(),
                    actual,
                });
            }
        }
        Ok(())
    }

    fn linear_score(&self, row: &[f64]) -> f64 {
        let coefficients = self.classifier.coefficients();
        let intercept = *self.classifier.intercept().get((0, 0));
        row.iter()
            .enumerate()
            .fold(intercept, |score, (j, x)| score + x * coefficients.get((0, j)))
    }
}

impl Scorer for PipelineModel {
    fn predict(&self, record: &PatientRecord) -> Result<RiskClass, ScoringError> {
        let row = self.preprocessor.transform(record)?;
        let x = DenseMatrix::new(1, row.len(), row, false);
        let labels = self.classifier.predict(&x)?;
        let label = labels
            .first()
            .copied()
            .ok_or_else(|| Failed::predict("classifier returned no label"))?;
        RiskClass::try_from(label)
    }

    fn predict_proba(&self, record: &PatientRecord) -> Result<[f64; 2], ScoringError> {
        let row = self.preprocessor.transform(record)?;
        let positive = 1.0 / (1.0 + (-self.linear_score(&row)).exp());
        Ok([1.0 - positive, positive])
    }

    fn test_accuracy(&self) -> f64 {
        self.test_accuracy
    }

    fn feature_importances(&self) -> Option<Vec<FeatureImportance>> {
        let importances = self.feature_importances.as_ref()?;
        Some(
            self.preprocessor
                .feature_names()
                .into_iter()
                .zip(importances.iter().copied())
                .map(|(feature, importance)| FeatureImportance {
                    feature,
                    importance,
                })
                .collect(),
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use tempfile::TempDir;

    fn patient(age: u32) -> PatientRecord {
        PatientRecord {
            age,
            ..PatientRecord::default()
        }
    }

    #[test]
    fn transform_standardizes_and_one_hot_encodes() {
        let preprocessor = Preprocessor {
            numeric: vec![NumericColumn {
                name: "age".into(),
                mean: 40.0,
                scale: 10.0,
            }],
            categorical: vec![CategoricalColumn {
                name: "sex".into(),
                categories: vec!["male".into(), "female".into()],
            }],
        };
        assert_eq!(preprocessor.width(), 3);
        assert_eq!(preprocessor.feature_names(), vec!["age", "sex=male", "sex=female"]);
        assert_eq!(preprocessor.transform(&patient(55)).unwrap(), vec![1.5, 1.0, 0.0]);
    }

    #[test]
    fn unknown_category_encodes_as_zeros() {
        let preprocessor = Preprocessor {
            numeric: vec![],
            categorical: vec![CategoricalColumn {
                name: "thal".into(),
                categories: vec!["fixed defect".into()],
            }],
        };
        assert_eq!(preprocessor.transform(&patient(50)).unwrap(), vec![0.0]);
    }

    #[test]
    fn unknown_column_is_a_schema_error() {
        let preprocessor = Preprocessor {
            numeric: vec![NumericColumn {
                name: "bmi".into(),
                mean: 0.0,
                scale: 1.0,
            }],
            categorical: vec![],
        };
        assert!(matches!(
            preprocessor.check_columns(),
            Err(ScoringError::Schema(name)) if name == "bmi"
        ));
        assert!(preprocessor.transform(&patient(50)).is_err());
    }

    #[test]
    fn artifact_round_trip_scores_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model_pipeline.json");
        let fitted = fitted_model();
        write_artifact(&fitted, &path);

        let loaded = PipelineModel::load(&path).unwrap();
        assert_eq!(loaded.test_accuracy(), 0.8525);
        for age in [25, 40, 60, 84] {
            let record = patient(age);
            assert_eq!(loaded.predict(&record).unwrap(), fitted.predict(&record).unwrap());
            assert_eq!(
                loaded.predict_proba(&record).unwrap(),
                fitted.predict_proba(&record).unwrap()
            );
        }
    }

    #[test]
    fn artifact_coefficients_reload_bit_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model_pipeline.json");
        let fitted = fitted_model();
        write_artifact(&fitted, &path);

        let loaded = PipelineModel::load(&path).unwrap();
        let (expected, actual) = (fitted.classifier.coefficients(), loaded.classifier.coefficients());
        assert_eq!(expected.shape(), actual.shape());
        for j in 0..expected.shape().1 {
            assert_eq!(expected.get((0, j)).to_bits(), actual.get((0, j)).to_bits(), "coefficient {j}");
        }
        assert_eq!(
            fitted.classifier.intercept().get((0, 0)).to_bits(),
            loaded.classifier.intercept().get((0, 0)).to_bits()
        );
    }

    #[test]
    fn probabilities_agree_with_labels() {
        let model = fitted_model();
        for age in [25, 30, 80, 84] {
            let record = patient(age);
            let [low, high] = model.predict_proba(&record).unwrap();
            assert!((0.0..=1.0).contains(&high));
            assert!((low + high - 1.0).abs() < 1e-12);
            let class = model.predict(&record).unwrap();
            assert_eq!(class == RiskClass::High, high > 0.5, "age {age}");
        }
    }

    #[test]
    fn older_patients_score_higher() {
        let model = fitted_model();
        assert_eq!(model.predict(&patient(25)).unwrap(), RiskClass::Low);
        assert_eq!(model.predict(&patient(84)).unwrap(), RiskClass::High);
        let [_, young] = model.predict_proba(&patient(25)).unwrap();
        let [_, old] = model.predict_proba(&patient(84)).unwrap();
        assert!(old > young);
    }

    #[test]
    fn importances_follow_feature_names() {
        let mut model = fitted_model();
        assert!(model.feature_importances().is_none());

        let width = model.preprocessor.width();
        model.feature_importances = Some((0..width).map(|i| i as f64).collect());
        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), width);
        assert_eq!(importances[0].feature, "age");
        assert_eq!(importances[6].feature, "sex=male");
        assert_eq!(importances[width - 1].importance, (width - 1) as f64);
    }

    #[test]
    fn missing_artifact_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let err = PipelineModel::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelError::Open { .. }));
    }

    #[test]
    fn malformed_artifact_fails_to_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"test_accuracy\": 0.9}").unwrap();
        let err = PipelineModel::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Format { .. }));
    }

    #[test]
    fn preprocessor_width_must_match_classifier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut model = fitted_model();
        model.preprocessor.numeric.pop();
        write_artifact(&model, &path);

        let err = PipelineModel::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCount { expected, actual } if expected == actual + 1
        ));
    }

    #[test]
    fn importances_must_match_feature_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut model = fitted_model();
        model.feature_importances = Some(vec![0.5; 3]);
        write_artifact(&model, &path);

        assert!(matches!(
            PipelineModel::load(&path),
            Err(ModelError::FeatureCount { .. })
        ));
    }

    #[test]
    fn artifact_with_unknown_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut model = fitted_model();
        model.preprocessor.numeric[0].name = "bmi".into();
        write_artifact(&model, &path);

        assert!(matches!(
            PipelineModel::load(&path),
            Err(ModelError::Schema(ScoringError::Schema(_)))
        ));
    }
}
