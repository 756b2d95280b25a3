use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

use log::{info, warn};

use crate::error::AppError;
use crate::logger::PredictionLogger;
use crate::records::PatientRecord;
use crate::scoring::{top_importances, Assessment, FeatureImportance, RiskClass, Scorer, TOP_FEATURES};
use crate::validation::validate;

const BAR_WIDTH: usize = 40;

/// Receives each step of a submission as it happens.
pub trait Presenter {
    fn invalid(&mut self, errors: &[String]) -> io::Result<()>;
    fn valid(&mut self) -> io::Result<()>;
    fn outcome(&mut self, assessment: &Assessment) -> io::Result<()>;
    fn logged(&mut self) -> io::Result<()>;
    fn importances(&mut self, importances: &[FeatureImportance]) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was scored or written.
    Rejected(Vec<String>),
    Logged(Assessment),
    /// Scored as high risk. These are shown but never written to the log.
    NotLogged(Assessment),
}

/// One user's form session: a scorer built at startup and the log it writes to.
pub struct Session<S> {
    scorer: S,
    logger: PredictionLogger,
}

impl<S: Scorer> Session<S> {
    pub fn new(scorer: S, logger: PredictionLogger) -> Self {
        Session { scorer, logger }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn logger(&self) -> &PredictionLogger {
        &self.logger
    }

    /// Validates, scores and logs one record.
    ///
    /// The outcome reaches the presenter before the log write is attempted,
    /// so a failing write never hides the prediction. Only low-risk outcomes
    /// are logged.
    pub fn submit<P: Presenter>(
        &self,
        record: &PatientRecord,
        presenter: &mut P,
    ) -> Result<SubmitOutcome, AppError> {
        let errors = validate(record);

        let outcome = if !errors.is_empty() {
            warn!("rejected record with {} out-of-range field(s)", errors.len());
            presenter.invalid(&errors)?;
            SubmitOutcome::Rejected(errors)
        } else {
            presenter.valid()?;
            let assessment = self.scorer.assess(record)?;
            info!(
                "scored record as {} (p={:.4})",
                assessment.class, assessment.probability
            );
            presenter.outcome(&assessment)?;

            match assessment.class {
                RiskClass::Low => {
                    self.logger
                        .log(record, assessment.class.label(), assessment.probability)?;
                    presenter.logged()?;
                    SubmitOutcome::Logged(assessment)
                }
                RiskClass::High => SubmitOutcome::NotLogged(assessment),
            }
        };

        if let Some(importances) = self.scorer.feature_importances() {
            presenter.importances(&top_importances(importances, TOP_FEATURES))?;
        }

        Ok(outcome)
    }
}

/// Plain-text rendering for a terminal.
pub struct TerminalPresenter<W> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        TerminalPresenter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn model_summary(&mut self, accuracy: f64) -> io::Result<()> {
        writeln!(self.out, "Model Accuracy: {:.2}%", accuracy * 100.0)
    }

    pub fn exported(&mut self, dest: &Path) -> io::Result<()> {
        writeln!(self.out, "Full log written to {}", dest.display())
    }

    pub fn no_importances(&mut self) -> io::Result<()> {
        writeln!(self.out, "Feature importances are not available for this model.")
    }

    pub fn recent(&mut self, table: Option<impl Display>) -> io::Result<()> {
        match table {
            Some(table) => {
                writeln!(self.out, "Recent Predictions")?;
                writeln!(self.out, "{}", table)
            }
            None => writeln!(self.out, "No predictions logged yet."),
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn invalid(&mut self, errors: &[String]) -> io::Result<()> {
        writeln!(self.out, "Invalid input(s) detected. Please fix the following:")?;
        for error in errors {
            writeln!(self.out, "  - {}", error)?;
        }
        Ok(())
    }

    fn valid(&mut self) -> io::Result<()> {
        writeln!(self.out, "All inputs look valid!")
    }

    fn outcome(&mut self, assessment: &Assessment) -> io::Result<()> {
        let verdict = match assessment.class {
            RiskClass::High => "This person likely has heart disease.",
            RiskClass::Low => "This person is unlikely to have heart disease.",
        };
        writeln!(
            self.out,
            "{}: {} (Probability: {:.2})",
            assessment.class, verdict, assessment.probability
        )
    }

    fn logged(&mut self) -> io::Result<()> {
        writeln!(self.out, "Prediction logged successfully!")
    }

    fn importances(&mut self, importances: &[FeatureImportance]) -> io::Result<()> {
        if importances.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "Feature Importance")?;

        let name_width = importances
            .iter()
            .map(|item| item.feature.len())
            .max()
            .unwrap_or(0);
        let peak = importances
            .iter()
            .map(|item| item.importance)
            .fold(0.0_f64, f64::max);

        for item in importances {
            let len = if peak > 0.0 {
                ((item.importance.max(0.0) / peak) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            writeln!(
                self.out,
                "  {:<width$} {:<bar$} {:.3}",
                item.feature,
                "#".repeat(len),
                item.importance,
                width = name_width,
                bar = BAR_WIDTH
            )?;
        }
        Ok(())
    }
}
