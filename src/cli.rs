use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Parser, Subcommand};

use crate::config::{DEFAULT_LOG_PATH, DEFAULT_MODEL_PATH};
use crate::history::ExportFormat;
use crate::records::{
    ChestPain, ExerciseAngina, FastingBloodSugar, PatientRecord, RestingEcg, Sex, Slope, Thal,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Heart disease risk prediction", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, global = true, env = "HEART_RISK_MODEL", default_value = DEFAULT_MODEL_PATH,
    help = "Serialized model pipeline")]
    pub model: PathBuf,
    #[arg(long, global = true, env = "HEART_RISK_PREDICTIONS", default_value = DEFAULT_LOG_PATH,
    help = "Prediction log (CSV)")]
    pub log_file: PathBuf,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Verbose level")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score one patient and log low-risk outcomes
    Predict(FormArgs),
    /// Show the most recent logged predictions
    History {
        #[arg(short, long, help = "Rows to show [default: 5]")]
        rows: Option<usize>,
    },
    /// Write the full prediction log to a file
    Export {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Show model accuracy and feature importances
    Model,
}

/// The patient form. Ranges here are input limits, looser than the
/// clinical checks applied before scoring.
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    #[arg(long, default_value_t = 45, value_parser = value_parser!(u32).range(1..=120),
    help = "Age")]
    pub age: u32,
    #[arg(long, value_enum, default_value_t = Sex::Male)]
    pub sex: Sex,
    #[arg(long, value_enum, default_value_t = ChestPain::TypicalAngina,
    help = "Chest pain type")]
    pub cp: ChestPain,
    #[arg(long, default_value_t = 120, value_parser = value_parser!(u32).range(50..=250),
    help = "Resting blood pressure (mm Hg)")]
    pub trestbps: u32,
    #[arg(long, default_value_t = 200, value_parser = value_parser!(u32).range(100..=600),
    help = "Serum cholesterol (mg/dl)")]
    pub chol: u32,
    #[arg(long, value_enum, default_value_t = FastingBloodSugar::True,
    help = "Fasting blood sugar > 120 mg/dl")]
    pub fbs: FastingBloodSugar,
    #[arg(long, value_enum, default_value_t = RestingEcg::Normal,
    help = "Resting ECG results")]
    pub restecg: RestingEcg,
    #[arg(long, default_value_t = 150, value_parser = value_parser!(u32).range(50..=250),
    help = "Maximum heart rate achieved")]
    pub thalach: u32,
    #[arg(long, value_enum, default_value_t = ExerciseAngina::Yes,
    help = "Exercise induced angina")]
    pub exang: ExerciseAngina,
    #[arg(long, default_value_t = 1.0, value_parser = parse_oldpeak,
    help = "ST depression")]
    pub oldpeak: f64,
    #[arg(long, value_enum, default_value_t = Slope::Upsloping,
    help = "Slope of peak exercise ST segment")]
    pub slope: Slope,
    #[arg(long, default_value_t = 0, value_parser = value_parser!(u8).range(0..=4),
    help = "Number of major vessels colored by fluoroscopy")]
    pub ca: u8,
    #[arg(long, value_enum, default_value_t = Thal::Normal, help = "Thalassemia")]
    pub thal: Thal,
}

impl FormArgs {
    pub fn record(&self) -> PatientRecord {
        PatientRecord {
            age: self.age,
            sex: self.sex,
            cp: self.cp,
            trestbps: self.trestbps,
            chol: self.chol,
            fbs: self.fbs,
            restecg: self.restecg,
            thalach: self.thalach,
            exang: self.exang,
            oldpeak: self.oldpeak,
            slope: self.slope,
            ca: self.ca,
            thal: self.thal,
        }
    }
}

/// Accepts 0.0 to 10.0 in steps of 0.1.
fn parse_oldpeak(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=10.0).contains(&parsed) {
        return Err(format!("{parsed} is not in 0.0..=10.0"));
    }
    Ok((parsed * 10.0).round() / 10.0)
}
