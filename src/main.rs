//! stroke-risk entrypoint: train the tabular model, assess patients, inspect stored predictions.
//! Command output is one JSON line on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stroke_risk::{
    assessment::{AssessmentRequest, Assessor, PatientIdentity, ScanUpload},
    config::ServiceConfig,
    logging::StructuredLogger,
    model::{ModelRegistry, TabularClassifier},
    risk::{RiskLevel, Stage},
    storage::{retention_cutoff, PredictionFilter, PredictionStore},
};
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Used only when the configured secret variable is unset.
const FALLBACK_SECRET: &[u8] = b"stroke-risk-secret-placeholder";

#[derive(Parser)]
#[command(name = "stroke-risk", version, about = "Stroke risk assessment (placeholder models)")]
struct Cli {
    /// JSON service configuration; defaults apply when missing
    #[arg(long, env = "STROKE_RISK_CONFIG", default_value = "config.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the tabular model on placeholder data and save the artifact
    Train,
    /// Assess one patient from a JSON form, optionally with a brain scan
    Assess {
        #[arg(long)]
        form: PathBuf,
        #[arg(long)]
        scan: Option<PathBuf>,
        /// Print the assessment without storing it
        #[arg(long)]
        no_store: bool,
    },
    /// Print a stored prediction
    Show { id: String },
    /// Risk distribution and most recent predictions
    Stats {
        #[arg(long)]
        risk: Option<String>,
        /// e.g. "Stage 2" or 2
        #[arg(long)]
        stage: Option<String>,
        /// Only predictions from the last N days
        #[arg(long)]
        days: Option<i64>,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Tabular vs scan outcome for records where both models ran
    Compare {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Delete predictions older than the given number of days
    Prune {
        #[arg(long)]
        days: i64,
    },
    /// Which model files are present (nothing is loaded or trained)
    Health,
}

/// Form file: patient identity plus measurement values (strings, numbers or booleans).
#[derive(Deserialize)]
struct FormFile {
    patient: PatientIdentity,
    measurements: BTreeMap<String, serde_json::Value>,
}

fn form_values(raw: BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    raw.into_iter()
        .filter_map(|(k, v)| {
            let s = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((k, s))
        })
        .collect()
}

fn open_store(config: &ServiceConfig) -> Result<PredictionStore, BoxError> {
    std::fs::create_dir_all(&config.data_dir)?;
    let secret = match std::env::var(&config.store.secret_env) {
        Ok(s) if !s.is_empty() => s.into_bytes(),
        _ => {
            warn!(var = %config.store.secret_env, "store secret not set; using placeholder secret");
            FALLBACK_SECRET.to_vec()
        }
    };
    Ok(PredictionStore::open(&config.store_path(), &secret)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), BoxError> {
    StructuredLogger::emit_json(value, &mut std::io::stdout().lock())?;
    Ok(())
}

fn read_scan(path: &Path) -> Result<ScanUpload, BoxError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ScanUpload {
        file_name,
        bytes: std::fs::read(path)?,
    })
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli.config);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(data_dir = ?config.data_dir, "stroke-risk starting");

    match cli.command {
        Command::Train => {
            let model = TabularClassifier::train(&config.tabular)?;
            model.save(&config.tabular_model_path())?;
            let importances: Vec<serde_json::Value> = model
                .ranked_importances()
                .into_iter()
                .map(|(f, v)| json!({ "feature": f.name(), "importance": v }))
                .collect();
            print_json(&json!({
                "trained_at": model.trained_at().to_rfc3339(),
                "metrics": model.metrics(),
                "feature_importance": importances,
                "params": model.params(),
            }))?;
        }
        Command::Assess { form, scan, no_store } => {
            let form: FormFile = serde_json::from_str(&std::fs::read_to_string(&form)?)?;
            let scan = scan.as_deref().map(read_scan).transpose()?;

            let registry = Arc::new(ModelRegistry::load(&config)?);
            let assessor = Assessor::new(registry, &config.scan);
            let assessment = assessor.assess(AssessmentRequest {
                patient: form.patient,
                form: form_values(form.measurements),
                scan,
            })?;

            if !no_store {
                open_store(&config)?.insert(&assessment.record)?;
            }
            print_json(&assessment)?;
        }
        Command::Show { id } => match open_store(&config)?.get(&id)? {
            Some(record) => print_json(&record)?,
            None => return Err(format!("prediction {} not found", id).into()),
        },
        Command::Stats { risk, stage, days, limit } => {
            let risk = match risk.as_deref() {
                Some(s) => Some(RiskLevel::parse(s).ok_or_else(|| format!("unknown risk tier {:?}", s))?),
                None => None,
            };
            let stage = match stage.as_deref() {
                Some(s) => Some(Stage::parse(s).ok_or_else(|| format!("unknown stage {:?}", s))?),
                None => None,
            };
            let since = days.map(|d| retention_cutoff(chrono::Utc::now(), d)).transpose()?;
            let filter = PredictionFilter {
                risk,
                stage,
                since,
                until: None,
            };
            let store = open_store(&config)?;
            let distribution = store.risk_distribution()?;
            let recent = store.list(&filter, limit)?;
            print_json(&json!({
                "total_predictions": distribution.total(),
                "risk_distribution": distribution,
                "recent_predictions": recent,
            }))?;
        }
        Command::Compare { limit } => {
            let comparisons = open_store(&config)?.compare(limit)?;
            print_json(&json!({
                "count": comparisons.len(),
                "comparisons": comparisons,
            }))?;
        }
        Command::Prune { days } => {
            let cutoff = retention_cutoff(chrono::Utc::now(), days)?;
            let removed = open_store(&config)?.prune_before(cutoff.timestamp_millis())?;
            info!(removed, days, "pruned predictions");
            print_json(&json!({ "removed": removed }))?;
        }
        Command::Health => {
            let status = ModelRegistry::artifact_status(&config);
            print_json(&json!({
                "status": "healthy",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "models": status,
            }))?;
        }
    }

    Ok(())
}
