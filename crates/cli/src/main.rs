use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casualty_core::{
    catalog::ActionGroup,
    time::{is_complete_time, normalize_checked},
    ActionCatalog, ActionLabel, AtMist, EditSession, EngineConfig, LogChange, PatientSnapshot,
    SystemClock, TriageCategory, VitalChart, VitalField,
};

#[derive(Parser)]
#[command(name = "casualty")]
#[command(about = "Casualty card engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize keypad time input
    Time {
        /// Raw digits, e.g. 0130
        raw: String,
    },
    /// Create an empty patient snapshot
    New {
        /// Output file (.json, .yaml or .yml)
        file: PathBuf,
        /// Number of records that already exist
        #[arg(long, default_value_t = 0)]
        records: usize,
    },
    /// Print TCCC recommendations for a snapshot
    Recommend {
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the projected vital chart for a snapshot
    Chart {
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the AT-MIST handover
    Handover { file: PathBuf },
    /// Set the triage category (P1-P4, or "" to clear) and save the snapshot
    Triage { file: PathBuf, category: String },
    /// Toggle a treatment action and save the snapshot
    Toggle {
        file: PathBuf,
        label: String,
        /// Entry time (HHMM); defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// Record a dose and save the snapshot
    Dose {
        file: PathBuf,
        label: String,
        /// Entry time (HHMM); defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// Record a vital reading and save the snapshot
    Vitals {
        file: PathBuf,
        /// field=value pairs, e.g. pulse=120 bp=90/60 acvpu=V
        #[arg(required = true)]
        values: Vec<String>,
        /// Reading time (HHMM); defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    /// List the standard action catalog
    Catalog,
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn load(path: &Path) -> anyhow::Result<PatientSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot = if is_yaml(path) {
        PatientSnapshot::from_yaml(&text)?
    } else {
        PatientSnapshot::from_json(&text)?
    };
    Ok(snapshot)
}

fn save(path: &Path, snapshot: &PatientSnapshot) -> anyhow::Result<()> {
    let text = if is_yaml(path) {
        snapshot.to_yaml()?
    } else {
        snapshot.to_json()?
    };
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        "saved patient {} to {}",
        snapshot.patient_number,
        path.display()
    );
    Ok(())
}

fn report(change: &LogChange) {
    match change {
        LogChange::Appended(line) => println!("Added: {}", line),
        LogChange::Removed(line) => println!("Removed: {}", line),
        LogChange::Unchanged => println!("No change"),
    }
}

fn open_session(path: &Path, config: &EngineConfig) -> anyhow::Result<EditSession> {
    Ok(EditSession::begin(load(path)?, config.clone()))
}

/// Normalizes an optional `--time` argument. Only a complete `HH:MM` time is accepted.
fn checked_time(raw: Option<&str>) -> anyhow::Result<String> {
    let Some(raw) = raw else {
        return Ok(String::new());
    };
    let time = normalize_checked(raw);
    if !time.valid || !is_complete_time(&time.text) {
        anyhow::bail!("'{}' is not a complete HHMM time", raw);
    }
    Ok(time.text)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("casualty=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env_values(
        std::env::var("CASUALTY_MATCH_POLICY").ok(),
        std::env::var("CASUALTY_CHART_HEIGHT").ok(),
    )?;
    tracing::debug!("engine config: {:?}", config);

    let cli = Cli::parse();
    let clock = SystemClock;

    match cli.command {
        Some(Commands::Time { raw }) => {
            let time = normalize_checked(&raw);
            if time.valid {
                println!("{}", time.text);
            } else {
                println!("{} (invalid)", time.text);
            }
        }
        Some(Commands::New { file, records }) => {
            let snapshot = PatientSnapshot::create(records);
            save(&file, &snapshot)?;
            println!(
                "Created patient {} with ID: {}",
                snapshot.patient_number, snapshot.id
            );
        }
        Some(Commands::Recommend { file, json }) => {
            let recommendations = casualty_core::recommend(&load(&file)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&recommendations.lines())?);
            } else {
                print!("{}", recommendations);
            }
        }
        Some(Commands::Chart { file, json }) => {
            let snapshot = load(&file)?;
            match VitalChart::project(&snapshot.vital_history, None, false, &config) {
                Some(chart) if json => println!("{}", serde_json::to_string_pretty(&chart)?),
                Some(chart) => {
                    println!(
                        "{} readings, {}x{} px",
                        chart.readings.len(),
                        chart.width,
                        chart.height
                    );
                    for series in &chart.series {
                        let values: Vec<String> = series
                            .points
                            .iter()
                            .map(|p| format!("{}@{}", p.value, p.reading.time))
                            .collect();
                        println!("{:>6}: {}", series.parameter.label(), values.join(", "));
                    }
                }
                None => println!("No vital readings recorded."),
            }
        }
        Some(Commands::Handover { file }) => {
            print!("{}", AtMist::from_snapshot(&load(&file)?, None));
        }
        Some(Commands::Triage { file, category }) => {
            let category = TriageCategory::parse(&category)
                .with_context(|| format!("unknown triage category '{}'", category))?;
            let mut snapshot = load(&file)?;
            snapshot.triage_category = category;
            save(&file, &snapshot)?;
            println!("Patient {} triage: {}", snapshot.patient_number, category);
        }
        Some(Commands::Toggle { file, label, time }) => {
            let label = ActionLabel::new(&label)?;
            let mut session = open_session(&file, &config)?;
            session.set_treatment_time(&checked_time(time.as_deref())?);
            let change = session.toggle_action(&label, &clock);
            save(&file, &session.commit(&clock))?;
            report(&change);
        }
        Some(Commands::Dose { file, label, time }) => {
            let label = ActionLabel::new(&label)?;
            let mut session = open_session(&file, &config)?;
            session.set_treatment_time(&checked_time(time.as_deref())?);
            let change = session.step_dose(&label, &clock);
            save(&file, &session.commit(&clock))?;
            report(&change);
        }
        Some(Commands::Vitals { file, values, time }) => {
            let mut session = open_session(&file, &config)?;
            for pair in &values {
                let (name, value) = pair
                    .split_once('=')
                    .with_context(|| format!("expected field=value, got '{}'", pair))?;
                let field = VitalField::parse(&name.to_ascii_lowercase())
                    .with_context(|| format!("unknown vital field '{}'", name))?;
                session.set_vital(field, value);
            }
            session.set_vitals_time(&checked_time(time.as_deref())?);
            let snapshot = session.commit(&clock);
            save(&file, &snapshot)?;
            println!(
                "Recorded reading {} of patient {}",
                snapshot.vital_history.len(),
                snapshot.patient_number
            );
        }
        Some(Commands::Catalog) => {
            let catalog = ActionCatalog::tccc()?;
            for group in [
                ActionGroup::Medication,
                ActionGroup::Antibiotic,
                ActionGroup::Tourniquet,
                ActionGroup::Procedure,
                ActionGroup::VascularAccess,
            ] {
                println!("{}:", group.title());
                for entry in catalog.group(group) {
                    match &entry.indication {
                        Some(indication) => println!("  {} ({})", entry.label, indication),
                        None => println!("  {}", entry.label),
                    }
                }
            }
        }
        None => {
            println!("Use 'casualty --help' for commands");
        }
    }

    Ok(())
}
