use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use voter_simulation::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::Args;
use crate::sim::config_reader::*;
use crate::sim::openai::ChatOracle;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_sample;
mod openai;
mod report;

use crate::sim::io_common::LoadedVoter;

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The workbook {path} is empty"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number or a string holding one"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("Error reading line {lineno} of the CSV input"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} is too short"))]
    LineTooShort { lineno: usize },
    #[snafu(display("Missing required columns: {}", missing.join(", ")))]
    MissingColumns { missing: Vec<String> },
    #[snafu(display("Line {lineno}: invalid value {value:?} for column {column}"))]
    InvalidValue {
        lineno: usize,
        column: String,
        value: String,
    },

    #[snafu(display("The environment variable {var} must hold the API key of the oracle"))]
    MissingCredential { var: String },
    #[snafu(display("Could not create the HTTP client"))]
    HttpClient { source: reqwest::Error },

    #[snafu(display("Simulation error: {source}"))]
    Simulation { source: SimulationErrors },

    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CONTEST_NAME: &str = "Voter simulation";

/// Where the voter profiles come from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VoterSource {
    Csv(String),
    Excel {
        path: String,
        worksheet: Option<String>,
    },
    Sample,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OracleSettings {
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub timeout: Duration,
    pub structured_output: bool,
}

/// Everything a run needs, after merging the configuration file and the flags.
#[derive(PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub contest_name: String,
    pub sources: Vec<VoterSource>,
    pub historical_path: Option<String>,
    pub oracle: OracleSettings,
    pub rules: SimulationRules,
    pub replay: bool,
    pub out: Option<String>,
    pub votes_out: Option<String>,
    pub reference: Option<String>,
}

fn voter_source(
    provider: &str,
    path: Option<String>,
    worksheet: Option<String>,
) -> SimResult<VoterSource> {
    match (provider, path) {
        ("sample", _) => Ok(VoterSource::Sample),
        ("csv", Some(p)) => Ok(VoterSource::Csv(p)),
        ("xlsx", Some(p)) => Ok(VoterSource::Excel { path: p, worksheet }),
        ("csv", None) | ("xlsx", None) => {
            whatever!("Provider {} requires a file path", provider)
        }
        (x, _) => whatever!("Provider not implemented {:?}", x),
    }
}

fn resolve(root: &Path, p: &str) -> String {
    root.join(p).to_string_lossy().to_string()
}

/// Merges the configuration file (if any) with the command line flags.
///
/// `root` is the directory of the configuration file: the paths of the file are
/// relative to it. The flags take precedence over the file.
pub fn resolve_settings(
    args: &Args,
    config: &SimConfig,
    root: &Path,
) -> SimResult<RunSettings> {
    let output = config.output_settings.clone().unwrap_or_default();
    let oracle_cfg = config.oracle.clone().unwrap_or_default();
    let rules_cfg = config.rules.clone().unwrap_or_default();

    let sources: Vec<VoterSource> = match (&args.input, args.input_type.as_deref()) {
        (_, Some("sample")) => vec![VoterSource::Sample],
        (Some(p), input_type) => vec![voter_source(
            input_type.unwrap_or("csv"),
            Some(p.clone()),
            args.excel_worksheet_name.clone(),
        )?],
        (None, Some(x)) => {
            whatever!("Input type {} was given without an input file", x)
        }
        (None, None) if !config.voter_file_sources.is_empty() => {
            let mut res = Vec::new();
            for fs in config.voter_file_sources.iter() {
                res.push(voter_source(
                    fs.provider.as_str(),
                    fs.file_path.as_deref().map(|p| resolve(root, p)),
                    fs.excel_worksheet_name.clone(),
                )?);
            }
            res
        }
        (None, None) => vec![VoterSource::Sample],
    };

    let repetitions = match args.repetitions {
        Some(r) => r,
        None => match rules_cfg.repetitions.as_ref().map(read_js_int).transpose()? {
            Some(r) => u32::try_from(r).ok().context(ParsingJsonNumberSnafu {})?,
            None => SimulationRules::DEFAULT_RULES.repetitions,
        },
    };
    let simulation_weight = args
        .weight
        .or(rules_cfg.simulation_weight)
        .unwrap_or(SimulationRules::DEFAULT_RULES.simulation_weight);

    let timeout_seconds = oracle_cfg
        .timeout_seconds
        .as_ref()
        .map(read_js_int)
        .transpose()?
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    Ok(RunSettings {
        contest_name: output
            .contest_name
            .unwrap_or_else(|| DEFAULT_CONTEST_NAME.to_string()),
        sources,
        historical_path: args.historical.clone().or_else(|| {
            config
                .historical_file_path
                .as_deref()
                .map(|p| resolve(root, p))
        }),
        oracle: OracleSettings {
            model: args
                .model
                .clone()
                .or(oracle_cfg.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key_env: oracle_cfg
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            base_url: oracle_cfg
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_seconds),
            structured_output: oracle_cfg.structured_output.unwrap_or(true),
        },
        rules: SimulationRules {
            repetitions,
            simulation_weight,
        },
        replay: args.replay || rules_cfg.replay_recorded_votes.unwrap_or(false),
        out: args
            .out
            .clone()
            .or_else(|| output.output_path.as_deref().map(|p| resolve(root, p))),
        votes_out: args
            .votes_out
            .clone()
            .or_else(|| output.votes_path.as_deref().map(|p| resolve(root, p))),
        reference: args.reference.clone(),
    })
}

fn read_voters(sources: &[VoterSource]) -> SimResult<Vec<LoadedVoter>> {
    let mut data: Vec<LoadedVoter> = Vec::new();
    for source in sources {
        let mut source_data = match source {
            VoterSource::Csv(path) => io_csv::read_csv_voters_path(path)?,
            VoterSource::Excel { path, worksheet } => {
                io_excel::read_excel_voters(path, worksheet.as_deref())?
            }
            VoterSource::Sample => io_sample::sample_voters(),
        };
        info!("Read {} voters from {:?}", source_data.len(), source);
        data.append(&mut source_data);
    }
    Ok(data)
}

fn recorded_votes(voters: &[LoadedVoter]) -> SimResult<Vec<String>> {
    let mut res = Vec::with_capacity(voters.len());
    for (idx, v) in voters.iter().enumerate() {
        match &v.recorded_vote {
            Some(vote) => res.push(vote.clone()),
            None => whatever!(
                "Replaying votes requires a {} column: voter #{} has no recorded vote",
                io_common::VOTE_COLUMN,
                idx + 1
            ),
        }
    }
    Ok(res)
}

/// Runs a simulation end to end: reads the inputs, asks the oracle (or replays
/// the recorded votes) and writes the reports.
pub fn run_simulation(args: &Args) -> SimResult<()> {
    let (config, root): (SimConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (SimConfig::default(), PathBuf::new()),
    };
    debug!("config: {:?}", config);

    let settings = resolve_settings(args, &config, &root)?;
    info!("settings: {:?}", settings);
    settings.rules.validate().context(SimulationSnafu {})?;

    // The credential is checked before reading any voter.
    let oracle: Option<ChatOracle> = if settings.replay {
        None
    } else {
        Some(ChatOracle::from_settings(&settings.oracle)?)
    };

    let historical = match &settings.historical_path {
        Some(p) => io_csv::read_csv_historical_path(p)?,
        None => HistoricalTable::results_2020(),
    };
    info!("Historical data for {} states", historical.len());

    let loaded = read_voters(&settings.sources)?;
    let mut ctx = RunContext::new(historical);
    ctx.set_voters(loaded.iter().map(|lv| lv.record.clone()).collect());

    let status = match &oracle {
        None => {
            let votes = recorded_votes(&loaded)?;
            ctx.replay(&votes).context(SimulationSnafu {})?
        }
        Some(o) => {
            // No signal handling: the flag is only set through the library API.
            let cancel = CancellationFlag::new();
            ctx.simulate(o, &settings.rules, &cancel)
                .context(SimulationSnafu {})?
        }
    };
    if let RunStatus::Cancelled { processed } = status {
        warn!(
            "The simulation was cancelled after {} of {} voters",
            processed,
            loaded.len()
        );
    }

    let summary = report::build_summary(&settings, status, &mut ctx)?;
    report::log_tables(&mut ctx, settings.rules.simulation_weight)?;
    let pretty_js_stats = report::write_summary(&summary, settings.out.as_deref())?;
    if let Some(votes_p) = &settings.votes_out {
        report::write_votes(ctx.voters(), ctx.votes(), votes_p)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        report::check_reference(&pretty_js_stats, summary_p)?;
    }
    Ok(())
}
