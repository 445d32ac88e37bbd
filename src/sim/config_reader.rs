use crate::sim::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "votesPath")]
    pub votes_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    pub model: Option<String>,
    /// The name of the environment variable holding the API key.
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<JSValue>,
    #[serde(rename = "structuredOutput")]
    pub structured_output: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    pub repetitions: Option<JSValue>,
    #[serde(rename = "simulationWeight")]
    pub simulation_weight: Option<f64>,
    #[serde(rename = "replayRecordedVotes")]
    pub replay_recorded_votes: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "voterFileSources", default)]
    pub voter_file_sources: Vec<FileSource>,
    #[serde(rename = "historicalFilePath")]
    pub historical_file_path: Option<String>,
    pub oracle: Option<OracleConfig>,
    pub rules: Option<RulesConfig>,
}

pub fn read_config(path: &str) -> SimResult<SimConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SimConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Reads a summary previously written by `votesim`.
pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Numbers may be given either as JSON numbers or as strings.
pub fn read_js_int(x: &JSValue) -> SimResult<u64> {
    match x {
        JSValue::Number(n) => n.as_u64().context(ParsingJsonNumberSnafu {}),
        JSValue::String(s) => s.trim().parse::<u64>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
