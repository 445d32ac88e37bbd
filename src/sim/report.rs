// The reports of a run: JSON summary, log tables and the check against a reference.

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use std::fs;
use std::fs::File;
use text_diff::print_diff;

use crate::sim::*;

// Two decimals are enough for percentages and keep the summary stable.
fn pct(x: f64) -> JSValue {
    json!((x * 100.0).round() / 100.0)
}

pub fn tallies_to_json(tallies: &StateTallies) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (state, t) in tallies.iter() {
        m.insert(
            state.clone(),
            json!({
                "democrat": t.democrat,
                "republican": t.republican,
                "undecided": t.undecided,
                "winner": t.winner.as_str(),
            }),
        );
    }
    JSValue::Object(m)
}

pub fn comparison_to_json(comparison: &ComparisonTable) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (state, c) in comparison.iter() {
        m.insert(
            state.clone(),
            json!({
                "democrat": c.democrat,
                "republican": c.republican,
                "undecided": c.undecided,
                "winnerSimulated": c.winner_simulated.as_str(),
                "democratRealPercent": c.democrat_real_percent.map(pct),
                "republicanRealPercent": c.republican_real_percent.map(pct),
                "winnerReal": c.winner_real.as_str(),
                "block": c.block.to_string(),
                "correctPrediction": c.correct_prediction,
            }),
        );
    }
    JSValue::Object(m)
}

pub fn adjusted_to_json(adjusted: &AdjustedTable) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (state, a) in adjusted.iter() {
        m.insert(
            state.clone(),
            json!({
                "democratSimulatedPercent": pct(a.democrat_sim_pct),
                "republicanSimulatedPercent": pct(a.republican_sim_pct),
                "democratAdjustedPercent": pct(a.democrat_adj_pct),
                "republicanAdjustedPercent": pct(a.republican_adj_pct),
                "winnerAdjusted": a.winner_adjusted.as_str(),
                "blended": a.blended,
            }),
        );
    }
    JSValue::Object(m)
}

/// One entry per processed voter, in input order.
///
/// The sample counts are null for replayed votes.
pub fn votes_to_json(votes: &[SimulatedVote]) -> JSValue {
    let entries: Vec<JSValue> = votes
        .iter()
        .map(|v| {
            json!({
                "state": v.state,
                "rawVote": v.raw_vote,
                "decision": v.decision.as_str(),
                "samples": v.outcome.map(|o| json!({
                    "count1": o.count_1,
                    "count2": o.count_2,
                    "invalid": o.invalid,
                    "failed": o.failed,
                })),
            })
        })
        .collect();
    JSValue::Array(entries)
}

fn status_to_json(status: RunStatus) -> JSValue {
    match status {
        RunStatus::Completed => json!({"status": "completed"}),
        RunStatus::Cancelled { processed } => {
            json!({"status": "cancelled", "processed": processed})
        }
    }
}

/// Assembles the summary of a run.
pub fn build_summary(
    settings: &RunSettings,
    status: RunStatus,
    ctx: &mut RunContext,
) -> SimResult<JSValue> {
    let weight = settings.rules.simulation_weight;
    let num_voters = ctx.voters().len();
    let num_votes = ctx.votes().len();
    let voters = votes_to_json(ctx.votes());
    let tallies = tallies_to_json(ctx.tallies().context(SimulationSnafu {})?);
    let comparison_table = ctx.comparison().context(SimulationSnafu {})?;
    let accuracy = prediction_accuracy(comparison_table);
    let comparison = comparison_to_json(comparison_table);
    let adjusted = adjusted_to_json(ctx.adjusted(weight).context(SimulationSnafu {})?);
    let source = if settings.replay { "replay" } else { "oracle" };

    Ok(json!({
        "config": {
            "contest": settings.contest_name,
            "source": source,
            "repetitions": settings.rules.repetitions,
            "simulationWeight": weight,
        },
        "run": status_to_json(status),
        "numVoters": num_voters,
        "numVotes": num_votes,
        "voters": voters,
        "tallies": tallies,
        "comparison": comparison,
        "accuracy": {
            "correct": accuracy.correct,
            "compared": accuracy.compared,
            "withRealData": accuracy.with_real_data,
            "percent": accuracy.accuracy_percent().map(pct),
        },
        "adjusted": adjusted,
    }))
}

/// Logs the comparison and the adjusted tables as text.
pub fn log_tables(ctx: &mut RunContext, weight: f64) -> SimResult<()> {
    info!(
        "{:>20} {:>10} {:>12} {:>20} {:>8}",
        "state", "simulated", "real", "block", "correct"
    );
    for c in ctx.comparison().context(SimulationSnafu {})?.values() {
        info!(
            "{:>20} {:>10} {:>12} {:>20} {:>8}",
            c.state,
            c.winner_simulated.as_str(),
            c.winner_real.as_str(),
            c.block.to_string(),
            c.correct_prediction
        );
    }
    let accuracy = prediction_accuracy(ctx.comparison().context(SimulationSnafu {})?);
    match accuracy.accuracy_percent() {
        Some(p) => info!(
            "Prediction accuracy: {:.1}% ({} of {} states)",
            p, accuracy.correct, accuracy.compared
        ),
        None => info!("Prediction accuracy: no state to compare"),
    }

    info!("Adjusted results with a simulation weight of {}", weight);
    for a in ctx.adjusted(weight).context(SimulationSnafu {})?.values() {
        info!(
            "{:>20} {:>7.2}% D {:>7.2}% R -> {}",
            a.state,
            a.democrat_adj_pct,
            a.republican_adj_pct,
            a.winner_adjusted.as_str()
        );
    }
    Ok(())
}

/// Writes the pretty-printed summary to the given file, or to the standard output.
///
/// Returns the text that was written.
pub fn write_summary(summary: &JSValue, out: Option<&str>) -> SimResult<String> {
    let pretty_js_stats = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    match out {
        None | Some("") | Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingOutputSnafu { path })?;
            info!("Summary written to {}", path);
        }
    }
    Ok(pretty_js_stats)
}

/// Writes the voters and their votes to a CSV file that `--replay` accepts.
pub fn write_votes(voters: &[VoterRecord], votes: &[SimulatedVote], path: &str) -> SimResult<()> {
    let f = File::create(path).context(WritingOutputSnafu { path })?;
    io_csv::write_csv_votes(voters, votes, f).context(WritingCsvSnafu { path })?;
    info!("{} votes written to {}", votes.len(), path);
    Ok(())
}

/// Fails if the summary differs from the reference summary stored at `path`.
pub fn check_reference(pretty_js_stats: &str, path: &str) -> SimResult<()> {
    let summary_ref = read_summary(path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RunSettings {
        RunSettings {
            contest_name: "test".to_string(),
            sources: vec![VoterSource::Sample],
            historical_path: None,
            oracle: OracleSettings {
                model: DEFAULT_MODEL.to_string(),
                api_key_env: DEFAULT_API_KEY_ENV.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
                structured_output: true,
            },
            rules: SimulationRules::DEFAULT_RULES,
            replay: true,
            out: None,
            votes_out: None,
            reference: None,
        }
    }

    fn context() -> RunContext {
        let mut ctx = RunContext::new(HistoricalTable::results_2020());
        let voters: Vec<VoterRecord> = io_sample::sample_voters()
            .into_iter()
            .map(|lv| lv.record)
            .collect();
        ctx.set_voters(voters);
        // California, Texas and New York vote 1, the others 2.
        let votes: Vec<String> = (0..10)
            .map(|i| if i < 3 { "1" } else { "2" }.to_string())
            .collect();
        ctx.replay(&votes).unwrap();
        ctx
    }

    #[test]
    fn summary_tables() {
        let mut ctx = context();
        let js = build_summary(&settings(), RunStatus::Completed, &mut ctx).unwrap();
        assert_eq!(js["run"]["status"], json!("completed"));
        assert_eq!(js["numVoters"], json!(10));
        assert_eq!(js["numVotes"], json!(10));
        let voters = js["voters"].as_array().unwrap();
        assert_eq!(voters.len(), 10);
        assert_eq!(voters[1]["state"], json!("Texas"));
        assert_eq!(voters[1]["rawVote"], json!("1"));
        assert_eq!(voters[1]["decision"], json!("Democrat"));
        // Replayed votes carry no sample counts.
        assert_eq!(voters[1]["samples"], JSValue::Null);
        assert_eq!(js["tallies"]["TEXAS"]["winner"], json!("Democrat"));
        assert_eq!(js["comparison"]["TEXAS"]["winnerReal"], json!("Republican"));
        assert_eq!(js["comparison"]["OHIO"]["correctPrediction"], json!(true));
        // TEXAS: 0.8 * 100 + 0.2 * 46.5
        assert_eq!(js["adjusted"]["TEXAS"]["democratAdjustedPercent"], json!(89.3));
        // CA, NY, FL, OH: 4 of 10
        assert_eq!(js["accuracy"]["correct"], json!(4));
        assert_eq!(js["accuracy"]["percent"], json!(40.0));
        assert!(log_tables(&mut ctx, 0.8).is_ok());
    }

    #[test]
    fn simulated_voters_carry_their_samples() {
        let mut ctx = RunContext::new(HistoricalTable::results_2020());
        let voters: Vec<VoterRecord> = io_sample::sample_voters()
            .into_iter()
            .take(2)
            .map(|lv| lv.record)
            .collect();
        ctx.set_voters(voters);
        let oracle = ScriptedOracle::from_values(&[2, 2, 7, 1, 1, 2]);
        let rules = SimulationRules {
            repetitions: 3,
            simulation_weight: 0.8,
        };
        ctx.simulate(&oracle, &rules, &CancellationFlag::new())
            .unwrap();
        let js = votes_to_json(ctx.votes());
        assert_eq!(
            js[0],
            json!({
                "state": "California",
                "rawVote": "2",
                "decision": "Republican",
                "samples": {"count1": 0, "count2": 2, "invalid": 1, "failed": 0},
            })
        );
        assert_eq!(js[1]["samples"]["count1"], json!(2));
        assert_eq!(js[1]["samples"]["count2"], json!(1));
    }

    #[test]
    fn written_votes_can_be_replayed() {
        let mut ctx = context();
        let mut buf: Vec<u8> = Vec::new();
        io_csv::write_csv_votes(ctx.voters(), ctx.votes(), &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(
            "AGE,GENDER,STATE,EDUCATION_LEVEL,MARITAL_STATUS,OCCUPATION_DESCRIPTION,INCOME_LEVEL,VOTE\n"
        ));

        let loaded = io_csv::read_csv_voters(buf.as_slice()).unwrap();
        let records: Vec<VoterRecord> = loaded.iter().map(|lv| lv.record.clone()).collect();
        assert_eq!(records.as_slice(), ctx.voters());
        let recorded: Vec<String> = loaded
            .iter()
            .map(|lv| lv.recorded_vote.clone().unwrap())
            .collect();

        let mut replayed = RunContext::new(HistoricalTable::results_2020());
        replayed.set_voters(records);
        replayed.replay(&recorded).unwrap();
        assert_eq!(
            replayed.tallies().unwrap().clone(),
            ctx.tallies().unwrap().clone()
        );
    }

    #[test]
    fn cannot_write_votes_in_missing_dir() {
        let ctx = context();
        assert!(matches!(
            write_votes(ctx.voters(), ctx.votes(), "/nonexistent/dir/votes.csv"),
            Err(SimError::WritingOutput { .. })
        ));
    }

    #[test]
    fn cancelled_status() {
        assert_eq!(
            status_to_json(RunStatus::Cancelled { processed: 4 }),
            json!({"status": "cancelled", "processed": 4})
        );
    }

    #[test]
    fn missing_reference() {
        assert!(check_reference("{}", "/nonexistent/summary.json").is_err());
    }
}
