/*!
Simulation of an election from individual voter profiles.

Each voter profile is turned into a prompt, an external oracle (typically a
language model) is asked several times which ballot option the voter would pick,
and the answers are reduced to one decision per voter. The decisions are then
tallied per state, compared with historical results and blended with them.

The oracle is abstracted behind [`OracleCapability`], so that the whole pipeline
can run with a [`ScriptedOracle`] in tests.

See the [manual] for the command line program built on this library.
*/

pub mod blend;
pub mod builder;
mod compare;
mod config;
pub mod context;
mod ensemble;
mod historical;
pub mod manual;
mod oracle;
mod prompt;
mod tally;

use log::{debug, info};

pub use crate::blend::*;
pub use crate::compare::*;
pub use crate::config::*;
pub use crate::context::*;
pub use crate::ensemble::*;
pub use crate::historical::*;
pub use crate::oracle::*;
pub use crate::prompt::*;
pub use crate::tally::*;

/// The decision taken for one voter.
#[derive(PartialEq, Debug, Clone)]
pub struct SimulatedVote {
    /// The state as given in the voter record.
    pub state: String,
    /// "1", "2" or "Undecided".
    pub raw_vote: String,
    pub decision: VoteDecision,
    /// Not present for replayed votes.
    pub outcome: Option<EnsembleOutcome>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RunStatus {
    Completed,
    /// The run was stopped after `processed` voters.
    Cancelled { processed: usize },
}

/// Runs the ensemble vote for every voter, in order.
///
/// Arguments:
/// * `voters` the voter profiles
/// * `historical` the historical results, used to describe the state of each voter
/// * `oracle` the oracle to ask
/// * `rules` the number of repetitions per voter
/// * `cancel` checked before each voter. When it is set, the votes collected so far
///   are returned with a `Cancelled` status.
///
/// The output has one vote per processed voter, in the order of the input.
pub fn simulate_votes<O: OracleCapability + ?Sized>(
    voters: &[VoterRecord],
    historical: &HistoricalTable,
    oracle: &O,
    rules: &SimulationRules,
    cancel: &CancellationFlag,
) -> Result<(Vec<SimulatedVote>, RunStatus), SimulationErrors> {
    rules.validate()?;
    info!(
        "Simulating {} voters with {} repetitions each",
        voters.len(),
        rules.repetitions
    );
    let mut votes: Vec<SimulatedVote> = Vec::with_capacity(voters.len());
    for (idx, voter) in voters.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Simulation cancelled after {} voters", idx);
            return Ok((votes, RunStatus::Cancelled { processed: idx }));
        }
        let prompt = build_prompt(voter, historical);
        debug!("simulate_votes: voter {}: prompt: {}", idx, prompt);
        let outcome = run_repeated_votes(&prompt, oracle, rules.repetitions)?;
        info!(
            "Voter {}/{} ({}, {}): {} ({} x 1, {} x 2, {} invalid, {} failed)",
            idx + 1,
            voters.len(),
            voter.age,
            voter.state,
            outcome.decision,
            outcome.count_1,
            outcome.count_2,
            outcome.invalid,
            outcome.failed
        );
        votes.push(SimulatedVote {
            state: voter.state.clone(),
            raw_vote: outcome.decision.raw_vote().to_string(),
            decision: outcome.decision,
            outcome: Some(outcome),
        });
    }
    Ok((votes, RunStatus::Completed))
}

/// Uses votes recorded in a previous run instead of calling the oracle.
///
/// There must be exactly one recorded vote per voter.
pub fn replay_votes(
    voters: &[VoterRecord],
    recorded: &[String],
) -> Result<Vec<SimulatedVote>, SimulationErrors> {
    if voters.len() != recorded.len() {
        return Err(SimulationErrors::ReplayMismatch {
            voters: voters.len(),
            votes: recorded.len(),
        });
    }
    info!("Replaying {} recorded votes", recorded.len());
    Ok(voters
        .iter()
        .zip(recorded.iter())
        .map(|(v, raw)| {
            let decision = VoteDecision::from_raw(raw);
            SimulatedVote {
                state: v.state.clone(),
                raw_vote: decision.raw_vote().to_string(),
                decision,
                outcome: None,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn voter(age: u32, state: &str) -> VoterRecord {
        VoterRecord {
            age,
            gender: "male".to_string(),
            state: state.to_string(),
            education_level: "bachelor".to_string(),
            marital_status: "single".to_string(),
            occupation_description: "engineer".to_string(),
            income_level: 6,
        }
    }

    #[test]
    fn one_vote_per_voter_in_order() {
        init();
        let voters = vec![voter(25, "Ohio"), voter(40, "Texas"), voter(60, "Vermont")];
        let oracle = ScriptedOracle::from_values(&[2, 2, 1, 1, 2, 1]);
        let rules = SimulationRules {
            repetitions: 2,
            simulation_weight: 0.8,
        };
        let (votes, status) = simulate_votes(
            &voters,
            &HistoricalTable::results_2020(),
            &oracle,
            &rules,
            &CancellationFlag::new(),
        )
        .unwrap();
        assert_eq!(status, RunStatus::Completed);
        let raw: Vec<&str> = votes.iter().map(|v| v.raw_vote.as_str()).collect();
        // The last voter has a 1/1 tie.
        assert_eq!(raw, vec!["2", "1", "1"]);
        assert_eq!(votes[1].state, "Texas");
        assert_eq!(oracle.calls(), 6);
    }

    #[test]
    fn failures_make_undecided_voters() {
        init();
        let voters = vec![voter(30, "Georgia")];
        let (votes, _) = simulate_votes(
            &voters,
            &HistoricalTable::results_2020(),
            &ScriptedOracle::unavailable(),
            &SimulationRules::DEFAULT_RULES,
            &CancellationFlag::new(),
        )
        .unwrap();
        assert_eq!(votes[0].decision, VoteDecision::Undecided);
        assert_eq!(votes[0].raw_vote, "Undecided");
        assert_eq!(votes[0].outcome.map(|o| o.failed), Some(3));
    }

    #[test]
    fn invalid_rules_stop_early() {
        let oracle = ScriptedOracle::from_values(&[1]);
        let rules = SimulationRules {
            repetitions: 0,
            simulation_weight: 0.8,
        };
        let res = simulate_votes(
            &[voter(30, "Ohio")],
            &HistoricalTable::default(),
            &oracle,
            &rules,
            &CancellationFlag::new(),
        );
        assert_eq!(res, Err(SimulationErrors::NoRepetitions));
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(!flag.is_cancelled());
        other.cancel();
        assert!(flag.is_cancelled());
        let (votes, status) = simulate_votes(
            &[voter(30, "Ohio")],
            &HistoricalTable::default(),
            &ScriptedOracle::from_values(&[1, 1, 1]),
            &SimulationRules::DEFAULT_RULES,
            &flag,
        )
        .unwrap();
        assert!(votes.is_empty());
        assert_eq!(status, RunStatus::Cancelled { processed: 0 });
    }

    #[test]
    fn replay_normalizes_raw_votes() {
        let voters = vec![voter(30, "Ohio"), voter(31, "Ohio"), voter(32, "Texas")];
        let recorded = vec![" 1".to_string(), "x".to_string(), "2".to_string()];
        let votes = replay_votes(&voters, &recorded).unwrap();
        let decisions: Vec<VoteDecision> = votes.iter().map(|v| v.decision).collect();
        assert_eq!(
            decisions,
            vec![
                VoteDecision::Democrat,
                VoteDecision::Undecided,
                VoteDecision::Republican
            ]
        );
        assert_eq!(votes[0].raw_vote, "1");
        assert!(votes.iter().all(|v| v.outcome.is_none()));
        assert!(replay_votes(&voters, &recorded[..2]).is_err());
    }
}
