use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::blend::{adjust_with_historical, AdjustedTable};
use crate::compare::{compare_with_historical, ComparisonTable};
use crate::config::*;
use crate::historical::HistoricalTable;
use crate::oracle::OracleCapability;
use crate::tally::{aggregate_by_state, StateTallies};
use crate::{replay_votes, simulate_votes, RunStatus, SimulatedVote};

/// A flag to stop a long simulation between two voters.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// (a signal handler for example) while the run holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> CancellationFlag {
        CancellationFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The state of one simulation run, owned by the caller.
///
/// The derived tables are computed on demand and kept until their inputs change:
/// - replacing the voters discards the votes and every table,
/// - new votes discard the tallies, the comparison and the adjusted table,
/// - the adjusted table is recomputed when it is requested with another weight.
#[derive(Debug, Clone)]
pub struct RunContext {
    historical: HistoricalTable,
    voters: Vec<VoterRecord>,
    votes: Vec<SimulatedVote>,
    status: Option<RunStatus>,
    tallies: Option<StateTallies>,
    comparison: Option<ComparisonTable>,
    // The weight used for the cached table.
    adjusted: Option<(f64, AdjustedTable)>,
}

impl RunContext {
    pub fn new(historical: HistoricalTable) -> RunContext {
        RunContext {
            historical,
            voters: Vec::new(),
            votes: Vec::new(),
            status: None,
            tallies: None,
            comparison: None,
            adjusted: None,
        }
    }

    pub fn historical(&self) -> &HistoricalTable {
        &self.historical
    }

    pub fn voters(&self) -> &[VoterRecord] {
        &self.voters
    }

    pub fn set_voters(&mut self, voters: Vec<VoterRecord>) {
        debug!("RunContext::set_voters: {} voters", voters.len());
        self.voters = voters;
        self.set_votes(Vec::new(), None);
    }

    pub fn votes(&self) -> &[SimulatedVote] {
        &self.votes
    }

    /// The status of the last run, if any.
    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    fn set_votes(&mut self, votes: Vec<SimulatedVote>, status: Option<RunStatus>) {
        self.votes = votes;
        self.status = status;
        self.tallies = None;
        self.comparison = None;
        self.adjusted = None;
    }

    /// Asks the oracle for the vote of every voter.
    ///
    /// If the run is cancelled, the votes collected so far are kept.
    pub fn simulate<O: OracleCapability + ?Sized>(
        &mut self,
        oracle: &O,
        rules: &SimulationRules,
        cancel: &CancellationFlag,
    ) -> Result<RunStatus, SimulationErrors> {
        let (votes, status) =
            simulate_votes(&self.voters, &self.historical, oracle, rules, cancel)?;
        info!("RunContext::simulate: {:?} with {} votes", status, votes.len());
        self.set_votes(votes, Some(status));
        Ok(status)
    }

    /// Uses recorded raw votes (one per voter, in order) instead of the oracle.
    pub fn replay(&mut self, recorded: &[String]) -> Result<RunStatus, SimulationErrors> {
        let votes = replay_votes(&self.voters, recorded)?;
        let status = RunStatus::Completed;
        self.set_votes(votes, Some(status));
        Ok(status)
    }

    fn current_tallies(&mut self) -> Result<StateTallies, SimulationErrors> {
        let tallies = match self.tallies.take() {
            Some(t) => t,
            None => {
                aggregate_by_state(self.votes.iter().map(|v| (v.state.as_str(), v.decision)))?
            }
        };
        self.tallies = Some(tallies.clone());
        Ok(tallies)
    }

    pub fn tallies(&mut self) -> Result<&StateTallies, SimulationErrors> {
        let tallies = self.current_tallies()?;
        Ok(&*self.tallies.insert(tallies))
    }

    pub fn comparison(&mut self) -> Result<&ComparisonTable, SimulationErrors> {
        let comparison = match self.comparison.take() {
            Some(c) => c,
            None => {
                let tallies = self.current_tallies()?;
                compare_with_historical(&tallies, &self.historical)
            }
        };
        Ok(&*self.comparison.insert(comparison))
    }

    pub fn adjusted(&mut self, weight: f64) -> Result<&AdjustedTable, SimulationErrors> {
        let weight = check_weight(weight)?;
        let table = match self.adjusted.take() {
            Some((w, table)) if w == weight => table,
            _ => {
                debug!("RunContext::adjusted: computing with weight {}", weight);
                let tallies = self.current_tallies()?;
                adjust_with_historical(&tallies, &self.historical, weight)?
            }
        };
        Ok(&self.adjusted.insert((weight, table)).1)
    }
}
