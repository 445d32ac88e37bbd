pub use crate::config::*;

use crate::blend::{adjust_with_historical, AdjustedTable};
use crate::compare::{compare_with_historical, ComparisonTable};
use crate::historical::HistoricalTable;
use crate::tally::{aggregate_by_state, StateTallies};

/// A builder for tallying votes that are already known, without any oracle.
///
/// ```
/// pub use voter_simulation::builder::Builder;
/// pub use voter_simulation::{HistoricalTable, SimulationRules, Winner};
/// # use voter_simulation::SimulationErrors;
///
/// let mut builder = Builder::new(&SimulationRules::DEFAULT_RULES)?
///     .historical(HistoricalTable::results_2020());
///
/// builder.add_vote_simple("Ohio", "2")?;
/// builder.add_vote_simple("Ohio", "1")?;
/// builder.add_vote_simple("Ohio", "2")?;
///
/// let comparison = builder.comparison()?;
/// assert_eq!(comparison["OHIO"].winner_simulated, Winner::Republican);
/// assert!(comparison["OHIO"].correct_prediction);
///
/// # Ok::<(), SimulationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: SimulationRules,
    pub(crate) _historical: HistoricalTable,
    pub(crate) _votes: Vec<(String, VoteDecision)>,
}

impl Builder {
    /// Only the weight of the rules is checked: the builder never calls an oracle.
    pub fn new(rules: &SimulationRules) -> Result<Builder, SimulationErrors> {
        check_weight(rules.simulation_weight)?;
        Ok(Builder {
            _rules: *rules,
            _historical: HistoricalTable::default(),
            _votes: Vec::new(),
        })
    }

    pub fn historical(self, table: HistoricalTable) -> Builder {
        Builder {
            _rules: self._rules,
            _historical: table,
            _votes: self._votes,
        }
    }

    /// Adds a single raw vote ("1", "2" or anything else for undecided).
    pub fn add_vote_simple(&mut self, state: &str, raw_vote: &str) -> Result<(), SimulationErrors> {
        self.add_vote(state, VoteDecision::from_raw(raw_vote), 1)
    }

    /// Adds `count` identical decisions for a state.
    ///
    /// The state must not be blank.
    pub fn add_vote(
        &mut self,
        state: &str,
        decision: VoteDecision,
        count: u32,
    ) -> Result<(), SimulationErrors> {
        if state.trim().is_empty() {
            return Err(SimulationErrors::MissingField {
                record: self._votes.len(),
                field: "STATE",
            });
        }
        for _ in 0..count {
            self._votes.push((state.to_string(), decision));
        }
        Ok(())
    }

    pub fn tallies(&self) -> Result<StateTallies, SimulationErrors> {
        aggregate_by_state(self._votes.iter().map(|(s, d)| (s.as_str(), *d)))
    }

    pub fn comparison(&self) -> Result<ComparisonTable, SimulationErrors> {
        Ok(compare_with_historical(&self.tallies()?, &self._historical))
    }

    /// The adjusted table, using the simulation weight of the rules.
    pub fn adjusted(&self) -> Result<AdjustedTable, SimulationErrors> {
        adjust_with_historical(
            &self.tallies()?,
            &self._historical,
            self._rules.simulation_weight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_expanded() {
        let mut b = Builder::new(&SimulationRules::DEFAULT_RULES).unwrap();
        b.add_vote("Texas", VoteDecision::Democrat, 3).unwrap();
        b.add_vote("texas", VoteDecision::Republican, 2).unwrap();
        b.add_vote_simple("Texas", "").unwrap();
        let t = b.tallies().unwrap();
        let texas = &t["TEXAS"];
        assert_eq!((texas.democrat, texas.republican, texas.undecided), (3, 2, 1));
        // Without history the weight plays no role.
        let adj = b.adjusted().unwrap();
        assert!((adj["TEXAS"].democrat_adj_pct - 60.0).abs() < 1e-9);
        assert!(!adj["TEXAS"].blended);
    }

    #[test]
    fn blank_state_is_rejected() {
        let mut b = Builder::new(&SimulationRules::DEFAULT_RULES).unwrap();
        b.add_vote_simple("Ohio", "1").unwrap();
        assert_eq!(
            b.add_vote_simple(" ", "1"),
            Err(SimulationErrors::MissingField {
                record: 1,
                field: "STATE"
            })
        );
    }

    #[test]
    fn invalid_rules() {
        let rules = SimulationRules {
            repetitions: 3,
            simulation_weight: 1.5,
        };
        assert!(Builder::new(&rules).is_err());
    }

    #[test]
    fn repetitions_are_not_needed() {
        let rules = SimulationRules {
            repetitions: 0,
            simulation_weight: 0.5,
        };
        let mut b = Builder::new(&rules).unwrap();
        b.add_vote_simple("Ohio", "1").unwrap();
        assert_eq!(b.tallies().unwrap()["OHIO"].democrat, 1);
    }
}
