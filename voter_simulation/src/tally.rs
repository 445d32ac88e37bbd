use log::{debug, info};
use std::collections::BTreeMap;

use crate::config::*;

/// Per-state tallies, keyed and ordered by uppercased state name.
pub type StateTallies = BTreeMap<String, StateTally>;

/// The winner of a state given its counts.
///
/// The larger of the two counts wins (Democrat when equal), then equal counts
/// are turned into a tie. Undecided voters are not considered.
pub fn state_winner(democrat: u64, republican: u64) -> Winner {
    let argmax = if republican > democrat {
        Winner::Republican
    } else {
        Winner::Democrat
    };
    if democrat == republican {
        Winner::Tie
    } else {
        argmax
    }
}

/// Counts the decisions per state and determines the winner of each state.
///
/// State names are uppercased, so that `"ohio"` and `"Ohio"` are counted together.
/// The output has one entry per distinct state and does not depend on the
/// order of the input. A record with an empty state name is rejected.
///
/// ```
/// use voter_simulation::{aggregate_by_state, VoteDecision, Winner};
///
/// let tallies = aggregate_by_state(vec![
///     ("Texas", VoteDecision::Democrat),
///     ("TEXAS", VoteDecision::Republican),
/// ])?;
/// let texas = &tallies["TEXAS"];
/// assert_eq!((texas.democrat, texas.republican, texas.undecided), (1, 1, 0));
/// assert_eq!(texas.winner, Winner::Tie);
/// # Ok::<(), voter_simulation::SimulationErrors>(())
/// ```
pub fn aggregate_by_state<'a, I>(votes: I) -> Result<StateTallies, SimulationErrors>
where
    I: IntoIterator<Item = (&'a str, VoteDecision)>,
{
    // (democrat, republican, undecided)
    let mut counts: BTreeMap<String, (u64, u64, u64)> = BTreeMap::new();
    let mut num_votes: usize = 0;
    for (idx, (state, decision)) in votes.into_iter().enumerate() {
        let key = normalize_state(state);
        if key.is_empty() {
            return Err(SimulationErrors::MissingField {
                record: idx,
                field: "STATE",
            });
        }
        let e = counts.entry(key).or_insert((0, 0, 0));
        match decision {
            VoteDecision::Democrat => e.0 += 1,
            VoteDecision::Republican => e.1 += 1,
            VoteDecision::Undecided => e.2 += 1,
        }
        num_votes += 1;
    }
    debug!(
        "aggregate_by_state: {} votes in {} states",
        num_votes,
        counts.len()
    );

    let tallies: StateTallies = counts
        .into_iter()
        .map(|(state, (democrat, republican, undecided))| {
            let t = StateTally {
                state: state.clone(),
                democrat,
                republican,
                undecided,
                winner: state_winner(democrat, republican),
            };
            (state, t)
        })
        .collect();
    for t in tallies.values() {
        info!(
            "{:>20}: {:>5} D {:>5} R {:>5} U -> {}",
            t.state, t.democrat, t.republican, t.undecided, t.winner
        );
    }
    Ok(tallies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoteDecision::*;

    fn pairs() -> Vec<(&'static str, VoteDecision)> {
        vec![
            ("Ohio", Democrat),
            ("Texas", Republican),
            ("ohio", Undecided),
            ("Georgia", Undecided),
            ("TEXAS", Republican),
            ("Texas ", Democrat),
            ("Georgia", Undecided),
        ]
    }

    #[test]
    fn counts_per_state() {
        let t = aggregate_by_state(pairs()).unwrap();
        assert_eq!(t.len(), 3);
        let keys: Vec<&String> = t.keys().collect();
        assert_eq!(keys, vec!["GEORGIA", "OHIO", "TEXAS"]);

        let ohio = &t["OHIO"];
        assert_eq!((ohio.democrat, ohio.republican, ohio.undecided), (1, 0, 1));
        assert_eq!(ohio.winner, Winner::Democrat);

        let texas = &t["TEXAS"];
        assert_eq!((texas.democrat, texas.republican, texas.undecided), (1, 2, 0));
        assert_eq!(texas.winner, Winner::Republican);
    }

    #[test]
    fn undecided_never_wins() {
        let t = aggregate_by_state(pairs()).unwrap();
        let georgia = &t["GEORGIA"];
        assert_eq!(georgia.undecided, 2);
        assert_eq!(georgia.winner, Winner::Tie);

        let t = aggregate_by_state(vec![
            ("Arizona", Undecided),
            ("Arizona", Undecided),
            ("Arizona", Republican),
        ])
        .unwrap();
        assert_eq!(t["ARIZONA"].winner, Winner::Republican);
    }

    #[test]
    fn winner_invariant() {
        for d in 0..6u64 {
            for r in 0..6u64 {
                let w = state_winner(d, r);
                assert_eq!(w == Winner::Tie, d == r, "{} {}", d, r);
                if d > r {
                    assert_eq!(w, Winner::Democrat);
                }
                if r > d {
                    assert_eq!(w, Winner::Republican);
                }
            }
        }
    }

    #[test]
    fn idempotent_and_order_independent() {
        let first = aggregate_by_state(pairs()).unwrap();
        let second = aggregate_by_state(pairs()).unwrap();
        assert_eq!(first, second);
        let mut reversed = pairs();
        reversed.reverse();
        assert_eq!(aggregate_by_state(reversed).unwrap(), first);
    }

    #[test]
    fn missing_state_fails() {
        let res = aggregate_by_state(vec![("Ohio", Democrat), ("  ", Republican)]);
        assert_eq!(
            res,
            Err(SimulationErrors::MissingField {
                record: 1,
                field: "STATE"
            })
        );
    }

    #[test]
    fn empty_input_gives_empty_tallies() {
        let t = aggregate_by_state(Vec::<(&str, VoteDecision)>::new()).unwrap();
        assert!(t.is_empty());
    }
}
