use log::debug;
use std::collections::BTreeMap;

use crate::config::*;
use crate::historical::HistoricalTable;
use crate::tally::StateTallies;

pub type AdjustedTable = BTreeMap<String, AdjustedRecord>;

/// The simulated shares of the two parties, in percent of the decided votes.
///
/// A state where nobody picked a party has shares of 0 for both.
pub fn simulated_shares(democrat: u64, republican: u64) -> (f64, f64) {
    let total = democrat + republican;
    if total == 0 {
        (0.0, 0.0)
    } else {
        (
            democrat as f64 / total as f64 * 100.0,
            republican as f64 / total as f64 * 100.0,
        )
    }
}

fn adjusted_winner(democrat_pct: f64, republican_pct: f64) -> Winner {
    if democrat_pct > republican_pct {
        Winner::Democrat
    } else if democrat_pct < republican_pct {
        Winner::Republican
    } else {
        Winner::Tie
    }
}

/// Blends the simulated shares of one state with its historical shares.
///
/// With historical data, each share is `weight * simulated + (1 - weight) * historical`.
/// Without historical data, the simulated shares are used as they are and the
/// weight plays no role.
pub fn blend_state(
    tally: &StateTally,
    historical: Option<&HistoricalRecord>,
    weight: f64,
) -> AdjustedRecord {
    let (sim_dem, sim_rep) = simulated_shares(tally.democrat, tally.republican);
    let (adj_dem, adj_rep) = match historical {
        Some(h) => (
            (weight * sim_dem) + ((1.0 - weight) * h.democrat_real_percent),
            (weight * sim_rep) + ((1.0 - weight) * h.republican_real_percent),
        ),
        None => (sim_dem, sim_rep),
    };
    AdjustedRecord {
        state: tally.state.clone(),
        democrat_sim_pct: sim_dem,
        republican_sim_pct: sim_rep,
        democrat_adj_pct: adj_dem,
        republican_adj_pct: adj_rep,
        winner_adjusted: adjusted_winner(adj_dem, adj_rep),
        blended: historical.is_some(),
    }
}

/// Blends every simulated state with the historical results.
///
/// `weight` is the share given to the simulation and must be within [0, 1].
///
/// ```
/// use voter_simulation::*;
///
/// let tallies = aggregate_by_state(vec![
///     ("Texas", VoteDecision::Democrat),
///     ("Texas", VoteDecision::Democrat),
///     ("Texas", VoteDecision::Democrat),
///     ("Texas", VoteDecision::Republican),
///     ("Texas", VoteDecision::Republican),
/// ])?;
/// let adjusted = adjust_with_historical(&tallies, &HistoricalTable::results_2020(), 0.8)?;
/// // 0.8 * 60 + 0.2 * 46.5
/// assert!((adjusted["TEXAS"].democrat_adj_pct - 57.3).abs() < 1e-9);
/// # Ok::<(), SimulationErrors>(())
/// ```
pub fn adjust_with_historical(
    tallies: &StateTallies,
    historical: &HistoricalTable,
    weight: f64,
) -> Result<AdjustedTable, SimulationErrors> {
    let weight = check_weight(weight)?;
    let res: AdjustedTable = tallies
        .values()
        .map(|t| {
            let rec = blend_state(t, historical.get(&t.state), weight);
            debug!(
                "adjust_with_historical: {}: {:.2} D {:.2} R -> {}",
                rec.state, rec.democrat_adj_pct, rec.republican_adj_pct, rec.winner_adjusted
            );
            (t.state.clone(), rec)
        })
        .collect();
    Ok(res)
}
