use log::debug;
use std::collections::BTreeMap;

use crate::config::*;
use crate::historical::HistoricalTable;
use crate::tally::StateTallies;

pub type ComparisonTable = BTreeMap<String, ComparisonRecord>;

fn is_correct(simulated: Winner, real: RealWinner) -> bool {
    matches!(
        (simulated, real),
        (Winner::Democrat, RealWinner::Democrat) | (Winner::Republican, RealWinner::Republican)
    )
}

/// Joins the simulated tallies with the historical results.
///
/// Every simulated state is kept. States without historical data get the
/// `No Real Data` winner and the `Unknown Block` label, and are never counted
/// as correct predictions. The inputs are not modified.
pub fn compare_with_historical(
    tallies: &StateTallies,
    historical: &HistoricalTable,
) -> ComparisonTable {
    tallies
        .values()
        .map(|t| {
            let real = historical.get(&t.state);
            let winner_real = real
                .map(|r| RealWinner::from(r.winner_real))
                .unwrap_or(RealWinner::NoRealData);
            let block = real
                .map(|r| BlockLabel::Known(r.block))
                .unwrap_or(BlockLabel::Unknown);
            if real.is_none() {
                debug!("compare_with_historical: no historical data for {}", t.state);
            }
            let rec = ComparisonRecord {
                state: t.state.clone(),
                democrat: t.democrat,
                republican: t.republican,
                undecided: t.undecided,
                winner_simulated: t.winner,
                democrat_real_percent: real.map(|r| r.democrat_real_percent),
                republican_real_percent: real.map(|r| r.republican_real_percent),
                winner_real,
                block,
                correct_prediction: is_correct(t.winner, winner_real),
            };
            (t.state.clone(), rec)
        })
        .collect()
}

/// How many states were called correctly.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct AccuracySummary {
    pub correct: usize,
    /// All the states in the comparison.
    pub compared: usize,
    /// The states that have historical data.
    pub with_real_data: usize,
}

impl AccuracySummary {
    /// The share of correct predictions over all the compared states, in percent.
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.compared == 0 {
            None
        } else {
            Some(self.correct as f64 / self.compared as f64 * 100.0)
        }
    }
}

pub fn prediction_accuracy(comparison: &ComparisonTable) -> AccuracySummary {
    AccuracySummary {
        correct: comparison.values().filter(|c| c.correct_prediction).count(),
        compared: comparison.len(),
        with_real_data: comparison
            .values()
            .filter(|c| c.winner_real != RealWinner::NoRealData)
            .count(),
    }
}
