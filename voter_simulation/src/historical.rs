use log::debug;
use std::collections::BTreeMap;

use crate::config::*;

/// Historical per-state results, keyed by uppercased state name.
///
/// The table is read-only once built. Lookups normalize the state name, so
/// `"Ohio"`, `"ohio "` and `"OHIO"` designate the same row.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct HistoricalTable {
    records: BTreeMap<String, HistoricalRecord>,
}

impl HistoricalTable {
    /// Builds a table from a list of records. The state keys are normalized,
    /// and two records for the same state are rejected.
    pub fn new(records: Vec<HistoricalRecord>) -> Result<HistoricalTable, SimulationErrors> {
        let mut m: BTreeMap<String, HistoricalRecord> = BTreeMap::new();
        for r in records {
            let key = normalize_state(&r.state);
            if m.contains_key(&key) {
                return Err(SimulationErrors::DuplicateState(key));
            }
            m.insert(key.clone(), HistoricalRecord { state: key, ..r });
        }
        debug!("HistoricalTable::new: {} states", m.len());
        Ok(HistoricalTable { records: m })
    }

    /// The 2020 presidential results for the ten states of the default sample.
    pub fn results_2020() -> HistoricalTable {
        use crate::config::Party::*;
        use crate::config::PoliticalBlock::*;
        let rows: [(&str, f64, f64, Party, PoliticalBlock); 10] = [
            ("CALIFORNIA", 63.5, 34.3, Democrat, SolidlyDemocratic),
            ("TEXAS", 46.5, 52.1, Republican, SolidlyRepublican),
            ("NEW YORK", 60.9, 37.7, Democrat, SolidlyDemocratic),
            ("FLORIDA", 47.9, 51.2, Republican, SwingState),
            ("OHIO", 45.2, 53.3, Republican, SwingState),
            ("PENNSYLVANIA", 50.0, 48.8, Democrat, SwingState),
            ("ILLINOIS", 57.9, 40.6, Democrat, SolidlyDemocratic),
            ("MICHIGAN", 50.6, 47.8, Democrat, SwingState),
            ("GEORGIA", 49.5, 49.3, Democrat, SwingState),
            ("ARIZONA", 49.4, 49.1, Democrat, SwingState),
        ];
        let records = rows
            .iter()
            .map(|(state, dem, rep, winner, block)| {
                (
                    state.to_string(),
                    HistoricalRecord {
                        state: state.to_string(),
                        democrat_real_percent: *dem,
                        republican_real_percent: *rep,
                        winner_real: *winner,
                        block: *block,
                    },
                )
            })
            .collect();
        HistoricalTable { records }
    }

    pub fn get(&self, state: &str) -> Option<&HistoricalRecord> {
        self.records.get(&normalize_state(state))
    }

    pub fn block_for(&self, state: &str) -> Option<PoliticalBlock> {
        self.get(state).map(|r| r.block)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records, in state order.
    pub fn iter(&self) -> impl Iterator<Item = &HistoricalRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str) -> HistoricalRecord {
        HistoricalRecord {
            state: state.to_string(),
            democrat_real_percent: 50.0,
            republican_real_percent: 49.0,
            winner_real: Party::Democrat,
            block: PoliticalBlock::SwingState,
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let t = HistoricalTable::results_2020();
        assert_eq!(t.len(), 10);
        let ohio = t.get("ohio").unwrap();
        assert_eq!(ohio.state, "OHIO");
        assert_eq!(ohio.winner_real, Party::Republican);
        assert_eq!(t.block_for(" Texas"), Some(PoliticalBlock::SolidlyRepublican));
        assert_eq!(t.get("Vermont"), None);
    }

    #[test]
    fn keys_are_normalized() {
        let t = HistoricalTable::new(vec![record("Nevada ")]).unwrap();
        assert_eq!(t.get("NEVADA").unwrap().state, "NEVADA");
    }

    #[test]
    fn duplicates_are_rejected() {
        let res = HistoricalTable::new(vec![record("Nevada"), record("NEVADA")]);
        assert_eq!(res, Err(SimulationErrors::DuplicateState("NEVADA".to_string())));
    }
}
