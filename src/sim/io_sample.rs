// The built-in sample, used when no input is given.

use crate::sim::{io_common::LoadedVoter, *};

// (AGE, GENDER, STATE, EDUCATION_LEVEL, MARITAL_STATUS, OCCUPATION_DESCRIPTION, INCOME_LEVEL)
const SAMPLE: [(u32, &str, &str, &str, &str, &str, u8); 10] = [
    (25, "male", "California", "bachelor", "single", "engineer", 6),
    (40, "female", "Texas", "master", "married", "teacher", 4),
    (60, "female", "New York", "high_school", "widowed", "retired", 3),
    (35, "male", "Florida", "bachelor", "single", "manager", 7),
    (50, "male", "Ohio", "phd", "married", "scientist", 9),
    (45, "female", "Pennsylvania", "high_school", "single", "nurse", 5),
    (29, "male", "Illinois", "master", "married", "lawyer", 4),
    (38, "female", "Michigan", "bachelor", "single", "technician", 6),
    (67, "male", "Georgia", "high_school", "widowed", "consultant", 3),
    (53, "female", "Arizona", "master", "divorced", "artist", 7),
];

pub fn sample_voters() -> Vec<LoadedVoter> {
    SAMPLE
        .iter()
        .map(
            |(age, gender, state, education, marital, occupation, income)| LoadedVoter {
                record: VoterRecord {
                    age: *age,
                    gender: gender.to_string(),
                    state: state.to_string(),
                    education_level: education.to_string(),
                    marital_status: marital.to_string(),
                    occupation_description: occupation.to_string(),
                    income_level: *income,
                },
                recorded_vote: None,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_covers_the_historical_states() {
        let voters = sample_voters();
        assert_eq!(voters.len(), 10);
        let historical = HistoricalTable::results_2020();
        for v in voters.iter() {
            assert!(historical.get(&v.record.state).is_some(), "{:?}", v);
            assert!((1..=10).contains(&v.record.income_level));
        }
    }
}
