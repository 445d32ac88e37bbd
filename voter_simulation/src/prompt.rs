use crate::config::*;
use crate::historical::HistoricalTable;

/// The ballot offered to every simulated voter, in order.
pub const BALLOT_OPTIONS: [(&str, &str); 2] = [
    ("1", "KAMALA D. HARRIS / TIM WALZ (Democratic)"),
    ("2", "DONALD J. TRUMP / J.D. VANCE (Republican)"),
];

/// The label describing the political lean of a state, as inserted in the prompt.
///
/// States that are missing from the historical table get a neutral label.
pub fn block_label(state: &str, historical: &HistoricalTable) -> &'static str {
    historical
        .block_for(state)
        .map(|b| b.label())
        .unwrap_or(PoliticalBlock::UNKNOWN_LABEL)
}

/// Renders the ballot question for one voter.
///
/// All the demographic attributes are embedded verbatim. The respondent is
/// asked to answer with a single number that designates one of the tickets.
///
/// ```
/// use voter_simulation::{build_prompt, HistoricalTable, VoterRecord};
///
/// let voter = VoterRecord {
///     age: 35,
///     gender: "female".to_string(),
///     state: "Florida".to_string(),
///     education_level: "bachelor".to_string(),
///     marital_status: "married".to_string(),
///     occupation_description: "teacher".to_string(),
///     income_level: 5,
/// };
/// let prompt = build_prompt(&voter, &HistoricalTable::results_2020());
/// assert!(prompt.contains("35-year-old female voter living in Florida"));
/// assert!(prompt.contains("swing state"));
/// ```
pub fn build_prompt(voter: &VoterRecord, historical: &HistoricalTable) -> String {
    let block = block_label(&voter.state, historical);
    let ballot: Vec<String> = BALLOT_OPTIONS
        .iter()
        .map(|(num, ticket)| format!("{}. {}", num, ticket))
        .collect();
    format!(
        "You are a {}-year-old {} voter living in {}, a state with {}. \
You have a {} education level. You are {} and work as a {}. \
Your household income is {} on a scale of 1 to 10.\n\n\
Please cast your vote in the 2024 U.S. presidential election:\n\
{}\n\
Respond with only the number 1 or 2.",
        voter.age,
        voter.gender,
        voter.state,
        block,
        voter.education_level,
        voter.marital_status,
        voter.occupation_description,
        voter.income_level,
        ballot.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(state: &str) -> VoterRecord {
        VoterRecord {
            age: 67,
            gender: "male".to_string(),
            state: state.to_string(),
            education_level: "high_school".to_string(),
            marital_status: "widowed".to_string(),
            occupation_description: "consultant".to_string(),
            income_level: 3,
        }
    }

    #[test]
    fn embeds_every_attribute() {
        let p = build_prompt(&voter("Georgia"), &HistoricalTable::results_2020());
        for needle in [
            "67-year-old",
            "male",
            "Georgia",
            "high_school",
            "widowed",
            "consultant",
            "income is 3 on a scale of 1 to 10",
            "swing state",
            "1. KAMALA D. HARRIS / TIM WALZ (Democratic)",
            "2. DONALD J. TRUMP / J.D. VANCE (Republican)",
            "Respond with only the number 1 or 2.",
        ] {
            assert!(p.contains(needle), "missing {:?} in {}", needle, p);
        }
    }

    #[test]
    fn block_lookup_ignores_case() {
        let t = HistoricalTable::results_2020();
        assert_eq!(block_label("new york", &t), "solidly Democratic");
        assert_eq!(block_label("TEXAS", &t), "solidly Republican");
    }

    #[test]
    fn unknown_state_falls_back() {
        let p = build_prompt(&voter("Vermont"), &HistoricalTable::results_2020());
        assert!(p.contains("a state with an unknown political leaning"));
    }

    #[test]
    fn is_pure() {
        let t = HistoricalTable::results_2020();
        let v = voter("Ohio");
        assert_eq!(build_prompt(&v, &t), build_prompt(&v, &t));
    }
}
