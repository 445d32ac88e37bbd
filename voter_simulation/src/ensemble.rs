use log::{debug, warn};

use crate::config::*;
use crate::oracle::*;

/// The reduction of the repeated samples for one voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct EnsembleOutcome {
    pub decision: VoteDecision,
    pub count_1: u32,
    pub count_2: u32,
    /// Answers that were neither 1 nor 2.
    pub invalid: u32,
    /// Calls that returned an error.
    pub failed: u32,
}

impl EnsembleOutcome {
    pub fn valid_samples(&self) -> u32 {
        self.count_1 + self.count_2
    }
}

/// Reduces a sequence of oracle results to a single decision.
///
/// Errors and invalid answers are discarded. Among the valid samples, the
/// plurality wins. A tie between 1 and 2 is resolved in favor of 1: the rule
/// is fixed so that the same samples always produce the same decision.
/// Without any valid sample, the voter is undecided.
///
/// ```
/// use voter_simulation::{reduce_samples, Sample, VoteDecision};
///
/// let outcome = reduce_samples(&[Ok(Sample::Two), Ok(Sample::One)]);
/// assert_eq!(outcome.decision, VoteDecision::Democrat);
/// ```
pub fn reduce_samples(samples: &[Result<Sample, OracleError>]) -> EnsembleOutcome {
    let mut outcome = EnsembleOutcome {
        decision: VoteDecision::Undecided,
        count_1: 0,
        count_2: 0,
        invalid: 0,
        failed: 0,
    };
    for s in samples {
        match s {
            Ok(Sample::One) => outcome.count_1 += 1,
            Ok(Sample::Two) => outcome.count_2 += 1,
            Ok(Sample::Invalid) => outcome.invalid += 1,
            Err(_) => outcome.failed += 1,
        }
    }
    outcome.decision = match (outcome.count_1, outcome.count_2) {
        (c1, c2) if c1 > c2 => VoteDecision::Democrat,
        (c1, c2) if c2 > c1 => VoteDecision::Republican,
        (c1, _) if c1 > 0 => VoteDecision::Democrat,
        _ => VoteDecision::Undecided,
    };
    outcome
}

/// Calls the oracle `repetitions` times with the same prompt and reduces the answers.
///
/// Individual failures are tolerated: the decision is taken on the calls that
/// succeeded.
pub fn run_repeated_votes<O: OracleCapability + ?Sized>(
    prompt: &str,
    oracle: &O,
    repetitions: u32,
) -> Result<EnsembleOutcome, SimulationErrors> {
    check_repetitions(repetitions)?;
    let mut samples: Vec<Result<Sample, OracleError>> = Vec::new();
    for rep in 0..repetitions {
        let s = request_vote(prompt, oracle);
        if let Err(e) = &s {
            warn!("run_repeated_votes: repetition {}: {}", rep + 1, e);
        }
        samples.push(s);
    }
    let outcome = reduce_samples(&samples);
    debug!("run_repeated_votes: {:?}", outcome);
    Ok(outcome)
}
