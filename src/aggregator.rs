//! Consensus aggregation across orchestration rounds

use tracing::debug;

use crate::protocol::{ConsensusResult, ResponseSet};

/// Merge several rounds of per-agent responses into one consensus set
///
/// For each agent identity appearing in any round, the response with
/// the strictly greatest confidence wins; when two responses for the
/// same identity carry equal confidence, the later round's response
/// wins. An identity need not appear in every round.
///
/// Pure function: no I/O, inputs untouched, safe to call from any
/// number of tasks concurrently. An empty input yields an empty result;
/// a single round comes back unchanged.
pub fn aggregate(rounds: &[ResponseSet]) -> ConsensusResult {
    let mut consensus = ResponseSet::new();

    for round in rounds {
        for (name, response) in round.iter() {
            let keep_existing = consensus
                .get(name)
                .is_some_and(|best| response.confidence() < best.confidence());
            if !keep_existing {
                consensus.insert(name, response.clone());
            }
        }
    }

    for (name, response) in consensus.iter() {
        debug!(
            agent = %name,
            confidence = response.confidence(),
            "Consensus selected"
        );
    }

    ConsensusResult::new(consensus)
}
