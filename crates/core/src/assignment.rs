//! Assignment engine: builds the giver -> receiver derangement for a draw.
//!
//! The participant list is shuffled with Fisher-Yates and every participant
//! gives to the next one in the shuffled order, the last wrapping around to
//! the first. The result is a single cycle through everyone, so nobody can
//! draw themselves and no repair pass is needed.
//!
//! Each of the `(N-1)!` possible cycles is produced by exactly `N` of the `N!`
//! shuffles, so a uniform shuffle gives a uniform cycle. With two
//! participants the only cycle is the reciprocal pair.

use std::collections::HashSet;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Smallest participant count for which a derangement exists.
pub const MIN_PARTICIPANTS: usize = 2;

/// One directed giver -> receiver edge of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pair<T> {
    pub giver: T,
    pub receiver: T,
}

/// Error returned when a draw cannot be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("At least 2 participants are required for a draw, found {found}")]
    InsufficientParticipants { found: usize },
}

/// Draw a cyclic derangement of `ids` using the thread-local RNG.
///
/// Identifiers are assumed unique; duplicates are not removed.
pub fn assign<T: Clone>(ids: &[T]) -> Result<Vec<Pair<T>>, AssignmentError> {
    assign_with(ids, &mut rand::rng())
}

/// Draw a cyclic derangement of `ids` using the given RNG.
///
/// Returns exactly `ids.len()` pairs. Every identifier appears once as a
/// giver and once as a receiver, and no pair maps an identifier to itself.
pub fn assign_with<T, R>(ids: &[T], rng: &mut R) -> Result<Vec<Pair<T>>, AssignmentError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if ids.len() < MIN_PARTICIPANTS {
        return Err(AssignmentError::InsufficientParticipants { found: ids.len() });
    }

    let mut order = ids.to_vec();
    order.shuffle(rng);
    Ok(cycle_pairs(&order))
}

/// Pair each element with its successor, the last with the first.
fn cycle_pairs<T: Clone>(order: &[T]) -> Vec<Pair<T>> {
    order
        .iter()
        .zip(order.iter().cycle().skip(1))
        .map(|(giver, receiver)| Pair {
            giver: giver.clone(),
            receiver: receiver.clone(),
        })
        .collect()
}

/// Check that `pairs` is a permutation of its givers with no fixed point.
pub fn is_derangement<T: Eq + Hash>(pairs: &[Pair<T>]) -> bool {
    let givers: HashSet<&T> = pairs.iter().map(|p| &p.giver).collect();
    let receivers: HashSet<&T> = pairs.iter().map(|p| &p.receiver).collect();

    givers.len() == pairs.len()
        && receivers == givers
        && pairs.iter().all(|p| p.giver != p.receiver)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
