//! Tag compatibility scoring
//!
//! Ranks events for a user by combining the user's tag history with each
//! event's tags through a pairwise similarity oracle (a trained text model
//! on device; anything implementing [`SimilarityOracle`] here).

use std::cmp::Ordering;

use crate::api::session::TagUsage;
use crate::api::types::EventItem;

/// Pairwise tag similarity in `[0, 1]`
///
/// `None` means the oracle could not produce a prediction for the pair; such
/// pairs are left out of the score entirely.
pub trait SimilarityOracle {
    fn similarity(&self, user_tag: &str, event_tag: &str) -> Option<f64>;
}

impl<F> SimilarityOracle for F
where
    F: Fn(&str, &str) -> Option<f64>,
{
    fn similarity(&self, user_tag: &str, event_tag: &str) -> Option<f64> {
        self(user_tag, event_tag)
    }
}

/// Case-insensitive exact match: 1.0 on equal tags, 0.0 otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTagOracle;

impl SimilarityOracle for ExactTagOracle {
    fn similarity(&self, user_tag: &str, event_tag: &str) -> Option<f64> {
        let equal = user_tag.trim().to_lowercase() == event_tag.trim().to_lowercase();
        Some(if equal { 1.0 } else { 0.0 })
    }
}

/// Weighted mean similarity between `user_tags` and `event_tags`
///
/// Every (user tag, event tag) pair adds `similarity * frequency` to the sum
/// and `frequency` to the weight, so a user tag counts once per event tag it
/// is paired with. A NaN prediction counts as no prediction; others are
/// clamped to [0, 1]. Returns `None` when the total weight is zero.
pub fn compatibility_score<O>(user_tags: &[TagUsage], event_tags: &[String], oracle: &O) -> Option<f64>
where
    O: SimilarityOracle + ?Sized,
{
    let mut total_similarity = 0.0_f64;
    let mut total_weight = 0_u64;

    for usage in user_tags {
        for event_tag in event_tags {
            let Some(similarity) = oracle.similarity(&usage.name, event_tag) else {
                continue;
            };
            if similarity.is_nan() {
                continue;
            }
            let similarity = similarity.clamp(0.0, 1.0);
            total_similarity += similarity * f64::from(usage.frequency);
            total_weight += u64::from(usage.frequency);
        }
    }

    if total_weight == 0 {
        None
    } else {
        Some(total_similarity / total_weight as f64)
    }
}

/// An event with its compatibility score for the current user
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEvent<'a> {
    pub event: &'a EventItem,
    pub score: Option<f64>,
}

/// Score every event and sort best first
///
/// Events without a score go last; ties keep the server order.
pub fn rank_events<'a, O>(
    user_tags: &[TagUsage],
    events: &'a [EventItem],
    oracle: &O,
) -> Vec<RankedEvent<'a>>
where
    O: SimilarityOracle + ?Sized,
{
    let mut ranked: Vec<RankedEvent<'a>> = events
        .iter()
        .map(|event| RankedEvent {
            event,
            score: compatibility_score(user_tags, &event.tags, oracle),
        })
        .collect();

    ranked.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked
}
