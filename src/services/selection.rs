//! Reviewer selection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{User, UserId};

/// Most reviewers assigned when a pull request is created.
pub const MAX_INITIAL_REVIEWERS: usize = 2;

/// Where pull request creation draws its randomness from.
#[derive(Clone)]
pub enum RngSource {
    /// Fresh OS entropy for every draw.
    Entropy,
    /// Reproducible sequence of generators derived from one seed.
    Seeded(Arc<Mutex<StdRng>>),
}

impl RngSource {
    pub fn entropy() -> Self {
        Self::Entropy
    }

    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    pub fn next_rng(&self) -> StdRng {
        match self {
            Self::Entropy => StdRng::from_entropy(),
            Self::Seeded(root) => {
                let mut root = root.lock().unwrap_or_else(|p| p.into_inner());
                StdRng::seed_from_u64(root.r#gen())
            }
        }
    }
}

impl Default for RngSource {
    fn default() -> Self {
        Self::entropy()
    }
}

/// Pick the initial reviewers of a pull request.
///
/// Shuffles the team, aims for one or two reviewers with equal probability
/// and takes the first eligible members of the shuffled order. Returns fewer
/// when the team has fewer eligible members.
pub fn select_reviewers<R: Rng + ?Sized>(members: &[User], author: &UserId, rng: &mut R) -> Vec<User> {
    let eligible = members
        .iter()
        .filter(|m| m.is_eligible_reviewer_for(author))
        .count();
    let target = rng.gen_range(1..=MAX_INITIAL_REVIEWERS).min(eligible);

    let mut shuffled: Vec<&User> = members.iter().collect();
    shuffled.shuffle(rng);

    shuffled
        .into_iter()
        .filter(|m| m.is_eligible_reviewer_for(author))
        .take(target)
        .cloned()
        .collect()
}

/// First active team member that can replace `outgoing`.
///
/// Skips the author, everyone already reviewing and the outgoing reviewer.
/// `active` is scanned in storage order.
pub fn pick_first_available(
    active: &[User],
    reviewers: &[User],
    author: &UserId,
    outgoing: &UserId,
) -> Option<User> {
    let taken: HashSet<&str> = reviewers.iter().map(|r| r.id.as_str()).collect();

    active
        .iter()
        .find(|u| {
            u.is_eligible_reviewer_for(author)
                && !u.id.same_as(outgoing)
                && !taken.contains(u.id.as_str())
        })
        .cloned()
}
