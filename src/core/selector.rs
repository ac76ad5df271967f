use crate::domain::model::{CategoryFilter, Place};
use rand::Rng;
use std::collections::VecDeque;

pub const PICK_HISTORY_LIMIT: usize = 5;

/// Picks one place uniformly among those matching `filter`.
///
/// Returns `None` when nothing matches. Every call is independent: no weighting and no
/// memory of earlier picks.
pub fn pick_random<'a, R>(
    places: &'a [Place],
    filter: &CategoryFilter,
    rng: &mut R,
) -> Option<&'a Place>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&Place> = places
        .iter()
        .filter(|p| filter.matches(p.category))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    Some(candidates[index])
}

/// Recently picked places, newest first, for display next to the picker.
///
/// Bounded to [`PICK_HISTORY_LIMIT`]. A place already in the history is not added again.
#[derive(Debug, Clone, Default)]
pub struct PickHistory {
    entries: VecDeque<Place>,
}

impl PickHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the place was already listed.
    pub fn record(&mut self, place: &Place) -> bool {
        if self.entries.iter().any(|p| p.id == place.id) {
            return false;
        }
        self.entries.push_front(place.clone());
        self.entries.truncate(PICK_HISTORY_LIMIT);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &Place> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
