//! Train/validation/test splitting and class balancing.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Per-entity masks for the three splits. `true` keeps an entity visible.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitMasks {
    pub train: Vec<bool>,
    pub val: Vec<bool>,
    pub test: Vec<bool>,
}

impl SplitMasks {
    /// Entities hidden in more than one split.
    pub fn overlap(&self) -> usize {
        (0..self.train.len())
            .filter(|&i| [&self.train, &self.val, &self.test].iter().filter(|m| !m[i]).count() > 1)
            .count()
    }
}

/// Hide half of the entities in each split.
///
/// Each split is sampled on its own, so the hidden sets may overlap. The
/// overlap is logged rather than removed.
pub fn split_masks(entity_count: usize, seed: u64) -> SplitMasks {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hide_half = || {
        let mut mask = vec![true; entity_count];
        for i in rand::seq::index::sample(&mut rng, entity_count, entity_count / 2) {
            mask[i] = false;
        }
        mask
    };
    let masks = SplitMasks {
        train: hide_half(),
        val: hide_half(),
        test: hide_half(),
    };
    let overlap = masks.overlap();
    if overlap > 0 {
        tracing::debug!(overlap, entity_count, "split masks hide shared entities");
    }
    masks
}

/// Shuffle `0..sample_count` and cut it 80/10/10 into train, validation and
/// test indices.
pub fn split_indices(sample_count: usize, seed: u64) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..sample_count).collect();
    order.shuffle(&mut rng);

    let val_start = sample_count * 8 / 10;
    let test_start = sample_count * 9 / 10;
    let test = order.split_off(test_start);
    let val = order.split_off(val_start);
    (order, val, test)
}

/// Downsample every label to the size of the rarest one.
///
/// Returns sample indices grouped by label in first-seen order, ascending
/// within each group.
pub fn resample_balanced(labels: &[usize], seed: u64) -> Vec<usize> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of: HashMap<usize, usize> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        let g = *group_of.entry(label).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }

    let Some(keep) = groups.iter().map(Vec::len).min() else {
        return Vec::new();
    };
    tracing::debug!(classes = groups.len(), per_class = keep, "resampling");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = Vec::with_capacity(keep * groups.len());
    for group in groups {
        let mut chosen: Vec<usize> = rand::seq::index::sample(&mut rng, group.len(), keep)
            .into_iter()
            .map(|k| group[k])
            .collect();
        chosen.sort_unstable();
        picked.extend(chosen);
    }
    picked
}
