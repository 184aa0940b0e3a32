//! Stratified train/validation split.

use crate::error::{KamaeError, Result};
use crate::types::Stance;

/// Default validation fraction.
pub const DEFAULT_TEST_SIZE: f64 = 0.15;

/// Default shuffle seed.
pub const DEFAULT_SEED: u64 = 42;

/// Train and validation partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
}

/// In-place Fisher-Yates shuffle.
pub fn shuffle(indices: &mut [usize], rng: &mut oorandom::Rand64) {
    for i in (1..indices.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        indices.swap(i, j);
    }
}

/// Splits `items` so each stance keeps roughly its share on both sides.
///
/// Every class contributes `round(n * test_size)` items to validation,
/// clamped to `[1, n - 1]`, so each present class appears in both
/// partitions. Deterministic for a given seed and input order.
///
/// # Errors
///
/// - `KamaeError::InvalidSplitFraction` if `test_size` is not in `(0, 1)`
/// - `KamaeError::EmptyDataset` if `items` is empty
/// - `KamaeError::UnderpopulatedClass` if a present class has one member
pub fn stratified_split<T, F>(
    items: Vec<T>,
    test_size: f64,
    seed: u64,
    stance_of: F,
) -> Result<Split<T>>
where
    F: Fn(&T) -> Stance,
{
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(KamaeError::InvalidSplitFraction(test_size));
    }
    if items.is_empty() {
        return Err(KamaeError::EmptyDataset);
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); Stance::NUM_LABELS];
    for (idx, item) in items.iter().enumerate() {
        by_class[stance_of(item).label()].push(idx);
    }

    for (label, members) in by_class.iter().enumerate() {
        if members.len() == 1 {
            let stance = Stance::from_label(label).ok_or(KamaeError::UnknownLabel(label))?;
            return Err(KamaeError::UnderpopulatedClass { stance, count: 1 });
        }
    }

    let mut rng = oorandom::Rand64::new(u128::from(seed));
    let mut train_idx = Vec::new();
    let mut val_idx = Vec::new();

    for members in by_class.iter_mut().filter(|m| !m.is_empty()) {
        shuffle(members, &mut rng);
        let n = members.len();
        let n_val = ((n as f64) * test_size).round().clamp(1.0, (n - 1) as f64) as usize;
        val_idx.extend_from_slice(&members[..n_val]);
        train_idx.extend_from_slice(&members[n_val..]);
    }

    shuffle(&mut train_idx, &mut rng);
    shuffle(&mut val_idx, &mut rng);

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut take = |indices: Vec<usize>| -> Vec<T> {
        indices
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    };

    let train = take(train_idx);
    let validation = take(val_idx);

    tracing::debug!(
        train = train.len(),
        validation = validation.len(),
        test_size,
        seed,
        "stratified split"
    );

    Ok(Split { train, validation })
}

/// Number of items per stance, in label order.
pub fn label_counts<T, F>(items: &[T], stance_of: F) -> [usize; Stance::NUM_LABELS]
where
    F: Fn(&T) -> Stance,
{
    let mut counts = [0usize; Stance::NUM_LABELS];
    for item in items {
        counts[stance_of(item).label()] += 1;
    }
    counts
}
