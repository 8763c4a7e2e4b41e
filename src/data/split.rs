//! Seeded train/test partitioning

use crate::core::{Dataset, Result, VoteError};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Share of instances assigned to the training partition by default
pub const DEFAULT_TRAIN_PROPORTION: f64 = 0.8;

/// Shuffle seed used by default
pub const DEFAULT_SEED: u64 = 42;

/// Number of training instances for `n` records: `n * proportion` rounded
/// half-to-even.
pub fn train_size(n: usize, train_proportion: f64) -> usize {
    (n as f64 * train_proportion).round_ties_even() as usize
}

/// Shuffle `data` with a seeded permutation and cut it into (train, test).
///
/// The proportion must lie strictly between 0 and 1; the dataset is left
/// untouched when it does not.
pub fn train_test_split(
    mut data: Dataset,
    train_proportion: f64,
    seed: u64,
) -> Result<(Dataset, Dataset)> {
    if !(train_proportion > 0.0 && train_proportion < 1.0) {
        return Err(VoteError::InvalidArgument(format!(
            "Train proportion must be between 0 and 1, got: {train_proportion}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    data.shuffle(&mut rng);

    let cut = train_size(data.len(), train_proportion);
    let test = data.split_off(cut);

    debug!(
        "Split {} instances into {} train / {} test (seed {seed})",
        cut + test.len(),
        cut,
        test.len()
    );

    Ok((data, test))
}
