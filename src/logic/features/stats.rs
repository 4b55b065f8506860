//! Small numeric helpers shared by the extractors.

use std::collections::HashMap;
use std::hash::Hash;

/// Shannon entropy (base 2) of the observed value distribution; 0.0 when empty
pub fn entropy<T, I>(values: I) -> f64
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut total = 0usize;
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return 0.0;
    }

    // summed in ascending count order so the result does not depend on hash order
    let mut counts: Vec<usize> = counts.into_values().collect();
    counts.sort_unstable();

    let total = total as f64;
    counts
        .into_iter()
        .map(|count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Arithmetic mean; 0.0 when empty
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// `part / whole`; 0.0 when `whole` is zero
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
