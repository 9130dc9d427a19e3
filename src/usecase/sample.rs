//! Reservoir sampling (Algorithm R).
//!
//! One pass over the input, O(k) extra memory. Every k-subset of the input is
//! equally likely, so each item ends up in the result with probability k/n.

use crate::domain::traits::UniformSource;

/// Draw `k` items uniformly without replacement from `items`.
///
/// The input is only read. When it holds `k` items or fewer, all of them are
/// returned in their original order.
pub fn reservoir_sample<T: Clone, R: UniformSource + ?Sized>(
    items: &[T],
    k: usize,
    rng: &mut R,
) -> Vec<T> {
    reservoir_sample_iter(items.iter().cloned(), k, rng)
}

/// Streaming form of [`reservoir_sample`] for inputs of unknown length.
pub fn reservoir_sample_iter<I, R>(items: I, k: usize, rng: &mut R) -> Vec<I::Item>
where
    I: IntoIterator,
    R: UniformSource + ?Sized,
{
    if k == 0 {
        return Vec::new();
    }

    let mut reservoir = Vec::with_capacity(k);
    for (i, item) in items.into_iter().enumerate() {
        if i < k {
            reservoir.push(item);
            continue;
        }

        let j = draw_index(rng, i);
        if j < k {
            reservoir[j] = item;
        }
    }
    reservoir
}

/// Uniform integer in `[0, i]`.
fn draw_index<R: UniformSource + ?Sized>(rng: &mut R, i: usize) -> usize {
    let u = rng.next_unit();
    // A misbehaving source returning 1.0 must not index past `i`.
    ((u * (i as f64 + 1.0)).floor() as usize).min(i)
}
