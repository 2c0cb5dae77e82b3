//! Numeric helpers shared by the analysis operations.
//!
//! Every function works on values that already went through numeric
//! coercion: missing cells are dropped by [`present`] before any statistic
//! is computed, so missing never counts as zero.

use std::cmp::Ordering;

/// Non-missing values of a coerced column, in row order.
pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().filter_map(|v| *v).collect()
}

/// Sorts values ascending. Inputs are finite so `total_cmp` is a true order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Whether every value is identical. True for empty and single-value slices.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Running mean and sum of squared deviations (Welford, 1962).
///
/// A sequence of identical values keeps `m2` at exactly zero, so constant
/// columns never pick up rounding noise in their spread.
#[derive(Debug, Clone, Copy, Default)]
struct Welford {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn from_values(values: &[f64]) -> Self {
        let mut acc = Self::default();
        for &x in values {
            acc.update(x);
        }
        acc
    }

    fn update(&mut self, x: f64) {
        self.count = self.count.saturating_add(1);
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Welford::from_values(values).mean)
}

/// Variance with `ddof` delta degrees of freedom.
///
/// Returns `None` when `n - ddof` is not positive.
pub fn variance(values: &[f64], ddof: usize) -> Option<f64> {
    let dof = values.len().checked_sub(ddof).filter(|&dof| dof > 0)?;
    Some(Welford::from_values(values).m2 / dof as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    variance(values, 1).map(f64::sqrt)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> Option<f64> {
    variance(values, 0).map(f64::sqrt)
}

/// Linearly interpolated quantile of an ascending slice.
///
/// For `p` in [0, 1], the position is `(n - 1) * p`; the result
/// interpolates between the two surrounding order statistics.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = last as f64 * p.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let low = *sorted.get(lower)?;
    let high = *sorted.get(upper.min(last))?;
    Some(low + (position - lower as f64) * (high - low))
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

/// Average ranks (1-based); tied values share the mean of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0usize;
    for run in order.chunk_by(|&a, &b| values[a].total_cmp(&values[b]).is_eq()) {
        let end = start.saturating_add(run.len());
        // 1-based positions start + 1 ..= end
        let rank = (start as f64 + 1.0 + end as f64) / 2.0;
        for &index in run {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson product-moment correlation.
///
/// `None` when fewer than two pairs exist or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let mut cov = 0.0;
    let mut ssx = 0.0;
    let mut ssy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        ssx += dx * dx;
        ssy += dy * dy;
    }

    let divisor = (ssx * ssy).sqrt();
    if divisor == 0.0 || !divisor.is_finite() {
        return None;
    }
    Some((cov / divisor).clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall's tau-b, which corrects for ties in either variable.
///
/// Uses Knight's O(n log n) method: pairs are sorted by `x` then `y`, and
/// discordant pairs are the inversions a merge sort of the `y` sequence
/// has to undo.
pub fn kendall(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }

    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let total = pair_count(n);
    let tied_x = tied_pairs(&pairs, |a, b| a.0.total_cmp(&b.0).is_eq());
    let tied_xy = tied_pairs(&pairs, |a, b| {
        a.0.total_cmp(&b.0).is_eq() && a.1.total_cmp(&b.1).is_eq()
    });

    let mut ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let mut scratch = Vec::with_capacity(n);
    let discordant = sort_counting_inversions(&mut ys, &mut scratch);
    let tied_y = tied_pairs(&ys, |a, b| a.total_cmp(b).is_eq());

    let untied_x = total.saturating_sub(tied_x);
    let untied_y = total.saturating_sub(tied_y);
    let denominator = (untied_x as f64 * untied_y as f64).sqrt();
    if denominator == 0.0 {
        return None;
    }

    // Pairs tied in neither variable: concordant + discordant
    let ranked = untied_x.saturating_add(tied_xy).saturating_sub(tied_y);
    let numerator = ranked as f64 - 2.0 * discordant as f64;
    Some((numerator / denominator).clamp(-1.0, 1.0))
}

/// Number of unordered pairs among `n` items.
fn pair_count(n: usize) -> u64 {
    let n = n as u64;
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Pairs that fall in the same run of a sorted slice.
fn tied_pairs<T>(sorted: &[T], same: impl FnMut(&T, &T) -> bool) -> u64 {
    sorted
        .chunk_by(same)
        .map(|run| pair_count(run.len()))
        .fold(0, u64::saturating_add)
}

/// Merge-sorts `values` ascending and returns the number of strict
/// inversions removed along the way.
fn sort_counting_inversions(values: &mut [f64], scratch: &mut Vec<f64>) -> u64 {
    if values.len() < 2 {
        return 0;
    }
    let mid = values.len() / 2;
    let (left, right) = values.split_at_mut(mid);
    let mut swaps = sort_counting_inversions(left, scratch)
        .saturating_add(sort_counting_inversions(right, scratch));

    scratch.clear();
    let mut waiting = left.len() as u64;
    let mut lhs = left.iter().copied().peekable();
    let mut rhs = right.iter().copied().peekable();
    loop {
        match (lhs.peek(), rhs.peek()) {
            (Some(&a), Some(&b)) => {
                if b.total_cmp(&a) == Ordering::Less {
                    // `b` jumps every value still waiting on the left
                    swaps = swaps.saturating_add(waiting);
                    scratch.push(b);
                    rhs.next();
                } else {
                    waiting = waiting.saturating_sub(1);
                    scratch.push(a);
                    lhs.next();
                }
            }
            (Some(_), None) => {
                scratch.extend(lhs);
                break;
            }
            (None, _) => {
                scratch.extend(rhs);
                break;
            }
        }
    }

    values.copy_from_slice(scratch.as_slice());
    swaps
}

/// Rounds to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
