use std::mem::swap;

pub trait MinMax {
    type Inner: PartialOrd;
    /// Simultaneously compute the min and max of items in an Iterator. Returns
    /// `None` if the iterator is empty.
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)>;
}

impl<T> MinMax for T
where
    T: Iterator,
    T::Item: PartialOrd + Clone,
{
    type Inner = T::Item;
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)> {
        let mut min = self.next()?;

        let mut max = if let Some(item) = self.next() {
            item
        } else {
            return Some((min.clone(), min));
        };

        if min > max {
            swap(&mut min, &mut max);
        }

        for item in self {
            if item > max {
                max = item;
            } else if item < min {
                min = item;
            }
        }
        Some((min, max))
    }
}

/// Bins the entries in `xs` into `k` bins.
///
/// # Example
///
/// ```rust
/// # use crosscat_utils::bincount;
/// let xs: Vec<usize> = vec![0, 0, 1, 2, 2, 2, 3];
///
/// assert_eq!(bincount(&xs, 4), vec![2, 1, 3, 1]);
/// ```
#[inline]
pub fn bincount(xs: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0; k];
    xs.iter().for_each(|&x| counts[x] += 1);
    counts
}

/// Returns the index of the largest element in xs.
///
/// If there are multiple largest elements, returns the index of the first.
#[inline]
pub fn argmax<T: PartialOrd>(xs: &[T]) -> usize {
    assert!(!xs.is_empty(), "Empty container");

    let (max_ix, _) = xs.iter().enumerate().skip(1).fold(
        (0, &xs[0]),
        |(max_ix, max_val), (ix, x)| {
            if x > max_val {
                (ix, x)
            } else {
                (max_ix, max_val)
            }
        },
    );
    max_ix
}

/// Returns the indices of all the elements equal to the maximum
pub fn argmax_ties<T: PartialOrd>(xs: &[T]) -> Vec<usize> {
    let max_ix = argmax(xs);
    xs.iter()
        .enumerate()
        .filter_map(|(ix, x)| if *x == xs[max_ix] { Some(ix) } else { None })
        .collect()
}

/// Returns a tuple (min_elem, max_elem).
#[inline]
pub fn minmax<T: PartialOrd + Clone>(xs: &[T]) -> (T, T) {
    xs.iter().cloned().minmax().expect("Empty slice")
}

/// Numerically stable `log(sum(exp(xs))`
///
/// Returns `-inf` if every entry is `-inf`.
#[inline]
pub fn logsumexp(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        panic!("Empty container");
    } else if xs.len() == 1 {
        xs[0]
    } else {
        let maxval = xs.iter().fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
        if maxval == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        xs.iter()
            .fold(0.0_f64, |acc, x| acc + (x - maxval).exp())
            .ln()
            + maxval
    }
}

/// Normalize log weights so that they logsumexp to zero
pub fn log_normalize(xs: &mut [f64]) {
    let z = logsumexp(xs);
    xs.iter_mut().for_each(|x| *x -= z);
}

/// The arithmetic mean. `NaN` for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// The population variance. `NaN` for an empty slice.
pub fn var(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64
}

/// Sum of squared deviations from the mean
pub fn sum_sq_dev(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|&x| (x - m) * (x - m)).sum()
}

fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut xs = xs.to_vec();
    xs.sort_unstable_by(|a, b| a.total_cmp(b));
    xs
}

/// The median. For even-length input, the mean of the two central values.
pub fn median(xs: &[f64]) -> f64 {
    assert!(!xs.is_empty(), "Empty container");
    let xs = sorted(xs);
    let n = xs.len();
    if n % 2 == 0 {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    } else {
        xs[n / 2]
    }
}

/// Empirical quantile with linear interpolation between order statistics
pub fn quantile(xs: &[f64], q: f64) -> f64 {
    assert!(!xs.is_empty(), "Empty container");
    assert!((0.0..=1.0).contains(&q), "q must be in [0, 1]");
    let xs = sorted(xs);
    let pos = q * (xs.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let t = pos - lower as f64;
    (xs[upper] - xs[lower]).mul_add(t, xs[lower])
}
