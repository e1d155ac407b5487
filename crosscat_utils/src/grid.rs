/// `n` evenly spaced values from `a` to `b`, inclusive
///
/// # Example
///
/// ```rust
/// # use crosscat_utils::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { step.mul_add(i as f64, a) })
                .collect()
        }
    }
}

/// `n` values from `a` to `b` evenly spaced in log space. `a` and `b` must be
/// positive.
pub fn log_linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    assert!(a > 0.0 && b > 0.0, "log_linspace bounds must be positive");
    linspace(a.ln(), b.ln(), n)
        .into_iter()
        .map(f64::exp)
        .collect()
}
