use rand::seq::SliceRandom;
use rand::Rng;

/// Choose one of `xs` uniformly at random. Panics if `xs` is empty.
pub fn choose_uniform<T: Copy, R: Rng>(xs: &[T], rng: &mut R) -> T {
    assert!(!xs.is_empty(), "Cannot choose from an empty slice");
    xs[rng.gen_range(0..xs.len())]
}

/// A uniformly random ordering of `0..n`
pub fn random_permutation<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut ixs: Vec<usize> = (0..n).collect();
    ixs.shuffle(rng);
    ixs
}
