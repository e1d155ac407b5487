use crosscat_consts::rv::misc::pflip;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::assignment::{lcrp, Assignment, AssignmentError};

/// How to initialize a partition
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitMode {
    /// Draw from the CRP
    #[default]
    FromThePrior,
    /// Every item in one group
    Together,
    /// Every item in its own group
    Apart,
}

impl FromStr for InitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "from_the_prior" => Ok(Self::FromThePrior),
            "together" => Ok(Self::Together),
            "apart" => Ok(Self::Apart),
            _ => Err(format!("cannot parse '{s}' as an initialization mode")),
        }
    }
}

/// The Chinese Restaurant Process with concentration `alpha`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Crp {
    pub alpha: f64,
}

impl Default for Crp {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl Crp {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Log weight of joining a group of size `n_k`
    pub fn ln_gibbs_weight(&self, n_k: usize) -> f64 {
        (n_k as f64).ln()
    }

    /// Log weight of opening a new group
    pub fn ln_singleton_weight(&self) -> f64 {
        self.alpha.ln()
    }

    /// The CRP conditional weights of the groups of `asgn`, optionally with
    /// the weight of a new group appended
    pub fn weight_vec(
        &self,
        asgn: &Assignment,
        normed: bool,
        append_new: bool,
    ) -> Vec<f64> {
        let mut weights: Vec<f64> =
            asgn.counts.iter().map(|&ct| ct as f64).collect();

        let n: usize = asgn.counts.iter().sum();
        let z = if append_new {
            weights.push(self.alpha);
            n as f64 + self.alpha
        } else {
            n as f64
        };

        if normed {
            weights.iter_mut().for_each(|ct| *ct /= z);
        }

        weights
    }

    /// Draw a partition of `n` items
    pub fn draw_assignment<R: Rng>(&self, n: usize, rng: &mut R) -> Assignment {
        if n == 0 {
            return Assignment::empty();
        }
        let mut counts = vec![1];
        let mut ps = vec![1.0, self.alpha];
        let mut zs = vec![0; n];

        for z in zs.iter_mut().take(n).skip(1) {
            let zi = pflip(&ps, 1, rng)[0];
            *z = zi;
            if zi < counts.len() {
                ps[zi] += 1.0;
                counts[zi] += 1;
            } else {
                ps[zi] = 1.0;
                ps.push(self.alpha);
                counts.push(1);
            };
        }

        Assignment {
            asgn: zs,
            n_cats: counts.len(),
            counts,
        }
    }

    /// Log probability of the partition
    pub fn ln_f_partition(&self, asgn: &Assignment) -> f64 {
        let n: usize = asgn.counts.iter().sum();
        lcrp(n, &asgn.counts, self.alpha)
    }

    /// Log probability of the partition under each concentration in `grid`
    pub fn alpha_conditionals(grid: &[f64], asgn: &Assignment) -> Vec<f64> {
        let n: usize = asgn.counts.iter().sum();
        grid.iter()
            .map(|&alpha| lcrp(n, &asgn.counts, alpha))
            .collect()
    }
}

/// A partition together with its CRP prior
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PriorProcess {
    pub process: Crp,
    pub asgn: Assignment,
}

impl PriorProcess {
    pub fn from_process<R: Rng>(process: Crp, n: usize, rng: &mut R) -> Self {
        let asgn = process.draw_assignment(n, rng);
        Self { process, asgn }
    }

    pub fn alpha(&self) -> f64 {
        self.process.alpha
    }

    pub fn weight_vec(&self, append_new: bool) -> Vec<f64> {
        self.process.weight_vec(&self.asgn, true, append_new)
    }

    pub fn weight_vec_unnormed(&self, append_new: bool) -> Vec<f64> {
        self.process.weight_vec(&self.asgn, false, append_new)
    }

    /// Log probability of the current partition
    pub fn ln_f_partition(&self) -> f64 {
        self.process.ln_f_partition(&self.asgn)
    }
}

/// Constructs a PriorProcess
#[derive(Clone, Debug)]
pub struct Builder {
    n: usize,
    asgn: Option<Vec<usize>>,
    alpha: Option<f64>,
    seed: Option<u64>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildPriorProcessError {
    #[error("the assignment has {n_asgn} entries but {n} were expected")]
    LengthMismatch { n: usize, n_asgn: usize },
    #[error("there are {n_cats} categories but {n} data")]
    NLessThanNCats { n: usize, n_cats: usize },
    #[error("the CRP concentration must be positive and finite, got {0}")]
    InvalidAlpha(f64),
    #[error("invalid assignment: {0}")]
    AssignmentError(#[from] AssignmentError),
}

impl Builder {
    /// Create a builder for `n`-length assignments
    ///
    /// # Arguments
    /// - n: the number of data/entries in the assignment
    pub fn new(n: usize) -> Self {
        Self {
            n,
            asgn: None,
            alpha: None,
            seed: None,
        }
    }

    /// Initialize the builder from an assignment vector
    ///
    /// # Note:
    /// The validity of `asgn` will not be verified until `build` is called.
    pub fn from_vec(asgn: Vec<usize>) -> Self {
        Self {
            n: asgn.len(),
            asgn: Some(asgn),
            alpha: None,
            seed: None,
        }
    }

    /// Set the CRP concentration
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Set the RNG seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the RNG seed from another RNG
    #[must_use]
    pub fn seed_from_rng<R: rand::Rng>(mut self, rng: &mut R) -> Self {
        self.seed = Some(rng.next_u64());
        self
    }

    /// Use a *flat* assignment with one partition
    #[must_use]
    pub fn flat(mut self) -> Self {
        self.asgn = Some(vec![0; self.n]);
        self
    }

    /// Put every entry in its own partition
    #[must_use]
    pub fn apart(mut self) -> Self {
        self.asgn = Some((0..self.n).collect());
        self
    }

    /// Initialize according to `mode`. `FromThePrior` leaves the assignment
    /// to be drawn on `build`.
    #[must_use]
    pub fn init_mode(self, mode: InitMode) -> Self {
        match mode {
            InitMode::FromThePrior => self,
            InitMode::Together => self.flat(),
            InitMode::Apart => self.apart(),
        }
    }

    /// Use an assignment with `n_cats`, evenly populated partitions/categories
    pub fn with_n_cats(
        mut self,
        n_cats: usize,
    ) -> Result<Self, BuildPriorProcessError> {
        if n_cats > self.n {
            Err(BuildPriorProcessError::NLessThanNCats { n: self.n, n_cats })
        } else {
            let asgn: Vec<usize> = (0..self.n).map(|i| i % n_cats).collect();
            self.asgn = Some(asgn);
            Ok(self)
        }
    }

    /// Build the assignment and consume the builder
    pub fn build(self) -> Result<PriorProcess, BuildPriorProcessError> {
        use rand::SeedableRng;
        use rand_xoshiro::Xoshiro256Plus;

        let mut rng = self
            .seed
            .map_or_else(Xoshiro256Plus::from_entropy, Xoshiro256Plus::seed_from_u64);

        let alpha = self.alpha.unwrap_or(1.0);
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(BuildPriorProcessError::InvalidAlpha(alpha));
        }
        let process = Crp::new(alpha);

        let asgn = match self.asgn {
            Some(asgn) if asgn.len() != self.n => {
                return Err(BuildPriorProcessError::LengthMismatch {
                    n: self.n,
                    n_asgn: asgn.len(),
                })
            }
            Some(asgn) => Assignment::from_vec(asgn)?,
            None => process.draw_assignment(self.n, &mut rng),
        };

        Ok(PriorProcess { process, asgn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn drawn_assignment_should_have_valid_partition() {
        let n: usize = 50;
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);

        for _ in 0..100 {
            let proc = Builder::new(n).seed_from_rng(&mut rng).build().unwrap();
            assert_eq!(proc.asgn.len(), n);
            assert!(proc.asgn.validate().is_valid());
        }
    }

    #[test]
    fn flat_partition_validation() {
        let n: usize = 50;
        let asgn = Builder::new(n).flat().build().unwrap().asgn;

        assert_eq!(asgn.n_cats, 1);
        assert_eq!(asgn.counts, vec![n]);
        assert!(asgn.asgn.iter().all(|&z| z == 0));
    }

    #[test]
    fn init_mode_apart() {
        let asgn = Builder::new(5)
            .init_mode(InitMode::Apart)
            .build()
            .unwrap()
            .asgn;
        assert_eq!(asgn.asgn, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn init_mode_parses_from_str() {
        assert_eq!("together".parse::<InitMode>(), Ok(InitMode::Together));
        assert!("sideways".parse::<InitMode>().is_err());
    }

    #[test]
    fn with_n_cats_n_cats_doesnt_divides_n() {
        let asgn = Builder::new(103)
            .with_n_cats(5)
            .unwrap()
            .build()
            .unwrap()
            .asgn;
        assert!(asgn.validate().is_valid());
        assert_eq!(asgn.n_cats, 5);
        assert_eq!(asgn.counts, vec![21, 21, 21, 20, 20]);
    }

    #[test]
    fn with_n_cats_too_many() {
        let res = Builder::new(3).with_n_cats(4);
        assert!(matches!(
            res,
            Err(BuildPriorProcessError::NLessThanNCats { n: 3, n_cats: 4 })
        ));
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        let res = Builder::new(3).with_alpha(0.0).build();
        assert_eq!(res, Err(BuildPriorProcessError::InvalidAlpha(0.0)));
    }

    #[test]
    fn manual_seed_control_works() {
        let asgn_1 = Builder::new(25).with_seed(17_834_795).build();
        let asgn_2 = Builder::new(25).with_seed(17_834_795).build();
        assert_eq!(asgn_1, asgn_2);
    }

    #[test]
    fn dirvec_with_alpha_15() {
        let proc = Builder::from_vec(vec![0, 1, 2, 0, 1, 0])
            .with_alpha(1.5)
            .build()
            .unwrap();
        let dv = proc.weight_vec_unnormed(true);

        assert_eq!(dv.len(), 4);
        assert_relative_eq!(dv[0], 3.0, epsilon = 10E-10);
        assert_relative_eq!(dv[1], 2.0, epsilon = 10E-10);
        assert_relative_eq!(dv[2], 1.0, epsilon = 10E-10);
        assert_relative_eq!(dv[3], 1.5, epsilon = 10E-10);
    }

    #[test]
    fn normed_weights_with_new_sum_to_one() {
        let proc = Builder::from_vec(vec![0, 1, 2, 0, 1, 0])
            .with_alpha(2.5)
            .build()
            .unwrap();
        let total: f64 = proc.weight_vec(true).iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1E-12);
        assert_relative_eq!(proc.weight_vec(true)[3], 2.5 / 8.5, epsilon = 1E-12);
    }

    #[test]
    fn log_gibbs_weights() {
        let proc = Builder::from_vec(vec![0, 1, 2, 0, 1, 0])
            .with_alpha(1.5)
            .build()
            .unwrap();

        let ldv = (0..3)
            .map(|k| proc.process.ln_gibbs_weight(proc.asgn.counts[k]))
            .chain(std::iter::once(proc.process.ln_singleton_weight()))
            .collect::<Vec<f64>>();

        assert_relative_eq!(ldv[0], 3.0_f64.ln(), epsilon = 10E-10);
        assert_relative_eq!(ldv[1], 2.0_f64.ln(), epsilon = 10E-10);
        assert_relative_eq!(ldv[2], 1.0_f64.ln(), epsilon = 10E-10);
        assert_relative_eq!(ldv[3], 1.5_f64.ln(), epsilon = 10E-10);
    }

    #[test]
    fn dirvec_with_unassigned_entry() {
        let mut proc = Builder::from_vec(vec![0, 1, 1, 1, 2, 2])
            .with_alpha(1.0)
            .build()
            .unwrap();

        proc.asgn.unassign(5);

        let dv = proc.weight_vec_unnormed(false);

        assert_eq!(dv, vec![1.0, 3.0, 1.0]);
        // normalizer only counts assigned entries
        let w = proc.weight_vec(false);
        assert_relative_eq!(w[1], 3.0 / 5.0, epsilon = 1E-12);
    }

    #[test]
    fn alpha_conditionals_match_lcrp() {
        let asgn = Assignment::from_vec(vec![0, 0, 1, 2]).unwrap();
        let grid = vec![0.5, 1.0, 2.0];
        let conds = Crp::alpha_conditionals(&grid, &asgn);
        for (alpha, cond) in grid.iter().zip(conds.iter()) {
            assert_relative_eq!(
                *cond,
                lcrp(4, &[2, 1, 1], *alpha),
                epsilon = 1E-12
            );
        }
    }

    #[test]
    fn draw_assignment_empty() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        assert!(Crp::new(1.0).draw_assignment(0, &mut rng).is_empty());
    }
}
