//! Discrete grids over which hyperparameters are resampled
use crosscat_consts::{MIN_SUM_SQ_DEV, N_GRID};
use crosscat_utils::{choose_uniform, linspace, log_linspace, minmax, sum_sq_dev};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rv::data::{
    CategoricalData, CategoricalSuffStat, DataOrSuffStat, GaussianData,
    GaussianSuffStat,
};
use crate::rv::dist::{NormalGamma, SymmetricDirichlet};
use crate::rv::traits::ConjugatePrior;

/// The CRP concentration grid for partitions of `n` items
pub fn crp_alpha_grid(n: usize) -> Vec<f64> {
    if n <= 1 {
        vec![1.0; N_GRID]
    } else {
        log_linspace(1.0, n as f64, N_GRID)
    }
}

/// The hyperparameters of a [`NormalGamma`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NgParam {
    M,
    R,
    S,
    V,
}

impl NgParam {
    pub const ALL: [NgParam; 4] =
        [NgParam::M, NgParam::R, NgParam::S, NgParam::V];

    pub fn get(self, ng: &NormalGamma) -> f64 {
        match self {
            NgParam::M => ng.m(),
            NgParam::R => ng.r(),
            NgParam::S => ng.s(),
            NgParam::V => ng.v(),
        }
    }

    /// Set the parameter on `ng`. Grid values are always valid.
    pub fn set(self, ng: &mut NormalGamma, value: f64) {
        match self {
            NgParam::M => ng.set_m_unchecked(value),
            NgParam::R => ng.set_r_unchecked(value),
            NgParam::S => ng.set_s_unchecked(value),
            NgParam::V => ng.set_v_unchecked(value),
        }
    }
}

/// Log marginal likelihood of continuous data summarized by `stat`
#[inline]
pub fn ng_ln_m(ng: &NormalGamma, stat: &GaussianSuffStat) -> f64 {
    let data: GaussianData<f64> = DataOrSuffStat::SuffStat(stat);
    ng.ln_m(&data)
}

/// Log marginal likelihood of categorical data summarized by `stat`
#[inline]
pub fn csd_ln_m(csd: &SymmetricDirichlet, stat: &CategoricalSuffStat) -> f64 {
    let data: CategoricalData<u32> = DataOrSuffStat::SuffStat(stat);
    csd.ln_m(&data)
}

/// Grids for the hyperparameters of a continuous column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NgGrid {
    pub m: Vec<f64>,
    pub r: Vec<f64>,
    pub s: Vec<f64>,
    pub v: Vec<f64>,
}

impl NgGrid {
    /// Build the grids from the present values of a column in a table with
    /// `n_rows` rows
    pub fn new(xs: &[f64], n_rows: usize) -> Self {
        let n_grid_max = n_rows.max(2) as f64;
        let r = log_linspace(1.0, n_grid_max, N_GRID);
        let v = r.clone();

        let ssd = if xs.is_empty() {
            MIN_SUM_SQ_DEV
        } else {
            sum_sq_dev(xs).max(MIN_SUM_SQ_DEV)
        };
        let s = log_linspace(ssd / 100.0, ssd, N_GRID);

        let m = if xs.is_empty() {
            vec![0.0; N_GRID]
        } else {
            let (min, max) = minmax(xs);
            linspace(min, max, N_GRID)
        };

        Self { m, r, s, v }
    }

    pub fn get(&self, param: NgParam) -> &[f64] {
        match param {
            NgParam::M => &self.m,
            NgParam::R => &self.r,
            NgParam::S => &self.s,
            NgParam::V => &self.v,
        }
    }

    /// Draw every hyperparameter uniformly from its grid
    pub fn draw<R: Rng>(&self, rng: &mut R) -> NormalGamma {
        NormalGamma::new_unchecked(
            choose_uniform(&self.m, rng),
            choose_uniform(&self.r, rng),
            choose_uniform(&self.s, rng),
            choose_uniform(&self.v, rng),
        )
    }

    /// Log marginal likelihood of the data in every one of `stats` for each
    /// grid value of `param`, the other parameters held at those of `ng`
    pub fn conditionals(
        &self,
        ng: &NormalGamma,
        param: NgParam,
        stats: &[GaussianSuffStat],
    ) -> Vec<f64> {
        let mut candidate = ng.clone();
        self.get(param)
            .iter()
            .map(|&value| {
                param.set(&mut candidate, value);
                stats.iter().map(|stat| ng_ln_m(&candidate, stat)).sum()
            })
            .collect()
    }
}

/// Grid for the concentration of a categorical column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CsdGrid {
    pub k: usize,
    pub alpha: Vec<f64>,
}

impl CsdGrid {
    pub fn new(k: usize, n_rows: usize) -> Self {
        Self {
            k,
            alpha: log_linspace(1.0, n_rows.max(2) as f64, N_GRID),
        }
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> SymmetricDirichlet {
        SymmetricDirichlet::new_unchecked(choose_uniform(&self.alpha, rng), self.k)
    }

    /// Log marginal likelihood of the data in every one of `stats` for each
    /// concentration on the grid
    pub fn conditionals(&self, stats: &[CategoricalSuffStat]) -> Vec<f64> {
        self.alpha
            .iter()
            .map(|&alpha| {
                let csd = SymmetricDirichlet::new_unchecked(alpha, self.k);
                stats.iter().map(|stat| csd_ln_m(&csd, stat)).sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rv::traits::SuffStat;
    use approx::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn crp_grid_spans_one_to_n() {
        let grid = crp_alpha_grid(100);
        assert_eq!(grid.len(), N_GRID);
        assert_relative_eq!(grid[0], 1.0, epsilon = 1E-12);
        assert_relative_eq!(grid[N_GRID - 1], 100.0, epsilon = 1E-9);
    }

    #[test]
    fn crp_grid_for_single_item_is_finite() {
        assert!(crp_alpha_grid(1).iter().all(|&a| a == 1.0));
        assert_eq!(crp_alpha_grid(0).len(), N_GRID);
    }

    #[test]
    fn ng_grid_from_data() {
        let xs = vec![1.0, 2.0, 3.0, 4.0];
        let grid = NgGrid::new(&xs, 4);
        // sum of squared deviations is 5
        assert_relative_eq!(grid.s[N_GRID - 1], 5.0, epsilon = 1E-9);
        assert_relative_eq!(grid.s[0], 0.05, epsilon = 1E-9);
        assert_relative_eq!(grid.m[0], 1.0, epsilon = 1E-12);
        assert_relative_eq!(grid.m[N_GRID - 1], 4.0, epsilon = 1E-12);
        assert_relative_eq!(grid.r[N_GRID - 1], 4.0, epsilon = 1E-9);
        assert_eq!(grid.r, grid.v);
    }

    #[test]
    fn ng_grid_with_constant_column_has_positive_s() {
        let grid = NgGrid::new(&[2.0, 2.0, 2.0], 3);
        assert!(grid.s.iter().all(|&s| s > 0.0));
        assert!(grid.m.iter().all(|&m| m == 2.0));
    }

    #[test]
    fn ng_grid_with_no_data() {
        let grid = NgGrid::new(&[], 10);
        assert!(grid.m.iter().all(|&m| m == 0.0));
        assert!(grid.s.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn drawn_hypers_are_on_the_grid() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let grid = NgGrid::new(&[0.5, -1.5, 3.2], 3);
        for _ in 0..20 {
            let ng = grid.draw(&mut rng);
            for param in NgParam::ALL {
                assert!(grid.get(param).contains(&param.get(&ng)));
            }
        }

        let csd_grid = CsdGrid::new(3, 20);
        let csd = csd_grid.draw(&mut rng);
        assert_eq!(csd.k(), 3);
        assert!(csd_grid.alpha.contains(&csd.alpha()));
    }

    #[test]
    fn empty_marginals_are_zero() {
        let ng = NormalGamma::new(0.0, 1.0, 1.0, 1.0).unwrap();
        let csd = SymmetricDirichlet::new(1.5, 4).unwrap();
        assert_relative_eq!(
            ng_ln_m(&ng, &GaussianSuffStat::new()),
            0.0,
            epsilon = 1E-10
        );
        assert_relative_eq!(
            csd_ln_m(&csd, &CategoricalSuffStat::new(4)),
            0.0,
            epsilon = 1E-10
        );
    }

    #[test]
    fn one_categorical_datum_has_uniform_marginal() {
        let csd = SymmetricDirichlet::new(0.7, 4).unwrap();
        let mut stat = CategoricalSuffStat::new(4);
        stat.observe(&2_u32);
        assert_relative_eq!(csd_ln_m(&csd, &stat), 0.25_f64.ln(), epsilon = 1E-10);
    }

    #[test]
    fn ng_conditionals_sum_over_stats() {
        let ng = NormalGamma::new(0.0, 1.0, 1.0, 1.0).unwrap();
        let stats: Vec<GaussianSuffStat> = vec![
            GaussianSuffStat::from(&[1.0, 2.0][..]),
            GaussianSuffStat::from(&[-3.0][..]),
        ];
        let grid = NgGrid::new(&[-3.0, 1.0, 2.0], 3);
        let conds = grid.conditionals(&ng, NgParam::S, &stats);
        assert_eq!(conds.len(), N_GRID);

        let mut expected = ng.clone();
        expected.set_s_unchecked(grid.s[2]);
        assert_relative_eq!(
            conds[2],
            ng_ln_m(&expected, &stats[0]) + ng_ln_m(&expected, &stats[1]),
            epsilon = 1E-10
        );
        // the prior itself is untouched
        assert_eq!(ng, NormalGamma::new(0.0, 1.0, 1.0, 1.0).unwrap());
    }

    #[test]
    fn csd_conditionals_favor_sharp_alpha_for_pure_clusters() {
        let grid = CsdGrid::new(3, 100);
        let mut stat = CategoricalSuffStat::new(3);
        (0..50).for_each(|_| stat.observe(&1_u32));
        let conds = grid.conditionals(&[stat]);
        // counts piled on one category prefer the smallest concentration
        assert!(conds[0] > conds[N_GRID - 1]);
    }
}
