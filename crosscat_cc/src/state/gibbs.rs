use std::collections::BTreeMap;

use super::State;

use crate::error::NumericalError;
use crate::feature::{ColModel, Feature};
use crate::misc::checked_ln_pflip;
use crate::view::View;

use crosscat_stats::prior_process::{Crp, PriorProcess};
use crosscat_utils::choose_uniform;
use rand::seq::SliceRandom;
use rand::Rng;

/// The Gibbs weights for moving one column, along with the partition a new
/// view would take
pub(crate) struct ColumnProposal {
    /// Unnormalized log weight of each view followed by the new view
    pub logps: Vec<f64>,
    /// The log likelihood of the column under each option
    pub ftr_logps: Vec<f64>,
    /// The row partition of the new view
    pub singleton: PriorProcess,
}

/// A column taken out of its view. If the column was alone in its view, the
/// view's row partition is kept so that staying put is one of the options.
pub(crate) struct ExtractedFeature {
    pub ftr: ColModel,
    pub singleton: Option<PriorProcess>,
}

impl State {
    /// Reassign all columns, or only those in `col_ixs`, using the Gibbs
    /// transition
    pub fn reassign_cols_gibbs<R: Rng>(
        &mut self,
        col_ixs: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<(), NumericalError> {
        if self.n_cols() < 2 {
            return Ok(());
        }

        // The algorithm is not valid if the columns are not scanned in
        // random order
        let mut col_ixs: Vec<usize> = match col_ixs {
            Some(ixs) => ixs.to_vec(),
            None => (0..self.n_cols()).collect(),
        };
        col_ixs.shuffle(rng);

        for col_ix in col_ixs {
            self.reassign_col_gibbs(col_ix, rng)?;
        }

        debug_assert!(self.asgn().validate().is_valid());
        Ok(())
    }

    /// Move the column at `col_ix`. Returns the log likelihood of the column
    /// in its new view.
    pub fn reassign_col_gibbs<R: Rng>(
        &mut self,
        col_ix: usize,
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let ExtractedFeature { ftr, singleton } = self.extract_ftr(col_ix);
        self.insert_feature_with(ftr, singleton, rng)
    }

    /// The Gibbs weights of `ftr` under every view and one new view. The new
    /// view takes the `singleton` row partition if given, otherwise one drawn
    /// from the CRP.
    pub(crate) fn col_gibbs_logps<R: Rng>(
        &self,
        ftr: &ColModel,
        singleton: Option<PriorProcess>,
        rng: &mut R,
    ) -> ColumnProposal {
        let process = &self.prior_process.process;
        let n_views = self.n_views();

        let mut logps: Vec<f64> = Vec::with_capacity(n_views + 1);
        let mut ftr_logps: Vec<f64> = Vec::with_capacity(n_views + 1);

        for (view, &ct) in self.views.iter().zip(self.asgn().counts.iter()) {
            let lp = ftr.asgn_score(view.asgn());
            ftr_logps.push(lp);
            logps.push(process.ln_gibbs_weight(ct) + lp);
        }

        let singleton = singleton.unwrap_or_else(|| {
            let alpha = choose_uniform(&self.view_alpha_grid, rng);
            let process = Crp::new(alpha);
            let asgn = process.draw_assignment(self.n_rows_for(ftr), rng);
            PriorProcess { process, asgn }
        });
        let lp = ftr.asgn_score(&singleton.asgn);
        ftr_logps.push(lp);
        logps.push(process.ln_singleton_weight() + lp);

        ColumnProposal {
            logps,
            ftr_logps,
            singleton,
        }
    }

    /// Insert an unassigned feature into the `State` via the Gibbs
    /// algorithm. Returns the log likelihood of the column in its new view.
    pub fn insert_feature<R: Rng>(
        &mut self,
        ftr: ColModel,
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        self.insert_feature_with(ftr, None, rng)
    }

    fn insert_feature_with<R: Rng>(
        &mut self,
        ftr: ColModel,
        singleton: Option<PriorProcess>,
        rng: &mut R,
    ) -> Result<f64, NumericalError> {
        let col_ix = ftr.id();
        let n_views = self.n_views();

        let proposal = self.col_gibbs_logps(&ftr, singleton, rng);
        let v_new = checked_ln_pflip(
            &proposal.logps,
            "column_partition_assignments",
            rng,
        )?;

        if v_new == n_views {
            self.views.push(View {
                ftrs: BTreeMap::new(),
                prior_process: proposal.singleton,
                alpha_grid: self.view_alpha_grid.clone(),
            });
        }

        self.asgn_mut().reassign(col_ix, v_new);
        self.views[v_new].insert_feature(ftr);
        Ok(proposal.ftr_logps[v_new])
    }

    /// Extract a feature from its view, unassign it, and drop the view if it
    /// is a singleton.
    pub(crate) fn extract_ftr(&mut self, col_ix: usize) -> ExtractedFeature {
        let v = self.asgn().asgn[col_ix];
        let ftr = match self.views[v].remove_feature(col_ix) {
            Some(ftr) => ftr,
            None => panic!("column {col_ix} is not in its view ({v})"),
        };
        let singleton = match self.asgn_mut().unassign(col_ix) {
            Some((v, true)) => Some(self.drop_view(v).prior_process),
            _ => None,
        };
        ExtractedFeature { ftr, singleton }
    }

    // Views may all be gone while the last column is out
    fn n_rows_for(&self, ftr: &ColModel) -> usize {
        self.views.first().map_or_else(|| ftr.len(), |view| view.n_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crosscat_codebook::ColType;
    use crosscat_data::Table;
    use crosscat_stats::prior_process::InitMode;
    use crosscat_utils::{log_normalize, logsumexp};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    use crate::state::Builder;

    fn gen_state(
        n_rows: usize,
        n_cols: usize,
        col_init: InitMode,
        rng: &mut Xoshiro256Plus,
    ) -> State {
        let cols = (0..n_cols)
            .map(|_| (0..n_rows).map(|_| rng.gen::<f64>()).collect())
            .collect();
        let table = Table::from_columns(cols).unwrap();
        let ftrs = (0..n_cols)
            .map(|ix| ColModel::from_table(ix, &ColType::Continuous, &table, rng))
            .collect();
        Builder::new(ftrs)
            .column_init_mode(col_init)
            .seed_from_rng(rng)
            .build()
            .unwrap()
    }

    #[test]
    fn extract_ftr_non_singleton() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(10, 4, InitMode::Together, &mut rng);
        assert_eq!(state.n_views(), 1);

        let ExtractedFeature { ftr, singleton } = state.extract_ftr(2);
        assert_eq!(ftr.id(), 2);
        assert!(singleton.is_none());
        assert_eq!(state.n_views(), 1);
        assert_eq!(state.asgn().counts, vec![3]);
        assert_eq!(state.views[0].n_cols(), 3);
    }

    #[test]
    fn extract_ftr_singleton_shifts_views() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(10, 3, InitMode::Apart, &mut rng);
        assert_eq!(state.n_views(), 3);

        let view_asgn = state.views[1].asgn().clone();
        let extracted = state.extract_ftr(1);
        assert_eq!(extracted.singleton.map(|pp| pp.asgn), Some(view_asgn));
        assert_eq!(state.n_views(), 2);
        assert_eq!(state.asgn().asgn[0], 0);
        assert_eq!(state.asgn().asgn[2], 1);
        assert!(state.views[1].ftrs.contains_key(&2));
    }

    #[test]
    fn column_gibbs_weights_normalize() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(15, 5, InitMode::FromThePrior, &mut rng);
        let ExtractedFeature { ftr, singleton } = state.extract_ftr(3);
        let mut proposal = state.col_gibbs_logps(&ftr, singleton, &mut rng);
        assert_eq!(proposal.logps.len(), state.n_views() + 1);
        log_normalize(&mut proposal.logps);
        assert!(logsumexp(&proposal.logps).abs() < 1E-10);

        state.insert_feature(ftr, &mut rng).unwrap();
        assert!(state.asgn().validate().is_valid());
        assert_eq!(state.n_cols(), 5);
    }

    #[test]
    fn new_view_proposal_covers_all_rows() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(12, 2, InitMode::Together, &mut rng);
        let ExtractedFeature { ftr, singleton } = state.extract_ftr(0);
        assert!(singleton.is_none());
        let proposal = state.col_gibbs_logps(&ftr, None, &mut rng);
        assert_eq!(proposal.singleton.asgn.len(), 12);
        assert!(state
            .view_alpha_grid
            .contains(&proposal.singleton.process.alpha));
    }

    // Column 0 sits alone in a view whose rows split cleanly into two far
    // apart clusters. Re-proposing the column must offer that same view, so
    // the learned row partition survives.
    #[test]
    fn lone_column_keeps_its_learned_row_partition() {
        use crate::view;
        use crosscat_stats::assignment::Assignment;
        use crosscat_stats::hyper_grid::crp_alpha_grid;

        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let n_rows = 40;
        let bimodal: Vec<f64> = (0..n_rows)
            .map(|i| {
                let center = if i < n_rows / 2 { 0.0 } else { 1000.0 };
                center + rng.gen::<f64>() * 0.01
            })
            .collect();
        let noise: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>()).collect();
        let table = Table::from_columns(vec![bimodal, noise]).unwrap();

        let split: Vec<usize> = (0..n_rows).map(|i| i / (n_rows / 2)).collect();
        let mut views: Vec<View> = Vec::new();
        for (col_ix, asgn) in [
            (0, Assignment::from_vec(split).unwrap()),
            (1, Assignment::together(n_rows)),
        ] {
            let ftr =
                ColModel::from_table(col_ix, &ColType::Continuous, &table, &mut rng);
            let view = view::Builder::from_assignment(asgn)
                .alpha(1.0)
                .features(vec![ftr])
                .seed_from_rng(&mut rng)
                .build()
                .unwrap();
            views.push(view);
        }

        let state = State::new(
            views,
            PriorProcess {
                process: Crp::new(1.0),
                asgn: Assignment::from_vec(vec![0, 1]).unwrap(),
            },
            crp_alpha_grid(2),
            crp_alpha_grid(n_rows),
        );

        let n_kept = (0..200)
            .filter(|_| {
                let mut state = state.clone();
                state.reassign_col_gibbs(0, &mut rng).unwrap();
                let view = &state.views[state.asgn().asgn[0]];
                let z = &view.asgn().asgn;
                view.n_cats() == 2
                    && z[..n_rows / 2].iter().all(|&k| k == z[0])
                    && z[n_rows / 2..].iter().all(|&k| k == z[n_rows - 1])
            })
            .count();
        assert!(n_kept > 190, "kept the partition {n_kept} of 200 times");
    }

    #[test]
    fn restricted_column_gibbs_only_moves_listed_columns() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(20, 4, InitMode::Together, &mut rng);
        for _ in 0..20 {
            state.reassign_cols_gibbs(Some(&[3]), &mut rng).unwrap();
            let asgn = &state.asgn().asgn;
            assert_eq!(asgn[0], asgn[1]);
            assert_eq!(asgn[1], asgn[2]);
        }
    }

    #[test]
    fn single_column_is_never_moved() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let mut state = gen_state(20, 1, InitMode::FromThePrior, &mut rng);
        let before = state.clone();
        state.reassign_cols_gibbs(None, &mut rng).unwrap();
        assert_eq!(state, before);
    }
}
