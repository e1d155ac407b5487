use super::View;

use crate::error::NumericalError;
use crate::feature::Feature;
use crate::misc::checked_ln_pflip;
use rand::seq::SliceRandom;
use rand::Rng;

impl View {
    // Remove the row for the purposes of MCMC without deleting its data.
    pub(crate) fn remove_row(&mut self, row_ix: usize) {
        let k = self.asgn().asgn[row_ix];
        self.forget_row(row_ix, k);
        if let Some((k, true)) = self.asgn_mut().unassign(row_ix) {
            self.drop_component(k);
        }
    }

    /// The unnormalized log Gibbs weights of the unassigned row at `row_ix`
    /// for each cluster followed by a new cluster
    pub(crate) fn row_gibbs_logps(&self, row_ix: usize) -> Vec<f64> {
        let process = &self.prior_process.process;
        let mut logps: Vec<f64> = Vec::with_capacity(self.n_cats() + 1);

        self.asgn().counts.iter().enumerate().for_each(|(k, &ct)| {
            let w = process.ln_gibbs_weight(ct);
            logps.push(w + self.predictive_score_at(row_ix, k));
        });

        logps.push(process.ln_singleton_weight() + self.singleton_score(row_ix));
        logps
    }

    pub(crate) fn reinsert_row(
        &mut self,
        row_ix: usize,
        rng: &mut impl Rng,
    ) -> Result<(), NumericalError> {
        let k_new = if self.n_cats() == 0 {
            // If empty, assign to category zero
            debug_assert!(self.ftrs.values().all(|f| f.k() == 0));
            self.append_empty_component();
            0
        } else {
            let logps = self.row_gibbs_logps(row_ix);
            let k_new =
                checked_ln_pflip(&logps, "row_partition_assignments", rng)?;

            if k_new == self.n_cats() {
                self.append_empty_component();
            }

            k_new
        };

        self.observe_row(row_ix, k_new);
        self.asgn_mut().reassign(row_ix, k_new);
        Ok(())
    }

    pub fn reassign_row_gibbs(
        &mut self,
        row_ix: usize,
        rng: &mut impl Rng,
    ) -> Result<(), NumericalError> {
        self.remove_row(row_ix);
        self.reinsert_row(row_ix, rng)
    }

    /// Use the standard Gibbs kernel to reassign the rows, or only the rows
    /// in `row_ixs`
    pub fn reassign_rows_gibbs(
        &mut self,
        row_ixs: Option<&[usize]>,
        rng: &mut impl Rng,
    ) -> Result<(), NumericalError> {
        // Reassignment doesn't make any sense if there is only one row,
        // because there can only be one on component.
        if self.n_rows() < 2 {
            return Ok(());
        }

        // The algorithm is not valid if the rows are not scanned in
        // random order
        let mut row_ixs: Vec<usize> = match row_ixs {
            Some(ixs) => ixs.to_vec(),
            None => (0..self.n_rows()).collect(),
        };
        row_ixs.shuffle(rng);

        for row_ix in row_ixs {
            self.reassign_row_gibbs(row_ix, rng)?;
        }

        debug_assert!(self.asgn().validate().is_valid());
        Ok(())
    }
}
