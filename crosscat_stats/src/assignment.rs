//! Data structures for assignments of items to components (partitions)
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marks an entry that has been pulled out of the partition
pub const UNASSIGNED: usize = usize::MAX;

/// Validates assignments unless `CROSSCAT_NOCHECK` was set to `"1"` at
/// compile time.
#[macro_export]
macro_rules! validate_assignment {
    ($asgn:expr) => {{
        let validate_asgn: bool = match option_env!("CROSSCAT_NOCHECK") {
            Some(value) => value != "1",
            None => true,
        };
        if validate_asgn {
            $asgn.validate().is_valid()
        } else {
            true
        }
    }};
}

/// A partition of `0..n` into `n_cats` groups
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Assignment {
    /// The assignment vector. `asgn[i]` is the partition index of the
    /// i<sup>th</sup> datum.
    pub asgn: Vec<usize>,
    /// Contains the number a data assigned to each partition
    pub counts: Vec<usize>,
    /// The number of partitions/categories
    pub n_cats: usize,
}

/// The possible ways an assignment can go wrong with incorrect bookkeeping
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug, Clone)]
pub struct AssignmentDiagnostics {
    /// No entry is left marked as unassigned
    all_entries_assigned: bool,
    /// There should be a partition with index zero in the assignment vector
    asgn_min_is_zero: bool,
    /// If `n_cats` is `k`, then the largest index in `asgn` should be `k-1`
    asgn_max_is_n_cats_minus_one: bool,
    /// If `n_cats` is `k`, then there should be indices 0, ..., k-1 in the
    /// assignment vector
    asgn_contains_0_through_n_cats_minus_1: bool,
    /// None of the entries in `counts` should be 0
    no_zero_counts: bool,
    /// `counts` should have an entry for every partition/category
    n_cats_cmp_counts_len: bool,
    /// The sum of `counts` should be the number of data
    sum_counts_cmp_n: bool,
    /// Each entry of `counts` matches the number of times its index appears
    /// in the assignment vector
    asgn_agrees_with_counts: bool,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AssignmentError {
    #[error("One or more entries are unassigned")]
    UnassignedEntry,
    #[error("Minimum assignment index is not 0")]
    MinAssignmentIndexNotZero,
    #[error("Max assignment index is not n_cats - 1")]
    MaxAssignmentIndexNotNCatsMinusOne,
    #[error("The assignment is missing one or more indices")]
    AssignmentDoesNotContainAllIndices,
    #[error("One or more of the counts is zero")]
    ZeroCounts,
    #[error("The sum of counts does not equal the number of data")]
    SumCountsNotEqualToAssignmentLength,
    #[error("The counts do not agree with the assignment")]
    AssignmentAndCountsDisagree,
    #[error(
        "The length of the counts does not equal the number of categories"
    )]
    NCatsIsNotCountsLength,
    #[error("Attempting to set assignment with a different-length assignment")]
    NewAssignmentLengthMismatch,
}

impl AssignmentDiagnostics {
    pub fn new(asgn: &Assignment) -> Self {
        let tallies = {
            let mut tallies = vec![0_usize; asgn.n_cats];
            asgn.asgn.iter().for_each(|&z| {
                if z < asgn.n_cats {
                    tallies[z] += 1;
                }
            });
            tallies
        };

        AssignmentDiagnostics {
            all_entries_assigned: asgn.asgn.iter().all(|&z| z != UNASSIGNED),
            asgn_min_is_zero: { *asgn.asgn.iter().min().unwrap_or(&0) == 0 },
            asgn_max_is_n_cats_minus_one: {
                asgn.asgn
                    .iter()
                    .max()
                    .map(|&x| x.checked_add(1) == Some(asgn.n_cats))
                    .unwrap_or(true)
            },
            asgn_contains_0_through_n_cats_minus_1: tallies
                .iter()
                .all(|&ct| ct > 0),
            no_zero_counts: !asgn.counts.iter().any(|&ct| ct == 0),
            n_cats_cmp_counts_len: asgn.n_cats == asgn.counts.len(),
            sum_counts_cmp_n: {
                let n: usize = asgn.counts.iter().sum();
                n == asgn.asgn.len()
            },
            asgn_agrees_with_counts: tallies.len() == asgn.counts.len()
                && tallies.iter().zip(asgn.counts.iter()).all(|(a, b)| a == b),
        }
    }

    /// `true` if none of diagnostics was violated
    pub fn is_valid(&self) -> bool {
        self.emit_error().is_ok()
    }

    /// The first violated diagnostic as an error
    pub fn emit_error(&self) -> Result<(), AssignmentError> {
        let checks = [
            (self.all_entries_assigned, AssignmentError::UnassignedEntry),
            (
                self.asgn_min_is_zero,
                AssignmentError::MinAssignmentIndexNotZero,
            ),
            (
                self.asgn_max_is_n_cats_minus_one,
                AssignmentError::MaxAssignmentIndexNotNCatsMinusOne,
            ),
            (
                self.asgn_contains_0_through_n_cats_minus_1,
                AssignmentError::AssignmentDoesNotContainAllIndices,
            ),
            (self.no_zero_counts, AssignmentError::ZeroCounts),
            (
                self.n_cats_cmp_counts_len,
                AssignmentError::NCatsIsNotCountsLength,
            ),
            (
                self.sum_counts_cmp_n,
                AssignmentError::SumCountsNotEqualToAssignmentLength,
            ),
            (
                self.asgn_agrees_with_counts,
                AssignmentError::AssignmentAndCountsDisagree,
            ),
        ];

        checks
            .into_iter()
            .find(|(ok, _)| !ok)
            .map_or(Ok(()), |(_, err)| Err(err))
    }
}

impl Assignment {
    pub fn empty() -> Self {
        Self {
            asgn: Vec::new(),
            counts: Vec::new(),
            n_cats: 0,
        }
    }

    /// Build from an assignment vector, computing the counts
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat_stats::assignment::{Assignment, AssignmentError};
    /// let asgn = Assignment::from_vec(vec![0, 1, 0, 2]).unwrap();
    /// assert_eq!(asgn.counts, vec![2, 1, 1]);
    ///
    /// // index 1 is skipped
    /// let bad = Assignment::from_vec(vec![0, 2, 2]);
    /// assert!(bad.is_err());
    /// ```
    pub fn from_vec(asgn: Vec<usize>) -> Result<Self, AssignmentError> {
        if asgn.iter().any(|&z| z == UNASSIGNED) {
            return Err(AssignmentError::UnassignedEntry);
        }

        // a partition of n items has at most n groups
        let n_cats: usize = match asgn.iter().max() {
            Some(&max) if max >= asgn.len() => {
                return Err(AssignmentError::AssignmentDoesNotContainAllIndices)
            }
            Some(&max) => max + 1,
            None => 0,
        };
        let mut counts: Vec<usize> = vec![0; n_cats];
        for z in &asgn {
            counts[*z] += 1;
        }

        let asgn = Assignment {
            asgn,
            counts,
            n_cats,
        };

        if validate_assignment!(asgn) {
            Ok(asgn)
        } else {
            asgn.validate().emit_error().map(|_| asgn)
        }
    }

    /// Every entry in one group
    pub fn together(n: usize) -> Self {
        Self {
            asgn: vec![0; n],
            counts: if n == 0 { vec![] } else { vec![n] },
            n_cats: usize::from(n > 0),
        }
    }

    /// Every entry in its own group
    pub fn apart(n: usize) -> Self {
        Self {
            asgn: (0..n).collect(),
            counts: vec![1; n],
            n_cats: n,
        }
    }

    /// Replace the assignment vector
    pub fn set_asgn(
        &mut self,
        asgn: Vec<usize>,
    ) -> Result<(), AssignmentError> {
        if asgn.len() != self.asgn.len() {
            return Err(AssignmentError::NewAssignmentLengthMismatch);
        }
        *self = Self::from_vec(asgn)?;
        Ok(())
    }

    /// Create and iterator for the assignment vector
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.asgn.iter()
    }

    pub fn len(&self) -> usize {
        self.asgn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of the entries in group `k`
    pub fn members(&self, k: usize) -> Vec<usize> {
        self.asgn
            .iter()
            .enumerate()
            .filter_map(|(ix, &z)| if z == k { Some(ix) } else { None })
            .collect()
    }

    /// Mark the entry at ix as unassigned. Will remove the entry's contribution
    /// to `n_cats` and `counts`, and will mark `asgn[ix]` with the unassigned
    /// designator. A group left empty is removed and the groups above it are
    /// shifted down.
    ///
    /// Returns the group the entry was in and whether that group was removed.
    pub fn unassign(&mut self, ix: usize) -> Option<(usize, bool)> {
        if self.asgn[ix] == UNASSIGNED {
            return None;
        }

        let k = self.asgn[ix];
        let removed = if self.counts[k] == 1 {
            self.asgn.iter_mut().for_each(|z| {
                if *z > k && *z != UNASSIGNED {
                    *z -= 1
                }
            });
            let _ct = self.counts.remove(k);
            self.n_cats -= 1;
            true
        } else {
            self.counts[k] -= 1;
            false
        };
        self.asgn[ix] = UNASSIGNED;
        Some((k, removed))
    }

    /// Reassign an unassigned entry. `k == n_cats` opens a new group.
    ///
    /// # Panics
    ///
    /// If `ix` is assigned or `k > n_cats`.
    pub fn reassign(&mut self, ix: usize, k: usize) {
        // If the index is the one beyond the number of entries, append k.
        if ix == self.len() {
            self.asgn.push(UNASSIGNED);
        }

        if self.asgn[ix] != UNASSIGNED {
            panic!("Entry {} is assigned. Use assign instead", ix);
        } else if k < self.n_cats {
            self.asgn[ix] = k;
            self.counts[k] += 1;
        } else if k == self.n_cats {
            self.asgn[ix] = k;
            self.n_cats += 1;
            self.counts.push(1);
        } else {
            panic!("k ({}) larger than n_cats ({})", k, self.n_cats);
        }
    }

    /// Append a new, unassigned entry to the end of the assignment
    pub fn push_unassigned(&mut self) {
        self.asgn.push(UNASSIGNED)
    }

    /// Validates the assignment
    pub fn validate(&self) -> AssignmentDiagnostics {
        AssignmentDiagnostics::new(self)
    }
}

/// Log probability of a partition with group sizes `cts` of `n` items under
/// a CRP with concentration `alpha`
pub fn lcrp(n: usize, cts: &[usize], alpha: f64) -> f64 {
    let k: f64 = cts.len() as f64;
    let gsum = cts.iter().fold(0.0, |acc, ct| {
        acc + ::special::Gamma::ln_gamma(*ct as f64).0
    });
    let cpnt_2 = ::special::Gamma::ln_gamma(alpha).0
        - ::special::Gamma::ln_gamma(n as f64 + alpha).0;
    gsum + k.mul_add(alpha.ln(), cpnt_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn zero_count_fails_validation() {
        let asgn = Assignment {
            asgn: vec![0, 0, 0, 0],
            counts: vec![0, 4],
            n_cats: 1,
        };

        let diagnostic = asgn.validate();

        assert!(!diagnostic.is_valid());

        assert!(diagnostic.asgn_min_is_zero);
        assert!(diagnostic.asgn_max_is_n_cats_minus_one);
        assert!(diagnostic.asgn_contains_0_through_n_cats_minus_1);
        assert!(diagnostic.sum_counts_cmp_n);
        assert!(!diagnostic.n_cats_cmp_counts_len);
        assert!(!diagnostic.no_zero_counts);
        assert!(!diagnostic.asgn_agrees_with_counts);
    }

    #[test]
    fn bad_counts_fails_validation() {
        let asgn = Assignment {
            asgn: vec![1, 1, 0, 0],
            counts: vec![2, 3],
            n_cats: 2,
        };

        let diagnostic = asgn.validate();

        assert!(!diagnostic.is_valid());
        assert!(!diagnostic.sum_counts_cmp_n);
        assert!(!diagnostic.asgn_agrees_with_counts);
        assert_eq!(
            diagnostic.emit_error(),
            Err(AssignmentError::SumCountsNotEqualToAssignmentLength)
        );
    }

    #[test]
    fn high_n_cats_fails_validation() {
        let asgn = Assignment {
            asgn: vec![1, 1, 0, 0],
            counts: vec![2, 2],
            n_cats: 3,
        };

        let diagnostic = asgn.validate();

        assert!(!diagnostic.is_valid());

        assert!(diagnostic.asgn_min_is_zero);
        assert!(!diagnostic.asgn_max_is_n_cats_minus_one);
        assert!(!diagnostic.asgn_contains_0_through_n_cats_minus_1);
        assert!(diagnostic.sum_counts_cmp_n);
        assert!(!diagnostic.n_cats_cmp_counts_len);
        assert!(diagnostic.no_zero_counts);
    }

    #[test]
    fn unassigned_entry_fails_validation() {
        let mut asgn = Assignment::from_vec(vec![0, 0, 1]).unwrap();
        asgn.unassign(0);
        assert_eq!(
            asgn.validate().emit_error(),
            Err(AssignmentError::UnassignedEntry)
        );
    }

    #[test]
    fn diagnostics_tolerate_unassigned_max() {
        let asgn = Assignment {
            asgn: vec![UNASSIGNED, 0, 0],
            counts: vec![2],
            n_cats: 1,
        };
        let diagnostics = asgn.validate();
        assert!(!diagnostics.asgn_max_is_n_cats_minus_one);
        assert!(!diagnostics.is_valid());
    }

    #[test]
    fn from_vec_rejects_huge_index_without_allocating() {
        assert_eq!(
            Assignment::from_vec(vec![0, usize::MAX - 1]),
            Err(AssignmentError::AssignmentDoesNotContainAllIndices)
        );
        assert_eq!(
            Assignment::from_vec(vec![0, 0, 3]),
            Err(AssignmentError::AssignmentDoesNotContainAllIndices)
        );
        // the largest index a partition of n items can use is n - 1
        assert!(Assignment::from_vec(vec![0, 1, 2]).is_ok());
    }

    #[test]
    fn from_vec_rejects_gaps() {
        assert_eq!(
            Assignment::from_vec(vec![1, 1, 2, 2]),
            Err(AssignmentError::MinAssignmentIndexNotZero)
        );
    }

    #[test]
    fn from_vec_counts() {
        let asgn = Assignment::from_vec(vec![0, 1, 2, 0, 1, 0]).unwrap();
        assert_eq!(asgn.n_cats, 3);
        assert_eq!(asgn.counts, vec![3, 2, 1]);
        assert_eq!(asgn.members(1), vec![1, 4]);
    }

    #[test]
    fn together_and_apart_are_valid() {
        for n in [0, 1, 7] {
            assert!(Assignment::together(n).validate().is_valid());
            assert!(Assignment::apart(n).validate().is_valid());
        }
        assert_eq!(Assignment::apart(4).n_cats, 4);
        assert_eq!(Assignment::together(4).counts, vec![4]);
    }

    #[test]
    fn set_asgn_length_mismatch() {
        let mut asgn = Assignment::together(3);
        assert_eq!(
            asgn.set_asgn(vec![0, 1]),
            Err(AssignmentError::NewAssignmentLengthMismatch)
        );
        asgn.set_asgn(vec![0, 1, 1]).unwrap();
        assert_eq!(asgn.counts, vec![1, 2]);
    }

    #[test]
    fn lcrp_all_ones() {
        let lcrp_1 = lcrp(4, &[1, 1, 1, 1], 1.0);
        assert_relative_eq!(lcrp_1, -3.178_053_830_347_95, epsilon = 10E-8);

        let lcrp_2 = lcrp(4, &[1, 1, 1, 1], 2.1);
        assert_relative_eq!(lcrp_2, -1.945_817_590_743_51, epsilon = 10E-8);
    }

    #[test]
    fn lcrp_single_group_alpha_one() {
        // n items in one table: (n-1)! / n! = 1/n
        assert_relative_eq!(
            lcrp(5, &[5], 1.0),
            -(5.0_f64.ln()),
            epsilon = 1E-10
        );
    }

    #[test]
    fn unassign_non_singleton() {
        let mut asgn = Assignment::from_vec(vec![0, 1, 1, 1, 2, 2]).unwrap();

        assert_eq!(asgn.unassign(1), Some((1, false)));

        assert_eq!(asgn.n_cats, 3);
        assert_eq!(asgn.counts, vec![1, 2, 2]);
        assert_eq!(asgn.asgn, vec![0, UNASSIGNED, 1, 1, 2, 2]);
    }

    #[test]
    fn unassign_singleton_low() {
        let mut asgn = Assignment::from_vec(vec![0, 1, 1, 1, 2, 2]).unwrap();

        assert_eq!(asgn.unassign(0), Some((0, true)));

        assert_eq!(asgn.n_cats, 2);
        assert_eq!(asgn.counts, vec![3, 2]);
        assert_eq!(asgn.asgn, vec![UNASSIGNED, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn unassign_singleton_middle() {
        let mut asgn = Assignment::from_vec(vec![0, 0, 1, 2, 2, 2]).unwrap();

        asgn.unassign(2);

        assert_eq!(asgn.n_cats, 2);
        assert_eq!(asgn.counts, vec![2, 3]);
        assert_eq!(asgn.asgn, vec![0, 0, UNASSIGNED, 1, 1, 1]);
    }

    #[test]
    fn unassign_twice_is_a_no_op() {
        let mut asgn = Assignment::from_vec(vec![0, 0, 1]).unwrap();
        asgn.unassign(0);
        assert_eq!(asgn.unassign(0), None);
        assert_eq!(asgn.counts, vec![1, 1]);
    }

    #[test]
    fn reassign_to_existing_cat() {
        let mut asgn = Assignment::from_vec(vec![0, 1, 1, 1, 2, 2]).unwrap();

        asgn.unassign(1);
        asgn.reassign(1, 1);

        assert_eq!(asgn.n_cats, 3);
        assert_eq!(asgn.counts, vec![1, 3, 2]);
        assert_eq!(asgn.asgn, vec![0, 1, 1, 1, 2, 2]);
        assert!(asgn.validate().is_valid());
    }

    #[test]
    fn reassign_to_new_cat() {
        let mut asgn = Assignment::from_vec(vec![0, 1, 1, 1, 2, 2]).unwrap();

        asgn.unassign(0);
        asgn.reassign(0, 2);

        assert_eq!(asgn.n_cats, 3);
        assert_eq!(asgn.counts, vec![3, 2, 1]);
        assert_eq!(asgn.asgn, vec![2, 0, 0, 0, 1, 1]);
        assert!(asgn.validate().is_valid());
    }

    #[test]
    #[should_panic]
    fn reassign_assigned_entry_panics() {
        let mut asgn = Assignment::from_vec(vec![0, 1]).unwrap();
        asgn.reassign(0, 1);
    }

    #[test]
    fn push_unassigned_then_reassign() {
        let mut asgn = Assignment::from_vec(vec![0, 0, 1]).unwrap();
        asgn.push_unassigned();
        assert_eq!(asgn.asgn, vec![0, 0, 1, UNASSIGNED]);
        asgn.reassign(3, 0);
        assert_eq!(asgn.counts, vec![3, 1]);
    }
}
