use std::convert::TryFrom;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::{AccumScore, Container, Datum};

/// Dense storage for one column of data with a presence mask
///
/// Missing entries hold `T::default()` in `data` and `false` in `present`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct DataContainer<T: Clone> {
    pub data: Vec<T>,
    pub present: Vec<bool>,
}

impl<T: Clone + Default> DataContainer<T> {
    /// A container in which every entry is present
    pub fn new(data: Vec<T>) -> Self {
        let n = data.len();
        DataContainer {
            data,
            present: vec![true; n],
        }
    }

    /// Entries for which `pred` is false are stored as missing
    pub fn with_filter<F>(mut data: Vec<T>, pred: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        let present: Vec<bool> = data.iter().map(&pred).collect();
        data.iter_mut()
            .zip(present.iter())
            .filter(|(_, &pr)| !pr)
            .for_each(|(x, _)| *x = T::default());
        DataContainer { data, present }
    }

    /// A container of `n` missing entries
    pub fn all_missing(n: usize) -> Self {
        DataContainer {
            data: vec![T::default(); n],
            present: vec![false; n],
        }
    }

    /// Iterator over `(row_ix, value)` for the present entries
    pub fn present_iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.data
            .iter()
            .zip(self.present.iter())
            .enumerate()
            .filter_map(|(ix, (x, &pr))| if pr { Some((ix, x)) } else { None })
    }

    pub fn n_present(&self) -> usize {
        self.present.iter().filter(|&&pr| pr).count()
    }

    #[inline]
    pub fn is_present(&self, ix: usize) -> bool {
        self.present[ix]
    }
}

impl DataContainer<f64> {
    /// Build from raw cells in which `NaN` marks a missing value
    pub fn from_nan_coded(xs: Vec<f64>) -> Self {
        Self::with_filter(xs, |x| !x.is_nan())
    }
}

impl<T> Container<T> for DataContainer<T>
where
    T: Clone + Default + TryFrom<Datum>,
{
    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, ix: usize) -> Option<T> {
        if self.present[ix] {
            Some(self.data[ix].clone())
        } else {
            None
        }
    }

    fn insert_overwrite(&mut self, ix: usize, x: T) {
        self.data[ix] = x;
        self.present[ix] = true;
    }

    fn push(&mut self, xopt: Option<T>) {
        match xopt {
            Some(x) => {
                self.data.push(x);
                self.present.push(true);
            }
            None => {
                self.data.push(T::default());
                self.present.push(false);
            }
        }
    }

    fn present_cloned(&self) -> Vec<T> {
        self.present_iter().map(|(_, x)| x.clone()).collect()
    }

    fn remove(&mut self, ix: usize) -> Option<T> {
        if self.present[ix] {
            self.present[ix] = false;
            Some(std::mem::take(&mut self.data[ix]))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> AccumScore<T> for DataContainer<T> {
    fn accum_score<F: Fn(&T) -> f64>(&self, scores: &mut [f64], score_fn: &F) {
        self.present_iter()
            .for_each(|(ix, x)| scores[ix] += score_fn(x));
    }
}

impl<T: Clone> Index<usize> for DataContainer<T> {
    type Output = T;
    fn index(&self, ix: usize) -> &T {
        &self.data[ix]
    }
}
