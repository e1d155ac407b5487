use crate::Datum;
use std::convert::TryFrom;

pub trait AccumScore<T> {
    /// Compute scores on the data using `score_fn` and add them to `scores`.
    /// Missing entries contribute nothing.
    fn accum_score<F: Fn(&T) -> f64>(&self, scores: &mut [f64], score_fn: &F);
}

/// A column of possibly missing data
pub trait Container<T: Clone + TryFrom<Datum>> {
    /// Number of entries, present or missing
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the entry at ix if it is present
    fn get(&self, ix: usize) -> Option<T>;

    /// Insert or overwrite an entry at ix
    fn insert_overwrite(&mut self, ix: usize, x: T);

    /// Append a new datum to the end of the container
    fn push(&mut self, xopt: Option<T>);

    /// Get as cloned vector containing only the present data
    fn present_cloned(&self) -> Vec<T>;

    /// Mark the entry at ix as missing and return it if it was present. Does
    /// not decrease the length.
    fn remove(&mut self, ix: usize) -> Option<T>;

    fn push_datum(&mut self, x: Datum) {
        match x {
            Datum::Missing => self.push(None),
            _ => {
                if let Ok(val) = T::try_from(x) {
                    self.push(Some(val));
                } else {
                    panic!("failed to convert pushed datum");
                }
            }
        }
    }

    fn insert_datum(&mut self, row_ix: usize, x: Datum) {
        match x {
            Datum::Missing => {
                self.remove(row_ix);
            }
            _ => {
                if let Ok(val) = T::try_from(x) {
                    self.insert_overwrite(row_ix, val)
                } else {
                    panic!("failed to convert inserted datum");
                }
            }
        }
    }
}
