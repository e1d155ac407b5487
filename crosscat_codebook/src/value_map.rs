use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::convert::TryFrom;
use std::hash::Hash;

/// A bijection between categories and the codes `0..k`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "BTreeMap<usize, T>", try_from = "BTreeMap<usize, T>")]
pub struct CategoryMap<T>
where
    T: Hash + Clone + Eq + Default + Ord,
{
    to_cat: Vec<T>,
    to_ix: HashMap<T, usize>,
}

impl<T> CategoryMap<T>
where
    T: Hash + Clone + Eq + Default + Ord,
{
    pub fn len(&self) -> usize {
        self.to_cat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_cat.is_empty()
    }

    pub fn ix(&self, cat: &T) -> Option<usize> {
        self.to_ix.get(cat).cloned()
    }

    pub fn category(&self, ix: usize) -> Option<&T> {
        self.to_cat.get(ix)
    }

    pub fn contains_cat(&self, cat: &T) -> bool {
        self.to_ix.contains_key(cat)
    }

    /// `true` if both directions of the map agree with each other
    pub fn is_bijective(&self) -> bool {
        self.to_cat.len() == self.to_ix.len()
            && self
                .to_cat
                .iter()
                .enumerate()
                .all(|(ix, cat)| self.to_ix.get(cat) == Some(&ix))
    }
}

impl<T> From<BTreeSet<T>> for CategoryMap<T>
where
    T: Hash + Clone + Eq + Ord + Default,
{
    fn from(set: BTreeSet<T>) -> Self {
        let to_cat: Vec<T> = set.into_iter().collect();
        let to_ix = to_cat
            .iter()
            .cloned()
            .enumerate()
            .map(|(ix, cat)| (cat, ix))
            .collect();
        Self { to_cat, to_ix }
    }
}

impl<T> TryFrom<Vec<T>> for CategoryMap<T>
where
    T: Hash + Clone + Eq + Ord + Default,
{
    type Error = String;

    fn try_from(cats: Vec<T>) -> Result<Self, Self::Error> {
        let to_ix: HashMap<T, usize> = cats
            .iter()
            .cloned()
            .enumerate()
            .map(|(ix, cat)| (cat, ix))
            .collect();

        if to_ix.len() == cats.len() {
            Ok(Self { to_ix, to_cat: cats })
        } else {
            Err(String::from("Duplicate entries"))
        }
    }
}

impl<T> From<CategoryMap<T>> for BTreeMap<usize, T>
where
    T: Hash + Clone + Eq + Default + Ord,
{
    fn from(value_map: CategoryMap<T>) -> Self {
        value_map.to_cat.into_iter().enumerate().collect()
    }
}

impl<T> TryFrom<BTreeMap<usize, T>> for CategoryMap<T>
where
    T: Hash + Clone + Eq + Default + Ord,
{
    type Error = String;

    fn try_from(map: BTreeMap<usize, T>) -> Result<Self, Self::Error> {
        let k = map.len();

        // fill to_cat with a dummy value so we can insert via indexing
        let mut to_cat = vec![T::default(); k];
        let mut to_ix = HashMap::new();

        for (ix, cat) in map {
            if ix >= k {
                return Err(format!(
                    "Category index {ix} exceeds the number of categories ({k})"
                ));
            }
            to_cat[ix] = cat.clone();
            if to_ix.insert(cat, ix).is_some() {
                return Err(format!("Category {ix} is a duplicate"));
            }
        }

        Ok(Self { to_ix, to_cat })
    }
}

/// Maps the raw values of a discrete column to and from its codes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueMap {
    /// Named values
    String(CategoryMap<String>),
    /// The raw values are the codes `0..k` themselves
    Identity(usize),
}

impl ValueMap {
    /// Build a map from a set of values. Codes follow the sort order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::BTreeSet;
    /// # use crosscat_codebook::ValueMap;
    /// let cats: BTreeSet<String> =
    ///     ["B", "C", "A"].iter().map(|s| s.to_string()).collect();
    ///
    /// let value_map = ValueMap::new(cats);
    ///
    /// assert_eq!(value_map.code("A"), Some(0));
    /// assert_eq!(value_map.code("C"), Some(2));
    /// assert_eq!(value_map.code("D"), None);
    /// assert_eq!(value_map.value(1), Some(String::from("B")));
    /// ```
    pub fn new(cats: BTreeSet<String>) -> Self {
        Self::String(CategoryMap::from(cats))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::String(inner) => inner.len(),
            Self::Identity(k) => *k,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The code of a raw value if it is in the map
    pub fn code(&self, value: &str) -> Option<u32> {
        match self {
            Self::String(map) => map.ix(&String::from(value)).map(|ix| ix as u32),
            Self::Identity(k) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&x| (x as usize) < *k),
        }
    }

    /// The raw value of a code if it is in the map
    pub fn value(&self, code: u32) -> Option<String> {
        match self {
            Self::String(map) => map.category(code as usize).cloned(),
            Self::Identity(k) => {
                if (code as usize) < *k {
                    Some(code.to_string())
                } else {
                    None
                }
            }
        }
    }

    /// `true` if `code(value(x)) == x` for every code
    pub fn is_bijective(&self) -> bool {
        match self {
            Self::String(map) => map.is_bijective(),
            Self::Identity(_) => true,
        }
    }
}

impl TryFrom<Vec<String>> for ValueMap {
    type Error = String;

    fn try_from(cats: Vec<String>) -> Result<Self, Self::Error> {
        CategoryMap::try_from(cats).map(Self::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_values_are_inverses() {
        let map = ValueMap::try_from(vec![
            String::from("low"),
            String::from("mid"),
            String::from("high"),
        ])
        .unwrap();
        assert!(map.is_bijective());
        for code in 0..3 {
            let value = map.value(code).unwrap();
            assert_eq!(map.code(&value), Some(code));
        }
        assert_eq!(map.value(3), None);
    }

    #[test]
    fn duplicate_values_are_rejected() {
        let res =
            ValueMap::try_from(vec![String::from("a"), String::from("a")]);
        assert!(res.is_err());
    }

    #[test]
    fn identity_map_parses_codes() {
        let map = ValueMap::Identity(3);
        assert_eq!(map.code("2"), Some(2));
        assert_eq!(map.code("3"), None);
        assert_eq!(map.code("two"), None);
        assert_eq!(map.value(1), Some(String::from("1")));
    }

    #[test]
    fn category_map_deserialize_rejects_gaps() {
        let mut raw = BTreeMap::new();
        raw.insert(0_usize, String::from("a"));
        raw.insert(2_usize, String::from("b"));
        assert!(CategoryMap::try_from(raw).is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let map = ValueMap::new(
            ["x", "y"].iter().map(|s| s.to_string()).collect(),
        );
        let yaml = serde_yaml::to_string(&map).unwrap();
        let other: ValueMap = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(map, other);
    }
}
