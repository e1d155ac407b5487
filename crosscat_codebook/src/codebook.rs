use crate::error::{
    CodebookError, ColMetadataListError, InsertRowError, RowNameListError,
};
use crate::ValueMap;
use crosscat_data::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A structure that enforces unique row names.
///
/// # Notes
///
/// Serializes to a `Vec` of `String` and deserializes to a `Vec` of
/// `String`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(into = "Vec<String>")]
#[serde(try_from = "Vec<String>")]
pub struct RowNameList {
    row_names: Vec<String>,
    index_lookup: HashMap<String, usize>,
}

impl TryFrom<Vec<String>> for RowNameList {
    type Error = RowNameListError;

    fn try_from(row_names: Vec<String>) -> Result<Self, Self::Error> {
        let mut index_lookup: HashMap<String, usize> = HashMap::new();
        row_names
            .iter()
            .enumerate()
            .try_for_each(|(ix, row_name)| {
                if let Some(old_ix) = index_lookup.insert(row_name.clone(), ix)
                {
                    Err(RowNameListError::Duplicate {
                        row_name: row_name.clone(),
                        ix_1: old_ix,
                        ix_2: ix,
                    })
                } else {
                    Ok(())
                }
            })?;

        Ok(RowNameList {
            row_names,
            index_lookup,
        })
    }
}

impl From<RowNameList> for Vec<String> {
    fn from(rows: RowNameList) -> Self {
        rows.row_names
    }
}

impl RowNameList {
    pub fn new() -> RowNameList {
        RowNameList::default()
    }

    /// Names rows by their index
    pub fn from_range(range: std::ops::Range<usize>) -> RowNameList {
        let row_names: Vec<String> = range.map(|ix| format!("{ix}")).collect();
        let index_lookup = row_names
            .iter()
            .enumerate()
            .map(|(ix, name)| (name.clone(), ix))
            .collect();

        RowNameList {
            row_names,
            index_lookup,
        }
    }

    pub fn len(&self) -> usize {
        self.row_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_names.is_empty()
    }

    pub fn index(&self, row_name: &str) -> Option<usize> {
        self.index_lookup.get(row_name).cloned()
    }

    pub fn name(&self, ix: usize) -> Option<&String> {
        self.row_names.get(ix)
    }

    pub fn insert(&mut self, row_name: String) -> Result<(), InsertRowError> {
        use std::collections::hash_map::Entry;

        let ix = self.len();
        match self.index_lookup.entry(row_name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(ix);
                self.row_names.push(row_name);
                Ok(())
            }
            _ => Err(InsertRowError(row_name)),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        self.row_names.as_slice()
    }
}

/// A structure that enforces unique column names.
///
/// # Notes
/// Serializes to a `Vec` of `ColMetadata` and deserializes to a `Vec` of
/// `ColMetadata`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(into = "Vec<ColMetadata>", try_from = "Vec<ColMetadata>")]
pub struct ColMetadataList {
    metadata: Vec<ColMetadata>,
    index_lookup: HashMap<String, usize>,
}

impl ColMetadataList {
    /// Create a new `ColMetadataList`. Returns an error if any of the
    /// `ColMetadata`s' names are not unique (case sensitive).
    pub fn new(
        metadata: Vec<ColMetadata>,
    ) -> Result<Self, ColMetadataListError> {
        let mut index_lookup = HashMap::new();
        metadata
            .iter()
            .enumerate()
            .try_for_each(|(ix, md)| {
                if index_lookup.insert(md.name.clone(), ix).is_none() {
                    Ok(())
                } else {
                    Err(ColMetadataListError::Duplicate(md.name.clone()))
                }
            })
            .map(|_| ColMetadataList {
                metadata,
                index_lookup,
            })
    }

    /// Append a new column to the end of the list. Returns an error if the
    /// column's name already exists.
    pub fn push(&mut self, md: ColMetadata) -> Result<(), ColMetadataListError> {
        use std::collections::hash_map::Entry;

        let n = self.len();
        match self.index_lookup.entry(md.name.clone()) {
            Entry::Vacant(entry) => {
                self.metadata.push(md);
                entry.insert(n);
                debug_assert_eq!(self.metadata.len(), self.index_lookup.len());
                Ok(())
            }
            _ => Err(ColMetadataListError::Duplicate(md.name)),
        }
    }

    /// Iterate through the column metadata
    pub fn iter(&self) -> std::slice::Iter<ColMetadata> {
        self.metadata.iter()
    }

    /// The number of columns
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// True if there are no columns
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Return the integer index and the metadata of the column with `name` if
    /// it exists. Otherwise return `None`.
    pub fn get(&self, name: &str) -> Option<(usize, &ColMetadata)> {
        self.index_lookup
            .get(name)
            .map(|&ix| (ix, &self.metadata[ix]))
    }
}

impl From<ColMetadataList> for Vec<ColMetadata> {
    fn from(cols: ColMetadataList) -> Self {
        cols.metadata
    }
}

impl std::ops::Index<usize> for ColMetadataList {
    type Output = ColMetadata;

    fn index(&self, ix: usize) -> &Self::Output {
        &self.metadata[ix]
    }
}

impl std::ops::IndexMut<usize> for ColMetadataList {
    fn index_mut(&mut self, ix: usize) -> &mut ColMetadata {
        &mut self.metadata[ix]
    }
}

impl TryFrom<Vec<ColMetadata>> for ColMetadataList {
    type Error = ColMetadataListError;

    fn try_from(mds: Vec<ColMetadata>) -> Result<ColMetadataList, Self::Error> {
        ColMetadataList::new(mds)
    }
}

/// Codebook object for storing information about the dataset
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Codebook {
    /// The name of the table
    pub table_name: String,
    /// The metadata for each column
    pub col_metadata: ColMetadataList,
    /// Optional misc comments
    #[serde(default)]
    pub comments: Option<String>,
    /// Names of each row. May be empty, in which case rows are known by
    /// index only.
    #[serde(default)]
    pub row_names: RowNameList,
}

impl Default for Codebook {
    fn default() -> Codebook {
        Codebook::new(String::from("my_table"), ColMetadataList::default())
    }
}

impl Codebook {
    pub fn new(table_name: String, col_metadata: ColMetadataList) -> Self {
        Codebook {
            table_name,
            col_metadata,
            comments: None,
            row_names: RowNameList::new(),
        }
    }

    /// A codebook with `n_cols` continuous columns named by index
    pub fn all_continuous(table_name: &str, n_cols: usize) -> Self {
        let metadata = (0..n_cols)
            .map(|ix| ColMetadata {
                name: format!("{ix}"),
                coltype: ColType::Continuous,
                notes: None,
            })
            .collect();
        Codebook {
            table_name: String::from(table_name),
            col_metadata: ColMetadataList {
                index_lookup: (0..n_cols).map(|ix| (format!("{ix}"), ix)).collect(),
                metadata,
            },
            comments: None,
            row_names: RowNameList::new(),
        }
    }

    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, CodebookError> {
        let mut file = File::open(path)?;
        let mut yaml = String::new();
        file.read_to_string(&mut yaml)?;
        let codebook: Codebook = serde_yaml::from_str(&yaml)?;
        Ok(codebook)
    }

    /// Get the number of columns
    pub fn n_cols(&self) -> usize {
        self.col_metadata.len()
    }

    /// Get the integer index of a row by name
    pub fn row_index(&self, row_name: &str) -> Option<usize> {
        self.row_names.index(row_name)
    }

    /// Get the integer index of a column by name
    pub fn column_index(&self, col_name: &str) -> Option<usize> {
        self.col_metadata.get(col_name).map(|(ix, _)| ix)
    }

    /// Return the ValueMap of the column if it exists
    ///
    /// Will return `None` if the column is not categorical
    pub fn value_map(&self, col_ix: usize) -> Option<&ValueMap> {
        self.col_metadata[col_ix].coltype.value_map()
    }

    /// Check that every discrete column has a proper value map
    pub fn validate(&self) -> Result<(), CodebookError> {
        self.col_metadata.iter().try_for_each(|md| match &md.coltype {
            ColType::Continuous => Ok(()),
            ColType::Categorical { k, value_map } => {
                if *k == 0 {
                    Err(CodebookError::EmptyCategorical {
                        col_name: md.name.clone(),
                    })
                } else if value_map.len() != *k {
                    Err(CodebookError::ValueMapSizeMismatch {
                        col_name: md.name.clone(),
                        k: *k,
                        n_values: value_map.len(),
                    })
                } else if !value_map.is_bijective() {
                    Err(CodebookError::ValueMapNotBijective {
                        col_name: md.name.clone(),
                    })
                } else {
                    Ok(())
                }
            }
        })
    }

    /// Check that a table can be modeled under this codebook: the column
    /// counts agree, named rows match the table, and every present cell of a
    /// discrete column is an integer code below that column's `k`.
    pub fn validate_table(&self, table: &Table) -> Result<(), CodebookError> {
        self.validate()?;

        if table.n_cols() != self.n_cols() {
            return Err(CodebookError::ColumnCountMismatch {
                n_codebook: self.n_cols(),
                n_table: table.n_cols(),
            });
        }

        if !self.row_names.is_empty() && self.row_names.len() != table.n_rows()
        {
            return Err(CodebookError::RowCountMismatch {
                n_codebook: self.row_names.len(),
                n_table: table.n_rows(),
            });
        }

        self.col_metadata
            .iter()
            .enumerate()
            .filter_map(|(col_ix, md)| md.coltype.k().map(|k| (col_ix, k)))
            .try_for_each(|(col_ix, k)| {
                (0..table.n_rows()).try_for_each(|row_ix| {
                    match table.get(row_ix, col_ix) {
                        Some(x) if !is_code(x, k) => {
                            Err(CodebookError::InvalidCategoricalValue {
                                row_ix,
                                col_ix,
                                value: x,
                                k,
                            })
                        }
                        _ => Ok(()),
                    }
                })
            })
    }
}

/// `true` if `x` is a non-negative integer less than `k`
pub fn is_code(x: f64, k: usize) -> bool {
    x >= 0.0 && x.fract() == 0.0 && (x as usize) < k
}

/// The model of a column
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum ColType {
    /// Univariate continuous data modeled with a Normal-Inverse-Gamma prior
    Continuous,
    /// Discrete data modeled with a symmetric Dirichlet-multinomial
    Categorical {
        /// The number of values this column can take on
        k: usize,
        /// The map between raw values and the codes `0..k`
        value_map: ValueMap,
    },
}

impl ColType {
    /// A discrete column whose raw values are its codes
    pub fn categorical(k: usize) -> Self {
        ColType::Categorical {
            k,
            value_map: ValueMap::Identity(k),
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, ColType::Continuous)
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColType::Categorical { .. })
    }

    /// The cardinality of a discrete column
    pub fn k(&self) -> Option<usize> {
        match self {
            ColType::Categorical { k, .. } => Some(*k),
            ColType::Continuous => None,
        }
    }

    /// Return the value map if the type is categorical
    pub fn value_map(&self) -> Option<&ValueMap> {
        match self {
            ColType::Categorical { value_map, .. } => Some(value_map),
            ColType::Continuous => None,
        }
    }
}

/// The metadata associated with a column
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColMetadata {
    /// The name of the Column
    pub name: String,
    /// The column model
    pub coltype: ColType,
    /// Optional notes about the column
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::Write;

    fn quick_codebook() -> Codebook {
        let md0 = ColMetadata {
            name: "0".to_string(),
            coltype: ColType::Continuous,
            notes: None,
        };
        let md1 = ColMetadata {
            name: "1".to_string(),
            coltype: ColType::categorical(3),
            notes: None,
        };
        let col_metadata = ColMetadataList::new(vec![md0, md1]).unwrap();
        Codebook::new("table".to_string(), col_metadata)
    }

    #[test]
    fn new_with_duplicate_names_should_fail() {
        let md = ColMetadata {
            name: "2".to_string(),
            coltype: ColType::Continuous,
            notes: None,
        };
        let col_metadata = ColMetadataList::new(vec![md.clone(), md]);
        assert_eq!(
            col_metadata,
            Err(ColMetadataListError::Duplicate(String::from("2")))
        );
    }

    #[test]
    fn all_continuous_names_columns_by_index() {
        let cb = Codebook::all_continuous("t", 4);
        assert_eq!(cb.n_cols(), 4);
        assert_eq!(cb.column_index("3"), Some(3));
        assert!(cb.col_metadata.iter().all(|md| md.coltype.is_continuous()));
    }

    #[test]
    fn value_map_for_continuous_coltype_is_none() {
        let cb = quick_codebook();
        assert!(cb.value_map(0).is_none());
        assert_eq!(cb.value_map(1), Some(&ValueMap::Identity(3)));
    }

    #[test]
    fn validate_table_accepts_codes_and_missing() {
        let cb = quick_codebook();
        let table = Table::from_rows(vec![
            vec![0.1, 2.0],
            vec![f64::NAN, f64::NAN],
            vec![1.2, 0.0],
        ])
        .unwrap();
        assert!(cb.validate_table(&table).is_ok());
    }

    #[test]
    fn validate_table_rejects_out_of_range_code() {
        let cb = quick_codebook();
        let table = Table::from_rows(vec![vec![0.1, 3.0]]).unwrap();
        match cb.validate_table(&table) {
            Err(CodebookError::InvalidCategoricalValue {
                row_ix: 0,
                col_ix: 1,
                k: 3,
                ..
            }) => (),
            res => panic!("unexpected {res:?}"),
        }
    }

    #[test]
    fn validate_table_rejects_fractional_code() {
        let cb = quick_codebook();
        let table = Table::from_rows(vec![vec![0.1, 1.5]]).unwrap();
        assert!(matches!(
            cb.validate_table(&table),
            Err(CodebookError::InvalidCategoricalValue { .. })
        ));
    }

    #[test]
    fn validate_table_rejects_column_count_mismatch() {
        let cb = quick_codebook();
        let table = Table::from_rows(vec![vec![0.1]]).unwrap();
        assert!(matches!(
            cb.validate_table(&table),
            Err(CodebookError::ColumnCountMismatch {
                n_codebook: 2,
                n_table: 1
            })
        ));
    }

    #[test]
    fn validate_rejects_short_value_map() {
        let mut cb = quick_codebook();
        cb.col_metadata[1].coltype = ColType::Categorical {
            k: 4,
            value_map: ValueMap::Identity(3),
        };
        assert!(matches!(
            cb.validate(),
            Err(CodebookError::ValueMapSizeMismatch { k: 4, n_values: 3, .. })
        ));
    }

    #[test]
    fn deserialize_metadata_list_with_duplicate_names_fails() {
        let raw = indoc!(
            "
            ---
            - name: one
              coltype: continuous
            - name: one
              coltype: continuous
            "
        );
        let res: Result<ColMetadataList, _> = serde_yaml::from_str(raw);
        assert!(res.is_err());
    }

    #[test]
    fn serialize_then_deserialize() {
        let mut cb = quick_codebook();
        cb.row_names = RowNameList::from_range(0..3);
        let yaml = serde_yaml::to_string(&cb).unwrap();
        let other: Codebook = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cb, other);
    }

    #[test]
    fn from_yaml_reads_file() {
        let cb = quick_codebook();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_yaml::to_string(&cb).unwrap().as_bytes())
            .unwrap();
        let other = Codebook::from_yaml(file.path()).unwrap();
        assert_eq!(cb, other);
    }

    #[test]
    fn from_yaml_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"table_name: [").unwrap();
        assert!(matches!(
            Codebook::from_yaml(file.path()),
            Err(CodebookError::Yaml(_))
        ));
    }

    #[test]
    fn row_names_try_into_repeats_vec() {
        let names = vec![String::from("a"), String::from("b"), String::from("a")];
        let res = RowNameList::try_from(names);
        assert_eq!(
            res,
            Err(RowNameListError::Duplicate {
                row_name: String::from("a"),
                ix_1: 0,
                ix_2: 2
            })
        );
    }

    #[test]
    fn insert_existing_row_names_returns_error() {
        let mut names = RowNameList::from_range(0..2);
        assert!(names.insert(String::from("2")).is_ok());
        assert_eq!(
            names.insert(String::from("0")),
            Err(InsertRowError(String::from("0")))
        );
        assert_eq!(names.index("2"), Some(2));
    }
}
