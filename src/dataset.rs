//! Read-only access to the incident table.
//!
//! The table is read once when the store is built and never mutated
//! afterwards. Tests build a store from an in-memory frame with
//! [`DatasetStore::from_frame`].

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::{CsvReader, DataType, PolarsResult, SerReader, Series};
use polars_io::parquet::ParquetReader;

use crate::error::{AppError, Result};
use crate::records::IncidentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn infer(path: &Path) -> Option<FileFormat> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(FileFormat::Csv),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }
}

pub async fn read_csv(file: File) -> PolarsResult<DataFrame> {
    CsvReader::new(file).has_header(true).finish()
}

pub async fn read_parquet(file: File) -> PolarsResult<DataFrame> {
    ParquetReader::new(file).finish()
}

pub struct DatasetStore {
    df: DataFrame,
}

impl DatasetStore {
    /// Reads the backing file. CSV or Parquet is picked from the extension.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::infer(path).ok_or_else(|| AppError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let file = File::open(path).map_err(|e| AppError::io(path, e))?;

        let df = match format {
            FileFormat::Csv => read_csv(file).await?,
            FileFormat::Parquet => read_parquet(file).await?,
        };
        info!(
            "loaded {} incidents with {} columns from {:?}",
            df.height(),
            df.width(),
            path
        );

        Self::from_frame(df)
    }

    /// Checks the required columns are present and casts them to their
    /// expected dtypes. A value that does not convert fails the load.
    pub fn from_frame(mut df: DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        for column in IncidentRecord::required_columns() {
            if !names.contains(&column) {
                return Err(AppError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        for (name, dtype) in IncidentRecord::raw_dtypes() {
            let cast = df
                .column(name)?
                .strict_cast(&dtype)
                .map_err(|_| AppError::ColumnType {
                    column: name.to_string(),
                    dtype: dtype.to_string(),
                })?;
            df.with_column(cast)?;
        }
        Ok(DatasetStore { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    fn column(&self, name: &str) -> Result<&Series> {
        if !self.df.get_column_names().contains(&name) {
            return Err(AppError::UnknownColumn {
                column: name.to_string(),
            });
        }
        Ok(self.df.column(name)?)
    }

    /// Non-null values of a column rendered as strings, in row order.
    fn values(&self, name: &str) -> Result<Vec<String>> {
        let series = self.column(name)?.cast(&DataType::Utf8)?;
        let values = series
            .utf8()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(values)
    }

    /// Distinct non-null values of `column`.
    pub fn distinct_values(&self, column: &str) -> Result<BTreeSet<String>> {
        let distinct: BTreeSet<String> = self.values(column)?.into_iter().collect();
        debug!("{} distinct values in {:?}", distinct.len(), column);
        Ok(distinct)
    }

    /// Occurrences of each non-null value, most frequent first. Ties are
    /// broken by value.
    pub fn value_counts(&self, column: &str) -> Result<Vec<(String, usize)>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in self.values(column)? {
            *counts.entry(value).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    pub fn preview(&self, rows: usize) -> DataFrame {
        self.df.head(Some(rows))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::*;
    use polars::df;
    use polars::prelude::NamedFrom;

    pub(crate) fn fixture() -> DatasetStore {
        let df = df!(
            CITY => &[Some("Delhi"), Some("Mumbai"), Some("Delhi"), None, Some("Pune")],
            VICTIM_AGE => &[30i64, 45, 22, 60, 17],
            VICTIM_GENDER => &[Some("Male"), Some("Female"), Some("Female"), Some("Other"), None],
            WEAPON_USED => &[Some("Knife"), Some("Firearm"), None, Some("Knife"), Some("Blunt Object")],
            CRIME_DESCRIPTION => &["Assault", "Robbery", "Assault", "Fraud", "Burglary"],
            CRIME_DOMAIN => &["Violent Crime", "Other Crime", "Violent Crime", "Other Crime", "Other Crime"],
            POLICE_DEPLOYED => &[10i64, 4, 12, 3, 7],
            CASE_CLOSED => &[1i64, 0, 1, 0, 1]
        )
        .unwrap();
        DatasetStore::from_frame(df).unwrap()
    }

    #[test]
    fn distinct_values_skip_nulls() {
        let store = fixture();
        let cities = store.distinct_values(CITY).unwrap();
        assert_eq!(
            cities.into_iter().collect::<Vec<_>>(),
            vec!["Delhi", "Mumbai", "Pune"]
        );
        let weapons = store.distinct_values(WEAPON_USED).unwrap();
        assert_eq!(weapons.len(), 3);
    }

    #[test]
    fn distinct_values_render_integers() {
        let store = fixture();
        let closed = store.distinct_values(CASE_CLOSED).unwrap();
        assert!(closed.contains("0"));
        assert!(closed.contains("1"));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let store = fixture();
        assert!(matches!(
            store.distinct_values("Report Number"),
            Err(AppError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn value_counts_are_sorted_by_frequency_then_value() {
        let store = fixture();
        let counts = store.value_counts(CRIME_DESCRIPTION).unwrap();
        assert_eq!(counts[0], ("Assault".to_string(), 2));
        assert_eq!(counts[1], ("Burglary".to_string(), 1));
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn missing_column_fails_construction() {
        let df = df!(CITY => &["Delhi"]).unwrap();
        assert!(matches!(
            DatasetStore::from_frame(df),
            Err(AppError::MissingColumn { .. })
        ));
    }

    #[test]
    fn unparseable_numbers_fail_construction() {
        let df = df!(
            CITY => &["Delhi", "Mumbai"],
            VICTIM_AGE => &["30", "thirty"],
            VICTIM_GENDER => &["Male", "Female"],
            WEAPON_USED => &["Knife", "Firearm"],
            CRIME_DESCRIPTION => &["Assault", "Robbery"],
            CRIME_DOMAIN => &["Violent Crime", "Other Crime"],
            POLICE_DEPLOYED => &[10i64, 4],
            CASE_CLOSED => &[1i64, 0]
        )
        .unwrap();
        match DatasetStore::from_frame(df) {
            Err(AppError::ColumnType { column, .. }) => assert_eq!(column, VICTIM_AGE),
            other => panic!("expected a column type error, got {:?}", other.err()),
        }
    }

    #[test]
    fn numeric_text_is_cast() {
        let df = df!(
            CITY => &["Delhi"],
            VICTIM_AGE => &["30"],
            VICTIM_GENDER => &["Male"],
            WEAPON_USED => &["Knife"],
            CRIME_DESCRIPTION => &["Assault"],
            CRIME_DOMAIN => &["Violent Crime"],
            POLICE_DEPLOYED => &["10"],
            CASE_CLOSED => &["Yes"]
        )
        .unwrap();
        let store = DatasetStore::from_frame(df).unwrap();
        assert_eq!(store.frame().column(VICTIM_AGE).unwrap().dtype(), &DataType::Int64);
        assert!(store.distinct_values(POLICE_DEPLOYED).unwrap().contains("10"));
    }

    #[test]
    fn preview_is_bounded() {
        let store = fixture();
        assert_eq!(store.preview(2).height(), 2);
        assert_eq!(store.preview(100).height(), store.len());
    }

    #[test]
    fn format_inferred_from_extension() {
        assert_eq!(FileFormat::infer(Path::new("a/b.CSV")), Some(FileFormat::Csv));
        assert_eq!(
            FileFormat::infer(Path::new("b.parquet")),
            Some(FileFormat::Parquet)
        );
        assert_eq!(FileFormat::infer(Path::new("b.xlsx")), None);
        assert_eq!(FileFormat::infer(Path::new("noext")), None);
    }
}
