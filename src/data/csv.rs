//! Delimited text dataset loading
//!
//! Supports files where:
//! - The first row holds the column names
//! - Fields are separated by a configurable delimiter (`;` by default) and may be quoted
//! - Columns whose values all parse as numbers become numeric attributes,
//!   every other column becomes a nominal attribute
//! - The class column is the last one unless configured otherwise

use crate::core::{Attribute, Dataset, Instance, Result, VoteError};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Which column holds the class label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassColumn {
    /// The last column of the file
    #[default]
    Last,
    /// Zero-based column index
    Index(usize),
    /// Column with the given header name
    Name(String),
}

/// Parsing options for delimited files
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Field separator
    pub delimiter: u8,
    /// Column designated as the class label
    pub class_column: ClassColumn,
    /// Tokens treated as missing values
    pub missing_tokens: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            class_column: ClassColumn::Last,
            missing_tokens: vec!["?".to_string(), String::new()],
        }
    }
}

/// Loader for delimited text files with a header row
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    options: LoaderOptions,
}

impl CsvLoader {
    /// Create a loader with semicolon separation and the last column as class
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load a dataset from a file; the relation is named after the file stem
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            VoteError::LoadError(format!("cannot open {}: {e}", path.display()))
        })?;

        let relation = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");

        debug!("Parsing {}", path.display());
        self.load_reader(relation, file)
    }

    /// Load a dataset from any reader
    pub fn load_reader<R: Read>(&self, relation: &str, reader: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let names: Vec<String> = reader
            .headers()
            .map_err(|e| VoteError::LoadError(format!("malformed header row: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        if names.is_empty() || names.iter().all(String::is_empty) {
            return Err(VoteError::LoadError("missing header row".to_string()));
        }

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                let line = e.position().map_or(0, |p| p.line());
                VoteError::LoadError(format!("malformed row at line {line}: {e}"))
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        if rows.is_empty() {
            return Err(VoteError::LoadError(format!(
                "'{relation}' contains a header but no data rows"
            )));
        }

        let class_idx = self.resolve_class_column(&names)?;
        let attributes = self.infer_attributes(&names, &rows, class_idx);

        let lookups: Vec<HashMap<&str, usize>> = attributes
            .iter()
            .map(|attribute| {
                (0..attribute.num_values())
                    .filter_map(|i| attribute.value(i).map(|v| (v, i)))
                    .collect()
            })
            .collect();

        let mut instances = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = row
                .iter()
                .zip(&attributes)
                .zip(&lookups)
                .map(|((token, attribute), lookup)| {
                    if self.is_missing(token) {
                        None
                    } else if attribute.is_numeric() {
                        token.parse::<f64>().ok()
                    } else {
                        lookup.get(token.as_str()).map(|&i| i as f64)
                    }
                })
                .collect();
            instances.push(Instance::new(values));
        }

        let mut dataset = Dataset::new(relation, attributes);
        for instance in instances {
            dataset.push(instance)?;
        }
        dataset.set_class_index(class_idx)?;

        info!(
            "Loaded '{}': {} instances, {} attributes, class '{}'",
            relation,
            dataset.len(),
            dataset.num_attributes(),
            names[class_idx]
        );

        Ok(dataset)
    }

    fn resolve_class_column(&self, names: &[String]) -> Result<usize> {
        match &self.options.class_column {
            ClassColumn::Last => {
                info!("Setting class index to the last column");
                Ok(names.len() - 1)
            }
            ClassColumn::Index(i) if *i < names.len() => Ok(*i),
            ClassColumn::Index(i) => Err(VoteError::LoadError(format!(
                "class column {i} out of range for {} columns",
                names.len()
            ))),
            ClassColumn::Name(name) => names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| VoteError::LoadError(format!("no column named '{name}'"))),
        }
    }

    /// Decide the type of every column. The class column is always nominal.
    fn infer_attributes(
        &self,
        names: &[String],
        rows: &[Vec<String>],
        class_idx: usize,
    ) -> Vec<Attribute> {
        names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let numeric = col != class_idx
                    && rows.iter().all(|row| {
                        let token = &row[col];
                        self.is_missing(token)
                            || token.parse::<f64>().map_or(false, f64::is_finite)
                    });

                if numeric {
                    Attribute::numeric(name.clone())
                } else {
                    let mut values: Vec<String> = Vec::new();
                    for row in rows {
                        let token = &row[col];
                        if !self.is_missing(token) && !values.contains(token) {
                            values.push(token.clone());
                        }
                    }
                    Attribute::nominal(name.clone(), values)
                }
            })
            .collect()
    }

    fn is_missing(&self, token: &str) -> bool {
        self.options.missing_tokens.iter().any(|m| m == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const BANK_HEAD: &str = "\"age\";\"job\";\"balance\";\"y\"\n\
        30;\"unemployed\";1787;\"no\"\n\
        33;\"services\";4789;\"yes\"\n\
        35;\"management\";?;\"no\"\n";

    #[test]
    fn test_semicolon_quoted_fields() {
        let dataset = CsvLoader::new()
            .load_reader("bank", Cursor::new(BANK_HEAD))
            .unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.num_attributes(), 4);
        assert_eq!(dataset.relation(), "bank");
        assert_eq!(dataset.class_index(), Some(3));

        let attrs = dataset.attributes();
        assert!(attrs[0].is_numeric());
        assert!(attrs[1].is_nominal());
        assert!(attrs[2].is_numeric());
        assert_eq!(attrs[3].name, "y");
        assert_eq!(attrs[3].value(0), Some("no"));
        assert_eq!(attrs[3].value(1), Some("yes"));
    }

    #[test]
    fn test_values_and_missing() {
        let dataset = CsvLoader::new()
            .load_reader("bank", Cursor::new(BANK_HEAD))
            .unwrap();

        let second = dataset.instance(1).unwrap();
        assert_eq!(second.value(0), Some(33.0));
        assert_eq!(second.value(1), Some(1.0));
        assert_eq!(dataset.class_value(second), Some(1));

        let third = dataset.instance(2).unwrap();
        assert!(third.is_missing(2));
    }

    #[test]
    fn test_numeric_looking_class_is_nominal() {
        let data = "a;label\n1.0;0\n2.0;1\n3.0;0\n";
        let dataset = CsvLoader::new().load_reader("t", Cursor::new(data)).unwrap();
        assert!(dataset.class_attribute().unwrap().is_nominal());
        assert_eq!(dataset.num_classes(), 2);
    }

    #[test]
    fn test_class_column_by_name_and_index() {
        let data = "label;x\nyes;1\nno;2\n";

        let by_name = CsvLoader::with_options(LoaderOptions {
            class_column: ClassColumn::Name("label".to_string()),
            ..LoaderOptions::default()
        })
        .load_reader("t", Cursor::new(data))
        .unwrap();
        assert_eq!(by_name.class_index(), Some(0));

        let by_index = CsvLoader::with_options(LoaderOptions {
            class_column: ClassColumn::Index(0),
            ..LoaderOptions::default()
        })
        .load_reader("t", Cursor::new(data))
        .unwrap();
        assert_eq!(by_index.class_index(), Some(0));

        let unknown = CsvLoader::with_options(LoaderOptions {
            class_column: ClassColumn::Name("target".to_string()),
            ..LoaderOptions::default()
        })
        .load_reader("t", Cursor::new(data));
        assert!(matches!(unknown, Err(VoteError::LoadError(_))));
    }

    #[test]
    fn test_inconsistent_column_count() {
        let data = "a;b;y\n1;2;yes\n1;no\n";
        let result = CsvLoader::new().load_reader("t", Cursor::new(data));
        assert!(matches!(result, Err(VoteError::LoadError(_))));
    }

    #[test]
    fn test_header_only_and_empty_input() {
        let result = CsvLoader::new().load_reader("t", Cursor::new("a;b;y\n"));
        assert!(matches!(result, Err(VoteError::LoadError(_))));

        let result = CsvLoader::new().load_reader("t", Cursor::new(""));
        assert!(matches!(result, Err(VoteError::LoadError(_))));
    }

    #[test]
    fn test_comma_delimiter() {
        let options = LoaderOptions {
            delimiter: b',',
            ..LoaderOptions::default()
        };
        let dataset = CsvLoader::with_options(options)
            .load_reader("t", Cursor::new("x,y\n1,a\n2,b\n"))
            .unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.attribute(0).unwrap().is_numeric());
    }

    #[test]
    fn test_missing_file() {
        let result = CsvLoader::new().load_file("/definitely/not/here.csv");
        assert!(matches!(result, Err(VoteError::LoadError(_))));
    }
}
