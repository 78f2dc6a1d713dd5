//! Feature schemas and the ordered records handed to predictors.
//!
//! A classifier has no notion of column names; it only sees positions. The
//! schema pins down which field sits at which position so that a record built
//! in the wrong order is rejected instead of silently mispredicted.

use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::records::{
    CITY, CRIME_DESCRIPTION, CRIME_DOMAIN, POLICE_DEPLOYED, VICTIM_AGE, VICTIM_GENDER, WEAPON_USED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Categorical,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    pub fields: Vec<FieldSpec>,
}

lazy_static! {
    pub static ref CRIME_DOMAIN_SCHEMA: FeatureSchema = FeatureSchema::new(vec![
        FieldSpec::new(CITY, FieldKind::Categorical),
        FieldSpec::new(VICTIM_AGE, FieldKind::Integer),
        FieldSpec::new(VICTIM_GENDER, FieldKind::Categorical),
        FieldSpec::new(WEAPON_USED, FieldKind::Categorical),
        FieldSpec::new(CRIME_DESCRIPTION, FieldKind::Categorical),
    ]);
    pub static ref CASE_CLOSURE_SCHEMA: FeatureSchema = FeatureSchema::new(vec![
        FieldSpec::new(CITY, FieldKind::Categorical),
        FieldSpec::new(CRIME_DESCRIPTION, FieldKind::Categorical),
        FieldSpec::new(VICTIM_AGE, FieldKind::Integer),
        FieldSpec::new(VICTIM_GENDER, FieldKind::Categorical),
        FieldSpec::new(WEAPON_USED, FieldKind::Categorical),
        FieldSpec::new(CRIME_DOMAIN, FieldKind::Categorical),
        FieldSpec::new(POLICE_DEPLOYED, FieldKind::Integer),
    ]);
}

impl FeatureSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        FeatureSchema { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Checks that `record` has exactly these fields, in this order, with
    /// values of the declared kind.
    pub fn validate(&self, record: &FeatureRecord) -> Result<()> {
        if record.len() != self.len() {
            return Err(AppError::mismatch(format!(
                "expected {} fields {:?}, got {} fields {:?}",
                self.len(),
                self.names(),
                record.len(),
                record.names()
            )));
        }
        for (position, (spec, (name, value))) in
            self.fields.iter().zip(record.iter()).enumerate()
        {
            if spec.name != *name {
                return Err(AppError::mismatch(format!(
                    "position {position}: expected {:?}, got {:?}",
                    spec.name, name
                )));
            }
            if spec.kind != value.kind() {
                return Err(AppError::mismatch(format!(
                    "{:?} expects a {:?} value, got {:?}",
                    spec.name, spec.kind, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureValue {
    Text(String),
    Integer(i64),
}

impl FeatureValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FeatureValue::Text(_) => FieldKind::Categorical,
            FeatureValue::Integer(_) => FieldKind::Integer,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// A single-row, ordered set of named feature values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRecord {
    fields: Vec<(String, FeatureValue)>,
}

impl FeatureRecord {
    pub fn builder() -> FeatureRecordBuilder {
        FeatureRecordBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

#[derive(Debug, Default)]
pub struct FeatureRecordBuilder {
    fields: Vec<(String, FeatureValue)>,
}

impl FeatureRecordBuilder {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((name.to_string(), FeatureValue::Text(value.into())));
        self
    }

    pub fn integer(mut self, name: &str, value: i64) -> Self {
        self.fields
            .push((name.to_string(), FeatureValue::Integer(value)));
        self
    }

    pub fn build(self) -> FeatureRecord {
        FeatureRecord {
            fields: self.fields,
        }
    }
}
