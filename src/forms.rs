//! Selection inputs for the two prediction forms.
//!
//! Every categorical choice must be a value seen in the dataset and every
//! number must sit inside its slider range, so a submitted form can never
//! hand a model something it could not have been offered.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::dataset::DatasetStore;
use crate::error::{AppError, Result};
use crate::inference::{CaseClosureRequest, CrimeDomainRequest};
use crate::records::{
    CITY, CRIME_DESCRIPTION, CRIME_DOMAIN, POLICE_DEPLOYED, VICTIM_AGE, VICTIM_GENDER, WEAPON_USED,
};

pub const AGE_RANGE: RangeInclusive<i64> = 0..=100;
pub const POLICE_RANGE: RangeInclusive<i64> = 0..=50;

pub const DOMAIN_FORM_DEFAULT_AGE: i64 = 30;
pub const CLOSURE_FORM_DEFAULT_AGE: i64 = 25;
pub const DEFAULT_POLICE: i64 = 10;

/// Values offered by each selection input, taken from the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    pub cities: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub weapons: BTreeSet<String>,
    pub crime_descriptions: BTreeSet<String>,
    pub domains: BTreeSet<String>,
}

impl SelectionOptions {
    pub fn from_dataset(store: &DatasetStore) -> Result<Self> {
        Ok(SelectionOptions {
            cities: store.distinct_values(CITY)?,
            genders: store.distinct_values(VICTIM_GENDER)?,
            weapons: store.distinct_values(WEAPON_USED)?,
            crime_descriptions: store.distinct_values(CRIME_DESCRIPTION)?,
            domains: store.distinct_values(CRIME_DOMAIN)?,
        })
    }

    /// Options for `column`, or `None` if it is not a selection input.
    pub fn for_column(&self, column: &str) -> Option<&BTreeSet<String>> {
        match column {
            CITY => Some(&self.cities),
            VICTIM_GENDER => Some(&self.genders),
            WEAPON_USED => Some(&self.weapons),
            CRIME_DESCRIPTION => Some(&self.crime_descriptions),
            CRIME_DOMAIN => Some(&self.domains),
            _ => None,
        }
    }

    pub fn choose(&self, column: &str, value: &str) -> Result<String> {
        let options = self.for_column(column).ok_or_else(|| AppError::UnknownColumn {
            column: column.to_string(),
        })?;
        if options.contains(value) {
            Ok(value.to_string())
        } else {
            Err(AppError::InvalidSelection {
                field: column.to_string(),
                value: value.to_string(),
            })
        }
    }
}

pub fn bounded(field: &str, value: i64, range: &RangeInclusive<i64>) -> Result<i64> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(AppError::OutOfRange {
            field: field.to_string(),
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Raw crime-domain form input.
#[derive(Debug, Clone, Default)]
pub struct CrimeDomainForm {
    pub city: String,
    pub age: Option<i64>,
    pub gender: String,
    pub weapon: String,
    pub crime_description: String,
}

impl CrimeDomainForm {
    pub fn submit(&self, options: &SelectionOptions) -> Result<CrimeDomainRequest> {
        let age = self.age.unwrap_or(DOMAIN_FORM_DEFAULT_AGE);
        Ok(CrimeDomainRequest {
            city: options.choose(CITY, &self.city)?,
            age: bounded(VICTIM_AGE, age, &AGE_RANGE)?,
            gender: options.choose(VICTIM_GENDER, &self.gender)?,
            weapon: options.choose(WEAPON_USED, &self.weapon)?,
            crime_description: options.choose(CRIME_DESCRIPTION, &self.crime_description)?,
        })
    }
}

/// Raw case-closure form input.
#[derive(Debug, Clone, Default)]
pub struct CaseClosureForm {
    pub city: String,
    pub age: Option<i64>,
    pub gender: String,
    pub weapon: String,
    pub domain: String,
    pub crime_description: String,
    pub police_deployed: Option<i64>,
}

impl CaseClosureForm {
    pub fn submit(&self, options: &SelectionOptions) -> Result<CaseClosureRequest> {
        let age = self.age.unwrap_or(CLOSURE_FORM_DEFAULT_AGE);
        let police = self.police_deployed.unwrap_or(DEFAULT_POLICE);
        Ok(CaseClosureRequest {
            city: options.choose(CITY, &self.city)?,
            crime_description: options.choose(CRIME_DESCRIPTION, &self.crime_description)?,
            age: bounded(VICTIM_AGE, age, &AGE_RANGE)?,
            gender: options.choose(VICTIM_GENDER, &self.gender)?,
            weapon: options.choose(WEAPON_USED, &self.weapon)?,
            domain: options.choose(CRIME_DOMAIN, &self.domain)?,
            police_deployed: bounded(POLICE_DEPLOYED, police, &POLICE_RANGE)?,
        })
    }
}
