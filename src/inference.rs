//! Turns form submissions into feature records and runs them through the
//! matching model.

use std::fmt;

use log::debug;

use crate::error::Result;
use crate::features::FeatureRecord;
use crate::model::{Label, ModelRegistry, PredictionTarget};
use crate::records::{
    CITY, CRIME_DESCRIPTION, CRIME_DOMAIN, POLICE_DEPLOYED, VICTIM_AGE, VICTIM_GENDER, WEAPON_USED,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeDomainRequest {
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub weapon: String,
    pub crime_description: String,
}

impl CrimeDomainRequest {
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord::builder()
            .text(CITY, self.city.as_str())
            .integer(VICTIM_AGE, self.age)
            .text(VICTIM_GENDER, self.gender.as_str())
            .text(WEAPON_USED, self.weapon.as_str())
            .text(CRIME_DESCRIPTION, self.crime_description.as_str())
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseClosureRequest {
    pub city: String,
    pub crime_description: String,
    pub age: i64,
    pub gender: String,
    pub weapon: String,
    pub domain: String,
    pub police_deployed: i64,
}

impl CaseClosureRequest {
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord::builder()
            .text(CITY, self.city.as_str())
            .text(CRIME_DESCRIPTION, self.crime_description.as_str())
            .integer(VICTIM_AGE, self.age)
            .text(VICTIM_GENDER, self.gender.as_str())
            .text(WEAPON_USED, self.weapon.as_str())
            .text(CRIME_DOMAIN, self.domain.as_str())
            .integer(POLICE_DEPLOYED, self.police_deployed)
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Closed,
    Open,
}

impl CaseState {
    /// Only an indicator of exactly 1 means closed.
    pub fn from_label(label: &Label) -> CaseState {
        match label {
            Label::Indicator(1) => CaseState::Closed,
            _ => CaseState::Open,
        }
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseState::Closed => f.write_str("Closed"),
            CaseState::Open => f.write_str("Open"),
        }
    }
}

pub fn predict_crime_domain(registry: &ModelRegistry, request: &CrimeDomainRequest) -> Result<String> {
    let record = request.to_record();
    debug!("crime domain input columns: {:?}", record.names());
    let label = registry.predict(PredictionTarget::CrimeDomain, &record)?;
    Ok(label.to_string())
}

pub fn predict_case_closure(registry: &ModelRegistry, request: &CaseClosureRequest) -> Result<CaseState> {
    let record = request.to_record();
    debug!("case closure input columns: {:?}", record.names());
    let label = registry.predict(PredictionTarget::CaseClosure, &record)?;
    Ok(CaseState::from_label(&label))
}
