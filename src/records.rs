use polars::prelude::DataType;

pub const CITY: &str = "City";
pub const VICTIM_AGE: &str = "Victim Age";
pub const VICTIM_GENDER: &str = "Victim Gender";
pub const WEAPON_USED: &str = "Weapon Used";
pub const CRIME_DESCRIPTION: &str = "Crime Description";
pub const CRIME_DOMAIN: &str = "Crime Domain";
pub const POLICE_DEPLOYED: &str = "Police Deployed";
pub const CASE_CLOSED: &str = "Case Closed";

/// One row of the incident table. Only the columns listed here are relied on;
/// the backing file may carry more.
pub struct IncidentRecord {}

impl IncidentRecord {
    /// Dtypes the loaded columns are cast to. `Case Closed` keeps whatever was
    /// inferred since source files use either 0/1 or Yes/No.
    pub fn raw_dtypes() -> Vec<(&'static str, DataType)> {
        vec![
            (CITY, DataType::Utf8),
            (VICTIM_AGE, DataType::Int64),
            (VICTIM_GENDER, DataType::Utf8),
            (WEAPON_USED, DataType::Utf8),
            (CRIME_DESCRIPTION, DataType::Utf8),
            (CRIME_DOMAIN, DataType::Utf8),
            (POLICE_DEPLOYED, DataType::Int64),
        ]
    }

    pub fn required_columns() -> [&'static str; 8] {
        [
            CITY,
            VICTIM_AGE,
            VICTIM_GENDER,
            WEAPON_USED,
            CRIME_DESCRIPTION,
            CRIME_DOMAIN,
            POLICE_DEPLOYED,
            CASE_CLOSED,
        ]
    }
}
