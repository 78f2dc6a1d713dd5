use std::path::PathBuf;

pub static DATASET_PATH: &str = "data/crime_dataset_india.csv";
pub static CRIME_DOMAIN_MODEL_PATH: &str = "models/crime_domain.json";
pub static CASE_CLOSURE_MODEL_PATH: &str = "models/case_closure.json";

/// Locations of the dataset and the two model artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub crime_domain_model: PathBuf,
    pub case_closure_model: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset_path: PathBuf::from(DATASET_PATH),
            crime_domain_model: PathBuf::from(CRIME_DOMAIN_MODEL_PATH),
            case_closure_model: PathBuf::from(CASE_CLOSURE_MODEL_PATH),
        }
    }
}

impl Config {
    pub fn with_dataset(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.dataset_path = path;
        }
        self
    }

    pub fn with_models(mut self, crime_domain: Option<PathBuf>, case_closure: Option<PathBuf>) -> Self {
        if let Some(path) = crime_domain {
            self.crime_domain_model = path;
        }
        if let Some(path) = case_closure {
            self.case_closure_model = path;
        }
        self
    }
}
