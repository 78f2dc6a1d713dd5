//! Trained classifiers and the registry that owns them.
//!
//! Artifacts are JSON documents carrying the feature schema the estimator was
//! fit on, the categorical encoders, the label decoding and the serialized
//! smartcore estimator itself. Training happens elsewhere; this module only
//! loads and runs them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::DecisionTreeClassifier;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::features::{
    FeatureRecord, FeatureSchema, FeatureValue, FieldKind, CASE_CLOSURE_SCHEMA,
    CRIME_DOMAIN_SCHEMA,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    CrimeDomain,
    CaseClosure,
}

impl PredictionTarget {
    pub fn expected_schema(&self) -> &'static FeatureSchema {
        match self {
            PredictionTarget::CrimeDomain => &*CRIME_DOMAIN_SCHEMA,
            PredictionTarget::CaseClosure => &*CASE_CLOSURE_SCHEMA,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionTarget::CrimeDomain => "crime_domain",
            PredictionTarget::CaseClosure => "case_closure",
        }
    }
}

/// What a classifier returns for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Class(String),
    Indicator(i64),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Class(s) => f.write_str(s),
            Label::Indicator(i) => write!(f, "{i}"),
        }
    }
}

/// A trained model, whatever its algorithm.
pub trait Predictor: Send + Sync {
    /// The field order the model was fit on.
    fn schema(&self) -> &FeatureSchema;

    fn predict(&self, record: &FeatureRecord) -> Result<Label>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelSpec {
    /// Class code `i` decodes to `classes[i]`.
    Text { classes: Vec<String> },
    /// The class code is the label.
    Indicator,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    DecisionTree(DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>),
    RandomForest(RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>),
}

impl Estimator {
    fn name(&self) -> &'static str {
        match self {
            Estimator::DecisionTree(_) => "decision_tree",
            Estimator::RandomForest(_) => "random_forest",
        }
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        let codes = match self {
            Estimator::DecisionTree(tree) => tree.predict(x)?,
            Estimator::RandomForest(forest) => forest.predict(x)?,
        };
        Ok(codes)
    }
}

#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub target: PredictionTarget,
    pub features: FeatureSchema,
    /// Ordered vocabulary per categorical field; a value's code is its index.
    pub encoders: BTreeMap<String, Vec<String>>,
    pub labels: LabelSpec,
    pub estimator: Estimator,
}

impl ModelArtifact {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string(self)?;
        fs::write(path, raw).map_err(|e| AppError::io(path, e))
    }
}

/// Runs a smartcore estimator on one encoded row.
pub struct SmartcorePredictor {
    target: PredictionTarget,
    schema: FeatureSchema,
    encoders: HashMap<String, HashMap<String, usize>>,
    labels: LabelSpec,
    estimator: Estimator,
}

impl SmartcorePredictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let ModelArtifact {
            target,
            features,
            encoders,
            labels,
            estimator,
        } = artifact;

        let mut lookup = HashMap::new();
        for field in &features.fields {
            if field.kind != FieldKind::Categorical {
                continue;
            }
            let vocabulary = encoders.get(&field.name).ok_or_else(|| {
                AppError::mismatch(format!("no encoder for categorical field {:?}", field.name))
            })?;
            let codes: HashMap<String, usize> = vocabulary
                .iter()
                .enumerate()
                .map(|(code, value)| (value.clone(), code))
                .collect();
            lookup.insert(field.name.clone(), codes);
        }

        Ok(SmartcorePredictor {
            target,
            schema: features,
            encoders: lookup,
            labels,
            estimator,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_artifact(ModelArtifact::read(path)?)
    }

    pub fn target(&self) -> PredictionTarget {
        self.target
    }

    fn encode(&self, record: &FeatureRecord) -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(record.len());
        for (name, value) in record.iter() {
            let x = match value {
                FeatureValue::Integer(i) => *i as f64,
                FeatureValue::Text(s) => {
                    let codes = self.encoders.get(name).ok_or_else(|| {
                        AppError::mismatch(format!("{name:?} is not a categorical field"))
                    })?;
                    let code = codes.get(s).ok_or_else(|| AppError::UnknownCategory {
                        field: name.to_string(),
                        value: s.clone(),
                    })?;
                    *code as f64
                }
            };
            row.push(x);
        }
        Ok(row)
    }

    fn decode(&self, code: i32) -> Result<Label> {
        match &self.labels {
            LabelSpec::Indicator => Ok(Label::Indicator(i64::from(code))),
            LabelSpec::Text { classes } => usize::try_from(code)
                .ok()
                .and_then(|i| classes.get(i))
                .map(|class| Label::Class(class.clone()))
                .ok_or(AppError::UnknownClass { code }),
        }
    }
}

impl Predictor for SmartcorePredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, record: &FeatureRecord) -> Result<Label> {
        let row = self.encode(record)?;
        let ncols = row.len();
        let x = DenseMatrix::new(1, ncols, row, false);
        let codes = self.estimator.predict(&x)?;
        let code = codes.first().copied().ok_or(AppError::EmptyPrediction)?;
        debug!(
            "{} {} predicted class code {}",
            self.target.as_str(),
            self.estimator.name(),
            code
        );
        self.decode(code)
    }
}

/// The two classifiers, loaded once and shared read-only.
pub struct ModelRegistry {
    crime_domain: Box<dyn Predictor>,
    case_closure: Box<dyn Predictor>,
}

impl ModelRegistry {
    pub fn new(crime_domain: Box<dyn Predictor>, case_closure: Box<dyn Predictor>) -> Self {
        ModelRegistry {
            crime_domain,
            case_closure,
        }
    }

    pub fn load(config: &Config) -> Result<Self> {
        let crime_domain =
            load_model(&config.crime_domain_model, PredictionTarget::CrimeDomain)?;
        let case_closure =
            load_model(&config.case_closure_model, PredictionTarget::CaseClosure)?;
        Ok(ModelRegistry::new(
            Box::new(crime_domain),
            Box::new(case_closure),
        ))
    }

    pub fn predictor(&self, target: PredictionTarget) -> &dyn Predictor {
        match target {
            PredictionTarget::CrimeDomain => self.crime_domain.as_ref(),
            PredictionTarget::CaseClosure => self.case_closure.as_ref(),
        }
    }

    /// Validates `record` against the model's schema, then predicts.
    pub fn predict(&self, target: PredictionTarget, record: &FeatureRecord) -> Result<Label> {
        let predictor = self.predictor(target);
        predictor.schema().validate(record)?;
        predictor.predict(record)
    }
}

/// Loads the artifact at `path` and checks it was built for `target` with the
/// field order the request builder produces. Case-closure artifacts must
/// decode to indicators since only `Indicator(1)` reads as closed.
pub fn load_model<P: AsRef<Path>>(path: P, target: PredictionTarget) -> Result<SmartcorePredictor> {
    let path = path.as_ref();
    let predictor = SmartcorePredictor::load(path)?;
    if predictor.target() != target {
        return Err(AppError::TargetMismatch {
            path: path.to_path_buf(),
            expected: target.as_str().to_string(),
            found: predictor.target().as_str().to_string(),
        });
    }
    let expected = target.expected_schema();
    if predictor.schema() != expected {
        return Err(AppError::mismatch(format!(
            "{:?} was fit on {:?}, requests are built as {:?}",
            path,
            predictor.schema().names(),
            expected.names()
        )));
    }
    if target == PredictionTarget::CaseClosure && predictor.labels != LabelSpec::Indicator {
        return Err(AppError::LabelMismatch {
            path: path.to_path_buf(),
            target: target.as_str().to_string(),
        });
    }
    info!(
        "loaded {} model ({}) from {:?}",
        target.as_str(),
        predictor.estimator.name(),
        path
    );
    Ok(predictor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::*;
    use smartcore::tree::decision_tree_classifier::DecisionTreeClassifierParameters;

    fn vocab(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// Crime-domain artifact whose tree splits on the weapon code:
    /// Knife -> "Violent Crime", Firearm -> "Other Crime".
    fn crime_domain_artifact() -> ModelArtifact {
        // City, Victim Age, Victim Gender, Weapon Used, Crime Description
        let rows = vec![
            0.0, 30.0, 0.0, 0.0, 0.0, //
            0.0, 30.0, 1.0, 1.0, 0.0, //
            1.0, 40.0, 1.0, 0.0, 1.0, //
            1.0, 40.0, 0.0, 1.0, 1.0,
        ];
        let x = DenseMatrix::new(4, 5, rows, false);
        let y: Vec<i32> = vec![0, 1, 0, 1];
        let tree =
            DecisionTreeClassifier::fit(&x, &y, DecisionTreeClassifierParameters::default())
                .unwrap();

        let mut encoders = BTreeMap::new();
        encoders.insert(CITY.to_string(), vocab(&["Delhi", "Mumbai"]));
        encoders.insert(VICTIM_GENDER.to_string(), vocab(&["Male", "Female"]));
        encoders.insert(WEAPON_USED.to_string(), vocab(&["Knife", "Firearm"]));
        encoders.insert(CRIME_DESCRIPTION.to_string(), vocab(&["Assault", "Robbery"]));

        ModelArtifact {
            target: PredictionTarget::CrimeDomain,
            features: CRIME_DOMAIN_SCHEMA.clone(),
            encoders,
            labels: LabelSpec::Text {
                classes: vocab(&["Violent Crime", "Other Crime"]),
            },
            estimator: Estimator::DecisionTree(tree),
        }
    }

    fn record(weapon: &str) -> FeatureRecord {
        FeatureRecord::builder()
            .text(CITY, "Delhi")
            .integer(VICTIM_AGE, 30)
            .text(VICTIM_GENDER, "Male")
            .text(WEAPON_USED, weapon)
            .text(CRIME_DESCRIPTION, "Assault")
            .build()
    }

    #[test]
    fn decision_tree_predicts_text_labels() {
        let predictor = SmartcorePredictor::from_artifact(crime_domain_artifact()).unwrap();
        assert_eq!(
            predictor.predict(&record("Knife")).unwrap(),
            Label::Class("Violent Crime".to_string())
        );
        assert_eq!(
            predictor.predict(&record("Firearm")).unwrap(),
            Label::Class("Other Crime".to_string())
        );
    }

    #[test]
    fn repeated_inputs_give_identical_outputs() {
        let predictor = SmartcorePredictor::from_artifact(crime_domain_artifact()).unwrap();
        let first = predictor.predict(&record("Knife")).unwrap();
        for _ in 0..5 {
            assert_eq!(predictor.predict(&record("Knife")).unwrap(), first);
        }
    }

    #[test]
    fn unseen_category_is_an_error() {
        let predictor = SmartcorePredictor::from_artifact(crime_domain_artifact()).unwrap();
        assert!(matches!(
            predictor.predict(&record("Poison")),
            Err(AppError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn missing_encoder_is_rejected() {
        let mut artifact = crime_domain_artifact();
        artifact.encoders.remove(WEAPON_USED);
        assert!(matches!(
            SmartcorePredictor::from_artifact(artifact),
            Err(AppError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn class_code_outside_vocabulary_is_an_error() {
        let mut artifact = crime_domain_artifact();
        artifact.labels = LabelSpec::Text {
            classes: vocab(&["Violent Crime"]),
        };
        let predictor = SmartcorePredictor::from_artifact(artifact).unwrap();
        assert!(matches!(
            predictor.predict(&record("Firearm")),
            Err(AppError::UnknownClass { code: 1 })
        ));
    }

    #[test]
    fn indicator_labels_pass_codes_through() {
        let mut artifact = crime_domain_artifact();
        artifact.labels = LabelSpec::Indicator;
        let predictor = SmartcorePredictor::from_artifact(artifact).unwrap();
        assert_eq!(predictor.predict(&record("Firearm")).unwrap(), Label::Indicator(1));
    }

    #[test]
    fn random_forest_votes_on_indicator() {
        use smartcore::ensemble::random_forest_classifier::RandomForestClassifierParameters;

        // every column agrees on the class, so any split separates it
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..8 {
            let class = (i % 2) as f64;
            rows.extend_from_slice(&[class, 20.0 + 30.0 * class, class, class, class]);
            y.push(i % 2);
        }
        let x = DenseMatrix::new(8, 5, rows, false);
        let forest =
            RandomForestClassifier::fit(&x, &y, RandomForestClassifierParameters::default())
                .unwrap();

        let mut artifact = crime_domain_artifact();
        artifact.labels = LabelSpec::Indicator;
        artifact.estimator = Estimator::RandomForest(forest);
        let predictor = SmartcorePredictor::from_artifact(artifact).unwrap();

        let high = FeatureRecord::builder()
            .text(CITY, "Mumbai")
            .integer(VICTIM_AGE, 50)
            .text(VICTIM_GENDER, "Female")
            .text(WEAPON_USED, "Firearm")
            .text(CRIME_DESCRIPTION, "Robbery")
            .build();
        assert_eq!(predictor.predict(&high).unwrap(), Label::Indicator(1));
        assert_eq!(predictor.predict(&record("Knife")).unwrap(), Label::Indicator(0));
    }

    #[test]
    fn load_rejects_wrong_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain.json");
        crime_domain_artifact().write(&path).unwrap();

        assert!(load_model(&path, PredictionTarget::CrimeDomain).is_ok());
        assert!(matches!(
            load_model(&path, PredictionTarget::CaseClosure),
            Err(AppError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn load_rejects_text_labels_for_case_closure() {
        // City, Crime Description, Victim Age, Victim Gender, Weapon Used,
        // Crime Domain, Police Deployed
        let rows = vec![
            0.0, 0.0, 30.0, 0.0, 0.0, 0.0, 5.0, //
            0.0, 0.0, 30.0, 0.0, 0.0, 0.0, 20.0,
        ];
        let x = DenseMatrix::new(2, 7, rows, false);
        let y: Vec<i32> = vec![0, 1];
        let tree =
            DecisionTreeClassifier::fit(&x, &y, DecisionTreeClassifierParameters::default())
                .unwrap();

        let mut encoders = BTreeMap::new();
        encoders.insert(CITY.to_string(), vocab(&["Delhi"]));
        encoders.insert(CRIME_DESCRIPTION.to_string(), vocab(&["Assault"]));
        encoders.insert(VICTIM_GENDER.to_string(), vocab(&["Male"]));
        encoders.insert(WEAPON_USED.to_string(), vocab(&["Knife"]));
        encoders.insert(CRIME_DOMAIN.to_string(), vocab(&["Violent Crime"]));
        let mut artifact = ModelArtifact {
            target: PredictionTarget::CaseClosure,
            features: CASE_CLOSURE_SCHEMA.clone(),
            encoders,
            labels: LabelSpec::Text {
                classes: vocab(&["0", "1"]),
            },
            estimator: Estimator::DecisionTree(tree),
        };

        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("closure_text.json");
        artifact.write(&text).unwrap();
        assert!(matches!(
            load_model(&text, PredictionTarget::CaseClosure),
            Err(AppError::LabelMismatch { .. })
        ));

        artifact.labels = LabelSpec::Indicator;
        let indicator = dir.path().join("closure.json");
        artifact.write(&indicator).unwrap();
        assert!(load_model(&indicator, PredictionTarget::CaseClosure).is_ok());
    }

    #[test]
    fn load_rejects_reordered_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain.json");
        let mut artifact = crime_domain_artifact();
        artifact.features.fields.swap(1, 2);
        artifact.write(&path).unwrap();

        assert!(matches!(
            load_model(&path, PredictionTarget::CrimeDomain),
            Err(AppError::SchemaMismatch { .. })
        ));
    }
}
