//! Fit-file input model and genome decoding.
//!
//! A fit file carries three loosely related lists: the `genome` blocks (one
//! parameter per block, mechanism encoded as a name suffix), the recording
//! `conditions` (temperature, initial potential and per-region reversal
//! potentials) and the `passive` defaults. [`decode_fit`] turns them into
//! the normalized collections in [`model`].

pub mod model;
mod parser;

use crate::domain::{CellfitError, CellfitResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

pub use model::{
    DecodedFit, MechanismEntry, MechanismTable, NormalizedGenome, RegionParameterMap,
    RegionPassiveEntry,
};
pub use parser::{
    GenomeRecord, PASSIVE_MECHANISM, PassiveField, decode_fit, decode_genome,
    decode_global_defaults, decode_reversal_potentials,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub genome: Vec<GenomeBlock>,
    pub conditions: Vec<Conditions>,
    pub passive: Vec<PassiveDefaults>,
}

/// One `{section, name, value, mechanism}` record of the genome list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeBlock {
    pub section: String,
    pub name: String,
    #[serde(default)]
    pub value: NumericText,
    /// Empty or missing selects the passive namespace.
    #[serde(default)]
    pub mechanism: Option<String>,
}

impl GenomeBlock {
    pub fn new(
        section: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<NumericText>,
        mechanism: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            name: name.into(),
            value: value.into(),
            mechanism: Some(mechanism.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub celsius: NumericText,
    pub v_init: NumericText,
    #[serde(default)]
    pub erev: Vec<IonTable>,
}

/// Per-region reversal potentials: `{"section": "soma", "ena": "53.0", "ek": "-107.0"}`.
///
/// Every key besides `section` is an `e<ion>` entry; key order follows the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonTable {
    pub section: String,
    #[serde(flatten)]
    pub potentials: serde_json::Map<String, serde_json::Value>,
}

impl IonTable {
    pub fn new<K, V>(section: impl Into<String>, potentials: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self {
            section: section.into(),
            potentials: potentials
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveDefaults {
    pub ra: NumericText,
}

/// A numeric field that fit exports write either as a JSON number or as a string.
///
/// Any JSON value is accepted when reading the file; [`NumericText::parse`]
/// rejects the rest, so the decoder can name the record it came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericText(serde_json::Value);

impl NumericText {
    pub fn parse(&self) -> Result<f64, NumericFieldError> {
        parse_numeric_value(&self.0)
    }
}

impl Display for NumericText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            serde_json::Value::String(raw) => f.write_str(raw),
            other => write!(f, "{other}"),
        }
    }
}

impl From<serde_json::Value> for NumericText {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl From<f64> for NumericText {
    fn from(value: f64) -> Self {
        Self(value.into())
    }
}

impl From<&str> for NumericText {
    fn from(raw: &str) -> Self {
        Self(raw.into())
    }
}

impl From<String> for NumericText {
    fn from(raw: String) -> Self {
        Self(raw.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericFieldError {
    #[error("value '{raw}' is not a floating-point number")]
    NotNumeric { raw: String },
    #[error("expected a number or numeric string, got {kind}")]
    UnsupportedType { kind: &'static str },
}

pub(crate) fn parse_numeric_str(raw: &str) -> Result<f64, NumericFieldError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| NumericFieldError::NotNumeric {
            raw: raw.to_owned(),
        })
}

pub(crate) fn parse_numeric_value(value: &serde_json::Value) -> Result<f64, NumericFieldError> {
    use serde_json::Value;

    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| NumericFieldError::NotNumeric {
                raw: number.to_string(),
            }),
        Value::String(raw) => parse_numeric_str(raw),
        Value::Null => Err(NumericFieldError::UnsupportedType { kind: "null" }),
        Value::Bool(_) => Err(NumericFieldError::UnsupportedType { kind: "boolean" }),
        Value::Array(_) => Err(NumericFieldError::UnsupportedType { kind: "array" }),
        Value::Object(_) => Err(NumericFieldError::UnsupportedType { kind: "object" }),
    }
}

pub fn parse_fit_parameters(source: &str) -> CellfitResult<FitParameters> {
    serde_json::from_str(source).map_err(|source| {
        CellfitError::input_validation(
            "INPUT.FIT_PARSE",
            format!("fit parameters are not valid JSON of the expected shape: {source}"),
        )
    })
}

pub fn load_fit_parameters(path: &Path) -> CellfitResult<FitParameters> {
    let source = fs::read_to_string(path).map_err(|source| {
        CellfitError::io_system(
            "IO.FIT_READ",
            format!("failed to read fit parameters '{}': {}", path.display(), source),
        )
    })?;
    parse_fit_parameters(&source).map_err(|error| {
        CellfitError::input_validation(
            error.placeholder(),
            format!("{} ({})", error.message(), path.display()),
        )
    })
}
