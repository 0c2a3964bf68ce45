pub mod errors;

pub use errors::{CellfitError, CellfitResult, DecodeResult, DecorResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Offset between the fit file's celsius values and the kelvin the decoration expects.
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Fit files store capacitance in µF/cm²; the decoration takes F/m².
pub const CAPACITANCE_RESCALE: f64 = 100.0;

/// Anatomical region tag as used by SWC-derived label dictionaries.
///
/// Unrecognized tags are not rejected; they are carried through as
/// [`Region::Other`] so the decoration target decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Region {
    Soma,
    Axon,
    Dend,
    Apic,
    Other(String),
}

impl Region {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "soma" => Self::Soma,
            "axon" => Self::Axon,
            "dend" => Self::Dend,
            "apic" => Self::Apic,
            _ => Self::Other(tag.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Soma => "soma",
            Self::Axon => "axon",
            Self::Dend => "dend",
            Self::Apic => "apic",
            Self::Other(tag) => tag,
        }
    }

    /// Region expression naming this tag's label, e.g. `"dend"` (quotes included).
    pub fn selector(&self) -> String {
        format!("\"{}\"", self.as_str())
    }

    pub const fn is_swc_tag(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Region {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        match region {
            Region::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

/// Passive cable properties; every field is independently optional and an
/// unset field means "defer to the enclosing default".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PassiveParameters {
    /// Membrane capacitance, F/m².
    pub capacitance: Option<f64>,
    /// Temperature, K.
    pub temperature_k: Option<f64>,
    /// Initial membrane potential, mV.
    pub init_potential_mv: Option<f64>,
    /// Axial resistivity, Ω·cm.
    pub axial_resistivity: Option<f64>,
}

impl PassiveParameters {
    pub fn is_empty(&self) -> bool {
        self.capacitance.is_none()
            && self.temperature_k.is_none()
            && self.init_potential_mv.is_none()
            && self.axial_resistivity.is_none()
    }

    /// Field-wise overlay: values set in `self` win, gaps are filled from `fallback`.
    pub fn or(self, fallback: PassiveParameters) -> PassiveParameters {
        PassiveParameters {
            capacitance: self.capacitance.or(fallback.capacitance),
            temperature_k: self.temperature_k.or(fallback.temperature_k),
            init_potential_mv: self.init_potential_mv.or(fallback.init_potential_mv),
            axial_resistivity: self.axial_resistivity.or(fallback.axial_resistivity),
        }
    }
}

/// Cell-wide defaults applied before any region override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    pub temperature_k: f64,
    pub init_potential_mv: f64,
    /// Absent means the target keeps its built-in capacitance.
    pub capacitance: Option<f64>,
    pub axial_resistivity: f64,
}

impl GlobalDefaults {
    pub fn as_passive(&self) -> PassiveParameters {
        PassiveParameters {
            capacitance: self.capacitance,
            temperature_k: Some(self.temperature_k),
            init_potential_mv: Some(self.init_potential_mv),
            axial_resistivity: Some(self.axial_resistivity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonReversal {
    pub region: Region,
    pub ion: String,
    /// Reversal potential, mV.
    pub rev_pot: f64,
}

impl IonReversal {
    pub fn new(region: Region, ion: impl Into<String>, rev_pot: f64) -> Self {
        Self {
            region,
            ion: ion.into(),
            rev_pot,
        }
    }
}
