//! Applying a decoded genome to a cell decoration.
//!
//! The decoration itself belongs to the simulator; this module only needs a
//! target that accepts global and region-scoped property assignments, which
//! is what [`Decoration`] describes. [`RecordedDecor`] is the in-crate
//! implementation used by the pipeline and the tests.

mod recorder;

use crate::domain::{GlobalDefaults, PassiveParameters};
use crate::genome::NormalizedGenome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use recorder::{
    DecorCall, MechanismCatalogue, RecordedDecor, RegionDecor, ResolvedDecor, SWC_REGION_LABELS,
};

/// A mechanism with its parameter values, painted as one density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensitySpec {
    pub mechanism: String,
    pub parameters: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paintable {
    Properties(PassiveParameters),
    IonReversal { ion: String, rev_pot: f64 },
    Density(DensitySpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placeable {
    IClamp {
        delay_ms: f64,
        duration_ms: f64,
        amplitude_na: f64,
    },
    ThresholdDetector {
        threshold_mv: f64,
    },
}

/// Target of parameter assignments, scoped to the whole cell or a region.
///
/// Errors are the target's own and are passed back to the caller untouched.
pub trait Decoration {
    type Error;

    fn set_global_property(&mut self, defaults: &GlobalDefaults) -> Result<(), Self::Error>;

    fn paint(&mut self, selector: &str, paintable: Paintable) -> Result<(), Self::Error>;

    fn place(
        &mut self,
        locset: &str,
        placeable: Placeable,
        label: &str,
    ) -> Result<(), Self::Error>;
}

/// Applies defaults and the normalized genome to `target`.
///
/// Order is fixed: global defaults, region passive overrides, ion reversal
/// potentials (collection order), mechanism densities. The first target error
/// aborts the pass.
pub fn apply_decoration<D>(
    defaults: &GlobalDefaults,
    genome: &NormalizedGenome,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: Decoration + ?Sized,
{
    target.set_global_property(defaults)?;

    for entry in genome.regions.iter() {
        target.paint(
            &entry.region.selector(),
            Paintable::Properties(entry.parameters),
        )?;
    }

    for ion in &genome.ions {
        target.paint(
            &ion.region.selector(),
            Paintable::IonReversal {
                ion: ion.ion.clone(),
                rev_pot: ion.rev_pot,
            },
        )?;
    }

    for entry in genome.mechanisms.iter() {
        target.paint(
            &entry.region.selector(),
            Paintable::Density(DensitySpec {
                mechanism: entry.mechanism.clone(),
                parameters: entry.parameters.clone(),
            }),
        )?;
    }

    debug!(
        regions = genome.regions.len(),
        ions = genome.ions.len(),
        densities = genome.mechanisms.len(),
        "applied genome to decoration"
    );
    Ok(())
}

/// Current clamp and spike detector placed after the parameters.
///
/// Missing fields fall back to the [`Default`] protocol when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusProtocol {
    pub locset: String,
    pub clamp_delay_ms: f64,
    pub clamp_duration_ms: f64,
    pub clamp_amplitude_na: f64,
    pub clamp_label: String,
    pub detector_threshold_mv: f64,
    pub detector_label: String,
}

impl Default for StimulusProtocol {
    fn default() -> Self {
        Self {
            locset: "(on-components 0.5 (tag 1))".to_string(),
            clamp_delay_ms: 100.0,
            clamp_duration_ms: 1000.0,
            clamp_amplitude_na: 0.2,
            clamp_label: "inj".to_string(),
            detector_threshold_mv: -40.0,
            detector_label: "det".to_string(),
        }
    }
}

pub fn place_protocol<D>(protocol: &StimulusProtocol, target: &mut D) -> Result<(), D::Error>
where
    D: Decoration + ?Sized,
{
    target.place(
        &protocol.locset,
        Placeable::IClamp {
            delay_ms: protocol.clamp_delay_ms,
            duration_ms: protocol.clamp_duration_ms,
            amplitude_na: protocol.clamp_amplitude_na,
        },
        &protocol.clamp_label,
    )?;
    target.place(
        &protocol.locset,
        Placeable::ThresholdDetector {
            threshold_mv: protocol.detector_threshold_mv,
        },
        &protocol.detector_label,
    )
}
