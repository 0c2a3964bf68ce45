use super::{Decoration, DensitySpec, Paintable, Placeable};
use crate::domain::{CellfitError, CellfitResult, DecorResult, GlobalDefaults, PassiveParameters};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Region labels an SWC morphology defines out of the box.
pub const SWC_REGION_LABELS: [&str; 4] = ["soma", "axon", "dend", "apic"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DecorCall {
    SetGlobalProperty {
        defaults: GlobalDefaults,
    },
    Paint {
        selector: String,
        paintable: Paintable,
    },
    Place {
        locset: String,
        placeable: Placeable,
        label: String,
    },
}

/// Mechanism names with the parameter names each one accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MechanismCatalogue {
    pub mechanisms: BTreeMap<String, BTreeSet<String>>,
}

impl MechanismCatalogue {
    pub fn insert<I, S>(&mut self, mechanism: impl Into<String>, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mechanisms
            .entry(mechanism.into())
            .or_default()
            .extend(parameters.into_iter().map(Into::into));
    }

    pub fn from_json(source: &str) -> CellfitResult<Self> {
        serde_json::from_str(source).map_err(|source| {
            CellfitError::input_validation(
                "INPUT.CATALOGUE_PARSE",
                format!("mechanism catalogue is not valid JSON of the expected shape: {source}"),
            )
        })
    }

    pub fn from_path(path: &Path) -> CellfitResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            CellfitError::io_system(
                "IO.CATALOGUE_READ",
                format!(
                    "failed to read mechanism catalogue '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        Self::from_json(&source)
    }

    fn check_density(&self, selector: &str, density: &DensitySpec) -> DecorResult<()> {
        let Some(known) = self.mechanisms.get(&density.mechanism) else {
            return Err(CellfitError::decoration(
                "DECOR.UNKNOWN_MECHANISM",
                format!(
                    "no mechanism '{}' in catalogue (painting {})",
                    density.mechanism, selector
                ),
            ));
        };

        if let Some(parameter) = density
            .parameters
            .keys()
            .find(|parameter| !known.contains(parameter.as_str()))
        {
            return Err(CellfitError::decoration(
                "DECOR.UNKNOWN_PARAMETER",
                format!(
                    "mechanism '{}' has no parameter '{}' (painting {})",
                    density.mechanism, parameter, selector
                ),
            ));
        }

        Ok(())
    }
}

/// Decoration target that records every call in order.
///
/// Optionally checks quoted region labels against a label set and densities
/// against a [`MechanismCatalogue`]; a rejected call is not recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordedDecor {
    labels: Option<BTreeSet<String>>,
    catalogue: Option<MechanismCatalogue>,
    calls: Vec<DecorCall>,
}

impl RecordedDecor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_swc_labels(self) -> Self {
        self.with_labels(SWC_REGION_LABELS)
    }

    pub fn with_catalogue(mut self, catalogue: MechanismCatalogue) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    pub fn calls(&self) -> &[DecorCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DecorCall> {
        self.calls
    }

    /// Effective decoration after last-applied-wins and default fallback.
    pub fn resolve(&self) -> ResolvedDecor {
        let mut defaults = None;
        let mut regions: Vec<RegionDecor> = Vec::new();

        for call in &self.calls {
            let (selector, paintable) = match call {
                DecorCall::SetGlobalProperty { defaults: applied } => {
                    defaults = Some(*applied);
                    continue;
                }
                DecorCall::Place { .. } => continue,
                DecorCall::Paint {
                    selector,
                    paintable,
                } => (selector, paintable),
            };

            let region = match regions.iter().position(|region| &region.selector == selector) {
                Some(index) => &mut regions[index],
                None => {
                    regions.push(RegionDecor::new(selector.clone()));
                    let last = regions.len() - 1;
                    &mut regions[last]
                }
            };

            match paintable {
                Paintable::Properties(properties) => {
                    region.properties = properties.or(region.properties);
                }
                Paintable::IonReversal { ion, rev_pot } => {
                    region.reversal_potentials.insert(ion.clone(), *rev_pot);
                }
                Paintable::Density(density) => region.densities.push(density.clone()),
            }
        }

        if let Some(defaults) = defaults {
            let fallback = defaults.as_passive();
            for region in &mut regions {
                region.properties = region.properties.or(fallback);
            }
        }

        ResolvedDecor { defaults, regions }
    }

    fn check_selector(&self, selector: &str) -> DecorResult<()> {
        let Some(labels) = &self.labels else {
            return Ok(());
        };
        // Only plain quoted labels are checked; other region expressions pass through.
        let Some(label) = selector
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        else {
            return Ok(());
        };

        if labels.contains(label) {
            Ok(())
        } else {
            Err(CellfitError::decoration(
                "DECOR.UNKNOWN_REGION",
                format!("no region label '{label}' on the morphology"),
            ))
        }
    }
}

impl Decoration for RecordedDecor {
    type Error = CellfitError;

    fn set_global_property(&mut self, defaults: &GlobalDefaults) -> DecorResult<()> {
        self.calls.push(DecorCall::SetGlobalProperty {
            defaults: *defaults,
        });
        Ok(())
    }

    fn paint(&mut self, selector: &str, paintable: Paintable) -> DecorResult<()> {
        self.check_selector(selector)?;
        if let (Some(catalogue), Paintable::Density(density)) = (&self.catalogue, &paintable) {
            catalogue.check_density(selector, density)?;
        }
        self.calls.push(DecorCall::Paint {
            selector: selector.to_owned(),
            paintable,
        });
        Ok(())
    }

    fn place(&mut self, locset: &str, placeable: Placeable, label: &str) -> DecorResult<()> {
        self.calls.push(DecorCall::Place {
            locset: locset.to_owned(),
            placeable,
            label: label.to_owned(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDecor {
    pub selector: String,
    pub properties: PassiveParameters,
    pub reversal_potentials: BTreeMap<String, f64>,
    pub densities: Vec<DensitySpec>,
}

impl RegionDecor {
    fn new(selector: String) -> Self {
        Self {
            selector,
            properties: PassiveParameters::default(),
            reversal_potentials: BTreeMap::new(),
            densities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDecor {
    pub defaults: Option<GlobalDefaults>,
    pub regions: Vec<RegionDecor>,
}

impl ResolvedDecor {
    pub fn region(&self, selector: &str) -> Option<&RegionDecor> {
        self.regions
            .iter()
            .find(|region| region.selector == selector)
    }
}
