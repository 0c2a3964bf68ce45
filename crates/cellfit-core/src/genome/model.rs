use crate::domain::{GlobalDefaults, IonReversal, PassiveParameters, Region};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPassiveEntry {
    pub region: Region,
    #[serde(flatten)]
    pub parameters: PassiveParameters,
}

/// Passive overrides per region, in order of first reference.
///
/// Entries are only ever created through [`RegionParameterMap::get_or_create`]
/// and are never removed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionParameterMap {
    entries: Vec<RegionPassiveEntry>,
}

impl RegionParameterMap {
    /// Returns the region's parameters, inserting an all-unset entry on first reference.
    pub fn get_or_create(&mut self, region: &Region) -> &mut PassiveParameters {
        let index = match self.position(region) {
            Some(index) => index,
            None => {
                self.entries.push(RegionPassiveEntry {
                    region: region.clone(),
                    parameters: PassiveParameters::default(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].parameters
    }

    pub fn get(&self, region: &Region) -> Option<&PassiveParameters> {
        self.position(region)
            .map(|index| &self.entries[index].parameters)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionPassiveEntry> {
        self.entries.iter()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.entries.iter().map(|entry| &entry.region)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, region: &Region) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.region == region)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismEntry {
    pub region: Region,
    pub mechanism: String,
    pub parameters: BTreeMap<String, f64>,
}

/// Density parameters keyed by (region, mechanism), in order of first reference.
///
/// Tables for different mechanisms on the same region stay separate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MechanismTable {
    entries: Vec<MechanismEntry>,
}

impl MechanismTable {
    /// Returns the parameter map for `(region, mechanism)`, inserting an empty one on first reference.
    pub fn get_or_create(&mut self, region: &Region, mechanism: &str) -> &mut BTreeMap<String, f64> {
        let index = match self.position(region, mechanism) {
            Some(index) => index,
            None => {
                self.entries.push(MechanismEntry {
                    region: region.clone(),
                    mechanism: mechanism.to_owned(),
                    parameters: BTreeMap::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].parameters
    }

    pub fn get(&self, region: &Region, mechanism: &str) -> Option<&BTreeMap<String, f64>> {
        self.position(region, mechanism)
            .map(|index| &self.entries[index].parameters)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MechanismEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.parameters.len()).sum()
    }

    fn position(&self, region: &Region, mechanism: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.region == region && entry.mechanism == mechanism)
    }
}

/// The decoder's three outputs, handed read-only to the applier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedGenome {
    pub regions: RegionParameterMap,
    pub mechanisms: MechanismTable,
    pub ions: Vec<IonReversal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFit {
    pub defaults: GlobalDefaults,
    pub genome: NormalizedGenome,
}
