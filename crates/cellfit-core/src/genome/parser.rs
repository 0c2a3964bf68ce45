use super::model::{DecodedFit, MechanismTable, NormalizedGenome, RegionParameterMap};
use super::{
    Conditions, FitParameters, GenomeBlock, IonTable, NumericText, PassiveDefaults,
    parse_numeric_value,
};
use crate::domain::{
    CAPACITANCE_RESCALE, CELSIUS_TO_KELVIN, CellfitError, DecodeResult, GlobalDefaults,
    IonReversal, PassiveParameters, Region,
};
use tracing::debug;

/// Mechanism tag standing for the passive (leak) namespace.
pub const PASSIVE_MECHANISM: &str = "pas";

const ION_TABLE_REGION_KEY: &str = "section";

/// A genome block after the mechanism tag has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum GenomeRecord {
    Passive {
        region: Region,
        key: String,
        value: f64,
    },
    Mechanism {
        region: Region,
        mechanism: String,
        key: String,
        value: f64,
    },
}

impl GenomeRecord {
    /// Resolves a raw block; `index` only feeds the error message.
    ///
    /// The `_<mechanism>` suffix is stripped from the name for every block,
    /// the passive namespace included, so `gbar_foo_pas` becomes `gbar_foo`.
    pub fn from_block(index: usize, block: &GenomeBlock) -> DecodeResult<Self> {
        let mechanism = match block.mechanism.as_deref() {
            None | Some("") => PASSIVE_MECHANISM,
            Some(mechanism) => mechanism,
        };
        let value = block.value.parse().map_err(|source| {
            CellfitError::input_validation(
                "INPUT.MALFORMED_RECORD",
                format!(
                    "genome block {} (section '{}', name '{}'): {}",
                    index, block.section, block.name, source
                ),
            )
        })?;

        let suffix = format!("_{mechanism}");
        let key = block
            .name
            .strip_suffix(suffix.as_str())
            .unwrap_or(&block.name)
            .to_owned();
        let region = Region::from_tag(&block.section);

        if mechanism == PASSIVE_MECHANISM {
            Ok(Self::Passive { region, key, value })
        } else {
            Ok(Self::Mechanism {
                region,
                mechanism: mechanism.to_owned(),
                key,
                value,
            })
        }
    }

    pub fn region(&self) -> &Region {
        match self {
            Self::Passive { region, .. } | Self::Mechanism { region, .. } => region,
        }
    }
}

/// The passive keys that map onto [`PassiveParameters`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassiveField {
    Capacitance,
    AxialResistivity,
    InitPotential,
    Temperature,
}

impl PassiveField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "cm" => Some(Self::Capacitance),
            "Ra" => Some(Self::AxialResistivity),
            "Vm" => Some(Self::InitPotential),
            "celsius" => Some(Self::Temperature),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Capacitance => "cm",
            Self::AxialResistivity => "Ra",
            Self::InitPotential => "Vm",
            Self::Temperature => "celsius",
        }
    }

    /// Stores `value` in the matching field, converting units on the way in.
    pub fn assign(self, parameters: &mut PassiveParameters, value: f64) {
        match self {
            Self::Capacitance => parameters.capacitance = Some(value / CAPACITANCE_RESCALE),
            Self::AxialResistivity => parameters.axial_resistivity = Some(value),
            Self::InitPotential => parameters.init_potential_mv = Some(value),
            Self::Temperature => parameters.temperature_k = Some(value + CELSIUS_TO_KELVIN),
        }
    }
}

/// Decodes genome blocks and ion tables into the three normalized collections.
///
/// Fails on the first non-numeric value; nothing is returned for a partial decode.
/// Passive keys other than `cm`, `Ra`, `Vm` and `celsius` are logged at debug
/// level and dropped, though their region still gets an entry.
pub fn decode_genome(
    blocks: &[GenomeBlock],
    ion_tables: &[IonTable],
) -> DecodeResult<NormalizedGenome> {
    let mut regions = RegionParameterMap::default();
    let mut mechanisms = MechanismTable::default();

    for (index, block) in blocks.iter().enumerate() {
        match GenomeRecord::from_block(index, block)? {
            GenomeRecord::Passive { region, key, value } => {
                // The region entry exists even when the key is dropped below.
                let parameters = regions.get_or_create(&region);
                match PassiveField::from_key(&key) {
                    Some(field) => field.assign(parameters, value),
                    None => debug!(
                        block = index,
                        region = %region,
                        key = %key,
                        "ignoring passive key without a matching cable property"
                    ),
                }
            }
            GenomeRecord::Mechanism {
                region,
                mechanism,
                key,
                value,
            } => {
                mechanisms.get_or_create(&region, &mechanism).insert(key, value);
            }
        }
    }

    let ions = decode_reversal_potentials(ion_tables)?;
    debug!(
        regions = regions.len(),
        mechanisms = mechanisms.len(),
        ions = ions.len(),
        "decoded genome"
    );

    Ok(NormalizedGenome {
        regions,
        mechanisms,
        ions,
    })
}

pub fn decode_reversal_potentials(ion_tables: &[IonTable]) -> DecodeResult<Vec<IonReversal>> {
    let mut ions = Vec::new();
    for (index, table) in ion_tables.iter().enumerate() {
        let region = Region::from_tag(&table.section);
        for (key, value) in &table.potentials {
            if key == ION_TABLE_REGION_KEY {
                continue;
            }
            let rev_pot = parse_numeric_value(value).map_err(|source| {
                CellfitError::input_validation(
                    "INPUT.MALFORMED_RECORD",
                    format!(
                        "reversal potential table {} (section '{}', key '{}'): {}",
                        index, table.section, key, source
                    ),
                )
            })?;
            ions.push(IonReversal::new(region.clone(), ion_species(key), rev_pot));
        }
    }
    Ok(ions)
}

/// `ena` -> `na`: drops the leading `e` of the reversal-potential key.
fn ion_species(key: &str) -> &str {
    let mut chars = key.chars();
    chars.next();
    chars.as_str()
}

pub fn decode_global_defaults(
    conditions: &Conditions,
    passive: &PassiveDefaults,
) -> DecodeResult<GlobalDefaults> {
    let field = |name: &str, value: &NumericText| {
        value.parse().map_err(|source| {
            CellfitError::input_validation(
                "INPUT.MALFORMED_RECORD",
                format!("global default '{name}': {source}"),
            )
        })
    };

    Ok(GlobalDefaults {
        temperature_k: field("celsius", &conditions.celsius)? + CELSIUS_TO_KELVIN,
        init_potential_mv: field("v_init", &conditions.v_init)?,
        capacitance: None,
        axial_resistivity: field("ra", &passive.ra)?,
    })
}

/// Decodes a whole fit file: `conditions[0]` and `passive[0]` supply the
/// global defaults and `conditions[0].erev` the reversal potentials.
pub fn decode_fit(fit: &FitParameters) -> DecodeResult<DecodedFit> {
    let conditions = fit.conditions.first().ok_or_else(|| {
        CellfitError::input_validation(
            "INPUT.MISSING_CONDITIONS",
            "fit parameters contain no 'conditions' entry",
        )
    })?;
    let passive = fit.passive.first().ok_or_else(|| {
        CellfitError::input_validation(
            "INPUT.MISSING_PASSIVE",
            "fit parameters contain no 'passive' entry",
        )
    })?;

    let defaults = decode_global_defaults(conditions, passive)?;
    let genome = decode_genome(&fit.genome, &conditions.erev)?;
    Ok(DecodedFit { defaults, genome })
}
