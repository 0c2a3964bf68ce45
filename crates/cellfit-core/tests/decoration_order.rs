use cellfit_core::decor::{
    DecorCall, Decoration, MechanismCatalogue, Paintable, RecordedDecor, StimulusProtocol,
    apply_decoration, place_protocol,
};
use cellfit_core::domain::{CellfitError, GlobalDefaults};
use cellfit_core::genome::{DecodedFit, decode_fit, load_fit_parameters};
use std::path::Path;

fn decoded_fixture() -> DecodedFit {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fit_parameters.json");
    let fit = load_fit_parameters(&path).expect("fixture should load");
    decode_fit(&fit).expect("fixture should decode")
}

fn call_kind(call: &DecorCall) -> &'static str {
    match call {
        DecorCall::SetGlobalProperty { .. } => "global",
        DecorCall::Paint {
            paintable: Paintable::Properties(_),
            ..
        } => "properties",
        DecorCall::Paint {
            paintable: Paintable::IonReversal { .. },
            ..
        } => "ion",
        DecorCall::Paint {
            paintable: Paintable::Density(_),
            ..
        } => "density",
        DecorCall::Place { .. } => "place",
    }
}

#[test]
fn calls_follow_global_passive_ion_density_order() {
    let decoded = decoded_fixture();
    let mut decor = RecordedDecor::new().with_swc_labels();
    apply_decoration(&decoded.defaults, &decoded.genome, &mut decor)
        .expect("fixture should apply");

    let kinds: Vec<&str> = decor.calls().iter().map(call_kind).collect();
    let mut expected = vec!["global"];
    expected.extend(std::iter::repeat_n("properties", 4));
    expected.extend(std::iter::repeat_n("ion", 6));
    expected.extend(std::iter::repeat_n("density", 13));
    assert_eq!(kinds, expected);

    let DecorCall::SetGlobalProperty { defaults } = &decor.calls()[0] else {
        panic!("first call should set global properties");
    };
    assert_eq!(defaults.capacitance, None);
    assert_eq!(defaults.axial_resistivity, 138.28);
}

#[test]
fn region_paint_passes_unset_fields_through() {
    let decoded = decoded_fixture();
    let mut decor = RecordedDecor::new();
    apply_decoration(&decoded.defaults, &decoded.genome, &mut decor)
        .expect("fixture should apply");

    let DecorCall::Paint {
        selector,
        paintable: Paintable::Properties(soma),
    } = &decor.calls()[1]
    else {
        panic!("second call should paint soma properties");
    };
    assert_eq!(selector, "\"soma\"");
    assert_eq!(soma.capacitance, Some(0.01));
    assert_eq!(soma.temperature_k, None);
    assert_eq!(soma.init_potential_mv, None);
    assert_eq!(soma.axial_resistivity, None);

    let resolved = decor.resolve();
    let soma = resolved.region("\"soma\"").expect("soma should resolve");
    assert_eq!(soma.properties.axial_resistivity, Some(138.28));
    assert_eq!(soma.properties.init_potential_mv, Some(-87.9755700445));
    assert_eq!(soma.densities.len(), 11);
    assert_eq!(soma.reversal_potentials.get("na"), Some(&53.0));
    assert_eq!(soma.reversal_potentials.get("k"), Some(&-107.0));

    let dend = resolved.region("\"dend\"").expect("dend should resolve");
    assert!(dend.reversal_potentials.is_empty());
    assert_eq!(dend.properties.capacitance, Some(0.02));
}

#[test]
fn catalogue_failure_propagates_unchanged_and_stops_application() {
    let decoded = decoded_fixture();
    let mut catalogue = MechanismCatalogue::default();
    catalogue.insert("Im", ["gbar"]);
    let mut decor = RecordedDecor::new().with_catalogue(catalogue);

    let error: CellfitError = apply_decoration(&decoded.defaults, &decoded.genome, &mut decor)
        .expect_err("Ih is not in the catalogue");
    assert_eq!(error.placeholder(), "DECOR.UNKNOWN_MECHANISM");
    assert!(error.message().contains("'Ih'"));

    // global + 4 regions + 6 ions + the accepted Im density
    assert_eq!(decor.calls().len(), 12);
}

#[test]
fn protocol_is_placed_after_parameters() {
    let decoded = decoded_fixture();
    let mut decor = RecordedDecor::new();
    apply_decoration(&decoded.defaults, &decoded.genome, &mut decor)
        .expect("fixture should apply");
    place_protocol(&StimulusProtocol::default(), &mut decor).expect("protocol should place");

    let calls = decor.calls();
    let tail: Vec<&str> = calls[calls.len() - 2..]
        .iter()
        .map(|call| match call {
            DecorCall::Place { label, locset, .. } => {
                assert_eq!(locset, "(on-components 0.5 (tag 1))");
                label.as_str()
            }
            other => panic!("expected placement, got {other:?}"),
        })
        .collect();
    assert_eq!(tail, ["inj", "det"]);
}

#[test]
fn custom_targets_can_be_driven_through_trait_objects() {
    struct CountingDecor(usize);

    impl Decoration for CountingDecor {
        type Error = std::convert::Infallible;

        fn set_global_property(&mut self, _defaults: &GlobalDefaults) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }

        fn paint(&mut self, _selector: &str, _paintable: Paintable) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }

        fn place(
            &mut self,
            _locset: &str,
            _placeable: cellfit_core::decor::Placeable,
            _label: &str,
        ) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }
    }

    let decoded = decoded_fixture();
    let mut counting = CountingDecor(0);
    let target: &mut dyn Decoration<Error = std::convert::Infallible> = &mut counting;
    apply_decoration(&decoded.defaults, &decoded.genome, target).expect("infallible target");
    assert_eq!(counting.0, 24);
}
