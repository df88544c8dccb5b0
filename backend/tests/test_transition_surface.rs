//! Transition surface construction and the dynamic blender

use loan_tape_core_rs::risk::{
    ArchetypeCatalog, ReferenceArchetypeModel, RiskMatrix, RiskVectorSource, TransitionParams,
};
use loan_tape_core_rs::transitions::{blend, blend_population, SeasoningRule, TransitionSurface};
use loan_tape_core_rs::Loan;

/// Age-indexed source that also returns out-of-range values
struct AgeEcho;

impl RiskVectorSource for AgeEcho {
    fn archetype_catalog(&self) -> ArchetypeCatalog {
        ArchetypeCatalog::new(vec!["SLOW".into(), "FAST".into(), "WILD".into()]).unwrap()
    }

    fn predict_risk_vectors(&self, loans: &[Loan]) -> Vec<Vec<f64>> {
        loans.iter().map(|_| vec![0.2, 0.3, 0.5]).collect()
    }

    fn base_transition_parameters(&self, archetype: &str, age: usize) -> TransitionParams {
        let a = age as f64 / 100.0;
        match archetype {
            "SLOW" => TransitionParams {
                p_current_to_30: a,
                ..TransitionParams::ZERO
            },
            "FAST" => TransitionParams {
                p_current_to_30: 2.0 * a,
                p_30_to_cure: 0.5,
                ..TransitionParams::ZERO
            },
            _ => TransitionParams {
                p_current_to_30: 1.5,
                p_current_to_paid: -0.2,
                p_30_to_60: 0.9,
                p_30_to_cure: 0.9,
                p_roll_forward: f64::NAN,
            },
        }
    }
}

#[test]
fn test_surface_is_indexed_by_age_and_archetype() {
    let src = AgeEcho;
    let surface = TransitionSurface::build(&src, &src.archetype_catalog(), 24);

    assert_eq!(surface.max_age(), 24);
    assert_eq!(surface.n_archetypes(), 3);
    assert!((surface.get(10, 0).p_current_to_30 - 0.10).abs() < 1e-12);
    assert!((surface.get(10, 1).p_current_to_30 - 0.20).abs() < 1e-12);
    assert_eq!(surface.row(7).len(), 3);
}

#[test]
fn test_ages_beyond_max_clamp() {
    let src = AgeEcho;
    let surface = TransitionSurface::build(&src, &src.archetype_catalog(), 24);
    assert_eq!(surface.get(24, 1), surface.get(100, 1));
    assert_eq!(surface.row(24), surface.row(usize::MAX));
}

#[test]
fn test_out_of_range_parameters_are_clamped() {
    let src = AgeEcho;
    let surface = TransitionSurface::build(&src, &src.archetype_catalog(), 5);
    let wild = surface.get(3, 2);
    assert_eq!(wild.p_current_to_30, 1.0);
    assert_eq!(wild.p_current_to_paid, 0.0);
    assert_eq!(wild.p_roll_forward, 0.0);
}

#[test]
fn test_blend_is_weighted_sum() {
    let src = AgeEcho;
    let surface = TransitionSurface::build(&src, &src.archetype_catalog(), 24);
    let p = blend(&surface, &[0.5, 0.5, 0.0], 10);
    assert!((p.p_current_to_30 - 0.15).abs() < 1e-12);
    assert!((p.p_30_to_cure - 0.25).abs() < 1e-12);
}

#[test]
fn test_excess_mass_is_renormalized_and_counted() {
    let src = AgeEcho;
    let surface = TransitionSurface::build(&src, &src.archetype_catalog(), 24);
    let risk = RiskMatrix::from_rows(vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]], 2, 3).unwrap();

    let batch = blend_population(
        &surface,
        &risk,
        &[0, 1],
        &[12, 12],
        &SeasoningRule::default(),
    );

    assert_eq!(batch.renormalized, 1);
    let wild = batch.params[0];
    assert!(wild.current_outflow() <= 1.0 + 1e-12);
    assert!((wild.dpd30_outflow() - 1.0).abs() < 1e-12);
    assert!((wild.p_30_to_60 - 0.5).abs() < 1e-12);
    assert!((batch.params[1].p_current_to_30 - 0.12).abs() < 1e-12);
}

#[test]
fn test_reference_model_surface_is_well_formed() {
    let model = ReferenceArchetypeModel::new();
    let catalog = model.archetype_catalog();
    let surface = TransitionSurface::build(&model, &catalog, 60);

    for age in 0..=60 {
        for params in surface.row(age) {
            assert!(params.current_outflow() <= 1.0);
            assert!(params.dpd30_outflow() <= 1.0);
        }
    }

    let weights = ReferenceArchetypeModel::risk_vector(690, 0.35);
    let blended = blend(&surface, &weights, 12);
    let max = surface
        .row(12)
        .iter()
        .map(|p| p.p_current_to_30)
        .fold(0.0, f64::max);
    let min = surface
        .row(12)
        .iter()
        .map(|p| p.p_current_to_30)
        .fold(1.0, f64::min);
    assert!(blended.p_current_to_30 >= min && blended.p_current_to_30 <= max);
}
