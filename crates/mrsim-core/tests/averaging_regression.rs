use mrsim_core::{AveragingScheme, IntegrationVolume};

/// Weighted mesh average of a function of the orientation angles, using the
/// same triangle-summed quadrature the interpolator applies.
fn weighted_mesh_average(scheme: &AveragingScheme, f: impl Fn(f64, f64) -> f64) -> f64 {
    let octant_orientations = scheme.octant_orientations();
    let mut total = 0.0;
    for octant in 0..scheme.n_octants() {
        let base = octant * octant_orientations;
        for triangle in scheme.triangles() {
            for &vertex in triangle {
                let (alpha, beta) = scheme.orientation_angles(base + vertex);
                total += scheme.weights()[vertex] * f(alpha, beta);
            }
        }
    }
    total
}

#[test]
fn quadrature_normalization_is_independent_of_density_and_volume() {
    for volume in [
        IntegrationVolume::Octant,
        IntegrationVolume::Hemisphere,
        IntegrationVolume::Sphere,
    ] {
        for density in [2, 5, 16, 33] {
            let scheme = AveragingScheme::build(density, false, volume).expect("scheme builds");
            let total = weighted_mesh_average(&scheme, |_, _| 1.0);
            assert!(
                (total - 1.0).abs() <= 1.0e-12,
                "{volume:?} density {density}: weight total {total}"
            );
            assert!((scheme.triangle_weight_total() - 1.0).abs() <= 1.0e-12);
        }
    }
}

#[test]
fn second_legendre_moment_integrates_to_zero() {
    // The octant lattice cancels P2(cos beta) exactly, which is what makes
    // octant-only coverage sufficient for rank-2 interactions.
    for volume in [IntegrationVolume::Octant, IntegrationVolume::Sphere] {
        let scheme = AveragingScheme::build(32, false, volume).expect("scheme builds");
        let moment = weighted_mesh_average(&scheme, |_, beta| {
            let x = beta.cos();
            0.5 * (3.0 * x * x - 1.0)
        });
        assert!(moment.abs() <= 1.0e-10, "{volume:?}: P2 moment {moment}");
    }
}

#[test]
fn planar_second_harmonic_integrates_to_zero() {
    let scheme =
        AveragingScheme::build(32, false, IntegrationVolume::Octant).expect("scheme builds");
    let moment = weighted_mesh_average(&scheme, |alpha, beta| {
        beta.sin().powi(2) * (2.0 * alpha).cos()
    });
    assert!(moment.abs() <= 1.0e-10, "cos(2 alpha) moment {moment}");
}

#[test]
fn orientation_counts_scale_with_the_requested_volume() {
    for (volume, octants) in [
        (IntegrationVolume::Octant, 1),
        (IntegrationVolume::Hemisphere, 4),
        (IntegrationVolume::Sphere, 8),
    ] {
        let scheme = AveragingScheme::build(9, false, volume).expect("scheme builds");
        assert_eq!(scheme.octant_orientations(), 55);
        assert_eq!(scheme.total_orientations(), 55 * octants);
        assert_eq!(scheme.triangles().len(), 81);
    }
}

#[test]
fn building_the_same_scheme_twice_is_deterministic() {
    let first = AveragingScheme::build(12, true, IntegrationVolume::Hemisphere).expect("scheme");
    let second = AveragingScheme::build(12, true, IntegrationVolume::Hemisphere).expect("scheme");
    assert_eq!(first.weights(), second.weights());
    assert_eq!(first.triangles(), second.triangles());
    for index in 0..first.total_orientations() {
        assert_eq!(first.orientation_angles(index), second.orientation_angles(index));
    }
}
