//! Wigner reduced rotation matrices for the spherical-tensor ranks carried by
//! the engine (rank 2 and rank 4), and the active z-y-z rotation of tensor
//! components they parameterize.

use num_complex::Complex64;

// Largest factorial argument is (l + |m|) = 8 for rank 4.
const FACTORIALS: [f64; 9] = [
    1.0, 1.0, 2.0, 6.0, 24.0, 120.0, 720.0, 5040.0, 40320.0,
];

fn factorial(n: i32) -> f64 {
    FACTORIALS[n as usize]
}

/// Wigner reduced rotation matrix element `d^l_{mp,m}(beta)` from the
/// closed-form factorial sum. Exact for the small ranks used here; the sum
/// has at most 2l + 1 terms.
pub fn wigner_small_d(l: i32, mp: i32, m: i32, beta: f64) -> f64 {
    debug_assert!(l >= 0 && mp.abs() <= l && m.abs() <= l);

    let cos_half = (0.5 * beta).cos();
    let sin_half = (0.5 * beta).sin();
    let prefactor = (factorial(l + mp)
        * factorial(l - mp)
        * factorial(l + m)
        * factorial(l - m))
    .sqrt();

    let s_min = 0.max(m - mp);
    let s_max = (l + m).min(l - mp);
    let mut sum = 0.0;
    for s in s_min..=s_max {
        let sign = if (mp - m + s).rem_euclid(2) == 0 {
            1.0
        } else {
            -1.0
        };
        let denominator = factorial(l + m - s)
            * factorial(s)
            * factorial(mp - m + s)
            * factorial(l - mp - s);
        sum += sign * cos_half.powi(2 * l + m - mp - 2 * s) * sin_half.powi(mp - m + 2 * s)
            / denominator;
    }

    prefactor * sum
}

/// Full `(2l+1) x (2l+1)` reduced rotation matrix, row-major with index
/// `(mp + l) * (2l + 1) + (m + l)`.
pub fn wigner_d_matrix(l: i32, beta: f64) -> Vec<f64> {
    let dim = (2 * l + 1) as usize;
    let mut matrix = Vec::with_capacity(dim * dim);
    for mp in -l..=l {
        for m in -l..=l {
            matrix.push(wigner_small_d(l, mp, m, beta));
        }
    }
    matrix
}

/// Rotates irreducible spherical tensor components through the z-y-z Euler
/// angles `(alpha, beta, gamma)`:
/// `out[mp] = e^{-i mp alpha} sum_m d^l_{mp,m}(beta) e^{-i m gamma} in[m]`.
pub fn rotate_spherical_components(
    l: i32,
    alpha: f64,
    beta: f64,
    gamma: f64,
    input: &[Complex64],
    output: &mut [Complex64],
) {
    let dim = (2 * l + 1) as usize;
    debug_assert_eq!(input.len(), dim);
    debug_assert_eq!(output.len(), dim);

    let d = wigner_d_matrix(l, beta);
    for (row, out) in output.iter_mut().enumerate() {
        let mp = row as i32 - l;
        let mut sum = Complex64::new(0.0, 0.0);
        for (col, value) in input.iter().enumerate() {
            let m = col as i32 - l;
            let gamma_phase = Complex64::from_polar(1.0, -(m as f64) * gamma);
            sum += *value * gamma_phase * d[row * dim + col];
        }
        *out = Complex64::from_polar(1.0, -(mp as f64) * alpha) * sum;
    }
}

#[cfg(test)]
mod tests {
    use super::{rotate_spherical_components, wigner_d_matrix, wigner_small_d};
    use num_complex::Complex64;

    const MAGIC_ANGLE: f64 = 0.955_316_618_124_509_3;

    #[test]
    fn reduced_matrix_is_identity_at_zero_angle() {
        for l in [2, 4] {
            let dim = (2 * l + 1) as usize;
            let matrix = wigner_d_matrix(l, 0.0);
            for row in 0..dim {
                for col in 0..dim {
                    let expected = if row == col { 1.0 } else { 0.0 };
                    assert!(
                        (matrix[row * dim + col] - expected).abs() <= 1.0e-14,
                        "d^{l}(0) element ({row},{col}) = {}",
                        matrix[row * dim + col]
                    );
                }
            }
        }
    }

    #[test]
    fn rank2_elements_match_closed_forms() {
        for beta in [0.3_f64, 0.955, 1.7, 2.9] {
            let (sin, cos) = beta.sin_cos();
            let expected_00 = 0.5 * (3.0 * cos * cos - 1.0);
            let expected_20 = (3.0_f64 / 8.0).sqrt() * sin * sin;
            assert!((wigner_small_d(2, 0, 0, beta) - expected_00).abs() <= 1.0e-13);
            assert!((wigner_small_d(2, 2, 0, beta) - expected_20).abs() <= 1.0e-13);
        }
    }

    #[test]
    fn rank2_zero_zero_element_vanishes_at_the_magic_angle() {
        assert!(wigner_small_d(2, 0, 0, MAGIC_ANGLE).abs() <= 1.0e-12);
    }

    #[test]
    fn reduced_matrices_are_orthogonal() {
        for l in [2, 4] {
            let dim = (2 * l + 1) as usize;
            let matrix = wigner_d_matrix(l, 1.234);
            for row_a in 0..dim {
                for row_b in 0..dim {
                    let mut dot = 0.0;
                    for col in 0..dim {
                        dot += matrix[row_a * dim + col] * matrix[row_b * dim + col];
                    }
                    let expected = if row_a == row_b { 1.0 } else { 0.0 };
                    assert!(
                        (dot - expected).abs() <= 1.0e-12,
                        "rows {row_a},{row_b} of d^{l} dot to {dot}"
                    );
                }
            }
        }
    }

    #[test]
    fn rotation_by_zero_angles_is_the_identity() {
        let input: Vec<Complex64> = (0..5)
            .map(|index| Complex64::new(index as f64 - 1.5, 0.25 * index as f64))
            .collect();
        let mut output = vec![Complex64::new(0.0, 0.0); 5];
        rotate_spherical_components(2, 0.0, 0.0, 0.0, &input, &mut output);
        for (expected, actual) in input.iter().zip(&output) {
            assert!((*expected - *actual).norm() <= 1.0e-14);
        }
    }

    #[test]
    fn rotation_preserves_the_component_norm() {
        let input: Vec<Complex64> = (0..9)
            .map(|index| Complex64::new(0.3 * index as f64 - 1.0, 0.1 * index as f64))
            .collect();
        let mut output = vec![Complex64::new(0.0, 0.0); 9];
        rotate_spherical_components(4, 0.7, 1.1, -0.4, &input, &mut output);

        let norm_in: f64 = input.iter().map(|value| value.norm_sqr()).sum();
        let norm_out: f64 = output.iter().map(|value| value.norm_sqr()).sum();
        assert!((norm_in - norm_out).abs() <= 1.0e-12 * norm_in.max(1.0));
    }

    #[test]
    fn rotation_preserves_the_reality_symmetry() {
        // A tensor with R_{-m} = (-1)^m conj(R_m) describes a real observable
        // and must keep that property under any rotation.
        let mut input = vec![Complex64::new(0.0, 0.0); 5];
        input[2] = Complex64::new(1.0, 0.0);
        input[3] = Complex64::new(0.4, -0.2);
        input[1] = -input[3].conj();
        input[4] = Complex64::new(-0.3, 0.7);
        input[0] = input[4].conj();

        let mut output = vec![Complex64::new(0.0, 0.0); 5];
        rotate_spherical_components(2, 0.9, 0.6, 1.8, &input, &mut output);

        for m in 0..=2_i32 {
            let direct = output[(2 + m) as usize];
            let mirrored = output[(2 - m) as usize];
            let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
            assert!((mirrored - sign * direct.conj()).norm() <= 1.0e-13);
        }
    }
}
