//! Spin transition symmetry functions.
//!
//! Pure scalar maps from a transition's initial/final magnetic quantum
//! numbers (and the spin quantum number, where higher ranks enter) to the
//! weights projecting an interaction's matrix element onto irreducible
//! spherical-tensor ranks. Deterministic, allocation-free, called once per
//! interaction per transition.

const SQRT_3_OVER_2: f64 = 1.224_744_871_391_589_1;
const INV_SQRT_10: f64 = 0.316_227_766_016_837_94;

/// Rank-1 single-spin weight, `mf - mi`.
pub fn transition_p(mf: f64, mi: f64) -> f64 {
    mf - mi
}

/// Rank-2 single-spin weight, `sqrt(3/2) (mf^2 - mi^2)`.
pub fn transition_d(mf: f64, mi: f64) -> f64 {
    SQRT_3_OVER_2 * (mf * mf - mi * mi)
}

/// Rank-3 single-spin building block,
/// `(1/sqrt(10)) [5 (mf^3 - mi^3) + (1 - 3 I(I+1)) (mf - mi)]`.
pub fn transition_f(mf: f64, mi: f64, spin: f64) -> f64 {
    let mut value = 1.0 - 3.0 * spin * (spin + 1.0);
    value *= mf - mi;
    value += 5.0 * (mf * mf * mf - mi * mi * mi);
    value * INV_SQRT_10
}

/// Weights of the rank 0, 2, and 4 terms of the second-order quadrupolar
/// correction, as the fixed linear combination of [`transition_p`] and
/// [`transition_f`].
pub fn quad_second_order_weights(mf: f64, mi: f64, spin: f64) -> [f64; 3] {
    let f_value = transition_f(mf, mi, spin);
    let p_term = (spin * (spin + 1.0) - 0.75) * transition_p(mf, mi);
    [
        0.357_770_876_4 * p_term + 0.848_528_137_4 * f_value,
        0.106_904_496_8 * p_term - 1.014_185_105_7 * f_value,
        -0.143_427_433_1 * p_term - 1.285_079_208_2 * f_value,
    ]
}

/// Two-spin rank-1 weight for weakly coupled nuclei,
/// `mIf mSf - mIi mSi`.
pub fn transition_dis(m_i_final: f64, m_i_initial: f64, m_s_final: f64, m_s_initial: f64) -> f64 {
    m_i_final * m_s_final - m_i_initial * m_s_initial
}

#[cfg(test)]
mod tests {
    use super::{
        quad_second_order_weights, transition_d, transition_dis, transition_f, transition_p,
    };

    #[test]
    fn p_and_d_are_antisymmetric_in_the_state_pair() {
        for (mf, mi) in [(0.5, -0.5), (1.5, 0.5), (2.5, -1.5), (-0.5, -2.5)] {
            assert_eq!(transition_p(mf, mi), -transition_p(mi, mf));
            assert!((transition_d(mf, mi) + transition_d(mi, mf)).abs() <= 1.0e-15);
        }
    }

    #[test]
    fn d_vanishes_for_the_central_transition() {
        assert_eq!(transition_d(0.5, -0.5), 0.0);
    }

    #[test]
    fn second_order_weights_match_the_closed_forms() {
        for (mf, mi, spin) in [(0.5, -0.5, 1.5), (1.5, 0.5, 2.5), (-0.5, -1.5, 1.5)] {
            let f_value = transition_f(mf, mi, spin);
            let p_term = (spin * (spin + 1.0) - 0.75) * transition_p(mf, mi);
            let [c0, c2, c4] = quad_second_order_weights(mf, mi, spin);
            assert!((c0 - (0.3577708764 * p_term + 0.8485281374 * f_value)).abs() <= 1.0e-9);
            assert!((c2 - (0.1069044968 * p_term - 1.0141851057 * f_value)).abs() <= 1.0e-9);
            assert!((c4 - (-0.1434274331 * p_term - 1.2850792082 * f_value)).abs() <= 1.0e-9);
        }
    }

    #[test]
    fn central_transition_c0_matches_the_known_spin_three_halves_value() {
        let [c0, _, _] = quad_second_order_weights(0.5, -0.5, 1.5);
        assert!((c0 - (-3.0 / 5.0_f64.sqrt())).abs() <= 1.0e-9);
    }

    #[test]
    fn two_spin_weight_reduces_to_products_of_states() {
        assert_eq!(transition_dis(0.5, -0.5, 0.5, 0.5), 0.5);
        assert_eq!(transition_dis(0.5, 0.5, 0.5, 0.5), 0.0);
        assert_eq!(
            transition_dis(0.5, -0.5, -0.5, -0.5),
            -transition_dis(-0.5, 0.5, -0.5, -0.5)
        );
    }
}
