use crate::domain::{SimError, SimResult};
use crate::modules::transition::{
    quad_second_order_weights, transition_d, transition_dis, transition_p,
};
use crate::numerics::special::wigner::rotate_spherical_components;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

const INV_SQRT_6: f64 = 0.408_248_290_463_863_05;
// Second-order quadrupolar spatial-tensor prefactors: 1/(6 sqrt 5),
// 1/(3 sqrt 14), 1/(3 sqrt 21), 1/sqrt(70), 1/(6 sqrt 7).
const QUAD_2ND_RANK0: f64 = 0.074_535_599_249_993_0;
const QUAD_2ND_RANK2_ZERO: f64 = 0.089_087_080_637_474_1;
const QUAD_2ND_RANK2_EDGE: f64 = 0.072_739_296_752_189_2;
const QUAD_2ND_RANK4_ZERO: f64 = 0.119_522_860_933_439_4;
const QUAD_2ND_RANK4_TWO: f64 = 0.062_994_078_834_871_36;

/// z-y-z Euler angles parameterizing a Wigner rotation stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl EulerAngles {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn is_zero(&self) -> bool {
        self.alpha == 0.0 && self.beta == 0.0 && self.gamma == 0.0
    }
}

/// One site of the ravelled spin system. Frequencies are in Hz, angles in
/// radians; unit conversion belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRavel {
    /// Spin quantum number I.
    pub spin: f64,
    /// Gyromagnetic ratio in Hz/T; fixes the Larmor frequency per event.
    pub gyromagnetic_ratio: f64,
    pub isotropic_chemical_shift: f64,
    /// Shielding anisotropy zeta.
    pub shielding_anisotropy: f64,
    pub shielding_asymmetry: f64,
    #[serde(default)]
    pub shielding_orientation: EulerAngles,
    /// Quadrupolar coupling constant Cq; ignored for spin-1/2 sites.
    pub quadrupolar_coupling: f64,
    pub quadrupolar_asymmetry: f64,
    #[serde(default)]
    pub quadrupolar_orientation: EulerAngles,
}

/// One pairwise coupling of the ravelled spin system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingRavel {
    pub site_index: [usize; 2],
    pub dipolar_coupling: f64,
    #[serde(default)]
    pub dipolar_orientation: EulerAngles,
    pub isotropic_j: f64,
    pub j_anisotropy: f64,
    pub j_asymmetry: f64,
    #[serde(default)]
    pub j_orientation: EulerAngles,
}

/// Ravelled isotopomer record consumed read-only by the engine. The optional
/// crystal orientation is the second stage of the PAS -> crystallite ->
/// common-frame transform shared by every interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinSystemRavel {
    pub sites: Vec<SiteRavel>,
    #[serde(default)]
    pub couplings: Vec<CouplingRavel>,
    #[serde(default)]
    pub crystal_orientation: EulerAngles,
}

impl SpinSystemRavel {
    pub fn number_of_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn has_quadrupolar_site(&self) -> bool {
        self.sites
            .iter()
            .any(|site| site.spin > 0.5 && site.quadrupolar_coupling != 0.0)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.sites.is_empty() {
            return Err(SimError::EmptySpinSystem);
        }
        for (coupling_index, coupling) in self.couplings.iter().enumerate() {
            for &site in &coupling.site_index {
                if site >= self.sites.len() {
                    return Err(SimError::CouplingSiteOutOfRange {
                        coupling: coupling_index,
                        site,
                        site_count: self.sites.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One event's slice of the flattened transition buffer: initial and final
/// Zeeman quantum numbers, one per site.
#[derive(Debug, Clone, Copy)]
pub struct TransitionView<'a> {
    pub initial: &'a [f64],
    pub final_state: &'a [f64],
}

/// Spherical-tensor decomposition of an interaction or an aggregated
/// Hamiltonian: one real rank-0 scalar, five rank-2 and nine rank-4 complex
/// components (order m ascending).
#[derive(Debug, Clone, PartialEq)]
pub struct RankTensorSet {
    pub r0: f64,
    pub r2: [Complex64; 5],
    pub r4: [Complex64; 9],
}

impl Default for RankTensorSet {
    fn default() -> Self {
        Self {
            r0: 0.0,
            r2: [Complex64::new(0.0, 0.0); 5],
            r4: [Complex64::new(0.0, 0.0); 9],
        }
    }
}

impl RankTensorSet {
    pub fn zero(&mut self) {
        self.r0 = 0.0;
        self.r2 = [Complex64::new(0.0, 0.0); 5];
        self.r4 = [Complex64::new(0.0, 0.0); 9];
    }

    pub fn add(&mut self, contribution: &Self) {
        self.r0 += contribution.r0;
        for (total, value) in self.r2.iter_mut().zip(&contribution.r2) {
            *total += *value;
        }
        for (total, value) in self.r4.iter_mut().zip(&contribution.r4) {
            *total += *value;
        }
    }
}

/// Accumulates the transition-weighted rank 0/2/4 components of every
/// interaction in the common frame.
///
/// Each interaction's principal-axis components are built in `scratch`
/// (re-zeroed first), rotated through the interaction's Euler angles and the
/// record's crystal orientation, and added into `totals`. Summation order
/// across interactions is immaterial beyond floating-point rounding.
#[allow(clippy::too_many_arguments)]
pub fn accumulate_common_frame_components(
    system: &SpinSystemRavel,
    transition: &TransitionView<'_>,
    allow_fourth_rank: bool,
    remove_2nd_order_quad_isotropic: bool,
    magnetic_flux_density: f64,
    totals: &mut RankTensorSet,
    scratch: &mut RankTensorSet,
) {
    debug_assert_eq!(transition.initial.len(), system.number_of_sites());
    debug_assert_eq!(transition.final_state.len(), system.number_of_sites());

    for (site_index, site) in system.sites.iter().enumerate() {
        let mf = transition.final_state[site_index];
        let mi = transition.initial[site_index];

        shielding_components(site, mf, mi, scratch);
        rotate_scratch(
            scratch,
            false,
            &site.shielding_orientation,
            &system.crystal_orientation,
        );
        totals.add(scratch);

        if site.spin > 0.5 && site.quadrupolar_coupling != 0.0 {
            quad_first_order_components(site, mf, mi, scratch);
            rotate_scratch(
                scratch,
                false,
                &site.quadrupolar_orientation,
                &system.crystal_orientation,
            );
            totals.add(scratch);

            if allow_fourth_rank {
                let isotropic_shift = quad_second_order_components(
                    site,
                    mf,
                    mi,
                    magnetic_flux_density,
                    scratch,
                );
                rotate_scratch(
                    scratch,
                    true,
                    &site.quadrupolar_orientation,
                    &system.crystal_orientation,
                );
                totals.add(scratch);
                if remove_2nd_order_quad_isotropic {
                    totals.r0 -= isotropic_shift;
                }
            }
        }
    }

    for coupling in &system.couplings {
        let [first, second] = coupling.site_index;
        let dis = transition_dis(
            transition.final_state[first],
            transition.initial[first],
            transition.final_state[second],
            transition.initial[second],
        );

        if coupling.dipolar_coupling != 0.0 {
            weak_dipolar_components(coupling, dis, scratch);
            rotate_scratch(
                scratch,
                false,
                &coupling.dipolar_orientation,
                &system.crystal_orientation,
            );
            totals.add(scratch);
        }

        if coupling.isotropic_j != 0.0 || coupling.j_anisotropy != 0.0 {
            j_coupling_components(coupling, dis, scratch);
            rotate_scratch(
                scratch,
                false,
                &coupling.j_orientation,
                &system.crystal_orientation,
            );
            totals.add(scratch);
        }
    }
}

/// First-order nuclear shielding: rank 0 from the isotropic shift, rank 2
/// from the anisotropy, both weighted by the rank-1 transition function.
fn shielding_components(site: &SiteRavel, mf: f64, mi: f64, scratch: &mut RankTensorSet) {
    scratch.zero();
    let weight = transition_p(mf, mi);
    scratch.r0 = site.isotropic_chemical_shift * weight;

    let zeta = site.shielding_anisotropy;
    if zeta != 0.0 {
        scratch.r2[2] = Complex64::new(zeta * weight, 0.0);
        let edge = -INV_SQRT_6 * site.shielding_asymmetry * zeta * weight;
        scratch.r2[0] = Complex64::new(edge, 0.0);
        scratch.r2[4] = Complex64::new(edge, 0.0);
    }
}

/// First-order electric quadrupole, weighted by the rank-2 transition
/// function (zero for symmetric transitions such as the central one).
fn quad_first_order_components(site: &SiteRavel, mf: f64, mi: f64, scratch: &mut RankTensorSet) {
    scratch.zero();
    let weight = transition_d(mf, mi);
    let vq = quad_splitting(site);
    scratch.r2[2] = Complex64::new(INV_SQRT_6 * vq * weight, 0.0);
    let edge = -site.quadrupolar_asymmetry * vq * weight / 6.0;
    scratch.r2[0] = Complex64::new(edge, 0.0);
    scratch.r2[4] = Complex64::new(edge, 0.0);
}

/// Second-order electric quadrupole, scaled by `vq^2 / v0` with the site's
/// Larmor frequency in the event's field. Returns the isotropic rank-0 term
/// so the caller can reference it out when requested.
fn quad_second_order_components(
    site: &SiteRavel,
    mf: f64,
    mi: f64,
    magnetic_flux_density: f64,
    scratch: &mut RankTensorSet,
) -> f64 {
    scratch.zero();
    let [c0, c2, c4] = quad_second_order_weights(mf, mi, site.spin);
    let vq = quad_splitting(site);
    let larmor_frequency = site.gyromagnetic_ratio * magnetic_flux_density;
    let scale = vq * vq / larmor_frequency;
    let eta = site.quadrupolar_asymmetry;
    let eta2 = eta * eta;

    let isotropic_shift = (eta2 / 3.0 + 1.0) * QUAD_2ND_RANK0 * scale * c0;
    scratch.r0 = isotropic_shift;

    scratch.r2[2] = Complex64::new((eta2 / 3.0 - 1.0) * QUAD_2ND_RANK2_ZERO * scale * c2, 0.0);
    let rank2_edge = -eta * QUAD_2ND_RANK2_EDGE * scale * c2;
    scratch.r2[0] = Complex64::new(rank2_edge, 0.0);
    scratch.r2[4] = Complex64::new(rank2_edge, 0.0);

    scratch.r4[4] = Complex64::new((eta2 / 18.0 + 1.0) * QUAD_2ND_RANK4_ZERO * scale * c4, 0.0);
    let rank4_two = -eta * QUAD_2ND_RANK4_TWO * scale * c4;
    scratch.r4[2] = Complex64::new(rank4_two, 0.0);
    scratch.r4[6] = Complex64::new(rank4_two, 0.0);
    let rank4_four = eta2 / 36.0 * scale * c4;
    scratch.r4[0] = Complex64::new(rank4_four, 0.0);
    scratch.r4[8] = Complex64::new(rank4_four, 0.0);

    isotropic_shift
}

/// Weak (secular, heteronuclear-limit) direct dipolar coupling.
fn weak_dipolar_components(coupling: &CouplingRavel, dis: f64, scratch: &mut RankTensorSet) {
    scratch.zero();
    scratch.r2[2] = Complex64::new(2.0 * coupling.dipolar_coupling * dis, 0.0);
}

/// J coupling: isotropic rank 0 plus a shielding-type anisotropic rank 2.
fn j_coupling_components(coupling: &CouplingRavel, dis: f64, scratch: &mut RankTensorSet) {
    scratch.zero();
    scratch.r0 = coupling.isotropic_j * dis;
    let zeta = coupling.j_anisotropy;
    if zeta != 0.0 {
        scratch.r2[2] = Complex64::new(zeta * dis, 0.0);
        let edge = -INV_SQRT_6 * coupling.j_asymmetry * zeta * dis;
        scratch.r2[0] = Complex64::new(edge, 0.0);
        scratch.r2[4] = Complex64::new(edge, 0.0);
    }
}

/// Quadrupolar splitting `3 Cq / (2 I (2I - 1))`.
fn quad_splitting(site: &SiteRavel) -> f64 {
    3.0 * site.quadrupolar_coupling / (2.0 * site.spin * (2.0 * site.spin - 1.0))
}

/// Two-stage Wigner transform of the scratch components: the interaction's
/// own Euler angles, then the crystal orientation. Identity stages are
/// skipped.
fn rotate_scratch(
    scratch: &mut RankTensorSet,
    rotate_rank4: bool,
    interaction: &EulerAngles,
    crystal: &EulerAngles,
) {
    for stage in [interaction, crystal] {
        if stage.is_zero() {
            continue;
        }
        let mut rank2 = [Complex64::new(0.0, 0.0); 5];
        rotate_spherical_components(
            2,
            stage.alpha,
            stage.beta,
            stage.gamma,
            &scratch.r2,
            &mut rank2,
        );
        scratch.r2 = rank2;
        if rotate_rank4 {
            let mut rank4 = [Complex64::new(0.0, 0.0); 9];
            rotate_spherical_components(
                4,
                stage.alpha,
                stage.beta,
                stage.gamma,
                &scratch.r4,
                &mut rank4,
            );
            scratch.r4 = rank4;
        }
    }
}
