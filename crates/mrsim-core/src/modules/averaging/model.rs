use crate::common::config::IntegrationVolume;
use crate::common::constants::{FRAC_PI_2, PI};
use crate::domain::{SimError, SimResult};
use crate::numerics::special::wigner::wigner_d_matrix;
use crate::numerics::DenseComplexMatrix;
use num_complex::Complex64;

/// Powder orientation-averaging scheme.
///
/// Holds the octahedral mesh over one octant (vertices, quadrature weights,
/// triangulation), its symmetry replication over the requested integration
/// volume, and the per-orientation rotation tables (`e^{-i m alpha}` phases
/// and rank-2 / rank-4 reduced rotation matrices) shared read-only by the
/// frequency and sideband stages. Immutable once built.
#[derive(Debug, Clone)]
pub struct AveragingScheme {
    integration_density: usize,
    integration_volume: IntegrationVolume,
    octant_orientations: usize,
    weights: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    alpha: Vec<f64>,
    beta: Vec<f64>,
    exp_minus_im_alpha: Vec<Complex64>,
    d2_beta: Vec<f64>,
    d4_beta: Option<Vec<f64>>,
}

impl AveragingScheme {
    /// Builds the mesh for `integration_density` subdivisions along an octant
    /// edge. Vertices are the integer lattice points of the octahedron face
    /// `x + y + z = nt`, row-major from the equatorial row up to the polar
    /// apex, with raw quadrature weight `r^-3`. Fails only on zero density.
    pub fn build(
        integration_density: usize,
        allow_fourth_rank: bool,
        integration_volume: IntegrationVolume,
    ) -> SimResult<Self> {
        if integration_density == 0 {
            return Err(SimError::InvalidIntegrationDensity { density: 0 });
        }

        let nt = integration_density;
        let octant_orientations = (nt + 1) * (nt + 2) / 2;
        let n_octants = integration_volume.octant_count();

        let mut octant_alpha = Vec::with_capacity(octant_orientations);
        let mut octant_beta = Vec::with_capacity(octant_orientations);
        let mut raw_weights = Vec::with_capacity(octant_orientations);
        for j in 0..=nt {
            for i in 0..=(nt - j) {
                let x = (nt - i - j) as f64;
                let y = i as f64;
                let z = j as f64;
                let r_squared = x * x + y * y + z * z;
                let r = r_squared.sqrt();
                octant_alpha.push(y.atan2(x));
                octant_beta.push((z / r).acos());
                raw_weights.push(1.0 / (r_squared * r));
            }
        }

        let triangles = octant_triangulation(nt);

        // Normalize so the triangle-summed weight over the whole configured
        // volume is exactly one, independent of density. The interpolator
        // assigns each triangle the sum of its corner values, so corners
        // shared between triangles count once per membership.
        let mut triangle_weight = 0.0;
        for triangle in &triangles {
            triangle_weight +=
                raw_weights[triangle[0]] + raw_weights[triangle[1]] + raw_weights[triangle[2]];
        }
        let norm = triangle_weight * n_octants as f64;
        let weights: Vec<f64> = raw_weights.iter().map(|weight| weight / norm).collect();

        // Symmetry replication: quadrant k adds k * pi/2 to alpha, the lower
        // hemisphere mirrors beta.
        let total = octant_orientations * n_octants;
        let mut alpha = Vec::with_capacity(total);
        let mut beta = Vec::with_capacity(total);
        for octant in 0..n_octants {
            let quadrant = (octant % 4) as f64;
            let lower = octant >= 4;
            for index in 0..octant_orientations {
                alpha.push(octant_alpha[index] + quadrant * FRAC_PI_2);
                beta.push(if lower {
                    PI - octant_beta[index]
                } else {
                    octant_beta[index]
                });
            }
        }

        let mut exp_minus_im_alpha = Vec::with_capacity(total * 4);
        for &angle in &alpha {
            for m in 1..=4 {
                exp_minus_im_alpha.push(Complex64::from_polar(1.0, -(m as f64) * angle));
            }
        }

        let mut d2_beta = Vec::with_capacity(total * 25);
        for &angle in &beta {
            d2_beta.extend(wigner_d_matrix(2, angle));
        }
        let d4_beta = allow_fourth_rank.then(|| {
            let mut table = Vec::with_capacity(total * 81);
            for &angle in &beta {
                table.extend(wigner_d_matrix(4, angle));
            }
            table
        });

        tracing::debug!(
            integration_density,
            octant_orientations,
            n_octants,
            allow_fourth_rank,
            "built powder averaging scheme"
        );

        Ok(Self {
            integration_density,
            integration_volume,
            octant_orientations,
            weights,
            triangles,
            alpha,
            beta,
            exp_minus_im_alpha,
            d2_beta,
            d4_beta,
        })
    }

    pub fn integration_density(&self) -> usize {
        self.integration_density
    }

    pub fn integration_volume(&self) -> IntegrationVolume {
        self.integration_volume
    }

    pub fn octant_orientations(&self) -> usize {
        self.octant_orientations
    }

    pub fn n_octants(&self) -> usize {
        self.integration_volume.octant_count()
    }

    pub fn total_orientations(&self) -> usize {
        self.octant_orientations * self.n_octants()
    }

    pub fn allow_fourth_rank(&self) -> bool {
        self.d4_beta.is_some()
    }

    /// Octant-local quadrature weights, shared by every octant replica.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Octant-local triangle connectivity used by the interpolator.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn orientation_angles(&self, index: usize) -> (f64, f64) {
        (self.alpha[index], self.beta[index])
    }

    /// Triangle-summed quadrature weight over the whole configured volume;
    /// one by construction.
    pub fn triangle_weight_total(&self) -> f64 {
        let mut total = 0.0;
        for triangle in &self.triangles {
            total += self.weights[triangle[0]]
                + self.weights[triangle[1]]
                + self.weights[triangle[2]];
        }
        total * self.n_octants() as f64
    }

    /// Rotates rank-2 components from the common frame into every
    /// orientation's rotor frame at once:
    /// `out[n][mp] = e^{-i mp alpha_n} sum_m d^2_{mp,m}(beta_n) R_m`.
    pub fn rotate_rank2(&self, components: &[Complex64; 5], out: &mut DenseComplexMatrix) {
        debug_assert_eq!(out.nrows(), self.total_orientations());
        debug_assert_eq!(out.ncols(), 5);

        for orientation in 0..self.total_orientations() {
            let d = &self.d2_beta[orientation * 25..(orientation + 1) * 25];
            for row in 0..5 {
                let mut sum = Complex64::new(0.0, 0.0);
                for (col, component) in components.iter().enumerate() {
                    sum += *component * d[row * 5 + col];
                }
                out[(orientation, row)] = self.alpha_phase(orientation, row as i32 - 2) * sum;
            }
        }
    }

    /// Rank-4 counterpart of [`Self::rotate_rank2`]; requires a scheme built
    /// with fourth-rank tables.
    pub fn rotate_rank4(
        &self,
        components: &[Complex64; 9],
        out: &mut DenseComplexMatrix,
    ) -> SimResult<()> {
        let Some(d4_beta) = &self.d4_beta else {
            return Err(SimError::FourthRankTablesUnavailable);
        };
        debug_assert_eq!(out.nrows(), self.total_orientations());
        debug_assert_eq!(out.ncols(), 9);

        for orientation in 0..self.total_orientations() {
            let d = &d4_beta[orientation * 81..(orientation + 1) * 81];
            for row in 0..9 {
                let mut sum = Complex64::new(0.0, 0.0);
                for (col, component) in components.iter().enumerate() {
                    sum += *component * d[row * 9 + col];
                }
                out[(orientation, row)] = self.alpha_phase(orientation, row as i32 - 4) * sum;
            }
        }
        Ok(())
    }

    fn alpha_phase(&self, orientation: usize, m: i32) -> Complex64 {
        if m == 0 {
            return Complex64::new(1.0, 0.0);
        }
        let stored = self.exp_minus_im_alpha[orientation * 4 + (m.unsigned_abs() as usize - 1)];
        if m > 0 { stored } else { stored.conj() }
    }
}

/// Row-pair triangulation of the octant mesh: each pair of adjacent rows
/// alternates "up" and "down" triangles, `nt^2` in total.
fn octant_triangulation(nt: usize) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(nt * nt);
    let mut row_start = 0;
    for row in 0..nt {
        let row_len = nt + 1 - row;
        let next_start = row_start + row_len;
        for i in 0..(row_len - 1) {
            triangles.push([row_start + i, row_start + i + 1, next_start + i]);
            if i + 1 < row_len - 1 {
                triangles.push([row_start + i + 1, next_start + i, next_start + i + 1]);
            }
        }
        row_start = next_start;
    }
    triangles
}
