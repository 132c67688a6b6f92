use crate::common::constants::TWO_PI;
use crate::domain::{SimError, SimResult};
use crate::numerics::special::wigner::wigner_small_d;
use crate::numerics::DenseComplexMatrix;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Per-event computation plan for the sideband evaluator: FFT-ordered
/// sideband frequency offsets (grid-bin units), the rotor-angle reduced
/// rotations `d^l_{m,0}(theta_r)`, and the accumulated-phase tables of the
/// Fourier sideband method.
#[derive(Debug, Clone)]
pub struct SidebandPlan {
    number_of_sidebands: usize,
    rotor_frequency: f64,
    rotor_angle: f64,
    vr_freq: Vec<f64>,
    d2_m0: [f64; 5],
    d4_m0: [f64; 9],
    pre_phase_2: Vec<Complex64>,
    pre_phase_4: Option<Vec<Complex64>>,
}

impl SidebandPlan {
    pub fn build(
        number_of_sidebands: usize,
        rotor_frequency: f64,
        rotor_angle: f64,
        inverse_increment: f64,
        allow_fourth_rank: bool,
    ) -> SimResult<Self> {
        if number_of_sidebands == 0 {
            return Err(SimError::InvalidSidebandCount { count: 0 });
        }
        let n = number_of_sidebands;

        // FFT-ordered sideband orders: 0, 1, .., then the negative wrap.
        let mut vr_freq = Vec::with_capacity(n);
        for k in 0..n {
            let order = if 2 * k + 1 <= n {
                k as f64
            } else {
                k as f64 - n as f64
            };
            vr_freq.push(order * rotor_frequency * inverse_increment);
        }

        let mut d2_m0 = [0.0; 5];
        for (index, value) in d2_m0.iter_mut().enumerate() {
            *value = wigner_small_d(2, index as i32 - 2, 0, rotor_angle);
        }
        let mut d4_m0 = [0.0; 9];
        for (index, value) in d4_m0.iter_mut().enumerate() {
            *value = wigner_small_d(4, index as i32 - 4, 0, rotor_angle);
        }

        let pre_phase_2 = if n > 1 {
            pre_phase_table(2, n, rotor_frequency, &d2_m0)
        } else {
            Vec::new()
        };
        let pre_phase_4 = (allow_fourth_rank && n > 1)
            .then(|| pre_phase_table(4, n, rotor_frequency, &d4_m0));

        Ok(Self {
            number_of_sidebands,
            rotor_frequency,
            rotor_angle,
            vr_freq,
            d2_m0,
            d4_m0,
            pre_phase_2,
            pre_phase_4,
        })
    }

    pub fn number_of_sidebands(&self) -> usize {
        self.number_of_sidebands
    }

    pub fn rotor_frequency(&self) -> f64 {
        self.rotor_frequency
    }

    pub fn rotor_angle(&self) -> f64 {
        self.rotor_angle
    }

    /// Sideband frequency offsets in grid-bin units, FFT order.
    pub fn vr_freq(&self) -> &[f64] {
        &self.vr_freq
    }

    pub fn d2_00(&self) -> f64 {
        self.d2_m0[2]
    }

    pub fn d4_00(&self) -> f64 {
        self.d4_m0[4]
    }

    fn pre_phase_2(&self, m_index: usize, sample: usize) -> Complex64 {
        self.pre_phase_2[m_index * self.number_of_sidebands + sample]
    }

    fn pre_phase_4(&self, m_index: usize, sample: usize) -> Option<Complex64> {
        self.pre_phase_4
            .as_ref()
            .map(|table| table[m_index * self.number_of_sidebands + sample])
    }
}

/// Accumulated phase of the periodic frequency component `m` at sample `j`:
/// `2 pi d^l_{m,0}(theta_r) (1 - e^{-i m w_r t_j}) / (m w_r)`, which is the
/// integral of `e^{-i m w_r t}` times `i`, so that summing the tables against
/// the rotor-frame components yields a purely imaginary exponent.
fn pre_phase_table(l: i32, n: usize, rotor_frequency: f64, d_m0: &[f64]) -> Vec<Complex64> {
    let dim = (2 * l + 1) as usize;
    let omega_r = TWO_PI * rotor_frequency;
    let mut table = vec![Complex64::new(0.0, 0.0); dim * n];
    for m_index in 0..dim {
        let m = m_index as i32 - l;
        if m == 0 {
            continue;
        }
        let scale = TWO_PI * d_m0[m_index] / (m as f64 * omega_r);
        for (sample, slot) in table[m_index * n..(m_index + 1) * n].iter_mut().enumerate() {
            // m * w_r * t_j reduces to 2 pi m j / n.
            let angle = -TWO_PI * (m as f64) * (sample as f64) / (n as f64);
            *slot = (Complex64::new(1.0, 0.0) - Complex64::from_polar(1.0, angle)) * scale;
        }
    }
    table
}

/// Batched forward FFT over all orientations of an event's sample buffer.
pub struct SidebandFft {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl SidebandFft {
    pub fn new(number_of_sidebands: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(number_of_sidebands);
        let scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }

    /// Transforms every `number_of_sidebands`-long chunk of `buffer` in
    /// place.
    pub fn process(&mut self, buffer: &mut [Complex64]) {
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }
}

/// Evaluates the per-orientation sideband amplitudes of one event.
///
/// For every orientation the rotor-frame components are folded with the
/// plan's accumulated-phase tables, exponentiated, and Fourier transformed;
/// the squared modulus per sideband order lands orientation-major in
/// `amplitudes`. With a single sideband the amplitude is uniformly one and
/// no transform runs.
pub fn evaluate_amplitudes(
    plan: &SidebandPlan,
    w2: &DenseComplexMatrix,
    w4: Option<&DenseComplexMatrix>,
    fft: Option<&mut SidebandFft>,
    samples: &mut Vec<Complex64>,
    amplitudes: &mut [f64],
) {
    let n = plan.number_of_sidebands();
    let total = w2.nrows();
    debug_assert_eq!(amplitudes.len(), total * n);

    if n == 1 {
        amplitudes.fill(1.0);
        return;
    }
    let fft = fft.expect("an FFT scheme is required for more than one sideband");

    samples.clear();
    samples.resize(total * n, Complex64::new(0.0, 0.0));
    let inverse_n = 1.0 / n as f64;
    for orientation in 0..total {
        let row = &mut samples[orientation * n..(orientation + 1) * n];
        for (sample, slot) in row.iter_mut().enumerate() {
            let mut exponent = Complex64::new(0.0, 0.0);
            for m_index in 0..5 {
                exponent += w2[(orientation, m_index)] * plan.pre_phase_2(m_index, sample);
            }
            if let Some(w4) = w4 {
                for m_index in 0..9 {
                    if let Some(value) = plan.pre_phase_4(m_index, sample) {
                        exponent += w4[(orientation, m_index)] * value;
                    }
                }
            }
            *slot = exponent.exp() * inverse_n;
        }
    }

    fft.process(samples);

    for (slot, value) in amplitudes.iter_mut().zip(samples.iter()) {
        *slot = value.norm_sqr();
    }
}

/// Accumulates the dimension's local (time-independent) frequencies and
/// rank-0 offset in grid-bin units. `refresh` resets the running totals on a
/// dimension's first event; later events add.
#[allow(clippy::too_many_arguments)]
pub fn accumulate_local_frequencies(
    plan: &SidebandPlan,
    w2: &DenseComplexMatrix,
    w4: Option<&DenseComplexMatrix>,
    r0: f64,
    inverse_increment: f64,
    refresh: bool,
    r0_offset: &mut f64,
    local_frequency: &mut [f64],
) {
    let total = w2.nrows();
    debug_assert_eq!(local_frequency.len(), total);

    if refresh {
        *r0_offset = 0.0;
        local_frequency.fill(0.0);
    }
    *r0_offset += r0 * inverse_increment;

    let d2_00 = plan.d2_00();
    for (orientation, slot) in local_frequency.iter_mut().enumerate() {
        *slot += inverse_increment * d2_00 * w2[(orientation, 2)].re;
    }
    if let Some(w4) = w4 {
        let d4_00 = plan.d4_00();
        for (orientation, slot) in local_frequency.iter_mut().enumerate() {
            *slot += inverse_increment * d4_00 * w4[(orientation, 4)].re;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate_amplitudes, SidebandFft, SidebandPlan};
    use crate::numerics::DenseComplexMatrix;
    use num_complex::Complex64;

    const MAGIC_ANGLE: f64 = 0.955_316_618_124_509_3;

    #[test]
    fn build_rejects_a_zero_sideband_count() {
        assert!(SidebandPlan::build(0, 1000.0, MAGIC_ANGLE, 1.0, false).is_err());
    }

    #[test]
    fn sideband_orders_follow_fft_ordering() {
        let plan = SidebandPlan::build(8, 1000.0, MAGIC_ANGLE, 1.0e-3, false).expect("plan");
        let orders: Vec<f64> = plan.vr_freq().iter().map(|f| f / (1000.0 * 1.0e-3)).collect();
        assert_eq!(orders, vec![0.0, 1.0, 2.0, 3.0, -4.0, -3.0, -2.0, -1.0]);

        let plan = SidebandPlan::build(1, 1.0e9, 0.0, 1.0, false).expect("plan");
        assert_eq!(plan.vr_freq(), &[0.0]);
    }

    #[test]
    fn single_sideband_amplitudes_are_uniformly_one() {
        let plan = SidebandPlan::build(1, 1.0e9, 0.0, 1.0, false).expect("plan");
        let w2 = DenseComplexMatrix::zeros(6, 5);
        let mut samples = Vec::new();
        let mut amplitudes = vec![0.0; 6];
        evaluate_amplitudes(&plan, &w2, None, None, &mut samples, &mut amplitudes);
        assert!(amplitudes.iter().all(|&amplitude| amplitude == 1.0));
    }

    #[test]
    fn zero_anisotropy_concentrates_amplitude_in_the_centerband() {
        let n = 16;
        let plan = SidebandPlan::build(n, 1000.0, MAGIC_ANGLE, 1.0, false).expect("plan");
        let w2 = DenseComplexMatrix::zeros(3, 5);
        let mut fft = SidebandFft::new(n);
        let mut samples = Vec::new();
        let mut amplitudes = vec![0.0; 3 * n];
        evaluate_amplitudes(&plan, &w2, None, Some(&mut fft), &mut samples, &mut amplitudes);

        for orientation in 0..3 {
            let row = &amplitudes[orientation * n..(orientation + 1) * n];
            assert!((row[0] - 1.0).abs() <= 1.0e-12);
            assert!(row[1..].iter().all(|&amplitude| amplitude <= 1.0e-12));
        }
    }

    #[test]
    fn sideband_amplitudes_sum_to_the_static_amplitude() {
        let n = 32;
        let plan = SidebandPlan::build(n, 2000.0, MAGIC_ANGLE, 1.0e-2, false).expect("plan");

        // A handful of rotor-frame component rows with the reality symmetry
        // R_{-m} = (-1)^m conj(R_m) of a physical interaction.
        let mut w2 = DenseComplexMatrix::zeros(4, 5);
        for orientation in 0..4 {
            let scale = 1500.0 * (orientation as f64 + 1.0);
            let plus_one = Complex64::new(0.21 * scale, -0.11 * scale);
            let plus_two = Complex64::new(-0.32 * scale, 0.07 * scale);
            w2[(orientation, 2)] = Complex64::new(0.4 * scale, 0.0);
            w2[(orientation, 3)] = plus_one;
            w2[(orientation, 1)] = -plus_one.conj();
            w2[(orientation, 4)] = plus_two;
            w2[(orientation, 0)] = plus_two.conj();
        }

        let mut fft = SidebandFft::new(n);
        let mut samples = Vec::new();
        let mut amplitudes = vec![0.0; 4 * n];
        evaluate_amplitudes(&plan, &w2, None, Some(&mut fft), &mut samples, &mut amplitudes);

        for orientation in 0..4 {
            let row_sum: f64 = amplitudes[orientation * n..(orientation + 1) * n].iter().sum();
            assert!(
                (row_sum - 1.0).abs() <= 1.0e-9,
                "orientation {orientation} sideband sum {row_sum}"
            );
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let n = 8;
        let plan = SidebandPlan::build(n, 800.0, MAGIC_ANGLE, 0.05, false).expect("plan");
        let mut w2 = DenseComplexMatrix::zeros(2, 5);
        w2[(0, 2)] = Complex64::new(900.0, 0.0);
        w2[(1, 2)] = Complex64::new(-450.0, 0.0);

        let mut fft = SidebandFft::new(n);
        let mut samples = Vec::new();
        let mut first = vec![0.0; 2 * n];
        let mut second = vec![0.0; 2 * n];
        evaluate_amplitudes(&plan, &w2, None, Some(&mut fft), &mut samples, &mut first);
        evaluate_amplitudes(&plan, &w2, None, Some(&mut fft), &mut samples, &mut second);
        assert_eq!(first, second);
    }
}
