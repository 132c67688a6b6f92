//! Sequence/event orchestration and the public simulation entry.

use crate::common::config::SimulationConfig;
use crate::domain::{SimError, SimResult};
use crate::modules::averaging::AveragingScheme;
use crate::modules::interpolation::{octant_tent_1d, octant_tent_2d};
use crate::modules::sequence::SpectralDimension;
use crate::modules::sideband::{
    accumulate_local_frequencies, evaluate_amplitudes, SidebandFft, SidebandPlan,
};
use crate::modules::tensor::{
    accumulate_common_frame_components, RankTensorSet, SpinSystemRavel, TransitionView,
};
use crate::numerics::DenseComplexMatrix;
use num_complex::Complex64;

/// Per-dimension evaluation result returned when interpolation is disabled:
/// everything an external consumer needs to rasterize or inspect the
/// orientation/sideband amplitudes itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionAmplitudes {
    /// Local (time-independent) frequency per orientation, grid-bin units.
    pub local_frequency: Vec<f64>,
    /// Accumulated rank-0 offset in grid-bin units.
    pub r0_offset: f64,
    /// Reference-offset term in grid-bin units.
    pub normalize_offset: f64,
    /// Sideband frequency offsets in grid-bin units, FFT order.
    pub sideband_frequency: Vec<f64>,
    /// Combined event amplitude product, orientation-major by sideband
    /// order, quadrature-weighted the same way the interpolation path is.
    pub amplitudes: Vec<f64>,
}

struct DimensionWork {
    r0_offset: f64,
    local_frequency: Vec<f64>,
    event_amplitudes: Vec<Vec<f64>>,
    plans: Vec<SidebandPlan>,
    combined: Vec<f64>,
}

impl DimensionWork {
    fn new(total_orientations: usize) -> Self {
        Self {
            r0_offset: 0.0,
            local_frequency: vec![0.0; total_orientations],
            event_amplitudes: Vec::new(),
            plans: Vec::new(),
            combined: Vec::new(),
        }
    }

    fn sideband_frequency(&self) -> &[f64] {
        // All events of a dimension share the sideband count; the combiner
        // follows the final event's sideband grid.
        self.plans
            .last()
            .expect("a validated dimension has at least one event")
            .vr_freq()
    }
}

/// Simulates one spin transition of one spin system over a one- or
/// two-dimensional spectroscopic sequence, accumulating the powder-averaged,
/// sideband-resolved resonance into the caller-owned `spec` buffer.
///
/// `transition` is the flattened quantum-number buffer: per event (dimension
/// major), the initial then the final Zeeman state, one entry per site. With
/// `config.interpolation` unset no rasterization happens and the weighted
/// per-orientation, per-sideband amplitudes are returned instead.
pub fn simulate_transition(
    spec: &mut [f64],
    system: &SpinSystemRavel,
    transition: &[f64],
    dimensions: &[SpectralDimension],
    config: &SimulationConfig,
) -> SimResult<Option<Vec<DimensionAmplitudes>>> {
    config.validate()?;
    if dimensions.is_empty() || dimensions.len() > 2 {
        return Err(SimError::UnsupportedDimensionCount {
            count: dimensions.len(),
        });
    }
    for (index, dimension) in dimensions.iter().enumerate() {
        dimension.validate(index)?;
    }
    system.validate()?;

    let grid_size: usize = dimensions.iter().map(|dimension| dimension.count).product();
    if config.interpolation && spec.len() != grid_size {
        return Err(SimError::OutputBufferMismatch {
            expected: grid_size,
            actual: spec.len(),
        });
    }

    let n_sites = system.number_of_sites();
    let total_events: usize = dimensions.iter().map(|dimension| dimension.events.len()).sum();
    let transition_stride = 2 * n_sites;
    if transition.len() != total_events * transition_stride {
        return Err(SimError::TransitionBufferMismatch {
            expected: total_events * transition_stride,
            actual: transition.len(),
        });
    }

    let allow_fourth_rank = config.quad_second_order && system.has_quadrupolar_site();
    let all_static = dimensions
        .iter()
        .flat_map(|dimension| dimension.events.iter())
        .all(|event| event.is_static());
    let number_of_sidebands = if all_static {
        1
    } else {
        config.number_of_sidebands
    };

    tracing::debug!(
        dimensions = dimensions.len(),
        total_events,
        number_of_sidebands,
        allow_fourth_rank,
        interpolation = config.interpolation,
        "simulating transition"
    );

    let scheme = AveragingScheme::build(
        config.integration_density,
        allow_fourth_rank,
        config.integration_volume,
    )?;
    let total_orientations = scheme.total_orientations();

    let mut fft = (number_of_sidebands > 1).then(|| SidebandFft::new(number_of_sidebands));
    let mut totals = RankTensorSet::default();
    let mut scratch = RankTensorSet::default();
    let mut w2 = DenseComplexMatrix::zeros(total_orientations, 5);
    let mut w4 = allow_fourth_rank.then(|| DenseComplexMatrix::zeros(total_orientations, 9));
    let mut samples: Vec<Complex64> = Vec::new();

    let mut work: Vec<DimensionWork> = dimensions
        .iter()
        .map(|_| DimensionWork::new(total_orientations))
        .collect();

    let mut cursor = 0;
    for (dimension, dimension_work) in dimensions.iter().zip(work.iter_mut()) {
        for (event_index, event) in dimension.events.iter().enumerate() {
            let event = event.effective();
            let plan = SidebandPlan::build(
                number_of_sidebands,
                event.rotor_frequency,
                event.rotor_angle,
                dimension.inverse_increment(),
                allow_fourth_rank,
            )?;

            let view = TransitionView {
                initial: &transition[cursor..cursor + n_sites],
                final_state: &transition[cursor + n_sites..cursor + transition_stride],
            };
            cursor += transition_stride;

            totals.zero();
            accumulate_common_frame_components(
                system,
                &view,
                allow_fourth_rank,
                config.remove_2nd_order_quad_isotropic,
                event.magnetic_flux_density,
                &mut totals,
                &mut scratch,
            );

            scheme.rotate_rank2(&totals.r2, &mut w2);
            if let Some(w4) = w4.as_mut() {
                scheme.rotate_rank4(&totals.r4, w4)?;
            }

            accumulate_local_frequencies(
                &plan,
                &w2,
                w4.as_ref(),
                totals.r0,
                dimension.inverse_increment(),
                event_index == 0,
                &mut dimension_work.r0_offset,
                &mut dimension_work.local_frequency,
            );

            let mut amplitudes = vec![0.0; total_orientations * number_of_sidebands];
            evaluate_amplitudes(
                &plan,
                &w2,
                w4.as_ref(),
                fft.as_mut(),
                &mut samples,
                &mut amplitudes,
            );
            dimension_work.event_amplitudes.push(amplitudes);
            dimension_work.plans.push(plan);
        }
    }

    // Orientation- and sideband-wise product across each dimension's events;
    // the quadrature weight is applied once, on the last dimension,
    // replicated across octants and sideband orders.
    for dimension_work in work.iter_mut() {
        let mut combined = vec![1.0; total_orientations * number_of_sidebands];
        for amplitudes in &dimension_work.event_amplitudes {
            for (product, amplitude) in combined.iter_mut().zip(amplitudes) {
                *product *= amplitude;
            }
        }
        dimension_work.combined = combined;
    }
    let weighted = work.len() - 1;
    apply_quadrature_weights(
        &mut work[weighted].combined,
        scheme.weights(),
        number_of_sidebands,
    );

    if !config.interpolation {
        let output = work
            .iter()
            .zip(dimensions)
            .map(|(dimension_work, dimension)| DimensionAmplitudes {
                local_frequency: dimension_work.local_frequency.clone(),
                r0_offset: dimension_work.r0_offset,
                normalize_offset: dimension.normalize_offset(),
                sideband_frequency: dimension_work.sideband_frequency().to_vec(),
                amplitudes: dimension_work.combined.clone(),
            })
            .collect();
        return Ok(Some(output));
    }

    match dimensions.len() {
        1 => one_dimensional_averaging(
            spec,
            &dimensions[0],
            &work[0],
            &scheme,
            number_of_sidebands,
        ),
        _ => two_dimensional_averaging(spec, dimensions, &work, &scheme, number_of_sidebands),
    }

    Ok(None)
}

fn apply_quadrature_weights(
    combined: &mut [f64],
    octant_weights: &[f64],
    number_of_sidebands: usize,
) {
    let octant_orientations = octant_weights.len();
    for (orientation, row) in combined.chunks_exact_mut(number_of_sidebands).enumerate() {
        let weight = octant_weights[orientation % octant_orientations];
        for value in row {
            *value *= weight;
        }
    }
}

/// C-style truncation toward zero for the sideband-offset bounds test; an
/// offset whose truncation falls outside `[0, count)` excludes the order.
fn offset_in_grid(offset: f64, count: usize) -> bool {
    let bin = offset as i64;
    bin >= 0 && bin < count as i64
}

fn one_dimensional_averaging(
    spec: &mut [f64],
    dimension: &SpectralDimension,
    work: &DimensionWork,
    scheme: &AveragingScheme,
    number_of_sidebands: usize,
) {
    let octant_orientations = scheme.octant_orientations();
    let offset = dimension.normalize_offset() + work.r0_offset;
    let sideband_frequency = work.sideband_frequency();

    let mut frequencies = vec![0.0; octant_orientations];
    let mut amplitudes = vec![0.0; octant_orientations];
    for order in 0..number_of_sidebands {
        let order_offset = offset + sideband_frequency[order];
        if !offset_in_grid(order_offset, dimension.count) {
            continue;
        }
        for octant in 0..scheme.n_octants() {
            let base = octant * octant_orientations;
            for index in 0..octant_orientations {
                frequencies[index] = work.local_frequency[base + index] + order_offset;
                amplitudes[index] =
                    work.combined[(base + index) * number_of_sidebands + order];
            }
            octant_tent_1d(spec, &frequencies, &amplitudes, scheme.triangles());
        }
    }
}

fn two_dimensional_averaging(
    spec: &mut [f64],
    dimensions: &[SpectralDimension],
    work: &[DimensionWork],
    scheme: &AveragingScheme,
    number_of_sidebands: usize,
) {
    let octant_orientations = scheme.octant_orientations();
    let count0 = dimensions[0].count;
    let count1 = dimensions[1].count;
    let offset0 = dimensions[0].normalize_offset() + work[0].r0_offset;
    let offset1 = dimensions[1].normalize_offset() + work[1].r0_offset;
    let sideband_frequency0 = work[0].sideband_frequency();
    let sideband_frequency1 = work[1].sideband_frequency();

    let mut frequencies0 = vec![0.0; octant_orientations];
    let mut frequencies1 = vec![0.0; octant_orientations];
    let mut amplitudes = vec![0.0; octant_orientations];
    for order0 in 0..number_of_sidebands {
        let order_offset0 = offset0 + sideband_frequency0[order0];
        if !offset_in_grid(order_offset0, count0) {
            continue;
        }
        for order1 in 0..number_of_sidebands {
            let order_offset1 = offset1 + sideband_frequency1[order1];
            if !offset_in_grid(order_offset1, count1) {
                continue;
            }
            for octant in 0..scheme.n_octants() {
                let base = octant * octant_orientations;
                for index in 0..octant_orientations {
                    frequencies0[index] = work[0].local_frequency[base + index] + order_offset0;
                    frequencies1[index] = work[1].local_frequency[base + index] + order_offset1;
                    amplitudes[index] = work[0].combined
                        [(base + index) * number_of_sidebands + order0]
                        * work[1].combined[(base + index) * number_of_sidebands + order1];
                }
                octant_tent_2d(
                    spec,
                    count0,
                    count1,
                    &frequencies0,
                    &frequencies1,
                    &amplitudes,
                    scheme.triangles(),
                );
            }
        }
    }
}
