//! Triangle "tenting": rasterization of orientation-mesh triangles onto the
//! spectral grids.
//!
//! A triangle's amplitude is spread over the frequency range its vertices
//! span — linearly rising to the middle vertex and falling after it in 1D,
//! as a uniform density over the triangle's footprint in 2D — and integrated
//! analytically bin by bin. Contributions outside `[0, count)` on any axis
//! are dropped; accumulation into the output buffer is purely additive.

const DEGENERATE_SPAN: f64 = 1.0e-12;
const DEGENERATE_AREA: f64 = 1.0e-12;

/// Tents one triangle's amplitude onto a 1D grid.
pub fn triangle_tent_1d(spec: &mut [f64], frequencies: [f64; 3], amplitude: f64) {
    let count = spec.len();
    tent_1d_strided(spec, count, 0, 1, frequencies, amplitude);
}

/// Tents every octant triangle of a ramped local-frequency slice onto the
/// 1D output. `frequencies` and `amplitudes` are octant-local.
pub fn octant_tent_1d(
    spec: &mut [f64],
    frequencies: &[f64],
    amplitudes: &[f64],
    triangles: &[[usize; 3]],
) {
    for triangle in triangles {
        let amplitude =
            amplitudes[triangle[0]] + amplitudes[triangle[1]] + amplitudes[triangle[2]];
        if amplitude == 0.0 {
            continue;
        }
        triangle_tent_1d(
            spec,
            [
                frequencies[triangle[0]],
                frequencies[triangle[1]],
                frequencies[triangle[2]],
            ],
            amplitude,
        );
    }
}

/// Rasterizes one triangle onto the joint 2D grid (`count0 x count1`,
/// row-major in the first axis) as a uniform amplitude density over its
/// footprint. Degenerate triangles fall back to a 1D tent along the
/// surviving axis, or a single-cell deposit.
pub fn triangle_tent_2d(
    spec: &mut [f64],
    count0: usize,
    count1: usize,
    frequencies0: [f64; 3],
    frequencies1: [f64; 3],
    amplitude: f64,
) {
    let (min0, max0) = min_max(frequencies0);
    let (min1, max1) = min_max(frequencies1);
    let area = 0.5
        * ((frequencies0[1] - frequencies0[0]) * (frequencies1[2] - frequencies1[0])
            - (frequencies0[2] - frequencies0[0]) * (frequencies1[1] - frequencies1[0]))
            .abs();

    if area < DEGENERATE_AREA {
        let span0 = max0 - min0;
        let span1 = max1 - min1;
        if span0 < DEGENERATE_SPAN && span1 < DEGENERATE_SPAN {
            let bin0 = frequencies0[0].floor();
            let bin1 = frequencies1[0].floor();
            if bin0 >= 0.0 && bin0 < count0 as f64 && bin1 >= 0.0 && bin1 < count1 as f64 {
                spec[bin0 as usize * count1 + bin1 as usize] += amplitude;
            }
        } else if span0 < DEGENERATE_SPAN {
            let bin0 = frequencies0[0].floor();
            if bin0 >= 0.0 && bin0 < count0 as f64 {
                tent_1d_strided(
                    spec,
                    count1,
                    bin0 as usize * count1,
                    1,
                    frequencies1,
                    amplitude,
                );
            }
        } else if span1 < DEGENERATE_SPAN {
            let bin1 = frequencies1[0].floor();
            if bin1 >= 0.0 && bin1 < count1 as f64 {
                tent_1d_strided(
                    spec,
                    count0,
                    bin1 as usize,
                    count1,
                    frequencies0,
                    amplitude,
                );
            }
        } else {
            collinear_tent_2d(spec, count0, count1, frequencies0, frequencies1, amplitude);
        }
        return;
    }

    let density = amplitude / area;
    let Some((first0, last0)) = bin_range(min0, max0, count0) else {
        return;
    };
    let Some((first1, last1)) = bin_range(min1, max1, count1) else {
        return;
    };

    let vertices = [
        (frequencies0[0], frequencies1[0]),
        (frequencies0[1], frequencies1[1]),
        (frequencies0[2], frequencies1[2]),
    ];
    let mut polygon: Vec<(f64, f64)> = Vec::with_capacity(8);
    let mut scratch: Vec<(f64, f64)> = Vec::with_capacity(8);
    for bin0 in first0..=last0 {
        for bin1 in first1..=last1 {
            polygon.clear();
            polygon.extend(vertices);
            clip_axis(&mut polygon, &mut scratch, 0, bin0 as f64, true);
            clip_axis(&mut polygon, &mut scratch, 0, (bin0 + 1) as f64, false);
            clip_axis(&mut polygon, &mut scratch, 1, bin1 as f64, true);
            clip_axis(&mut polygon, &mut scratch, 1, (bin1 + 1) as f64, false);
            let overlap = polygon_area(&polygon);
            if overlap > 0.0 {
                spec[bin0 as usize * count1 + bin1 as usize] += density * overlap;
            }
        }
    }
}

/// 2D counterpart of [`octant_tent_1d`] against the two ramped frequency
/// axes of a correlation spectrum.
#[allow(clippy::too_many_arguments)]
pub fn octant_tent_2d(
    spec: &mut [f64],
    count0: usize,
    count1: usize,
    frequencies0: &[f64],
    frequencies1: &[f64],
    amplitudes: &[f64],
    triangles: &[[usize; 3]],
) {
    for triangle in triangles {
        let amplitude =
            amplitudes[triangle[0]] + amplitudes[triangle[1]] + amplitudes[triangle[2]];
        if amplitude == 0.0 {
            continue;
        }
        triangle_tent_2d(
            spec,
            count0,
            count1,
            [
                frequencies0[triangle[0]],
                frequencies0[triangle[1]],
                frequencies0[triangle[2]],
            ],
            [
                frequencies1[triangle[0]],
                frequencies1[triangle[1]],
                frequencies1[triangle[2]],
            ],
            amplitude,
        );
    }
}

fn tent_1d_strided(
    spec: &mut [f64],
    count: usize,
    base: usize,
    stride: usize,
    frequencies: [f64; 3],
    amplitude: f64,
) {
    let mut f = frequencies;
    f.sort_unstable_by(f64::total_cmp);

    let span = f[2] - f[0];
    if span < DEGENERATE_SPAN {
        let bin = f[1].floor();
        if bin >= 0.0 && bin < count as f64 {
            spec[base + stride * bin as usize] += amplitude;
        }
        return;
    }

    let height = 2.0 * amplitude / span;
    integrate_linear_segment(f[0], f[1], 0.0, height, count, |bin, mass| {
        spec[base + stride * bin] += mass;
    });
    integrate_linear_segment(f[1], f[2], height, 0.0, count, |bin, mass| {
        spec[base + stride * bin] += mass;
    });
}

/// Integrates a linear ramp over each unit bin it crosses, reporting
/// `(bin, mass)` pairs; bins outside `[0, count)` are skipped.
fn integrate_linear_segment(
    xa: f64,
    xb: f64,
    ya: f64,
    yb: f64,
    count: usize,
    mut sink: impl FnMut(usize, f64),
) {
    if !(xb > xa) {
        return;
    }
    let Some((first, last)) = bin_range(xa, xb, count) else {
        return;
    };
    let slope = (yb - ya) / (xb - xa);
    for bin in first..=last {
        let lo = xa.max(bin as f64);
        let hi = xb.min((bin + 1) as f64);
        if hi <= lo {
            continue;
        }
        let y_lo = ya + slope * (lo - xa);
        let y_hi = ya + slope * (hi - xa);
        sink(bin as usize, 0.5 * (y_lo + y_hi) * (hi - lo));
    }
}

/// A triangle collapsed onto a slanted line: the mass profile along the
/// first axis is the usual tent; each strip's mass lands in the cell the
/// line passes through at the strip midpoint.
fn collinear_tent_2d(
    spec: &mut [f64],
    count0: usize,
    count1: usize,
    frequencies0: [f64; 3],
    frequencies1: [f64; 3],
    amplitude: f64,
) {
    let mut order = [0usize, 1, 2];
    order.sort_unstable_by(|&a, &b| frequencies0[a].total_cmp(&frequencies0[b]));
    let f0 = [
        frequencies0[order[0]],
        frequencies0[order[1]],
        frequencies0[order[2]],
    ];
    let (y_first, y_last) = (frequencies1[order[0]], frequencies1[order[2]]);
    let x_span = f0[2] - f0[0];
    let height = 2.0 * amplitude / x_span;

    let mut deposit = |bin0: usize, lo: f64, hi: f64, mass: f64| {
        let x_mid = 0.5 * (lo + hi);
        let t = (x_mid - f0[0]) / x_span;
        let y = y_first + t * (y_last - y_first);
        let bin1 = y.floor();
        if bin1 >= 0.0 && bin1 < count1 as f64 {
            spec[bin0 * count1 + bin1 as usize] += mass;
        }
    };

    for (xa, xb, ya, yb) in [(f0[0], f0[1], 0.0, height), (f0[1], f0[2], height, 0.0)] {
        if !(xb > xa) {
            continue;
        }
        let Some((first, last)) = bin_range(xa, xb, count0) else {
            continue;
        };
        let slope = (yb - ya) / (xb - xa);
        for bin in first..=last {
            let lo = xa.max(bin as f64);
            let hi = xb.min((bin + 1) as f64);
            if hi <= lo {
                continue;
            }
            let y_lo = ya + slope * (lo - xa);
            let y_hi = ya + slope * (hi - xa);
            deposit(bin as usize, lo, hi, 0.5 * (y_lo + y_hi) * (hi - lo));
        }
    }
}

/// Grid bins intersected by `[lo, hi]`, clamped to `[0, count)`.
fn bin_range(lo: f64, hi: f64, count: usize) -> Option<(i64, i64)> {
    let first = (lo.floor() as i64).max(0);
    let last = (hi.floor() as i64).min(count as i64 - 1);
    (first <= last).then_some((first, last))
}

fn min_max(values: [f64; 3]) -> (f64, f64) {
    let mut min = values[0];
    let mut max = values[0];
    for value in &values[1..] {
        min = min.min(*value);
        max = max.max(*value);
    }
    (min, max)
}

/// One Sutherland-Hodgman clip of a convex polygon against an axis-aligned
/// half plane.
fn clip_axis(
    polygon: &mut Vec<(f64, f64)>,
    scratch: &mut Vec<(f64, f64)>,
    axis: usize,
    bound: f64,
    keep_above: bool,
) {
    let coordinate = |point: (f64, f64)| if axis == 0 { point.0 } else { point.1 };
    let inside = |point: (f64, f64)| {
        if keep_above {
            coordinate(point) >= bound
        } else {
            coordinate(point) <= bound
        }
    };

    scratch.clear();
    let len = polygon.len();
    for index in 0..len {
        let current = polygon[index];
        let next = polygon[(index + 1) % len];
        let current_inside = inside(current);
        if current_inside {
            scratch.push(current);
        }
        if current_inside != inside(next) {
            let ca = coordinate(current);
            let cb = coordinate(next);
            let t = (bound - ca) / (cb - ca);
            scratch.push((
                current.0 + t * (next.0 - current.0),
                current.1 + t * (next.1 - current.1),
            ));
        }
    }
    std::mem::swap(polygon, scratch);
}

fn polygon_area(polygon: &[(f64, f64)]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for index in 0..polygon.len() {
        let (x0, y0) = polygon[index];
        let (x1, y1) = polygon[(index + 1) % polygon.len()];
        twice_area += x0 * y1 - x1 * y0;
    }
    0.5 * twice_area.abs()
}
