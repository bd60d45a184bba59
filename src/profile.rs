//! Capacitance → carrier-density transform.
//!
//! For each sweep direction the measured C(V) curve maps to an apparent
//! depth `Z = ε₀·εr·A / C` and a carrier density
//! `N = C³ / (ε₀·εr·A²·q) · dV/dC`; integrating N over Z gives the sheet
//! carrier density. dV/dC is formed as the ratio of two index-based
//! gradients, so a small per-step ΔC cannot blow up a single sample point
//! through a raw ΔV/ΔC division.

use crate::data::model::{Profile, SweepTable};

// ---------------------------------------------------------------------------
// Physical constants & numeric policy
// ---------------------------------------------------------------------------

/// Physical constants and the sentinel bound for degenerate values.
/// Passed explicitly so tests can pin every number the transform sees.
#[derive(Debug, Clone, Copy)]
pub struct Constants {
    /// Permittivity of free space (F/m).
    pub epsilon_0: f64,
    /// Elementary charge (C).
    pub elementary_charge: f64,
    /// Finite replacement for ±∞ from degenerate derivatives or
    /// zero-capacitance samples.
    pub sentinel: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            epsilon_0: 8.854e-12,
            elementary_charge: 1.602e-19,
            sentinel: 1e20,
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric kernels
// ---------------------------------------------------------------------------

/// Discrete gradient over sample index: central differences in the
/// interior, one-sided at the ends. A single sample has slope zero.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Trapezoidal quadrature of `y` over `x` in the order given. A
/// non-monotonic `x` contributes signed segments (path integration along
/// the sweep); callers wanting a depth-ordered integral must sort first.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

/// NaN collapses to zero; infinities clamp to the finite sentinel.
fn sanitize(values: &mut [f64], sentinel: f64) {
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
        } else if *v == f64::INFINITY {
            *v = sentinel;
        } else if *v == f64::NEG_INFINITY {
            *v = -sentinel;
        }
    }
}

// ---------------------------------------------------------------------------
// Sweep → Profile
// ---------------------------------------------------------------------------

struct DirectionProfile {
    depth_nm: Vec<f64>,
    density_cm3: Vec<f64>,
    sheet_cm2: f64,
}

/// Compute the depth/density profile of one sweep table.
///
/// `area_m2` is the capacitor area; `relative_permittivity` the εr of the
/// profiled layer. Every output sequence has exactly one entry per table
/// row and contains no non-finite values.
pub fn compute(
    table: &SweepTable,
    area_m2: f64,
    relative_permittivity: f64,
    constants: &Constants,
) -> Profile {
    let voltage = table.voltages();
    let forward = direction(
        &voltage,
        &table.forward(),
        area_m2,
        relative_permittivity,
        constants,
    );
    let backward = direction(
        &voltage,
        &table.backward(),
        area_m2,
        relative_permittivity,
        constants,
    );

    Profile {
        voltage,
        depth_forward_nm: forward.depth_nm,
        depth_backward_nm: backward.depth_nm,
        density_forward_cm3: forward.density_cm3,
        density_backward_cm3: backward.density_cm3,
        sheet_forward_cm2: forward.sheet_cm2,
        sheet_backward_cm2: backward.sheet_cm2,
    }
}

fn direction(
    voltage: &[f64],
    capacitance: &[f64],
    area_m2: f64,
    relative_permittivity: f64,
    constants: &Constants,
) -> DirectionProfile {
    let dv = gradient(voltage);
    let dc = gradient(capacitance);
    let mut dv_dc: Vec<f64> = dv.iter().zip(&dc).map(|(a, b)| a / b).collect();
    sanitize(&mut dv_dc, constants.sentinel);

    let eps = constants.epsilon_0 * relative_permittivity;

    // N = C³ / (ε₀·εr·A²·q) · dV/dC, in cm⁻³. Direction carries no sign
    // information, so the magnitude is reported.
    let mut density_cm3: Vec<f64> = capacitance
        .iter()
        .zip(&dv_dc)
        .map(|(&c, &slope)| {
            let per_m3 = c.powi(3) / (eps * area_m2 * area_m2 * constants.elementary_charge) * slope;
            (per_m3 * 1e-6).abs()
        })
        .collect();
    sanitize(&mut density_cm3, constants.sentinel);

    // Z = ε₀·εr·A / C, in nm. A zero capacitance sample lands on the
    // sentinel instead of ∞.
    let mut depth_nm: Vec<f64> = capacitance.iter().map(|&c| eps * area_m2 / c * 1e9).collect();
    sanitize(&mut depth_nm, constants.sentinel);

    let sheet_cm2 = trapezoid(&density_cm3, &depth_nm).abs();

    DirectionProfile {
        depth_nm,
        density_cm3,
        sheet_cm2,
    }
}
