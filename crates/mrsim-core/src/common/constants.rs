//! Shared numeric constants for the simulation kernels.

pub const PI: f64 = 3.141_592_653_589_793_238_462_643_383_279_5_f64;
pub const TWO_PI: f64 = 6.283_185_307_179_586_476_925_286_766_559_f64;
pub const FRAC_PI_2: f64 = PI / 2.0;

/// Rotor rates below this are treated as the static limit.
pub const STATIC_ROTOR_FREQUENCY_THRESHOLD_HZ: f64 = 1.0e-3;
/// Nominal rate substituted for a static event, large enough to push every
/// non-zero sideband order far outside any practical spectral grid.
pub const STATIC_ROTOR_FREQUENCY_SUBSTITUTE_HZ: f64 = 1.0e9;
