//! Solid-state NMR powder-pattern simulation engine.
//!
//! The crate computes frequency-domain amplitude histograms of
//! powder-averaged, sideband-resolved resonances: it builds an octahedral
//! orientation-averaging mesh, rotates the spin system's interaction tensors
//! from their principal-axis frames into a common rotor frame, evaluates
//! per-orientation spinning-sideband amplitudes with a batched Fourier
//! method, and rasterizes the weighted result onto one- or two-dimensional
//! spectral grids owned by the caller.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::config::{IntegrationVolume, SimulationConfig};
pub use domain::{SimError, SimResult};
pub use modules::averaging::AveragingScheme;
pub use modules::sequence::{SpectralDimension, SpectralEvent};
pub use modules::simulate::{DimensionAmplitudes, simulate_transition};
pub use modules::tensor::{
    CouplingRavel, EulerAngles, RankTensorSet, SiteRavel, SpinSystemRavel, TransitionView,
};
