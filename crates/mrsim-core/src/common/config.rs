use crate::domain::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Portion of the orientation sphere covered by the averaging mesh. Each
/// option replicates the octant mesh by symmetry; the quadrature weights are
/// renormalized so the covered volume always integrates to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationVolume {
    #[default]
    Octant,
    Hemisphere,
    Sphere,
}

impl IntegrationVolume {
    pub const fn octant_count(self) -> usize {
        match self {
            Self::Octant => 1,
            Self::Hemisphere => 4,
            Self::Sphere => 8,
        }
    }
}

/// Per-call knobs of the simulation engine. Everything else (grids, events,
/// interaction tensors, transitions) arrives through the input records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Subdivisions along an octant edge; vertex count grows quadratically.
    pub integration_density: usize,
    pub integration_volume: IntegrationVolume,
    pub number_of_sidebands: usize,
    /// Enables second-order quadrupolar terms (and with them the rank-4
    /// rotation tables) for sites with spin > 1/2.
    pub quad_second_order: bool,
    /// Subtracts the isotropic part of the second-order quadrupolar shift
    /// after accumulation, for experiments that reference it out.
    pub remove_2nd_order_quad_isotropic: bool,
    /// When false the call skips rasterization and returns the weighted
    /// per-orientation, per-sideband amplitudes instead.
    pub interpolation: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            integration_density: 64,
            integration_volume: IntegrationVolume::Octant,
            number_of_sidebands: 64,
            quad_second_order: false,
            remove_2nd_order_quad_isotropic: false,
            interpolation: true,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.integration_density == 0 {
            return Err(SimError::InvalidIntegrationDensity { density: 0 });
        }
        if self.number_of_sidebands == 0 {
            return Err(SimError::InvalidSidebandCount { count: 0 });
        }
        Ok(())
    }
}
