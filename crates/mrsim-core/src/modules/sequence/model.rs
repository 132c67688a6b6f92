use crate::common::constants::{
    STATIC_ROTOR_FREQUENCY_SUBSTITUTE_HZ, STATIC_ROTOR_FREQUENCY_THRESHOLD_HZ,
};
use crate::domain::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// One contiguous sequence segment with a constant field, rotor rate, and
/// rotor angle. Frequencies in Hz, the field in tesla, the angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralEvent {
    pub magnetic_flux_density: f64,
    pub rotor_frequency: f64,
    pub rotor_angle: f64,
}

impl SpectralEvent {
    pub fn new(magnetic_flux_density: f64, rotor_frequency: f64, rotor_angle: f64) -> Self {
        Self {
            magnetic_flux_density,
            rotor_frequency,
            rotor_angle,
        }
    }

    /// Rotor rates below the static threshold model a non-spinning sample.
    pub fn is_static(&self) -> bool {
        self.rotor_frequency < STATIC_ROTOR_FREQUENCY_THRESHOLD_HZ
    }

    /// The event actually simulated: static events collapse to a very fast
    /// nominal rate at zero angle, pushing all sideband orders out of any
    /// practical grid.
    pub(crate) fn effective(&self) -> SpectralEvent {
        if self.is_static() {
            SpectralEvent {
                rotor_frequency: STATIC_ROTOR_FREQUENCY_SUBSTITUTE_HZ,
                rotor_angle: 0.0,
                ..*self
            }
        } else {
            *self
        }
    }
}

/// One spectroscopic dimension: its spectral grid and the ordered events
/// whose amplitude contributions multiply into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralDimension {
    pub count: usize,
    /// Grid increment in Hz; bin `i` sits at `coordinates_offset + i * increment`.
    pub increment: f64,
    pub coordinates_offset: f64,
    pub events: Vec<SpectralEvent>,
}

impl SpectralDimension {
    pub fn inverse_increment(&self) -> f64 {
        1.0 / self.increment
    }

    /// Folds the reference-offset convention into bin units; the half-bin
    /// shift makes truncation behave as rounding to the nearest bin center.
    pub fn normalize_offset(&self) -> f64 {
        0.5 - self.coordinates_offset * self.inverse_increment()
    }

    pub fn validate(&self, index: usize) -> SimResult<()> {
        if self.count == 0 {
            return Err(SimError::EmptyDimensionGrid { index });
        }
        if !self.increment.is_finite() || self.increment == 0.0 {
            return Err(SimError::InvalidDimensionIncrement {
                index,
                increment: self.increment,
            });
        }
        if self.events.is_empty() {
            return Err(SimError::EmptyEventList { index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SpectralDimension, SpectralEvent};
    use crate::domain::SimError;

    #[test]
    fn static_events_collapse_to_the_fast_spinning_limit() {
        let event = SpectralEvent::new(9.4, 0.0, 0.3);
        assert!(event.is_static());
        let effective = event.effective();
        assert_eq!(effective.rotor_angle, 0.0);
        assert!(effective.rotor_frequency >= 1.0e9);
        assert_eq!(effective.magnetic_flux_density, 9.4);

        let spinning = SpectralEvent::new(9.4, 12_500.0, 0.955);
        assert!(!spinning.is_static());
        assert_eq!(spinning.effective(), spinning);
    }

    #[test]
    fn normalize_offset_maps_frequencies_onto_bin_centers() {
        let dimension = SpectralDimension {
            count: 64,
            increment: 100.0,
            coordinates_offset: -3200.0,
            events: vec![SpectralEvent::new(9.4, 0.0, 0.0)],
        };
        // A frequency right on bin 32's center lands at offset 32.5, which
        // truncates to bin 32.
        let offset = dimension.normalize_offset();
        assert!((offset - 32.5).abs() <= 1.0e-12);
    }

    #[test]
    fn validate_rejects_degenerate_grids() {
        let event = SpectralEvent::new(9.4, 0.0, 0.0);
        let dimension = SpectralDimension {
            count: 0,
            increment: 1.0,
            coordinates_offset: 0.0,
            events: vec![event],
        };
        assert_eq!(
            dimension.validate(0),
            Err(SimError::EmptyDimensionGrid { index: 0 })
        );

        let dimension = SpectralDimension {
            count: 16,
            increment: 0.0,
            coordinates_offset: 0.0,
            events: vec![event],
        };
        assert!(matches!(
            dimension.validate(1),
            Err(SimError::InvalidDimensionIncrement { index: 1, .. })
        ));

        let dimension = SpectralDimension {
            count: 16,
            increment: 1.0,
            coordinates_offset: 0.0,
            events: Vec::new(),
        };
        assert_eq!(
            dimension.validate(0),
            Err(SimError::EmptyEventList { index: 0 })
        );
    }
}
