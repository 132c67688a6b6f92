mod model;

pub use model::{SpectralDimension, SpectralEvent};
