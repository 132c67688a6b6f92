pub mod wigner;

pub use wigner::{rotate_spherical_components, wigner_d_matrix, wigner_small_d};
