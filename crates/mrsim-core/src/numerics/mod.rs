pub mod special;

pub use special::wigner::{rotate_spherical_components, wigner_d_matrix, wigner_small_d};

use faer::Mat;
use num_complex::Complex64;

pub type DenseComplexMatrix = Mat<Complex64>;
