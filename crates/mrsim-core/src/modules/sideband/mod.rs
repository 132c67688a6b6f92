mod model;

pub use model::{
    accumulate_local_frequencies, evaluate_amplitudes, SidebandFft, SidebandPlan,
};
