mod model;

pub use model::{
    accumulate_common_frame_components, CouplingRavel, EulerAngles, RankTensorSet, SiteRavel,
    SpinSystemRavel, TransitionView,
};
