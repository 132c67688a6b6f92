mod model;

pub use model::AveragingScheme;
