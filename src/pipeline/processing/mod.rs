// Pipeline processing: normalization, period parsing, seasons, reshaping,
// classification, and alert selection

pub mod classify;
pub mod normalize;
pub mod parser;
pub mod reshape;
pub mod season;
pub mod selection;
