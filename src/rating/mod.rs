pub mod power;
pub mod rpi;

pub use power::{category_value, compute_power_scores, rank_field, FieldRankings, PowerScores};
pub use rpi::{compute_rpi, RpiRating};
