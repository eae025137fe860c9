pub mod estimator;
pub mod history;
pub mod insight;

pub use estimator::{
    DistanceBucket, Estimator, FieldPositionImpact, FieldZone, PlayType, PlayerImpact,
    ScenarioComparison, ScenarioOutcome, WinProbability,
};
pub use history::HistoricalData;
pub use insight::generate_insight;
