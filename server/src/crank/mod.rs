mod crank_engine;
pub use crank_engine::{should_check_end, CrankEngine, CrankOutcome, CrankReport};
