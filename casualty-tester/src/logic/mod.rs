pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use scenarios::{expand_scenarios, get_scenario, list_scenarios, resolve_mechanisms};
pub use seeds::resolve_seed_inputs;
pub use simulation::{DEFAULT_TICKS, run_case};
pub use tester::*;
