pub mod game_tester;
pub mod inputs;
pub mod playability;
pub mod policy;
pub mod reports;
pub mod tester;
pub mod transcript;

pub use game_tester::{GameTester, SimulationExpectation, SimulationPlan, SimulationSummary};
pub use inputs::{resolve_roles, resolve_seed_inputs};
pub use playability::{
    PlayabilityAggregate, PlayabilityRecord, aggregate_playability, run_playability_analysis,
    validate_playability_targets,
};
pub use policy::GameplayStrategy;
pub use tester::*;
pub use transcript::render_transcript;
