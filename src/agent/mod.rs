//! Agent Controller (C7, spec §4.7): the autonomous optimize-measure-iterate
//! loop that drives a site from its initial crawl to a passing build,
//! calling out to the external planner/reviewer and the build queue (C9)
//! along the way.

mod checkpoint;
pub mod controller;
pub mod errors;
pub mod planner;
pub mod remote;
pub mod reviewer;
mod state_machine;

pub use controller::{AgentController, AgentReport, FinalVerdict};
pub use errors::AgentError;
pub use planner::{Planner, PlannerSuggestion};
pub use remote::{RemotePlanner, RemoteReviewer};
pub use reviewer::{ReviewVerdict, Reviewer};
