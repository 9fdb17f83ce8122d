//! Plan assembly: collaborator reads, one price snapshot, then pure sizing.

pub mod planner;

pub use planner::{
    ClosePlan, CloseRequest, LeveragePlanner, OpenPlan, OpenRequest, PlannerSettings,
    PlanningError,
};
