//! Status pipeline
//!
//! - **queue**: forward-only check for POS kinds that require it
//! - **guard**: submission pre-conditions (defer gate, Wolt idempotence)
//! - **workflow**: the end-to-end status update

pub mod error;
pub mod guard;
pub mod queue;
pub mod workflow;

pub use error::WorkflowError;
pub use guard::{Gate, SkipReason, needs_update, should_submit, submission_gate};
pub use queue::is_monotonic;
pub use workflow::{OrderStatusWorkflow, Outcome, StatusEvent, WorkflowSettings};
