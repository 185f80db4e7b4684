// Page-fit enforcement engine.
// Budgets and the height estimate triage content cheaply; the render oracle's
// page count is the only ground truth. The shrink planner removes whole
// bullets and entries, never rewrites text.

pub mod budget;
pub mod estimator;
pub mod handlers;
pub mod limits;
pub mod orchestrator;
pub mod shrink;

// Re-export the public API consumed by routes, state and main.
pub use budget::{DocumentKind, FitConfig};
pub use limits::{validate_limits, ValidationResult};
pub use orchestrator::{FitFailurePayload, FitOrchestrator, ShrinkExhausted};
