pub mod auth_flow;
pub mod controller;

pub use auth_flow::{AuthForm, AuthMode};
pub use controller::{CompletionEvent, StageOutcome, WorkflowController};
