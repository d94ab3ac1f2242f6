//! GitHub Actions runner surface: the triggering event and the workflow
//! commands used to report results back to the runner.

pub mod command;
pub mod context;

pub use command::{add_mask, set_failed, set_output};
pub use context::EventContext;
