//! The per-session dispatch driver and the default middleware assembly.
//!
//! [`Driver::dispatch`] is the public surface: it takes one parsed tool
//! call, runs the pre-hook chain, invokes the tool handler on success, and
//! sweeps the post-hooks. [`setup::build_driver`] wires the standard hook
//! order -- intent selector, scope gate, snapshot capture on the pre side;
//! trace writer and lessons-learned on the post side.

pub mod driver;
pub mod handlers;
pub mod lessons_hook;
pub mod setup;
pub mod trace_hook;

pub use driver::{DispatchOutcome, Driver};
pub use handlers::{SelectIntentHandler, ToolHandler, WriteFileHandler};
pub use lessons_hook::LessonsHook;
pub use setup::build_driver;
pub use trace_hook::TraceWriterHook;
