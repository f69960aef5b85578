//! The hook engine: registry plus ordered pre/post dispatch.
//!
//! Hooks are registered once at startup and matched per tool call by name.
//! Pre-hooks run in registration order and fail fast: the first veto stops
//! the chain and the handler is never invoked. Post-hooks run
//! unconditionally after the handler; their failures are logged and
//! reported but never roll back the tool.
//!
//! The engine itself is stateless -- all mutable state lives on the
//! session record that hooks receive.

pub mod engine;

pub use engine::{
    Hook, HookPhase, HookRegistry, PostHookOutcome, PostHookReport, PreDispatch, PreHookOutcome,
    ToolResult,
};
