//! Provide the value model and equality semantics shared by the taptest assertion library.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that the harness uses to
//! decide whether an assertion holds and how a value is shown in failure diagnostics.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, and no runner-specific types.
//! - Current scope: the dynamic [`Value`] model, identity equality ([`is_equal`]), structural equality
//!   ([`is_deep_equal`]), truthiness and JSON-style rendering ([`render`]).

pub mod equality;
pub mod render;
pub mod value;

pub use equality::{is_deep_equal, is_equal};
pub use render::{render_pretty, to_json};
pub use value::{Class, Date, HostRef, Object, Prototype, Symbol, Value};
