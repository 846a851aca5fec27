//! # Scripting Module
//!
//! The bridge between Rhai scripts and the native side.
//!
//! ## Responsibilities
//! - **Codecs**: `Dynamic` to native value types and back.
//! - **Validation**: per-callable signatures checked before any native work.
//! - **Registry**: raw native callables plus the namespaced bootstrap API.
//! - **Environment**: the owned engine, entry script and hook dispatch.
//!
//! ## Module Structure
//! - `codec`: `ScriptCodec` and the coercion rules
//! - `validator`: `Signature`
//! - `natives`: the `Mue_*` bindings
//! - `registry`: bootstrap sequence (`console`, `stacktrace`, `fs`, `graphics`, ...)
//! - `hooks`: the reserved lifecycle hook names
//! - `environment`: `ScriptEnvironment`

pub mod codec;
pub mod environment;
pub mod hooks;
pub mod natives;
pub mod registry;
pub mod validator;

pub use codec::{Category, ScriptCodec};
pub use environment::{EnvironmentOptions, ScriptEnvironment};
pub use hooks::{BoundHook, Hook};
pub use validator::Signature;
