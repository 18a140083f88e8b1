//! argsplice
//!
//! Call-site argument interception for JVM method bodies: the `@ModifyArgs` injector.
//!
//! ## Architecture
//!
//! - **codegen**: instruction stream model, descriptors, stack depth simulation and the
//!   target method being rewritten
//! - **inject**: the `@ModifyArgs` injector and its handler calling conventions
//! - **rt**: the argument bundle handlers receive, plus a reference interpreter that runs
//!   rewritten bodies
//! - **bin**: command-line preview tool
//!
//! ## Rewrite Flow
//!
//! ```text
//! call args on stack → pack into Args → handler(Args[, enclosing args]) → unpack → original call
//!                           ↓                                               ↓
//!                     box primitives                               checkcast / unbox
//! ```

pub mod codegen;
pub mod config;
pub mod consts;
pub mod error;
pub mod inject;
pub mod rt;

pub use codegen::{InsnId, InsnList, Target};
pub use config::Config;
pub use error::{Error, Result};
pub use inject::{HandlerForm, HandlerRef, ModifyArgsInjector};
pub use rt::Args;

/// Intercept the arguments of `call_site` in `target` with `handler`
///
/// Convenience over [`ModifyArgsInjector`] for one-off rewrites.
pub fn modify_args(target: &mut Target, call_site: InsnId, handler: HandlerRef, config: &Config) -> Result<()> {
    ModifyArgsInjector::new(handler, config).inject(target, call_site)?;
    Ok(())
}
