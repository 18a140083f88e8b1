//! Injectors that rewrite target method bodies

pub mod error;
pub mod handler;
pub mod modify_args;

pub use error::{InjectionError, InjectionResult};
pub use handler::{HandlerForm, HandlerRef, HandlerShapes};
pub use modify_args::ModifyArgsInjector;
