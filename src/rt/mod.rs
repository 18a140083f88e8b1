//! Runtime side of argument interception
//!
//! [`Args`] is the bundle handlers receive. The [`Interpreter`] executes rewritten method
//! bodies against it so their behaviour can be checked end to end.

pub mod args;
pub mod error;
pub mod interp;
pub mod value;

pub use args::Args;
pub use error::{ArgsError, ArgsOp, ArgsResult, InterpError, InterpResult};
pub use interp::{Completion, Heap, Host, Interpreter, Outcome};
pub use value::{Boxed, BundleRef, ObjectRef, Value};
