//! Lunar Eval - embeddable runtime for a Lua 5.1 subset.
//!
//! # Architecture
//!
//! - `value`: the dynamic [`Value`] model, [`Table`] storage and [`Function`]s
//! - `protocol`: metatable-aware indexing, assignment, calls and operators
//! - `proxy`: exposes host types to scripts through [`ProxyClass`]
//! - `interpreter`: async tree-walking evaluation of parsed chunks
//! - `engine`: the embedding surface, owning globals and registered classes
//! - `stdlib`: base functions plus `string`, `math` and `bit32`
//!
//! Every script-visible call is a suspension point, so host functions may
//! be `async`. Long-running scripts are stopped with a [`Cancellation`],
//! which is checked before each statement and loop iteration.

mod context;
mod engine;
pub mod errors;
mod heap;
mod interpreter;
mod print_handler;
pub mod protocol;
pub mod proxy;
pub mod stdlib;
pub mod value;

pub use context::{CallContext, Cancellation};
pub use engine::{Engine, EngineBuilder, ExecOutcome};
pub use errors::{Error, ErrorKind, EvalResult, RuntimeError};
pub use heap::CollectStats;
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use proxy::{
    descriptor, ClassBuilder, ClassDescriptor, HostCall, IntoValues, Member, PropertyAccess,
    ProxyClass, Signature,
};
pub use value::{first, Function, Table, UserData, Value, ValueKind, Values};

#[cfg(test)]
mod tests;
