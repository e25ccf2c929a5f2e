pub mod expr;
pub mod host;
pub mod interpreter;
pub mod memory;

pub use host::*;
pub use interpreter::{Interpreter, FREEZE_THRESHOLD, MAX_CALL_DEPTH};
pub use memory::MemoryHost;
