pub mod command;
pub mod error;
pub mod types;
pub mod value;

pub use command::*;
pub use error::InterpreterError;
pub use types::*;
pub use value::*;
