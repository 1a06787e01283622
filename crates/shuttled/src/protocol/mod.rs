//! Host command protocol.
//!
//! The host drives the worker over standard input and output. Commands are
//! `EXECUTE <TASK_TYPE> <request_id> [tokens...]` and `EXIT`; the worker
//! answers with `READY`, `DONE <summary>`, `ERROR <message>` and `EXITING`,
//! one line each.

mod command;
mod command_loop;
mod dispatcher;
mod errors;
mod response;

pub use command::{Command, ExecuteRequest};
pub use command_loop::{LoopOutcome, MAX_COMMAND_BYTES, serve};
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use response::{ResponseLine, ResponseWriter};
