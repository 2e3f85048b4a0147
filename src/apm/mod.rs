//! Command Monitoring
//!
//! The APM module reports runtime information about the commands the engine
//! executes on the server. Every physical command (each `bulkWrite` batch and
//! each `getMore` fetch) triggers the registered start and completion hooks,
//! carrying the fully formed command document. Hooks are observational only;
//! they cannot alter dispatch.
mod event;
mod listener;

pub use self::event::{CommandStarted, CommandResult};
pub use self::listener::{CompletionHook, Listener, StartHook};
