//! # stagehand_core - Stagehand Core
//!
//! Passive building blocks shared by every other Stagehand crate:
//! - **Tables**: ordered key/value lists with a lazily derived lookup map
//! - **Singletons**: at-most-one-instance-per-type registry, injected rather than global
//! - **Commands**: named, typed handlers in place of dynamic method lookup
//!
//! Nothing in here ticks. State machines driven by the host frame loop
//! live in `stagehand_tick`.

pub mod callback;
pub mod command;
pub mod error;
pub mod singleton;
pub mod table;

pub use callback::*;
pub use command::*;
pub use error::*;
pub use singleton::*;
pub use table::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::callback::{invoke_if_set, Callback};
    pub use crate::command::{CommandHandler, CommandRegistry};
    pub use crate::error::{CommandError, Error, RegistryError, Result, TableError};
    pub use crate::singleton::{SingletonGuard, SingletonRegistry};
    pub use crate::table::{KeyValue, KeyValueTable};
}
