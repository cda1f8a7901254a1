//! Named command dispatch
//!
//! Maps a command name to a typed handler that runs against a target.
//! Handlers are registered up front; an unknown name is reported as
//! [`CommandError::NotFound`] rather than looked up at call time.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CommandError;

/// Handler run against a target with an argument
pub type CommandHandler<T, A> = Box<dyn Fn(&mut T, A) + Send + Sync>;

/// Registry of named handlers for targets of type `T`
pub struct CommandRegistry<T, A = ()> {
    handlers: BTreeMap<String, CommandHandler<T, A>>,
}

impl<T, A> CommandRegistry<T, A> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register a handler under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), CommandError>
    where
        F: Fn(&mut T, A) + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(CommandError::AlreadyRegistered(name.into_boxed_str()));
        }
        self.handlers.insert(name, Box::new(handler));
        Ok(())
    }

    /// Builder-style registration, replacing any existing handler
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut T, A) + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Remove a handler
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Run the handler registered under `name`
    pub fn invoke(&self, target: &mut T, name: &str, args: A) -> Result<(), CommandError> {
        match self.handlers.get(name) {
            Some(handler) => {
                handler(target, args);
                Ok(())
            }
            None => {
                log::error!("The command could not be called: \"{}\"", name);
                Err(CommandError::NotFound(name.into()))
            }
        }
    }

    /// Check if a handler exists
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered command names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T, A> Default for CommandRegistry<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> fmt::Debug for CommandRegistry<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
