//! Engine and script lifecycle on the control thread.
//!
//! ```text
//! Unprepared --[first rebuild]--> Prepared
//!                                     |
//!                 Prepared <--[rebuild on rate/size change]
//! ```
//!
//! A rebuild replaces the engine and script together. Reloading only
//! replaces the script and keeps the engine.

use mindful_core::{Engine, Environment, Script};

/// Control-thread runtime states.
pub(crate) enum RuntimeState<E: Engine, S: Script> {
    /// No environment known yet; nothing to render into.
    Unprepared,

    /// Engine and script built for `environment`.
    Prepared {
        engine: E,
        script: S,
        environment: Environment,
    },
}

impl<E: Engine, S: Script> RuntimeState<E, S> {
    /// Check if in prepared state.
    pub fn is_prepared(&self) -> bool {
        matches!(self, Self::Prepared { .. })
    }

    /// The environment the engine was built for (only when prepared).
    pub fn environment(&self) -> Option<Environment> {
        match self {
            Self::Prepared { environment, .. } => Some(*environment),
            Self::Unprepared => None,
        }
    }

    /// Get reference to the engine (only when prepared).
    pub fn engine(&self) -> Option<&E> {
        match self {
            Self::Prepared { engine, .. } => Some(engine),
            Self::Unprepared => None,
        }
    }

    /// Get mutable reference to the engine (only when prepared).
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        match self {
            Self::Prepared { engine, .. } => Some(engine),
            Self::Unprepared => None,
        }
    }

    /// Get mutable reference to the script (only when prepared).
    pub fn script_mut(&mut self) -> Option<&mut S> {
        match self {
            Self::Prepared { script, .. } => Some(script),
            Self::Unprepared => None,
        }
    }

    /// Install a freshly built engine and script.
    pub fn prepare(&mut self, engine: E, script: S, environment: Environment) {
        *self = Self::Prepared {
            engine,
            script,
            environment,
        };
    }

    /// Swap in a new script, keeping the engine.
    ///
    /// Returns `false` (dropping `script`) when unprepared.
    pub fn replace_script(&mut self, new_script: S) -> bool {
        match self {
            Self::Prepared { script, .. } => {
                *script = new_script;
                true
            }
            Self::Unprepared => false,
        }
    }
}
