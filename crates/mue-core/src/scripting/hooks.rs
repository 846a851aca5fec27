//! # Hooks
//!
//! The four reserved script functions the lifecycle driver invokes by name.

use std::fmt;

/// A reserved lifecycle hook. Any other script function is ordinary user code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    /// `fn setup(config)`: receives the default window config, returns the effective one.
    Setup,
    /// `fn update(dt)`: called once per frame with the previous frame's duration in seconds.
    Update,
    /// `fn draw()`: called once per frame inside the drawing scope.
    Draw,
    /// `fn cleanup()`: called once after the frame loop exits.
    Cleanup,
}

impl Hook {
    pub const ALL: [Hook; 4] = [Hook::Setup, Hook::Update, Hook::Draw, Hook::Cleanup];

    pub fn name(self) -> &'static str {
        match self {
            Hook::Setup => "setup",
            Hook::Update => "update",
            Hook::Draw => "draw",
            Hook::Cleanup => "cleanup",
        }
    }

    /// Number of parameters the driver passes.
    pub fn arity(self) -> usize {
        match self {
            Hook::Setup | Hook::Update => 1,
            Hook::Draw | Hook::Cleanup => 0,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A hook that the entry script defines, as found by `ScriptEnvironment::lookup`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundHook {
    pub hook: Hook,
    /// Parameter count of the script definition.
    pub declared_arity: usize,
}

impl BoundHook {
    pub fn has_expected_arity(&self) -> bool {
        self.declared_arity == self.hook.arity()
    }
}
