//! Core types for the hook surface.

use permix_types::Rules;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events a container emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    /// Rules were replaced by `setup`.
    Setup,
    /// First `setup` completed.
    Ready,
    /// Rules were restored from a snapshot.
    Hydrate,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Setup => "setup",
            HookEvent::Ready => "ready",
            HookEvent::Hydrate => "hydrate",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emitted event together with its arguments.
#[derive(Debug, Clone, Copy)]
pub enum Hook<'a> {
    Setup(&'a Rules),
    Ready,
    Hydrate,
}

impl Hook<'_> {
    pub fn event(&self) -> HookEvent {
        match self {
            Hook::Setup(_) => HookEvent::Setup,
            Hook::Ready => HookEvent::Ready,
            Hook::Hydrate => HookEvent::Hydrate,
        }
    }

    /// The rule set carried by a `setup` event.
    pub fn rules(&self) -> Option<&Rules> {
        match self {
            Hook::Setup(rules) => Some(rules),
            _ => None,
        }
    }
}
