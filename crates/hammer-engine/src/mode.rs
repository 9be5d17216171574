//! Engine mode state machine.
//!
//! An engine is in exactly one mode at any instant, and mode transitions
//! are the only way callers observe or gate capability access. The
//! transition table below is the whole contract: anything not listed is
//! a mode conflict.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single current activity of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Not started, or shut off. Initial and terminal state.
    Off,
    /// Acquiring backends (startup or per-target processing).
    Loading,
    /// Ready; the only state from which operations may begin.
    Idling,
    /// A parse operation is running against the query core.
    Parsing,
    /// A manipulation is running against the mutation core.
    Manipulating,
}

impl EngineMode {
    /// Whether a direct transition `self -> to` is legal.
    ///
    /// `Off` is reachable from every state because `shutoff` always
    /// succeeds.
    pub fn allows(self, to: EngineMode) -> bool {
        use EngineMode::*;
        if to == Off {
            return true;
        }
        matches!(
            (self, to),
            (Off, Loading)
                | (Loading, Idling)
                | (Idling, Loading)
                | (Idling, Parsing)
                | (Idling, Manipulating)
                | (Parsing, Idling)
                | (Manipulating, Idling)
        )
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineMode::Off => "off",
            EngineMode::Loading => "loading",
            EngineMode::Idling => "idling",
            EngineMode::Parsing => "parsing",
            EngineMode::Manipulating => "manipulating",
        };
        f.write_str(s)
    }
}

/// Whether an engine commits to one backend combination for its whole
/// life, or may choose per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// One backend combination, fixed at construction.
    Fixed,
    /// Backend combination chosen per target.
    Dynamic,
}

/// Which capability contracts the engine's backends satisfy.
///
/// Declarative only; the engines never branch on this at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendCapability {
    /// Read-only inspection of a document.
    QueryOnly,
    /// Scripted interaction only.
    MutateOnly,
    /// Both querying and mutating.
    Both,
}

#[cfg(test)]
mod tests {
    use super::*;
    use EngineMode::*;

    #[test]
    fn off_reachable_from_everywhere() {
        for from in [Off, Loading, Idling, Parsing, Manipulating] {
            assert!(from.allows(Off), "{from} -> off should be legal");
        }
    }

    #[test]
    fn operations_only_start_from_idling() {
        assert!(Idling.allows(Parsing));
        assert!(Idling.allows(Manipulating));
        assert!(Idling.allows(Loading));

        assert!(!Parsing.allows(Manipulating));
        assert!(!Manipulating.allows(Parsing));
        assert!(!Loading.allows(Parsing));
        assert!(!Off.allows(Parsing));
        assert!(!Off.allows(Idling));
    }

    #[test]
    fn operations_return_to_idling() {
        assert!(Parsing.allows(Idling));
        assert!(Manipulating.allows(Idling));
        assert!(Loading.allows(Idling));
        assert!(!Parsing.allows(Loading));
    }

    #[test]
    fn mode_display() {
        assert_eq!(Idling.to_string(), "idling");
        assert_eq!(Manipulating.to_string(), "manipulating");
    }
}
