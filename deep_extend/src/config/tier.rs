//! Layer tiers of the configuration lineage.

use std::fmt;

/// Position of a layer in the configuration lineage.
///
/// Layers compose `Default < Base < Static < Primary`: overrides at a more
/// specific tier take precedence but may delegate upward with
/// [`crate::runtime::Run::call_next`]. The call-scoped "final" state (level,
/// global and local bags) is not a layer; it lives on the explicit
/// [`crate::runtime::Run`] context created per top-level merge call.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Tier {
    /// Built-in defaults; defines every method once.
    Default,
    /// Engine-variant baseline, below user configuration.
    Base,
    /// User-supplied overrides.
    Static,
    /// Call-site specialisation layered above user configuration.
    Primary,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Base => "base",
            Self::Static => "static",
            Self::Primary => "primary",
        };
        f.write_str(name)
    }
}
