//! Rule presets for common configurations.

use crate::NoDeprecated;
use pmax_core::ProgramRuleBox;

/// Preset configurations for pmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Every built-in rule.
    All,
}

impl Preset {
    /// Parses a preset name from configuration.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::Recommended),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<ProgramRuleBox> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::All => all_rules(),
        }
    }
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `no-deprecated` (PMAX001, PMAX002) - Forbids deprecated usages
#[must_use]
pub fn recommended_rules() -> Vec<ProgramRuleBox> {
    vec![Box::new(NoDeprecated::new())]
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<ProgramRuleBox> {
    vec![Box::new(NoDeprecated::new())]
}
