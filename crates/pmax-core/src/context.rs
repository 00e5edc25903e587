//! Context types for rule execution.

use crate::config::RuleConfig;
use crate::program::ProgramModel;
use crate::source::SourceUnit;

/// Context provided to program-wide rules.
pub struct ProgramContext<'a> {
    /// The compiled program.
    pub model: &'a dyn ProgramModel,
    /// This rule's configuration table, if any.
    pub rule_config: Option<&'a RuleConfig>,
}

impl<'a> ProgramContext<'a> {
    /// Creates a new context without rule configuration.
    #[must_use]
    pub fn new(model: &'a dyn ProgramModel) -> Self {
        Self {
            model,
            rule_config: None,
        }
    }

    /// Sets the rule configuration.
    #[must_use]
    pub fn with_rule_config(mut self, config: Option<&'a RuleConfig>) -> Self {
        self.rule_config = config;
        self
    }

    /// Units that rules should scan (not external, not declaration-only).
    pub fn scannable_units(&self) -> impl Iterator<Item = &'a SourceUnit> + 'a {
        self.model
            .source_units()
            .iter()
            .filter(|u| u.is_scannable())
    }

    /// Boolean rule option with a default.
    #[must_use]
    pub fn option_bool(&self, key: &str, default: bool) -> bool {
        self.rule_config
            .map_or(default, |c| c.get_bool(key, default))
    }

    /// String rule option with a default.
    #[must_use]
    pub fn option_str<'b>(&'b self, key: &str, default: &'b str) -> &'b str {
        self.rule_config
            .map_or(default, |c| c.get_str(key, default))
    }
}

impl std::fmt::Debug for ProgramContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramContext")
            .field("units", &self.model.source_units().len())
            .field("rule_config", &self.rule_config)
            .finish()
    }
}
