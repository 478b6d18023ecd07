// Command Domain Model

use serde::{Deserialize, Serialize};

use super::trigger::{ScopeId, TriggerSet, TriggerSource};

/// External command run by the execution gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Program name or path
    #[serde(rename = "command", default)]
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Deferred to the second pass of a dispatch
    #[serde(default)]
    pub late: bool,

    #[serde(flatten)]
    pub triggers: TriggerSet,

    /// Only run for dispatches carrying this scope id (negative = any scope)
    #[serde(rename = "command_id", default)]
    pub scope_id: ScopeId,
}

impl Command {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            late: false,
            triggers: TriggerSet::default(),
            scope_id: 0,
        }
    }

    pub fn with_triggers(mut self, triggers: TriggerSet) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_scope(mut self, scope_id: ScopeId) -> Self {
        self.scope_id = scope_id;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.late = true;
        self
    }

    /// Eligible iff the scope matches and the command listens to `source`
    pub fn is_eligible(&self, source: TriggerSource, scope_id: ScopeId) -> bool {
        (self.scope_id < 0 || self.scope_id == scope_id) && self.triggers.contains(source)
    }
}
