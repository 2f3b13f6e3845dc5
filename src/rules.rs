use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::types::PolicyDocument;

/// First-rule identifiers seen across every registered document.
///
/// Used only to flag duplicates; ids are never removed.
#[derive(Debug, Default)]
pub(crate) struct RuleRegistry {
    ids: HashSet<String>,
}

impl RuleRegistry {
    /// Record the document's first rule id. Returns `false` if the id was
    /// already registered; duplicates are logged, never rejected.
    pub(crate) fn register(&mut self, source: &Path, document: &PolicyDocument) -> bool {
        let Some(rule_id) = document.first_rule_id() else {
            return true;
        };
        debug!(source = %source.display(), rule_id, "first rule");
        if self.ids.insert(rule_id.to_owned()) {
            true
        } else {
            warn!(source = %source.display(), rule_id, "duplicate rule id");
            false
        }
    }

    pub(crate) fn contains(&self, rule_id: &str) -> bool {
        self.ids.contains(rule_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
