use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::types::{DocumentId, PolicyDocument};

/// Whether an insert created a new entry or replaced one with the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Replaced,
}

/// Identity-keyed document map. Later inserts with the same identity win.
#[derive(Debug, Default)]
pub(crate) struct DocumentIndex {
    name: &'static str,
    documents: BTreeMap<DocumentId, Arc<PolicyDocument>>,
}

impl DocumentIndex {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            documents: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, source: &Path, document: Arc<PolicyDocument>) -> InsertOutcome {
        let id = document.id().clone();
        let outcome = match self.documents.insert(id.clone(), document) {
            Some(_) => InsertOutcome::Replaced,
            None => InsertOutcome::Inserted,
        };
        match outcome {
            InsertOutcome::Inserted => {
                info!(index = self.name, %id, source = %source.display(), "loaded policy");
            }
            InsertOutcome::Replaced => {
                info!(index = self.name, %id, source = %source.display(), "replaced policy");
            }
        }
        outcome
    }

    pub(crate) fn get(&self, id: &DocumentId) -> Option<&Arc<PolicyDocument>> {
        self.documents.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.documents.keys()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<PolicyDocument>> {
        self.documents.values().cloned().collect()
    }
}
