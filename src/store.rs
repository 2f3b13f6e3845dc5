use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::codec::DocumentCodec;
use crate::config::RepositoryConfig;
use crate::discover;
use crate::error::RepositoryError;
use crate::index::DocumentIndex;
use crate::rules::RuleRegistry;
use crate::types::{DocumentId, PolicyDocument, Variant};

/// Base (non patient-specific) policies of both variants.
///
/// Built once and read-only afterwards. Any read or decode failure aborts the
/// load.
#[derive(Debug)]
pub struct TemplateStore {
    index: DocumentIndex,
}

impl TemplateStore {
    pub(crate) fn load<C: DocumentCodec>(
        config: &RepositoryConfig,
        codec: &C,
        rules: &mut RuleRegistry,
    ) -> Result<Self, RepositoryError> {
        let mut store = Self {
            index: DocumentIndex::new("base"),
        };
        for variant in Variant::ALL {
            store
                .load_variant(&config.base_policy_path(variant), codec, rules)
                .map_err(|source| RepositoryError::Initialization {
                    variant,
                    source: Box::new(source),
                })?;
        }
        Ok(store)
    }

    fn load_variant<C: DocumentCodec>(
        &mut self,
        dir: &Path,
        codec: &C,
        rules: &mut RuleRegistry,
    ) -> Result<(), RepositoryError> {
        for path in discover::xml_files(dir)? {
            debug!(path = %path.display(), "read base policy");
            let text = read_text(&path)?;
            let document = decode(codec, &path, &text)?;
            rules.register(&path, &document);
            self.index.insert(&path, Arc::new(document));
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&Arc<PolicyDocument>> {
        self.index.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.index.ids()
    }

    /// All base documents, ordered by identity.
    #[must_use]
    pub fn documents(&self) -> Vec<Arc<PolicyDocument>> {
        self.index.snapshot()
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String, RepositoryError> {
    std::fs::read_to_string(path).map_err(|source| RepositoryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn decode<C: DocumentCodec>(
    codec: &C,
    path: &Path,
    text: &str,
) -> Result<PolicyDocument, RepositoryError> {
    codec.decode(text).map_err(|source| RepositoryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
