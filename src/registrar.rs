use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::codec::DocumentCodec;
use crate::discover;
use crate::error::RepositoryError;
use crate::filler::{fill_subject, FillerArgs, FillerRegistry};
use crate::index::{DocumentIndex, InsertOutcome};
use crate::rules::RuleRegistry;
use crate::store::{decode, read_text};
use crate::types::{DocumentId, PolicyDocument, TemplateFamily, Variant};

/// Result of a successful instantiation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub document: Arc<PolicyDocument>,
    pub outcome: InsertOutcome,
    /// The template file the document was built from.
    pub source: PathBuf,
}

impl Registration {
    #[must_use]
    pub fn replaced(&self) -> bool {
        self.outcome == InsertOutcome::Replaced
    }
}

#[derive(Debug)]
struct PatientState {
    documents: DocumentIndex,
    rules: RuleRegistry,
}

/// Instantiates patient templates and owns the patient index.
///
/// Template discovery, reading, filling and decoding happen without holding
/// the lock. The write lock covers only the index insert and rule
/// registration, so a failed call leaves the index untouched.
#[derive(Debug)]
pub(crate) struct PatientRegistrar {
    fillers: FillerRegistry,
    strict: bool,
    state: RwLock<PatientState>,
}

/// What to instantiate and where to find its template.
pub(crate) struct TemplateRequest<'a> {
    pub(crate) variant: Variant,
    pub(crate) family: TemplateFamily,
    pub(crate) template_dir: &'a Path,
    pub(crate) args: &'a FillerArgs,
}

impl PatientRegistrar {
    pub(crate) fn new(fillers: FillerRegistry, strict: bool, rules: RuleRegistry) -> Self {
        Self {
            fillers,
            strict,
            state: RwLock::new(PatientState {
                documents: DocumentIndex::new("patient"),
                rules,
            }),
        }
    }

    pub(crate) fn fillers(&self) -> &FillerRegistry {
        &self.fillers
    }

    pub(crate) fn instantiate<C: DocumentCodec>(
        &self,
        codec: &C,
        request: &TemplateRequest<'_>,
    ) -> Result<Registration, RepositoryError> {
        let TemplateRequest {
            variant,
            family,
            template_dir,
            args,
        } = *request;

        let filler = self
            .fillers
            .get(family)
            .ok_or(RepositoryError::UnknownFamily { family })?;
        if let Some(parameter) = filler.first_missing_parameter(args) {
            return Err(RepositoryError::MissingParameter { family, parameter });
        }
        if let Some((parameter, value)) = args.first_unsafe_value() {
            return Err(RepositoryError::UnsafeValue {
                family,
                parameter,
                value: value.to_owned(),
            });
        }

        let source = select_template(template_dir, variant, family)?;
        debug!(path = %source.display(), %family, %variant, "read patient template");
        let text = read_text(&source)?;

        let text = fill_subject(&text, &args.subject_id);
        let filled = filler.fill(&text, args);
        if let Some(&placeholder) = filled.missing.first() {
            if self.strict {
                return Err(RepositoryError::PlaceholderMissing {
                    family,
                    variant,
                    path: source,
                    placeholder,
                });
            }
            for placeholder in &filled.missing {
                warn!(path = %source.display(), %family, placeholder, "placeholder not found in template");
            }
        }

        let document = Arc::new(decode(codec, &source, &filled.text)?);

        let outcome = {
            let mut state = self.state.write();
            let outcome = state.documents.insert(&source, Arc::clone(&document));
            state.rules.register(&source, &document);
            outcome
        };

        Ok(Registration {
            document,
            outcome,
            source,
        })
    }

    pub(crate) fn get(&self, id: &DocumentId) -> Option<Arc<PolicyDocument>> {
        self.state.read().documents.get(id).cloned()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<PolicyDocument>> {
        self.state.read().documents.snapshot()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub(crate) fn contains_rule(&self, rule_id: &str) -> bool {
        self.state.read().rules.contains(rule_id)
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.state.read().rules.len()
    }
}

/// Exactly one template file must match the family prefix.
fn select_template(
    dir: &Path,
    variant: Variant,
    family: TemplateFamily,
) -> Result<PathBuf, RepositoryError> {
    let mut matches = discover::family_templates(dir, family)?;
    if matches.len() != 1 {
        return Err(RepositoryError::TemplateSelection {
            family,
            variant,
            found: matches.len(),
        });
    }
    Ok(matches.remove(0))
}
