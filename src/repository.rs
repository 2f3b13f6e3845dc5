use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::{DocumentCodec, XacmlCodec};
use crate::config::RepositoryConfig;
use crate::discover;
use crate::error::RepositoryError;
use crate::filler::{FillerArgs, FillerRegistry};
use crate::registrar::{PatientRegistrar, Registration, TemplateRequest};
use crate::rules::RuleRegistry;
use crate::store::TemplateStore;
use crate::types::{
    DecisionRequest, DocumentId, PatientPolicy, PolicyDocument, TemplateFamily, Variant,
};

/// Source of policy documents for a decision engine.
pub trait PolicyRetrievalPoint {
    /// Look up a single document by identity.
    fn get_evaluatable(&self, id: &DocumentId) -> Option<Arc<PolicyDocument>>;

    /// Documents applicable to `request`.
    fn get_evaluatables(&self, request: &DecisionRequest) -> Vec<Arc<PolicyDocument>>;
}

/// Builder for a [`PolicyRepository`].
///
/// # Example
///
/// ```no_run
/// use epr_policies::{PolicyRepositoryBuilder, RepositoryConfig};
///
/// let repository = PolicyRepositoryBuilder::new(RepositoryConfig::with_root("policy-stack"))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct PolicyRepositoryBuilder<C = XacmlCodec> {
    config: RepositoryConfig,
    fillers: FillerRegistry,
    codec: C,
}

impl PolicyRepositoryBuilder<XacmlCodec> {
    /// Standard fillers and the built-in XACML codec.
    #[must_use]
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            config,
            fillers: FillerRegistry::standard(),
            codec: XacmlCodec,
        }
    }
}

impl<C: DocumentCodec> PolicyRepositoryBuilder<C> {
    #[must_use]
    pub fn fillers(mut self, fillers: FillerRegistry) -> Self {
        self.fillers = fillers;
        self
    }

    /// Decode documents with the decision engine's own codec.
    #[must_use]
    pub fn codec<D: DocumentCodec>(self, codec: D) -> PolicyRepositoryBuilder<D> {
        PolicyRepositoryBuilder {
            config: self.config,
            fillers: self.fillers,
            codec,
        }
    }

    /// Load the base policies of both variants and check that every patient
    /// template has a registered filler.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Initialization`] if any base policy cannot be
    /// read or decoded, and [`RepositoryError::UnregisteredFamily`] if a
    /// template family has no filler.
    pub fn build(self) -> Result<PolicyRepository<C>, RepositoryError> {
        let mut rules = RuleRegistry::default();
        let base = TemplateStore::load(&self.config, &self.codec, &mut rules)?;
        check_template_families(&self.config, &self.fillers)?;

        info!(
            base_policies = base.len(),
            rule_ids = rules.len(),
            "policy repository ready"
        );

        Ok(PolicyRepository {
            patients: PatientRegistrar::new(
                self.fillers,
                self.config.strict_placeholders,
                rules,
            ),
            config: self.config,
            codec: self.codec,
            base,
        })
    }
}

/// Every template file named `<digits>-*.xml` must belong to a registered family.
fn check_template_families(
    config: &RepositoryConfig,
    fillers: &FillerRegistry,
) -> Result<(), RepositoryError> {
    for variant in Variant::ALL {
        let dir = config.template_path(variant);
        if !dir.is_dir() {
            warn!(path = %dir.display(), %variant, "patient template directory missing");
            continue;
        }
        for path in discover::xml_files(&dir)? {
            let family = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(TemplateFamily::from_file_name);
            match family {
                Some(family) if !fillers.contains(family) => {
                    return Err(RepositoryError::UnregisteredFamily {
                        family,
                        variant,
                        path,
                    });
                }
                Some(_) => {}
                None => debug!(path = %path.display(), "not a family template"),
            }
        }
    }
    Ok(())
}

/// Number of template files matching one family in one variant's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCoverage {
    pub variant: Variant,
    pub family: TemplateFamily,
    pub directory: PathBuf,
    pub found: usize,
}

impl TemplateCoverage {
    /// Onboarding for this family and variant can only succeed with exactly one match.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.found == 1
    }
}

/// Base and patient policy indices behind a [`PolicyRetrievalPoint`].
///
/// Thread-safe and designed to live behind `Arc`: lookups run concurrently,
/// onboarding calls serialize only on the index insert.
#[derive(Debug)]
pub struct PolicyRepository<C = XacmlCodec> {
    config: RepositoryConfig,
    codec: C,
    base: TemplateStore,
    patients: PatientRegistrar,
}

impl PolicyRepository<XacmlCodec> {
    /// Load a repository with the standard fillers and the built-in codec.
    ///
    /// # Errors
    ///
    /// See [`PolicyRepositoryBuilder::build`].
    pub fn open(config: RepositoryConfig) -> Result<Self, RepositoryError> {
        PolicyRepositoryBuilder::new(config).build()
    }
}

impl<C: DocumentCodec> PolicyRepository<C> {
    /// Instantiate `family`'s template for one patient and register it.
    ///
    /// The subject placeholder attribute is replaced first, then the family's
    /// filler runs. The resulting document replaces any patient document with
    /// the same identity.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::TemplateSelection`] unless exactly one
    /// template matches, [`RepositoryError::MissingParameter`] if `args` lack
    /// a value the family needs, [`RepositoryError::UnsafeValue`] if a value
    /// contains `"`, `<` or `&`, and read/parse errors for the template. The
    /// patient index is unchanged on error.
    pub fn instantiate(
        &self,
        variant: Variant,
        family: TemplateFamily,
        args: &FillerArgs,
    ) -> Result<Registration, RepositoryError> {
        let template_dir = self.config.template_source(variant, family);
        self.patients.instantiate(
            &self.codec,
            &TemplateRequest {
                variant,
                family,
                template_dir: &template_dir,
                args,
            },
        )
    }

    /// Typed onboarding entry point for one patient policy.
    ///
    /// `subject_id` is inserted into the template unescaped, so it must not
    /// contain `"`, `<` or `&`.
    ///
    /// # Errors
    ///
    /// See [`instantiate`](Self::instantiate).
    pub fn add_patient_policy(
        &self,
        variant: Variant,
        subject_id: &str,
        policy: &PatientPolicy,
    ) -> Result<Registration, RepositoryError> {
        self.instantiate(variant, policy.family(), &policy.args(subject_id))
    }

    /// Count matching template files for every registered family in both variants.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MissingDirectory`] if a template tree is absent.
    pub fn template_coverage(&self) -> Result<Vec<TemplateCoverage>, RepositoryError> {
        let mut coverage = Vec::new();
        for variant in Variant::ALL {
            for family in self.patients.fillers().families() {
                let directory = self.config.template_source(variant, family);
                let found = discover::family_templates(&directory, family)?.len();
                coverage.push(TemplateCoverage {
                    variant,
                    family,
                    directory,
                    found,
                });
            }
        }
        Ok(coverage)
    }

    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    #[must_use]
    pub fn base(&self) -> &TemplateStore {
        &self.base
    }

    /// Number of patient documents currently registered.
    #[must_use]
    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Whether `rule_id` has been seen as a first rule of any registered document.
    #[must_use]
    pub fn contains_rule_id(&self, rule_id: &str) -> bool {
        self.patients.contains_rule(rule_id)
    }

    /// Number of distinct first-rule ids across base and patient documents.
    #[must_use]
    pub fn rule_id_count(&self) -> usize {
        self.patients.rule_count()
    }
}

impl<C: DocumentCodec> PolicyRetrievalPoint for PolicyRepository<C> {
    /// Base index first, then the patient index. A patient document never
    /// shadows a base document with the same identity.
    fn get_evaluatable(&self, id: &DocumentId) -> Option<Arc<PolicyDocument>> {
        self.base
            .get(id)
            .cloned()
            .or_else(|| self.patients.get(id))
    }

    /// Snapshot of every patient document.
    ///
    /// The request is not used for filtering: all patient documents are
    /// returned regardless of subject or resource.
    fn get_evaluatables(&self, _request: &DecisionRequest) -> Vec<Arc<PolicyDocument>> {
        self.patients.snapshot()
    }
}

impl<C> fmt::Display for PolicyRepository<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PolicyRepository({} base policies, {} patient policies)",
            self.base.len(),
            self.patients.len(),
        )
    }
}
