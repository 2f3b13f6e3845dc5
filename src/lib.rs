//! Policy document repository for EPR access-control policies.
//!
//! Loads the base policy stack of the original and modified variants at
//! startup, instantiates patient-specific policies from templates by
//! placeholder substitution, and serves both through a
//! [`PolicyRetrievalPoint`].

pub mod codec;
mod config;
mod discover;
mod error;
pub mod filler;
mod index;
mod registrar;
mod repository;
mod rules;
mod store;
mod types;

pub use codec::{DecodeError, DocumentCodec, XacmlCodec, XmlElement, XmlNode};
pub use config::{ConfigError, RepositoryConfig};
pub use error::RepositoryError;
pub use filler::{FillerArgs, FillerRegistry, Parameter};
pub use index::InsertOutcome;
pub use registrar::Registration;
pub use repository::{
    PolicyRepository, PolicyRepositoryBuilder, PolicyRetrievalPoint, TemplateCoverage,
};
pub use store::TemplateStore;
pub use types::{
    AccessLevel, DecisionRequest, DocumentId, DocumentKind, Effect, PatientPolicy,
    PolicyDocument, PolicyRule, ProvideLevel, TemplateFamily, UnknownLevel, Variant,
};
