mod document;
mod family;
mod identity;
mod level;
mod patient;
mod request;

pub use document::{DocumentKind, Effect, PolicyDocument, PolicyRule};
pub use family::{TemplateFamily, Variant};
pub use identity::DocumentId;
pub use level::{AccessLevel, ProvideLevel, UnknownLevel};
pub use patient::PatientPolicy;
pub use request::DecisionRequest;
