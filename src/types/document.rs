use std::fmt;

use super::identity::DocumentId;
use crate::codec::XmlElement;

/// Whether a document is a single policy or a policy set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Policy,
    PolicySet,
}

/// Rule effect as declared in the `Effect` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Permit,
    Deny,
}

/// A named decision unit nested inside a policy.
///
/// Only the identifier is interpreted here; conditions and targets stay in the
/// element tree for the decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub id: String,
    pub effect: Effect,
}

/// A decoded policy or policy set, ready to be handed to the decision engine.
///
/// Documents are immutable once decoded and are shared between the indices and
/// callers as `Arc<PolicyDocument>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    pub(crate) id: DocumentId,
    pub(crate) kind: DocumentKind,
    pub(crate) rules: Vec<PolicyRule>,
    pub(crate) children: Vec<PolicyDocument>,
    pub(crate) references: Vec<DocumentId>,
    pub(crate) element: XmlElement,
}

impl PolicyDocument {
    /// Start a document without rules, children or references. Used by
    /// codecs other than [`XacmlCodec`](crate::XacmlCodec).
    pub fn new(id: impl Into<DocumentId>, kind: DocumentKind, element: XmlElement) -> Self {
        Self {
            id: id.into(),
            kind,
            rules: Vec::new(),
            children: Vec::new(),
            references: Vec::new(),
            element,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<PolicyDocument>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<DocumentId>) -> Self {
        self.references = references;
        self
    }

    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Rules of a policy in document order. Always empty for policy sets.
    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Identifier of the first rule of a policy.
    ///
    /// Returns `None` for policy sets and for policies without rules. This is
    /// the only rule identifier tracked for duplicate detection.
    #[must_use]
    pub fn first_rule_id(&self) -> Option<&str> {
        match self.kind {
            DocumentKind::Policy => self.rules.first().map(|r| r.id.as_str()),
            DocumentKind::PolicySet => None,
        }
    }

    /// Policies and policy sets nested inline in a policy set.
    #[must_use]
    pub fn children(&self) -> &[PolicyDocument] {
        &self.children
    }

    /// Ids named by `PolicyIdReference` / `PolicySetIdReference` children.
    #[must_use]
    pub fn references(&self) -> &[DocumentId] {
        &self.references
    }

    /// The decoded element tree this document was built from.
    #[must_use]
    pub fn element(&self) -> &XmlElement {
        &self.element
    }
}

impl fmt::Display for PolicyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DocumentKind::Policy => "Policy",
            DocumentKind::PolicySet => "PolicySet",
        };
        write!(
            f,
            "{kind}({}, {} rules, {} children, {} references)",
            self.id,
            self.rules.len(),
            self.children.len(),
            self.references.len(),
        )
    }
}
