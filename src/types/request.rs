/// Request context passed by the decision engine when it asks for the
/// applicable patient policies.
///
/// [`PolicyRetrievalPoint::get_evaluatables`](crate::PolicyRetrievalPoint::get_evaluatables)
/// currently ignores it and returns every patient policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionRequest {
    pub subject_id: Option<String>,
    pub resource_id: Option<String>,
    pub action_id: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl DecisionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn action(mut self, id: impl Into<String>) -> Self {
        self.action_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}
