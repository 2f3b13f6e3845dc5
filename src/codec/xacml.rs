use super::error::DecodeError;
use super::tree::XmlElement;
use crate::types::{DocumentId, DocumentKind, Effect, PolicyDocument, PolicyRule};

/// Map a decoded element tree onto a policy document.
pub(crate) fn decode_element(element: &XmlElement) -> Result<PolicyDocument, DecodeError> {
    match element.local_name() {
        "Policy" => decode_policy(element),
        "PolicySet" => decode_policy_set(element),
        other => Err(DecodeError::new(format!(
            "expected a Policy or PolicySet element, found '{other}'"
        ))),
    }
}

fn required_attribute<'a>(element: &'a XmlElement, name: &str) -> Result<&'a str, DecodeError> {
    element.attribute(name).ok_or_else(|| {
        DecodeError::new(format!(
            "<{}> is missing the {name} attribute",
            element.name
        ))
    })
}

fn decode_policy(element: &XmlElement) -> Result<PolicyDocument, DecodeError> {
    let id = required_attribute(element, "PolicyId")?;
    let rules = element
        .child_elements()
        .filter(|child| child.local_name() == "Rule")
        .map(decode_rule)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PolicyDocument::new(id, DocumentKind::Policy, element.clone()).with_rules(rules))
}

fn decode_rule(element: &XmlElement) -> Result<PolicyRule, DecodeError> {
    let id = required_attribute(element, "RuleId")?;
    let effect = match required_attribute(element, "Effect")? {
        "Permit" => Effect::Permit,
        "Deny" => Effect::Deny,
        other => {
            return Err(DecodeError::new(format!(
                "rule '{id}' has unknown effect '{other}'"
            )))
        }
    };
    Ok(PolicyRule {
        id: id.to_owned(),
        effect,
    })
}

fn decode_policy_set(element: &XmlElement) -> Result<PolicyDocument, DecodeError> {
    let id = required_attribute(element, "PolicySetId")?;
    let mut children = Vec::new();
    let mut references = Vec::new();

    for child in element.child_elements() {
        match child.local_name() {
            "Policy" | "PolicySet" => children.push(decode_element(child)?),
            "PolicyIdReference" | "PolicySetIdReference" => {
                references.push(DocumentId::new(child.text()));
            }
            _ => {}
        }
    }

    Ok(PolicyDocument::new(id, DocumentKind::PolicySet, element.clone())
        .with_children(children)
        .with_references(references))
}
