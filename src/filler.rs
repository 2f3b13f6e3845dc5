//! Placeholder substitution for patient policy templates.
//!
//! Every template family has a fixed table of [`Substitution`]s. Filling a
//! template applies each entry as an unconditional literal replacement: a
//! placeholder that does not occur in the text is skipped without error and
//! reported in [`Filled::missing`], so callers can decide whether drift in a
//! template revision matters to them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::types::TemplateFamily;

/// Attribute-value placeholder replaced by the subject id in every template.
pub const SUBJECT_ATTRIBUTE_PLACEHOLDER: &str = "=\"epr-spid-goes-here\"";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Characters that would alter the markup or entity text of a filled template.
const UNSAFE_CHARS: [char; 3] = ['"', '<', '&'];

/// A runtime value a template family may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    SubjectId,
    /// GLN, group OID or representative id, depending on the family.
    OrganizationId,
    ValidFrom,
    ValidUntil,
    /// Access-level or provide-level URN.
    Level,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::SubjectId => "subject id",
            Parameter::OrganizationId => "organization id",
            Parameter::ValidFrom => "valid-from date",
            Parameter::ValidUntil => "valid-until date",
            Parameter::Level => "level",
        };
        f.write_str(name)
    }
}

/// Values substituted into a template.
///
/// Which fields must be present depends on the family; see
/// [`Filler::parameters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillerArgs {
    pub subject_id: String,
    pub organization_id: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub level: Option<String>,
}

impl FillerArgs {
    /// Values are inserted into the template text verbatim. Onboarding
    /// rejects values containing `"`, `<` or `&`; see
    /// [`first_unsafe_value`](Self::first_unsafe_value).
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn valid_from(mut self, date: NaiveDate) -> Self {
        self.valid_from = Some(date);
        self
    }

    #[must_use]
    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    #[must_use]
    pub fn level(mut self, level: impl fmt::Display) -> Self {
        self.level = Some(level.to_string());
        self
    }

    /// The formatted replacement text for a parameter, if set.
    fn value(&self, parameter: Parameter) -> Option<String> {
        match parameter {
            Parameter::SubjectId => Some(self.subject_id.clone()),
            Parameter::OrganizationId => self.organization_id.clone(),
            Parameter::ValidFrom => self.valid_from.map(|d| d.format(DATE_FORMAT).to_string()),
            Parameter::ValidUntil => self.valid_until.map(|d| d.format(DATE_FORMAT).to_string()),
            Parameter::Level => self.level.clone(),
        }
    }

    /// The first text value that cannot be inserted without escaping.
    #[must_use]
    pub fn first_unsafe_value(&self) -> Option<(Parameter, &str)> {
        [
            (Parameter::SubjectId, Some(self.subject_id.as_str())),
            (Parameter::OrganizationId, self.organization_id.as_deref()),
            (Parameter::Level, self.level.as_deref()),
        ]
        .into_iter()
        .find_map(|(parameter, value)| {
            value
                .filter(|v| v.contains(&UNSAFE_CHARS[..]))
                .map(|v| (parameter, v))
        })
    }

    fn has(&self, parameter: Parameter) -> bool {
        match parameter {
            Parameter::SubjectId => true,
            Parameter::OrganizationId => self.organization_id.is_some(),
            Parameter::ValidFrom => self.valid_from.is_some(),
            Parameter::ValidUntil => self.valid_until.is_some(),
            Parameter::Level => self.level.is_some(),
        }
    }
}

/// One literal placeholder and the parameter that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: &'static str,
    pub parameter: Parameter,
    prefix: &'static str,
    suffix: &'static str,
}

impl Substitution {
    /// Replace `placeholder` with the parameter value as-is.
    #[must_use]
    pub const fn literal(placeholder: &'static str, parameter: Parameter) -> Self {
        Self {
            placeholder,
            parameter,
            prefix: "",
            suffix: "",
        }
    }

    /// Replace `placeholder` with `prefix + value + suffix`, for placeholders
    /// that include their surrounding delimiters.
    #[must_use]
    pub const fn enclosed(
        placeholder: &'static str,
        parameter: Parameter,
        prefix: &'static str,
        suffix: &'static str,
    ) -> Self {
        Self {
            placeholder,
            parameter,
            prefix,
            suffix,
        }
    }
}

const ACCESS_LEVEL_NORMAL: &str = "urn:e-health-suisse:2015:policies:access-level:normal";
const TEMPLATE_UNTIL: &str = "2016-02-07";

const CONSENT: &[Substitution] = &[Substitution::enclosed(
    ">\"epd-spid-goes-here\"<",
    Parameter::SubjectId,
    ">",
    "<",
)];

const EMERGENCY_ACCESS: &[Substitution] =
    &[Substitution::literal(ACCESS_LEVEL_NORMAL, Parameter::Level)];

const PROVIDE_LEVEL: &[Substitution] = &[Substitution::literal(
    "urn:e-health-suisse:2015:policies:provide-level:normal",
    Parameter::Level,
)];

const HEALTHCARE_PROFESSIONAL: &[Substitution] = &[
    Substitution::literal("2.999", Parameter::OrganizationId),
    Substitution::literal(TEMPLATE_UNTIL, Parameter::ValidUntil),
    Substitution::literal(
        "urn:e-health-suisse:2015:policies:exclusion-list",
        Parameter::Level,
    ),
];

const GROUP: &[Substitution] = &[
    Substitution::literal("urn:oid:2.999", Parameter::OrganizationId),
    Substitution::literal(TEMPLATE_UNTIL, Parameter::ValidUntil),
    Substitution::literal(ACCESS_LEVEL_NORMAL, Parameter::Level),
];

const REPRESENTATIVE: &[Substitution] = &[
    Substitution::literal("2.999", Parameter::OrganizationId),
    Substitution::literal(TEMPLATE_UNTIL, Parameter::ValidUntil),
];

const DELEGATION: &[Substitution] = &[
    Substitution::literal("2.999", Parameter::OrganizationId),
    Substitution::literal("2023-02-01", Parameter::ValidFrom),
    Substitution::literal("2023-02-28", Parameter::ValidUntil),
    Substitution::literal(
        "urn:e-health-suisse:2015:policies:access-level:delegation-and-normal",
        Parameter::Level,
    ),
];

/// Result of filling a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filled {
    pub text: String,
    /// Placeholders of the table that did not occur in the text at the time
    /// their substitution ran.
    pub missing: Vec<&'static str>,
}

/// The substitution table of one template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filler {
    substitutions: &'static [Substitution],
}

impl Filler {
    #[must_use]
    pub const fn new(substitutions: &'static [Substitution]) -> Self {
        Self { substitutions }
    }

    #[must_use]
    pub fn substitutions(&self) -> &'static [Substitution] {
        self.substitutions
    }

    /// Parameters this family needs, including the subject id, without duplicates.
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = vec![Parameter::SubjectId];
        for s in self.substitutions {
            if !params.contains(&s.parameter) {
                params.push(s.parameter);
            }
        }
        params
    }

    /// Returns the first required parameter absent from `args`.
    #[must_use]
    pub fn first_missing_parameter(&self, args: &FillerArgs) -> Option<Parameter> {
        self.parameters().into_iter().find(|p| !args.has(*p))
    }

    /// Apply the table to `text`, in order.
    ///
    /// Pure and infallible. Entries whose parameter is unset in `args` leave
    /// their placeholder untouched.
    #[must_use]
    pub fn fill(&self, text: &str, args: &FillerArgs) -> Filled {
        let mut text = text.to_owned();
        let mut missing = Vec::new();
        for s in self.substitutions {
            if !text.contains(s.placeholder) {
                missing.push(s.placeholder);
                continue;
            }
            let Some(value) = args.value(s.parameter) else {
                continue;
            };
            let replacement = format!("{}{value}{}", s.prefix, s.suffix);
            text = text.replace(s.placeholder, &replacement);
        }
        Filled { text, missing }
    }
}

/// Replace the subject attribute placeholder with `subject_id`.
///
/// The subject id is inserted literally; it is not interpreted as a pattern.
#[must_use]
pub fn fill_subject(text: &str, subject_id: &str) -> String {
    text.replace(SUBJECT_ATTRIBUTE_PLACEHOLDER, &format!("=\"{subject_id}\""))
}

/// Lookup table from template family to its filler.
#[derive(Debug, Clone, Default)]
pub struct FillerRegistry {
    fillers: BTreeMap<TemplateFamily, Filler>,
}

impl FillerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven EPR template families, shared by both variants.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .register(TemplateFamily::CONSENT, CONSENT)
            .register(TemplateFamily::EMERGENCY_ACCESS, EMERGENCY_ACCESS)
            .register(TemplateFamily::PROVIDE_LEVEL, PROVIDE_LEVEL)
            .register(TemplateFamily::HEALTHCARE_PROFESSIONAL, HEALTHCARE_PROFESSIONAL)
            .register(TemplateFamily::GROUP, GROUP)
            .register(TemplateFamily::REPRESENTATIVE, REPRESENTATIVE)
            .register(TemplateFamily::DELEGATION, DELEGATION)
    }

    /// Register (or replace) the table for `family`.
    #[must_use]
    pub fn register(mut self, family: TemplateFamily, table: &'static [Substitution]) -> Self {
        self.fillers.insert(family, Filler::new(table));
        self
    }

    #[must_use]
    pub fn get(&self, family: TemplateFamily) -> Option<&Filler> {
        self.fillers.get(&family)
    }

    #[must_use]
    pub fn contains(&self, family: TemplateFamily) -> bool {
        self.fillers.contains_key(&family)
    }

    /// Registered families in ascending order.
    pub fn families(&self) -> impl Iterator<Item = TemplateFamily> + '_ {
        self.fillers.keys().copied()
    }
}
