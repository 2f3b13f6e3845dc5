use std::fmt;

/// Numeric category of patient-specific policy templates.
///
/// Template files are matched by the `"<family>-"` filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateFamily(u16);

impl TemplateFamily {
    /// General consent.
    pub const CONSENT: Self = Self(201);
    /// Emergency access level.
    pub const EMERGENCY_ACCESS: Self = Self(202);
    /// Default confidentiality of provided documents.
    pub const PROVIDE_LEVEL: Self = Self(203);
    /// Access right granted to a single healthcare professional.
    pub const HEALTHCARE_PROFESSIONAL: Self = Self(301);
    /// Access right granted to a group of healthcare professionals.
    pub const GROUP: Self = Self(302);
    /// Access right granted to a representative.
    pub const REPRESENTATIVE: Self = Self(303);
    /// Time-boxed delegation to a healthcare professional.
    pub const DELEGATION: Self = Self(304);

    pub const ALL: [Self; 7] = [
        Self::CONSENT,
        Self::EMERGENCY_ACCESS,
        Self::PROVIDE_LEVEL,
        Self::HEALTHCARE_PROFESSIONAL,
        Self::GROUP,
        Self::REPRESENTATIVE,
        Self::DELEGATION,
    ];

    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u16 {
        self.0
    }

    /// Filename prefix identifying this family's template, e.g. `"201-"`.
    #[must_use]
    pub fn prefix(self) -> String {
        format!("{}-", self.0)
    }

    /// Extract the family from a template filename such as `201-consent.xml`.
    ///
    /// Returns `None` when the name does not start with digits followed by `-`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (digits, _) = name.split_once('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for TemplateFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regulatory revision of the policy stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Original,
    Modified,
}

impl Variant {
    pub const ALL: [Self; 2] = [Self::Original, Self::Modified];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Modified => "modified",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
