use std::fmt;
use std::str::FromStr;

const ACCESS_LEVEL_PREFIX: &str = "urn:e-health-suisse:2015:policies:access-level:";
const PROVIDE_LEVEL_PREFIX: &str = "urn:e-health-suisse:2015:policies:provide-level:";

/// Read access level granted to healthcare professionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    Normal,
    Restricted,
    DelegationAndRestricted,
    DelegationAndNormal,
    Full,
    ExclusionList,
}

impl AccessLevel {
    /// The URN substituted into policy templates.
    #[must_use]
    pub fn as_urn(self) -> &'static str {
        match self {
            AccessLevel::Normal => "urn:e-health-suisse:2015:policies:access-level:normal",
            AccessLevel::Restricted => "urn:e-health-suisse:2015:policies:access-level:restricted",
            AccessLevel::DelegationAndRestricted => {
                "urn:e-health-suisse:2015:policies:access-level:delegation-and-restricted"
            }
            AccessLevel::DelegationAndNormal => {
                "urn:e-health-suisse:2015:policies:access-level:delegation-and-normal"
            }
            AccessLevel::Full => "urn:e-health-suisse:2015:policies:access-level:full",
            // Not under the access-level namespace.
            AccessLevel::ExclusionList => "urn:e-health-suisse:2015:policies:exclusion-list",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_urn())
    }
}

/// Error returned when a string is not a known level URN or short name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownLevel {
    kind: &'static str,
    value: String,
}

impl FromStr for AccessLevel {
    type Err = UnknownLevel;

    /// Accepts either the full URN or the short suffix (`"normal"`, `"full"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix(ACCESS_LEVEL_PREFIX).unwrap_or(s);
        match short {
            "normal" => Ok(AccessLevel::Normal),
            "restricted" => Ok(AccessLevel::Restricted),
            "delegation-and-restricted" => Ok(AccessLevel::DelegationAndRestricted),
            "delegation-and-normal" => Ok(AccessLevel::DelegationAndNormal),
            "full" => Ok(AccessLevel::Full),
            "exclusion-list" | "urn:e-health-suisse:2015:policies:exclusion-list" => {
                Ok(AccessLevel::ExclusionList)
            }
            _ => Err(UnknownLevel {
                kind: "access level",
                value: s.to_owned(),
            }),
        }
    }
}

/// Default confidentiality assigned to documents a patient provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvideLevel {
    Normal,
    Restricted,
    Secret,
}

impl ProvideLevel {
    #[must_use]
    pub fn as_urn(self) -> &'static str {
        match self {
            ProvideLevel::Normal => "urn:e-health-suisse:2015:policies:provide-level:normal",
            ProvideLevel::Restricted => "urn:e-health-suisse:2015:policies:provide-level:restricted",
            ProvideLevel::Secret => "urn:e-health-suisse:2015:policies:provide-level:secret",
        }
    }
}

impl fmt::Display for ProvideLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_urn())
    }
}

impl FromStr for ProvideLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(PROVIDE_LEVEL_PREFIX).unwrap_or(s) {
            "normal" => Ok(ProvideLevel::Normal),
            "restricted" => Ok(ProvideLevel::Restricted),
            "secret" => Ok(ProvideLevel::Secret),
            _ => Err(UnknownLevel {
                kind: "provide level",
                value: s.to_owned(),
            }),
        }
    }
}
