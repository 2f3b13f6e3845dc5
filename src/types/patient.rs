use chrono::NaiveDate;

use super::family::TemplateFamily;
use super::level::{AccessLevel, ProvideLevel};
use crate::filler::FillerArgs;

/// Typed onboarding parameters, one variant per template family.
///
/// Converted into [`FillerArgs`] before instantiation, so each family accepts
/// exactly the values its template needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientPolicy {
    /// 201: general consent.
    Consent,
    /// 202: emergency access level.
    EmergencyAccess { level: AccessLevel },
    /// 203: default provide level.
    ProvideLevel { level: ProvideLevel },
    /// 301: access for one healthcare professional, identified by GLN.
    HealthcareProfessional {
        gln: String,
        until: NaiveDate,
        level: AccessLevel,
    },
    /// 302: access for a group, identified by OID.
    Group {
        group_oid: String,
        until: NaiveDate,
        level: AccessLevel,
    },
    /// 303: access for a representative.
    Representative {
        representative_id: String,
        until: NaiveDate,
    },
    /// 304: time-boxed delegation to a healthcare professional.
    Delegation {
        gln: String,
        from: NaiveDate,
        until: NaiveDate,
        level: AccessLevel,
    },
}

impl PatientPolicy {
    #[must_use]
    pub fn family(&self) -> TemplateFamily {
        match self {
            PatientPolicy::Consent => TemplateFamily::CONSENT,
            PatientPolicy::EmergencyAccess { .. } => TemplateFamily::EMERGENCY_ACCESS,
            PatientPolicy::ProvideLevel { .. } => TemplateFamily::PROVIDE_LEVEL,
            PatientPolicy::HealthcareProfessional { .. } => TemplateFamily::HEALTHCARE_PROFESSIONAL,
            PatientPolicy::Group { .. } => TemplateFamily::GROUP,
            PatientPolicy::Representative { .. } => TemplateFamily::REPRESENTATIVE,
            PatientPolicy::Delegation { .. } => TemplateFamily::DELEGATION,
        }
    }

    /// Build the filler arguments for `subject_id`.
    #[must_use]
    pub fn args(&self, subject_id: &str) -> FillerArgs {
        let args = FillerArgs::new(subject_id);
        match self {
            PatientPolicy::Consent => args,
            PatientPolicy::EmergencyAccess { level } => args.level(level),
            PatientPolicy::ProvideLevel { level } => args.level(level),
            PatientPolicy::HealthcareProfessional { gln, until, level } => args
                .organization_id(gln.as_str())
                .valid_until(*until)
                .level(level),
            PatientPolicy::Group {
                group_oid,
                until,
                level,
            } => args
                .organization_id(group_oid.as_str())
                .valid_until(*until)
                .level(level),
            PatientPolicy::Representative {
                representative_id,
                until,
            } => args
                .organization_id(representative_id.as_str())
                .valid_until(*until),
            PatientPolicy::Delegation {
                gln,
                from,
                until,
                level,
            } => args
                .organization_id(gln.as_str())
                .valid_from(*from)
                .valid_until(*until)
                .level(level),
        }
    }
}
