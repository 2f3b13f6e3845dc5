
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use epr_policies::{
    AccessLevel, DecisionRequest, DecodeError, DocumentCodec, DocumentId, DocumentKind,
    FillerArgs, InsertOutcome, Parameter, PatientPolicy, PolicyDocument, PolicyRepository,
    PolicyRepositoryBuilder, PolicyRetrievalPoint, RepositoryError, TemplateFamily, Variant,
    XacmlCodec,
};
use fixtures::{delegation_template, policy_xml, Fixture, CONSENT_TEMPLATE, GROUP_TEMPLATE};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn id(s: &str) -> DocumentId {
    DocumentId::new(s)
}

#[test]
fn consent_onboarding_end_to_end() {
    let fx = Fixture::new();
    fx.base(Variant::Original, "base-1.xml", &policy_xml("urn:base:1", &["R1"]));
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    let registration = repo
        .add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    assert_eq!(registration.outcome, InsertOutcome::Inserted);
    assert!(registration.source.ends_with("201-consent.xml"));

    let doc = repo.get_evaluatable(&id("abc")).unwrap();
    assert_eq!(doc.kind(), DocumentKind::Policy);
    let subject = doc
        .element()
        .descendants()
        .into_iter()
        .find(|e| e.local_name() == "Subject")
        .unwrap();
    assert_eq!(subject.attribute("SubjectId"), Some("abc"));
    let value = subject.child_elements().next().unwrap();
    assert_eq!(value.text(), "abc");

    let all = repo.get_evaluatables(&DecisionRequest::new());
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id(), &id("abc"));

    assert!(repo.get_evaluatable(&id("urn:base:1")).is_some());
    assert!(repo.contains_rule_id("R1"));
    assert!(repo.contains_rule_id("urn:e-health-suisse:2015:policies:201:rule-1"));
}

#[test]
fn no_matching_template_is_a_selection_error() {
    let fx = Fixture::new();
    fx.template(Variant::Modified, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    let err = repo
        .instantiate(Variant::Original, TemplateFamily::CONSENT, &FillerArgs::new("abc"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::TemplateSelection {
            family: TemplateFamily::CONSENT,
            variant: Variant::Original,
            found: 0,
        }
    ));
    assert_eq!(
        err.to_string(),
        "expected exactly 1 template with the ID 201 in the original tree, found 0"
    );
    assert_eq!(repo.patient_count(), 0);
}

#[test]
fn ambiguous_template_is_a_selection_error() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-a.xml", CONSENT_TEMPLATE);
    fx.template(Variant::Original, "nested/201-b.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    let err = repo
        .instantiate(Variant::Original, TemplateFamily::CONSENT, &FillerArgs::new("abc"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::TemplateSelection { found: 2, .. }
    ));
    assert_eq!(repo.patient_count(), 0);
}

#[test]
fn reonboarding_replaces_document() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    let first = repo
        .add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    let second = repo
        .add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    assert!(!first.replaced());
    assert!(second.replaced());
    assert_eq!(repo.patient_count(), 1);
}

#[test]
fn base_document_wins_over_patient_document() {
    let fx = Fixture::new();
    fx.base(Variant::Original, "abc.xml", &policy_xml("abc", &["base-rule"]));
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    repo.add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    assert_eq!(repo.patient_count(), 1);

    let doc = repo.get_evaluatable(&id("abc")).unwrap();
    assert_eq!(doc.first_rule_id(), Some("base-rule"));
}

#[test]
fn unknown_identity_is_absent() {
    let fx = Fixture::new();
    let repo = fx.open();
    assert!(repo.get_evaluatable(&id("nobody")).is_none());
    assert!(repo.get_evaluatables(&DecisionRequest::new()).is_empty());
}

#[test]
fn enumeration_is_a_snapshot() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    repo.add_patient_policy(Variant::Original, "p1", &PatientPolicy::Consent)
        .unwrap();
    let snapshot = repo.get_evaluatables(&DecisionRequest::new());
    repo.add_patient_policy(Variant::Original, "p2", &PatientPolicy::Consent)
        .unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(repo.get_evaluatables(&DecisionRequest::new()).len(), 2);
}

#[test]
fn enumeration_ignores_request_contents() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();
    for subject in ["p1", "p2", "p3"] {
        repo.add_patient_policy(Variant::Original, subject, &PatientPolicy::Consent)
            .unwrap();
    }

    let request = DecisionRequest::new()
        .subject("p1")
        .resource("urn:e-health-suisse:2015:epr-spid:p1")
        .action("urn:ihe:iti:2007:RegistryStoredQuery")
        .attribute("urn:e-health-suisse:2015:epr-spid", "p1");
    let ids: Vec<_> = repo
        .get_evaluatables(&request)
        .iter()
        .map(|d| d.id().to_string())
        .collect();
    assert_eq!(ids, ["p1", "p2", "p3"]);
}

#[test]
fn shared_rule_ids_across_patients_do_not_fail() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    repo.add_patient_policy(Variant::Original, "p1", &PatientPolicy::Consent)
        .unwrap();
    repo.add_patient_policy(Variant::Original, "p2", &PatientPolicy::Consent)
        .unwrap();
    assert_eq!(repo.patient_count(), 2);
    assert_eq!(repo.rule_id_count(), 1);
}

#[test]
fn group_access_fills_every_placeholder() {
    let fx = Fixture::new();
    fx.template(Variant::Modified, "302-group.xml", GROUP_TEMPLATE);
    let repo = fx.open();

    let policy = PatientPolicy::Group {
        group_oid: "urn:oid:2.16.756.5.30.1".into(),
        until: date(2027, 6, 30),
        level: AccessLevel::Restricted,
    };
    let registration = repo
        .add_patient_policy(Variant::Modified, "761337610411353650", &policy)
        .unwrap();

    let doc = &registration.document;
    assert_eq!(doc.id(), &id("urn:fixture:302"));
    assert_eq!(doc.kind(), DocumentKind::PolicySet);
    assert_eq!(
        doc.references(),
        &[id("urn:e-health-suisse:2015:policies:access-level:restricted")]
    );

    let element = doc.element();
    let subject = element
        .descendants()
        .into_iter()
        .find(|e| e.local_name() == "Subject")
        .unwrap();
    assert_eq!(subject.attribute("PatientId"), Some("761337610411353650"));
    let values: Vec<_> = element
        .descendants()
        .into_iter()
        .filter(|e| e.local_name() == "AttributeValue")
        .map(|e| e.text())
        .collect();
    assert_eq!(values, ["urn:oid:2.16.756.5.30.1", "2027-06-30"]);
}

#[test]
fn missing_parameter_leaves_index_unchanged() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "304-delegation.xml", &delegation_template("o"));
    let repo = fx.open();

    let args = FillerArgs::new("abc")
        .organization_id("7601000000000")
        .valid_until(date(2024, 1, 1))
        .level(AccessLevel::DelegationAndNormal);
    let err = repo
        .instantiate(Variant::Original, TemplateFamily::DELEGATION, &args)
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::MissingParameter {
            family: TemplateFamily::DELEGATION,
            parameter: Parameter::ValidFrom,
        }
    ));
    assert_eq!(err.to_string(), "template family 304 requires a valid-from date");
    assert_eq!(repo.patient_count(), 0);
}

#[test]
fn broken_template_leaves_index_unchanged() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    fx.template(Variant::Modified, "201-consent.xml", "<Policy PolicyId=\"epr-spid-goes-here\">");
    let repo = fx.open();

    repo.add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    let err = repo
        .add_patient_policy(Variant::Modified, "def", &PatientPolicy::Consent)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Parse { .. }));
    assert_eq!(repo.patient_count(), 1);
    assert!(repo.get_evaluatable(&id("def")).is_none());
}

#[test]
fn unregistered_family_is_rejected_at_onboarding() {
    let fx = Fixture::new();
    let repo = fx.open();
    let err = repo
        .instantiate(Variant::Original, TemplateFamily::new(205), &FillerArgs::new("abc"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownFamily { .. }));
}

#[test]
fn subject_with_markup_characters_is_rejected() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    let repo = fx.open();

    for subject in ["a\"b", "a&amp;b", "a<b"] {
        let err = repo
            .add_patient_policy(Variant::Original, subject, &PatientPolicy::Consent)
            .unwrap_err();
        match err {
            RepositoryError::UnsafeValue {
                family,
                parameter,
                value,
            } => {
                assert_eq!(family, TemplateFamily::CONSENT);
                assert_eq!(parameter, Parameter::SubjectId);
                assert_eq!(value, subject);
            }
            other => panic!("expected UnsafeValue for {subject:?}, got {other:?}"),
        }
    }
    assert_eq!(repo.patient_count(), 0);
    assert!(repo.get_evaluatable(&id("a&b")).is_none());
}

#[test]
fn organization_id_with_markup_characters_is_rejected() {
    let fx = Fixture::new();
    fx.template(Variant::Modified, "302-group.xml", GROUP_TEMPLATE);
    let repo = fx.open();

    let policy = PatientPolicy::Group {
        group_oid: "urn:oid:1\"/><x".into(),
        until: date(2027, 6, 30),
        level: AccessLevel::Normal,
    };
    let err = repo
        .add_patient_policy(Variant::Modified, "abc", &policy)
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::UnsafeValue {
            parameter: Parameter::OrganizationId,
            ..
        }
    ));
    assert_eq!(repo.patient_count(), 0);
}

const REPRESENTATIVE_WITHOUT_DATE: &str = r#"<Policy PolicyId="urn:fixture:303">
  <Target><Subjects><Subject RepresentativeId="2.999"/></Subjects></Target>
  <Rule RuleId="urn:fixture:303:rule" Effect="Permit"/>
</Policy>"#;

fn representative() -> PatientPolicy {
    PatientPolicy::Representative {
        representative_id: "rep-42".into(),
        until: date(2026, 12, 31),
    }
}

#[test]
fn absent_placeholder_is_tolerated_by_default() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "303-rep.xml", REPRESENTATIVE_WITHOUT_DATE);
    let repo = fx.open();

    let registration = repo
        .add_patient_policy(Variant::Original, "abc", &representative())
        .unwrap();
    let subject = registration
        .document
        .element()
        .descendants()
        .into_iter()
        .find(|e| e.local_name() == "Subject")
        .unwrap();
    assert_eq!(subject.attribute("RepresentativeId"), Some("rep-42"));
}

#[test]
fn absent_placeholder_is_rejected_in_strict_mode() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "303-rep.xml", REPRESENTATIVE_WITHOUT_DATE);
    let repo = PolicyRepository::open(fx.config.clone().strict_placeholders(true)).unwrap();

    let err = repo
        .add_patient_policy(Variant::Original, "abc", &representative())
        .unwrap_err();
    match err {
        RepositoryError::PlaceholderMissing {
            family,
            variant,
            placeholder,
            ..
        } => {
            assert_eq!(family, TemplateFamily::REPRESENTATIVE);
            assert_eq!(variant, Variant::Original);
            assert_eq!(placeholder, "2016-02-07");
        }
        other => panic!("expected PlaceholderMissing, got {other:?}"),
    }
    assert_eq!(repo.patient_count(), 0);
}

fn delegation() -> PatientPolicy {
    PatientPolicy::Delegation {
        gln: "7601000000001".into(),
        from: date(2024, 3, 1),
        until: date(2024, 3, 31),
        level: AccessLevel::DelegationAndRestricted,
    }
}

#[test]
fn modified_delegation_reads_modified_tree() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "304-delegation.xml", &delegation_template("original"));
    let modified = fx.template(Variant::Modified, "304-delegation.xml", &delegation_template("modified"));
    let repo = fx.open();

    let registration = repo
        .add_patient_policy(Variant::Modified, "abc", &delegation())
        .unwrap();
    assert_eq!(registration.source, modified);
    assert_eq!(registration.document.id(), &id("urn:fixture:304:modified"));

    let env = registration
        .document
        .element()
        .descendants()
        .into_iter()
        .find(|e| e.local_name() == "Environment")
        .unwrap();
    assert_eq!(env.attribute("From"), Some("2024-03-01"));
    assert_eq!(env.attribute("Until"), Some("2024-03-31"));
}

#[test]
fn legacy_flag_reads_modified_delegation_from_original_tree() {
    let fx = Fixture::new();
    let original =
        fx.template(Variant::Original, "304-delegation.xml", &delegation_template("original"));
    fx.template(Variant::Modified, "304-delegation.xml", &delegation_template("modified"));
    let config = fx.config.clone().legacy_modified_delegation_source(true);
    let repo = PolicyRepository::open(config).unwrap();

    let registration = repo
        .add_patient_policy(Variant::Modified, "abc", &delegation())
        .unwrap();
    assert_eq!(registration.source, original);
    assert_eq!(registration.document.id(), &id("urn:fixture:304:original"));
}

#[test]
fn template_coverage_counts_each_family() {
    let fx = Fixture::new();
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);
    fx.template(Variant::Modified, "302-a.xml", GROUP_TEMPLATE);
    fx.template(Variant::Modified, "302-b.xml", GROUP_TEMPLATE);
    let repo = fx.open();

    let coverage = repo.template_coverage().unwrap();
    assert_eq!(coverage.len(), 2 * TemplateFamily::ALL.len());

    let found = |variant, family| {
        coverage
            .iter()
            .find(|c| c.variant == variant && c.family == family)
            .map(|c| c.found)
            .unwrap()
    };
    assert_eq!(found(Variant::Original, TemplateFamily::CONSENT), 1);
    assert_eq!(found(Variant::Modified, TemplateFamily::CONSENT), 0);
    assert_eq!(found(Variant::Modified, TemplateFamily::GROUP), 2);
    assert!(!coverage
        .iter()
        .any(|c| c.variant == Variant::Modified && c.is_satisfied()));
}

#[test]
fn missing_template_tree_fails_onboarding_but_not_startup() {
    let fx = Fixture::new();
    std::fs::remove_dir_all(fx.config.template_path(Variant::Modified)).unwrap();
    let repo = fx.open();

    let err = repo
        .add_patient_policy(Variant::Modified, "abc", &PatientPolicy::Consent)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::MissingDirectory { .. }));
}

/// Delegates to the XACML codec and counts decoded documents.
#[derive(Debug, Default)]
struct CountingCodec {
    decoded: Arc<AtomicUsize>,
}

impl DocumentCodec for CountingCodec {
    fn decode(&self, text: &str) -> Result<PolicyDocument, DecodeError> {
        self.decoded.fetch_add(1, Ordering::SeqCst);
        XacmlCodec.decode(text)
    }
}

#[test]
fn custom_codec_decodes_base_and_patient_documents() {
    let fx = Fixture::new();
    fx.base(Variant::Original, "a.xml", &policy_xml("urn:base:a", &["ra"]));
    fx.base(Variant::Modified, "b.xml", &policy_xml("urn:base:b", &["rb"]));
    fx.template(Variant::Original, "201-consent.xml", CONSENT_TEMPLATE);

    let codec = CountingCodec::default();
    let decoded = Arc::clone(&codec.decoded);
    let repo = PolicyRepositoryBuilder::new(fx.config.clone())
        .codec(codec)
        .build()
        .unwrap();
    assert_eq!(decoded.load(Ordering::SeqCst), 2);

    repo.add_patient_policy(Variant::Original, "abc", &PatientPolicy::Consent)
        .unwrap();
    assert_eq!(decoded.load(Ordering::SeqCst), 3);
}
