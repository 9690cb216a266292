//! Property tests for conversion laws
//!
//! Uses proptest to check arithmetic, inversion and grouping rules over
//! generated inputs.

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{AdmissionRule, ConversionConfig, Criterion, Error};
use kwconvert_policy::handlers::image_cve::max_accepted;
use kwconvert_policy::{
    CriterionRegistry, MetaCriterionExpander, PolicyFactory, RuleConverter, RuleOutcome,
    SummaryStatus,
};
use proptest::prelude::*;

const HOST_CRITERIA: [&str; 3] = [
    criteria::SHARE_IPC_WITH_HOST,
    criteria::SHARE_NET_WITH_HOST,
    criteria::SHARE_PID_WITH_HOST,
];

const HOST_FLAGS: [&str; 3] = ["allow_host_ipc", "allow_host_network", "allow_host_pid"];

const TRUE_LITERALS: [&str; 6] = ["1", "t", "T", "TRUE", "true", "True"];
const FALSE_LITERALS: [&str; 6] = ["0", "f", "F", "FALSE", "false", "False"];

/// Criteria that each map to a distinct single module
const MODULE_CRITERIA: [(&str, &str, &str); 6] = [
    (criteria::RUN_AS_ROOT, ops::EQUAL, "true"),
    (criteria::RUN_AS_PRIVILEGED, ops::EQUAL, "true"),
    (criteria::ALLOW_PRIV_ESCALATION, ops::EQUAL, "true"),
    (criteria::SHARE_IPC_WITH_HOST, ops::EQUAL, "true"),
    (criteria::IMAGE, ops::CONTAINS_ANY, "busybox"),
    (criteria::LABELS, ops::CONTAINS_ANY, "team"),
];

fn converter() -> RuleConverter {
    RuleConverter::new(ConversionConfig::default()).unwrap()
}

fn settings(rule: &AdmissionRule) -> serde_json::Value {
    match converter().convert_rule(rule).unwrap() {
        RuleOutcome::Converted(policy) => policy.as_single().unwrap().spec.settings.clone(),
        RuleOutcome::Diverted(_) => panic!("unexpected diversion"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A "deny when count >= N" threshold is always written as N - 1
    #[test]
    fn test_cve_threshold_is_n_minus_one(n in 0i64..100_000) {
        prop_assert_eq!(max_accepted(n).ok(), Some(n - 1));

        let rule = AdmissionRule::deny(
            1001,
            vec![Criterion::new(criteria::CVE_HIGH_COUNT, ops::BIGGER_EQUAL_THAN, n.to_string())],
        );
        let settings = settings(&rule);
        prop_assert_eq!(settings["maxSeverity"]["high"]["total"].as_i64(), Some(n - 1));
    }

    /// Each host sharing flag is the negation of its criterion; absent flags stay allowed
    #[test]
    fn test_host_flags_invert_criterion(
        which in 0usize..3,
        value in prop::bool::ANY,
        literal in 0usize..6,
    ) {
        let literal = if value { TRUE_LITERALS[literal] } else { FALSE_LITERALS[literal] };
        let rule = AdmissionRule::deny(
            1001,
            vec![Criterion::new(HOST_CRITERIA[which], ops::EQUAL, literal)],
        );
        let settings = settings(&rule);

        for (i, flag) in HOST_FLAGS.iter().enumerate() {
            let expected = if i == which { !value } else { true };
            prop_assert_eq!(settings[*flag].as_bool(), Some(expected));
        }
    }

    /// Distinct modules above one require a group; one module never does
    #[test]
    fn test_group_iff_several_modules(
        picks in prop::collection::btree_set(0usize..MODULE_CRITERIA.len(), 1..=MODULE_CRITERIA.len()),
        with_namespace in prop::bool::ANY,
    ) {
        let mut criteria_list: Vec<Criterion> = picks
            .iter()
            .map(|&i| {
                let (name, op, value) = MODULE_CRITERIA[i];
                Criterion::new(name, op, value)
            })
            .collect();
        if with_namespace {
            criteria_list.push(Criterion::new(criteria::NAMESPACE, ops::CONTAINS_ANY, "dev"));
        }
        let rule = AdmissionRule::deny(1001, criteria_list);

        let registry = CriterionRegistry::new(&ConversionConfig::default());
        let factory = PolicyFactory::new(&registry);
        prop_assert_eq!(factory.requires_group(&rule), picks.len() > 1);

        let policy = factory.generate(&rule, &ConversionConfig::default()).unwrap();
        prop_assert_eq!(policy.is_group(), picks.len() > 1);
        if let Some(group) = policy.as_group() {
            prop_assert_eq!(group.spec.policies.len(), picks.len());
            let terms: Vec<&str> = group.spec.expression.split(" && ").collect();
            let mut sorted = terms.clone();
            sorted.sort();
            prop_assert_eq!(terms, sorted);
        }
    }

    /// Any operator other than equality on the composite fails without expanding
    #[test]
    fn test_meta_rejects_other_operators(op in "[a-zA-Z!<>]{1,16}") {
        prop_assume!(op != ops::EQUAL);
        let expander = MetaCriterionExpander::new();
        let criterion = Criterion::new(criteria::PSP_COMPLIANCE, op.as_str(), "true");
        prop_assert!(matches!(expander.expand(&criterion), Err(Error::UnsupportedOperator(_))));
    }

    /// Unknown criterion names are rejected
    #[test]
    fn test_unknown_criterion_rejected(name in "zz[a-zA-Z]{1,12}") {
        let rule = AdmissionRule::deny(1001, vec![Criterion::new(name.as_str(), ops::EQUAL, "true")]);
        let err = converter().convert_rule(&rule).unwrap_err();
        prop_assert!(matches!(err, Error::UnsupportedCriterion(_)));
    }

    /// Reserved ids never convert, whatever the criteria
    #[test]
    fn test_reserved_ids_never_convert(id in 0u32..1000, pick in 0usize..MODULE_CRITERIA.len()) {
        let (name, op, value) = MODULE_CRITERIA[pick];
        let rule = AdmissionRule::deny(id, vec![Criterion::new(name, op, value)]);
        let result = converter().convert_rules(&[rule]);
        prop_assert!(result.policies.is_empty());
        prop_assert_eq!(result.summary[0].notes.as_str(), "neuvector environment only rule");
    }
}

#[test]
fn test_meta_expands_to_six_equalities() {
    let expander = MetaCriterionExpander::new();
    let expanded = expander
        .expand(&Criterion::new(criteria::PSP_COMPLIANCE, ops::EQUAL, "true"))
        .unwrap();

    assert_eq!(expanded.len(), 6);
    assert!(expanded
        .iter()
        .all(|c| c.operator == ops::EQUAL && c.value == "true"));
}

#[test]
fn test_cve_threshold_bounds() {
    let cases = [
        ("0", Some(-1)),
        (" 7 ", Some(6)),
        ("9223372036854775807", Some(i64::MAX - 1)),
        ("-1", None),
        ("-9223372036854775808", None),
        ("9223372036854775808", None),
        ("lots", None),
        ("", None),
    ];

    let rules: Vec<AdmissionRule> = cases
        .iter()
        .enumerate()
        .map(|(i, (value, _))| {
            AdmissionRule::deny(
                1001 + i as u32,
                vec![Criterion::new(criteria::CVE_HIGH_COUNT, ops::BIGGER_EQUAL_THAN, *value)],
            )
        })
        .collect();
    let result = converter().convert_rules(&rules);
    assert_eq!(result.summary.len(), cases.len());

    let mut policies = result.policies.iter();
    for ((value, expected), entry) in cases.iter().zip(&result.summary) {
        match expected {
            Some(total) => {
                assert_eq!(entry.status, SummaryStatus::Ok, "value {:?}", value);
                let policy = policies.next().unwrap().as_single().unwrap();
                assert_eq!(
                    policy.spec.settings["maxSeverity"]["high"]["total"].as_i64(),
                    Some(*total),
                    "value {:?}",
                    value
                );
            }
            None => {
                assert_eq!(entry.status, SummaryStatus::Skipped, "value {:?}", value);
                assert!(
                    entry.notes.starts_with("failed to build policy settings"),
                    "value {:?}: {}",
                    value,
                    entry.notes
                );
            }
        }
    }
    assert!(policies.next().is_none());
}
