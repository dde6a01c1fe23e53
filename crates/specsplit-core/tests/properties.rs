use proptest::prelude::*;
use specsplit_core::{invariant_violations, ChangeId, DecompositionResult, Warning};
use specsplit_test_utils::test_decomposer;

const FEATURES: [&str; 6] = [
    "Billing", "Catalog", "Inventory", "Shipping", "Reviews", "Accounts",
];

/// One generated feature section
#[derive(Debug, Clone)]
struct FeatureSpec {
    feature: usize,
    endpoints: usize,
    criteria: usize,
    requires: Option<usize>,
}

fn feature_spec() -> impl Strategy<Value = FeatureSpec> {
    (0..FEATURES.len(), 0..4usize, 0..5usize, proptest::option::of(0..FEATURES.len())).prop_map(
        |(feature, endpoints, criteria, requires)| FeatureSpec {
            feature,
            endpoints,
            criteria,
            requires,
        },
    )
}

fn render(features: &[FeatureSpec]) -> String {
    let mut text = String::from("# Platform\n\n");
    for spec in features {
        let name = FEATURES[spec.feature];
        let path = name.to_lowercase();
        text.push_str(&format!("## {name}\n\n"));
        if let Some(dep) = spec.requires {
            text.push_str(&format!("This work requires {}.\n", FEATURES[dep]));
        }
        text.push_str(&format!("The {name} Ledger keeps every Customer record.\n"));
        for i in 0..spec.endpoints {
            let endpoint = if i == 0 {
                format!("GET /{path}\n")
            } else {
                format!("POST /{path}/item{i}\n")
            };
            text.push_str(&endpoint);
        }
        for i in 0..spec.criteria {
            text.push_str(&format!(
                "- Given case {i} when the Customer acts then {name} responds\n"
            ));
        }
        text.push('\n');
    }
    text
}

fn closed_walk(result: &DecompositionResult, ids: &[ChangeId]) -> bool {
    ids.iter().enumerate().all(|(i, id)| {
        let next = &ids[(i + 1) % ids.len()];
        result.change(id.as_str()).is_some_and(|c| c.depends_on(next))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_results_satisfy_invariants(features in proptest::collection::vec(feature_spec(), 0..6)) {
        let result = test_decomposer().analyze(&render(&features), None, None);
        prop_assert!(!result.changes.is_empty());
        let violations = invariant_violations(&result);
        prop_assert!(violations.is_empty(), "{:?}", violations);
        for change in &result.changes {
            prop_assert!((0.0..=1.0).contains(&change.independence_score));
        }
    }

    #[test]
    fn prop_order_respects_edges_without_cycles(features in proptest::collection::vec(feature_spec(), 1..6)) {
        let result = test_decomposer().analyze(&render(&features), None, None);
        if !result.has_cycle() {
            let position = |id: &ChangeId| result.suggested_order.iter().position(|o| o == id);
            for (from, to) in result.edges() {
                prop_assert!(position(&to) < position(&from));
            }
        }
    }

    #[test]
    fn prop_cycle_warnings_are_closed_walks(features in proptest::collection::vec(feature_spec(), 1..6)) {
        let result = test_decomposer().analyze(&render(&features), None, None);
        for warning in &result.warnings {
            if let Warning::CircularDependency { ids } = warning {
                prop_assert!(ids.len() >= 2);
                prop_assert!(closed_walk(&result, ids));
            }
        }
    }

    #[test]
    fn prop_analysis_is_idempotent(features in proptest::collection::vec(feature_spec(), 0..6)) {
        let decomposer = test_decomposer();
        let text = render(&features);
        prop_assert_eq!(decomposer.analyze(&text, None, None), decomposer.analyze(&text, None, None));
    }

    #[test]
    fn prop_merge_keeps_invariants_and_totals(features in proptest::collection::vec(feature_spec(), 3..6)) {
        let decomposer = test_decomposer();
        let result = decomposer.analyze(&render(&features), None, None);
        prop_assume!(result.changes.len() >= 3);

        let ids: Vec<&str> = result.changes.iter().map(|c| c.id.as_str()).collect();
        let merged = decomposer.merge(&result, &ids[1..3]).unwrap();
        prop_assert_eq!(merged.changes.len(), result.changes.len() - 1);
        prop_assert_eq!(merged.total_acceptance_criteria(), result.total_acceptance_criteria());
        let violations = invariant_violations(&merged);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn prop_merge_is_associative(features in proptest::collection::vec(feature_spec(), 3..6)) {
        let decomposer = test_decomposer();
        let result = decomposer.analyze(&render(&features), None, None);
        prop_assume!(result.changes.len() >= 3);

        let (a, b, c) = (
            result.changes[0].id.as_str(),
            result.changes[1].id.as_str(),
            result.changes[2].id.as_str(),
        );
        let stepwise = decomposer.merge(&result, &[a, b]).unwrap();
        let stepwise = decomposer.merge(&stepwise, &[a, c]).unwrap();
        let at_once = decomposer.merge(&result, &[a, b, c]).unwrap();

        let left = stepwise.change(a).unwrap();
        let right = at_once.change(a).unwrap();
        prop_assert_eq!(&left.sections, &right.sections);
        prop_assert_eq!(&left.signals, &right.signals);
        prop_assert_eq!(&left.dependencies, &right.dependencies);
    }
}
