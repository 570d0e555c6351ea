#![cfg(test)]

use crate::ssa_analysis::error_tracer::{FunctionError, Origin};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

fn call(name: &str, args: &[&str]) -> Origin {
    Origin::FunctionCall {
        name: name.to_string(),
        args: args.iter().map(|arg| arg.to_string()).collect(),
        index: 0,
    }
}

fn keys(origins: &[Origin]) -> Vec<String> {
    origins.iter().map(Origin::key).collect()
}

#[test]
fn wrappers_are_flattened_into_their_leaves() {
    let mut function_error = FunctionError::new("flatten");

    function_error.add_origin(
        0,
        Origin::Phi {
            origins: vec![
                Origin::Nil,
                Origin::Pointer {
                    origins: vec![
                        Origin::Global {
                            name: "gerr".to_string(),
                        },
                        Origin::Channel {
                            senders: vec![call("errors.New", &["\"a\""]), Origin::MemoryAccess],
                        },
                    ],
                },
            ],
        },
    );

    assert_eq!(
        keys(function_error.slot(0)),
        vec!["nil", "global(gerr)", "errors.New#0(\"a\")", "memory access"]
    );
}

#[test]
fn duplicate_origins_keep_their_first_position() {
    let mut function_error = FunctionError::new("dedupe");

    function_error.add_origin(0, call("errors.New", &["\"a\""]));
    function_error.add_origin(0, Origin::Nil);
    function_error.add_origin(
        0,
        Origin::Phi {
            origins: vec![Origin::Nil, call("errors.New", &["\"a\""])],
        },
    );

    assert_eq!(keys(function_error.slot(0)), vec!["errors.New#0(\"a\")", "nil"]);
}

#[test]
fn self_calls_and_empty_modified_sets_are_dropped() {
    let mut function_error = FunctionError::new("recursive");

    function_error.add_origin(0, call("recursive", &[]));
    function_error.add_origin(0, Origin::modified_by(Vec::new()));

    assert!(function_error.slot(0).is_empty());
    assert!(!function_error.has_origins());
    assert_eq!(function_error.to_string(), "func recursive");

    function_error.add_origin(0, call("other", &[]));
    assert_eq!(function_error.to_string(), "func recursive #0: [other#0()]");
}

#[test]
fn slots_render_in_ascending_order() {
    let mut function_error = FunctionError::new("tuple");
    function_error.tuple_size = 3;

    function_error.add_origin(2, Origin::Unknown);
    function_error.add_origin(0, Origin::Nil);
    function_error.add_origin(1, Origin::modified_by(Vec::new()));

    let indices = function_error
        .slots()
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    assert_eq!(indices, vec![0, 2]);
    assert_eq!(function_error.to_string(), "func tuple #0: [nil] #2: [Unknown]");
    assert!(function_error.slot(7).is_empty());
}

// Strategy for generating leaf origins
fn leaf_origin_strategy() -> impl Strategy<Value = Origin> {
    let names = prop_oneof![
        Just("errors.New".to_string()),
        Just("fmt.Errorf".to_string()),
        Just("traced".to_string()),
        Just("helper".to_string()),
    ];
    let closures = prop::collection::vec(
        prop_oneof![Just("traced$1".to_string()), Just("traced$2".to_string())],
        0..3,
    );

    prop_oneof![
        Just(Origin::Nil),
        Just(Origin::Unknown),
        Just(Origin::MemoryAccess),
        "[a-c]".prop_map(|name| Origin::Global { name }),
        (names, prop::collection::vec("\"[a-b]\"", 0..2), 0usize..2)
            .prop_map(|(name, args, index)| Origin::FunctionCall { name, args, index }),
        closures.prop_map(|closures| Origin::modified_by(closures)),
    ]
}

// Strategy for generating arbitrarily nested origins
fn origin_strategy() -> impl Strategy<Value = Origin> {
    leaf_origin_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|origins| Origin::Phi { origins }),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|origins| Origin::Pointer { origins }),
            prop::collection::vec(inner, 0..4).prop_map(|senders| Origin::Channel { senders }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn aggregated_slots_only_hold_unique_reportable_leaves(
        origins in prop::collection::vec((0usize..3, origin_strategy()), 1..8)
    ) {
        let mut function_error = FunctionError::new("traced");
        for (slot, origin) in origins {
            function_error.add_origin(slot, origin);
        }

        for (_, slot) in function_error.slots() {
            let mut seen = FxHashSet::default();
            for origin in slot {
                prop_assert!(seen.insert(origin.key()), "duplicate origin {}", origin);
                prop_assert!(!origin.is_wrapper());

                match origin {
                    Origin::FunctionCall { name, .. } => prop_assert_ne!(name.as_str(), "traced"),
                    Origin::Modified { closures } => prop_assert!(!closures.is_empty()),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn aggregation_order_does_not_change_the_set_of_origins(
        origins in prop::collection::vec(origin_strategy(), 1..6)
    ) {
        let mut forward = FunctionError::new("traced");
        let mut backward = FunctionError::new("traced");

        for origin in &origins {
            forward.add_origin(0, origin.clone());
        }
        for origin in origins.iter().rev() {
            backward.add_origin(0, origin.clone());
        }

        let mut forward_keys = keys(forward.slot(0));
        let mut backward_keys = keys(backward.slot(0));
        forward_keys.sort();
        backward_keys.sort();

        prop_assert_eq!(forward_keys, backward_keys);
    }
}
