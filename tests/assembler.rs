use pageforge::model::{pages_index, Bundle};
use pageforge::validators::ValidatorsTable;
use pageforge::Assembler;
use serde_json::json;

fn bundle(value: serde_json::Value) -> Bundle {
    serde_json::from_value(value).unwrap()
}

/// S1 -- extension merge: a derived page inherits its base's layout and area items, with its
/// own areas appended or merged in.
#[test]
fn extension_merge_inherits_layout_and_areas() {
    let bundle = bundle(json!({
        "pages": [
            {
                "name": "base",
                "refs": ["base"],
                "definition": {
                    "layout": "L",
                    "areas": {"a": [{"widget": "w1", "id": "id1"}]}
                }
            },
            {
                "name": "d",
                "refs": ["d"],
                "definition": {
                    "extends": "base",
                    "areas": {
                        "a": [{"widget": "w2", "id": "id2"}],
                        "b": [{"widget": "w3", "id": "id3"}]
                    }
                }
            }
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let assembled = assembler.assemble(&bundle.pages[1]).unwrap();

    assert_eq!(assembled.definition.layout.as_deref(), Some("L"));
    let a_ids: Vec<_> = assembled.definition.areas["a"]
        .iter()
        .map(|i| i.id.clone().unwrap())
        .collect();
    assert_eq!(a_ids, vec!["id1", "id2"]);
    let b_ids: Vec<_> = assembled.definition.areas["b"]
        .iter()
        .map(|i| i.id.clone().unwrap())
        .collect();
    assert_eq!(b_ids, vec!["id3"]);
}

/// S2 -- a cycle among `extends` links is rejected rather than looping forever.
#[test]
fn extension_cycle_is_rejected() {
    let bundle = bundle(json!({
        "pages": [
            {"name": "p1", "refs": ["p1"], "definition": {"extends": "p2", "areas": {}}},
            {"name": "p2", "refs": ["p2"], "definition": {"extends": "p3", "areas": {}}},
            {"name": "p3", "refs": ["p3"], "definition": {"extends": "p1", "areas": {}}}
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let err = assembler.assemble(&bundle.pages[2]).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Error loading page \"p3\": Cycle in page extension detected:"));
}

/// S3 -- two items sharing an id within the same page is a hard failure.
#[test]
fn duplicate_ids_in_same_page_are_rejected() {
    let bundle = bundle(json!({
        "pages": [{
            "name": "home",
            "refs": ["home"],
            "definition": {
                "areas": {"a": [
                    {"widget": "w1", "id": "x"},
                    {"widget": "w2", "id": "x"}
                ]}
            }
        }]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let err = assembler.assemble(&bundle.pages[0]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error loading page \"home\": Duplicate widget/composition/layout ID(s): x"
    );
}

/// S4 -- items marked `enabled: false` are dropped from the assembled output.
#[test]
fn disabled_items_are_pruned() {
    let bundle = bundle(json!({
        "pages": [{
            "name": "home",
            "refs": ["home"],
            "definition": {
                "areas": {"a": [
                    {"widget": "w1", "id": "id1", "enabled": false},
                    {"widget": "w2", "id": "id2"}
                ]}
            }
        }]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let assembled = assembler.assemble(&bundle.pages[0]).unwrap();
    let ids: Vec<_> = assembled.definition.areas["a"]
        .iter()
        .map(|i| i.id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["id2"]);
}

/// S5 -- composition expansion interpolates a `topic:` expression against the instance id.
#[test]
fn composition_expansion_resolves_topic_expression() {
    let bundle = bundle(json!({
        "pages": [
            {
                "name": "cmp",
                "refs": ["cmp"],
                "definition": {
                    "areas": {
                        ".": [{"widget": "tw", "id": "inner", "features": {"resource": "${topic:r}"}}]
                    }
                }
            },
            {
                "name": "host",
                "refs": ["host"],
                "definition": {
                    "areas": {
                        "a": [{"composition": "cmp", "id": "host"}]
                    }
                }
            }
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let assembled = assembler.assemble(&bundle.pages[1]).unwrap();

    let items = &assembled.definition.areas["a"];
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].widget_ref(), Some("tw"));
    assert_eq!(items[0].id.as_deref(), Some("host-inner"));
    assert_eq!(
        items[0].features.as_ref().unwrap()["resource"],
        json!("host+r")
    );
}

/// A composition nested inside another composition is fully expanded rather than left
/// unresolved.
#[test]
fn nested_compositions_are_fully_expanded() {
    let bundle = bundle(json!({
        "pages": [
            {
                "name": "inner",
                "refs": ["inner"],
                "definition": {"areas": {".": [{"widget": "w", "id": "leaf"}]}}
            },
            {
                "name": "outer",
                "refs": ["outer"],
                "definition": {"areas": {".": [{"composition": "inner", "id": "mid"}]}}
            },
            {
                "name": "host",
                "refs": ["host"],
                "definition": {"areas": {"a": [{"composition": "outer", "id": "top"}]}}
            }
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let assembled = assembler.assemble(&bundle.pages[2]).unwrap();

    let items = &assembled.definition.areas["a"];
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].widget_ref(), Some("w"));
    assert_eq!(items[0].id.as_deref(), Some("top-mid-leaf"));
}

/// Two pages composing each other is a cycle, not infinite recursion.
#[test]
fn composition_cycle_is_rejected_without_overflowing_the_stack() {
    let bundle = bundle(json!({
        "pages": [
            {
                "name": "a",
                "refs": ["a"],
                "definition": {"areas": {".": [{"composition": "b", "id": "toB"}]}}
            },
            {
                "name": "b",
                "refs": ["b"],
                "definition": {"areas": {".": [{"composition": "a", "id": "toA"}]}}
            },
            {
                "name": "host",
                "refs": ["host"],
                "definition": {"areas": {"a": [{"composition": "a", "id": "start"}]}}
            }
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));
    let err = assembler.assemble(&bundle.pages[2]).unwrap_err();
    let message = err.to_string();
    // the cycle is noticed while expanding "b" (the second hop: host -> a -> b -> a again).
    assert!(message.starts_with("Error loading page \"b\": Cycle in compositions detected:"));
}

/// S6 -- `insertBeforeId` splices an item ahead of its target, or fails if the target is
/// absent.
#[test]
fn insert_before_id_splices_or_fails() {
    let bundle = bundle(json!({
        "pages": [
            {
                "name": "base",
                "refs": ["base"],
                "definition": {"areas": {"a": [{"id": "id1", "widget": "w"}, {"id": "id2", "widget": "w"}]}}
            },
            {
                "name": "ok",
                "refs": ["ok"],
                "definition": {
                    "extends": "base",
                    "areas": {"a": [{"id": "idX", "widget": "w", "insertBeforeId": "id2"}]}
                }
            },
            {
                "name": "bad",
                "refs": ["bad"],
                "definition": {
                    "extends": "base",
                    "areas": {"a": [{"id": "idX", "widget": "w", "insertBeforeId": "idZ"}]}
                }
            }
        ]
    }));

    let validators = ValidatorsTable::build(&bundle).unwrap();
    let assembler = Assembler::new(&validators, pages_index(&bundle.pages));

    let assembled = assembler.assemble(&bundle.pages[1]).unwrap();
    let ids: Vec<_> = assembled.definition.areas["a"]
        .iter()
        .map(|i| i.id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["id1", "idX", "id2"]);

    let err = assembler.assemble(&bundle.pages[2]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error loading page \"bad\": No id found that matches insertBeforeId value \"idZ\""
    );
}

/// Invariant: running `assemble` twice from two fresh assemblers on the same input yields
/// structurally identical output.
#[test]
fn assembling_twice_from_fresh_assemblers_is_deterministic() {
    let bundle = bundle(json!({
        "pages": [{
            "name": "home",
            "refs": ["home"],
            "definition": {"areas": {"a": [{"widget": "w1"}, {"widget": "w2"}]}}
        }]
    }));

    let validators_a = ValidatorsTable::build(&bundle).unwrap();
    let assembler_a = Assembler::new(&validators_a, pages_index(&bundle.pages));
    let first = assembler_a.assemble(&bundle.pages[0]).unwrap();

    let validators_b = ValidatorsTable::build(&bundle).unwrap();
    let assembler_b = Assembler::new(&validators_b, pages_index(&bundle.pages));
    let second = assembler_b.assemble(&bundle.pages[0]).unwrap();

    let first_ids: Vec<_> = first.definition.areas["a"].iter().map(|i| i.id.clone()).collect();
    let second_ids: Vec<_> = second.definition.areas["a"].iter().map(|i| i.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
}
