use proptest::prelude::*;
use schema_checks::{
    DeriveOptions, FieldPath, NamingConvention, SchemaNode, Segment, Shape, ValidationRule, derive, resolve,
};
use serde_json::{Map, Value, json};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({ "type": "string" })),
        Just(json!({ "type": "integer", "minimum": 0 })),
        Just(json!({ "type": "number" })),
        Just(json!({ "type": "boolean" })),
        Just(json!({ "type": "string", "nullable": true, "enum": ["a", "b"] })),
        Just(json!({ "x-kubernetes-int-or-string": true })),
    ]
}

fn schema() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|item| json!({ "type": "array", "items": item })),
            prop::collection::vec(("[a-z]{1,5}", inner, any::<bool>()), 1..4).prop_map(|fields| {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (name, sub, is_required) in fields {
                    if properties.contains_key(&name) {
                        continue;
                    }
                    if is_required {
                        required.push(Value::from(name.clone()));
                    }
                    properties.insert(name, sub);
                }
                json!({ "type": "object", "properties": properties, "required": required })
            }),
        ]
    })
}

fn required_scalars(node: &SchemaNode, path: FieldPath, alternative: bool, out: &mut Vec<FieldPath>) {
    match &node.shape {
        Shape::Scalar(_) => {
            if !node.optional || alternative {
                out.push(path);
            }
        }
        Shape::Object(fields) => {
            for (name, child) in fields {
                required_scalars(child, path.child(Segment::Key(name.clone())), false, out);
            }
        }
        Shape::Sequence(item) => required_scalars(item, path.child(Segment::Element), false, out),
        Shape::OneOf(alts) => {
            for alt in alts {
                required_scalars(alt, path.child(Segment::Alternative(alt.kind())), true, out);
            }
        }
    }
}

proptest! {
    #[test]
    fn resolution_is_repeatable(raw in schema()) {
        let root = SchemaNode::build(&raw).unwrap();
        let naming = NamingConvention::default();
        let first = resolve(&root, &naming).map_err(|e| e.to_string());
        let second = resolve(&SchemaNode::build(&raw).unwrap(), &naming).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn required_scalars_open_with_non_null(raw in schema()) {
        let root = SchemaNode::build(&raw).unwrap();
        let Ok(names) = resolve(&root, &NamingConvention::default()) else {
            return Ok(());
        };
        let units = derive(&root, &names, &DeriveOptions::default()).unwrap();

        let mut expected = Vec::new();
        required_scalars(&root, FieldPath::root(), false, &mut expected);
        for path in expected {
            let unit = units.iter().find(|u| u.path == path);
            prop_assert!(unit.is_some(), "no unit for {}", path);
            prop_assert_eq!(unit.unwrap().rules.first(), Some(&ValidationRule::NonNull));
        }
    }

    #[test]
    fn identifiers_are_unique(raw in schema()) {
        let root = SchemaNode::build(&raw).unwrap();
        if let Ok(names) = resolve(&root, &NamingConvention::default()) {
            let mut ids: Vec<&str> = names.iter().map(|(_, id)| id).collect();
            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
            prop_assert_eq!(total, root.node_count());
        }
    }
}
