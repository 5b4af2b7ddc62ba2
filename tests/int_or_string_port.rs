//! The number-or-string probe port of a ClusterInstallation resource, end to end.
use schema_checks::{
    CaseStyle, Config, DeriveOptions, Error, FieldPath, Kind, NamingConvention, Segment, ValidationRule, generate,
};
use serde_json::{Value, json};

fn cluster_installation_spec() -> Value {
    json!({
        "type": "object",
        "required": ["ingressName"],
        "properties": {
            "ingressName": { "type": "string" },
            "replicas": { "type": "integer", "format": "int32" },
            "livenessProbe": {
                "type": "object",
                "properties": {
                    "failureThreshold": { "type": "integer", "format": "int32" },
                    "httpGet": {
                        "type": "object",
                        "required": ["port"],
                        "properties": {
                            "host": { "type": "string" },
                            "path": { "type": "string" },
                            "port": {
                                "anyOf": [{ "type": "integer" }, { "type": "string" }],
                                "x-kubernetes-int-or-string": true
                            },
                            "scheme": { "type": "string" }
                        }
                    }
                }
            }
        }
    })
}

fn config(root: &str) -> Config {
    Config {
        naming: NamingConvention::default().with_root_name(root),
        rules: DeriveOptions::default(),
        ..Config::default()
    }
}

#[test]
fn optional_port_union_yields_two_sibling_units() {
    let schema = json!({
        "type": "object",
        "properties": { "port": { "x-kubernetes-int-or-string": true } }
    });
    let units = generate(&schema, &config("ClusterInstallationSpecLivenessProbeHttpGet")).unwrap();

    assert_eq!(units.len(), 2);
    assert!(units[0].identifier.ends_with("FromNumberParameters"));
    assert!(units[1].identifier.ends_with("FromStringParameters"));
    assert_eq!(units[0].identifier, "ClusterInstallationSpecLivenessProbeHttpGetPort_FromNumberParameters");
    assert_eq!(units[1].identifier, "ClusterInstallationSpecLivenessProbeHttpGetPort_FromStringParameters");
    for unit in &units {
        assert_eq!(unit.rules, [ValidationRule::NonNull]);
    }
}

#[test]
fn full_spec_plans_required_leaves_and_union_alternatives() {
    let units = generate(&cluster_installation_spec(), &config("ClusterInstallationSpec")).unwrap();
    let ids: Vec<&str> = units.iter().map(|u| u.identifier.as_str()).collect();
    assert_eq!(ids, [
        "ClusterInstallationSpecIngressName",
        "ClusterInstallationSpecLivenessProbeHttpGetPort_FromNumberParameters",
        "ClusterInstallationSpecLivenessProbeHttpGetPort_FromStringParameters",
    ]);

    let port: FieldPath = ["livenessProbe", "httpGet", "port"].into_iter().collect();
    assert_eq!(units[1].path, port.child(Segment::Alternative(Kind::Number)));
    assert_eq!(units[1].origin, "/properties/livenessProbe/properties/httpGet/properties/port");
    assert_eq!(units[2].alternative, Some(Kind::String));
}

#[test]
fn every_alternative_unit_is_self_contained() {
    let units = generate(&cluster_installation_spec(), &config("Spec")).unwrap();
    let alternatives: Vec<_> = units.iter().filter(|u| u.alternative.is_some()).collect();
    assert_eq!(alternatives.len(), 2);
    assert_eq!(alternatives[0].rules.first(), Some(&ValidationRule::NonNull));
    assert_eq!(alternatives[1].rules.first(), Some(&ValidationRule::NonNull));
    assert_ne!(alternatives[0].path, alternatives[1].path);
    assert!(!alternatives[0].path.starts_with(&alternatives[1].path));
    assert!(!alternatives[1].path.starts_with(&alternatives[0].path));
}

#[test]
fn stripped_case_collision_aborts_generation() {
    let schema = json!({
        "type": "object",
        "properties": { "fooBar": { "type": "string" }, "foo_bar": { "type": "integer" } }
    });
    let config = Config {
        naming: NamingConvention::default().with_case(CaseStyle::Lower),
        rules: DeriveOptions::default(),
        ..Config::default()
    };
    let err = generate(&schema, &config).unwrap_err();
    assert!(matches!(err, Error::NameCollision { .. }));
    let message = err.to_string();
    assert!(message.contains("$.fooBar") && message.contains("$.foo_bar"), "{message}");
}

#[test]
fn unknown_scalar_kind_never_defaults() {
    let schema = json!({
        "type": "object",
        "properties": { "mode": { "type": "unknown" } }
    });
    let err = generate(&schema, &Config::default()).unwrap_err();
    assert_eq!(err.kind(), "schema");
    assert!(err.to_string().contains("#/properties/mode"), "{err}");
}
