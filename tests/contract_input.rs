//! End-to-end: schema document + submitted arguments → rule map.
use input_rules::rules::{Rules, RulesConfig};
use input_rules::schema::{FieldDef, InputObjectType, RuleSpec, RuleValue, Schema, TypeRef, parse_schema};
use serde_json::{Value, json};

const USER_UPDATE: &str = r#"{
    "types": {
        "ContractInput": {
            "fields": {
                "start": { "type": "Int", "rules": ["lt:end"] },
                "end":   { "type": "Int", "rules": ["gt:start"] }
            }
        },
        "LineInput": {
            "fields": {
                "name":  { "type": "String!", "rules": "required" },
                "from":  { "type": "String", "rules": ["date", "after:2024-01-01"] },
                "until": { "type": "String", "rules": ["after:from"] },
                "note":  { "type": "String", "rules": ["required_with:name,until"] }
            }
        }
    },
    "arguments": {
        "contract": { "type": "ContractInput" },
        "lines":    { "type": "[LineInput!]!", "rules": "array" }
    }
}"#;

fn derive(schema: &Schema, request: &Value) -> Value {
    let rules = Rules::new(schema.arguments(), request).get().unwrap();
    serde_json::to_value(&rules).unwrap()
}

#[test]
fn nested_contract_rules_reference_siblings() {
    let schema = parse_schema(USER_UPDATE).unwrap();
    let request = json!({ "contract": { "start": null, "end": 2 } });

    let rules = derive(&schema, &request);
    assert_eq!(rules, json!({
        "contract.start": ["lt:contract.end"],
        "contract.end": ["gt:contract.start"],
        "lines": ["array"],
    }));
}

#[test]
fn list_elements_get_their_own_paths() {
    let schema = parse_schema(USER_UPDATE).unwrap();
    let request = json!({
        "lines": [
            { "name": "a", "from": "2024-02-01", "until": "2024-03-01" },
            null,
            { "name": "c" }
        ]
    });

    let rules = Rules::new(schema.arguments(), &request).get().unwrap();
    let keys = rules.keys().collect::<Vec<_>>();
    assert_eq!(keys, [
        "lines",
        "lines.0.name", "lines.0.from", "lines.0.until", "lines.0.note",
        "lines.2.name", "lines.2.from", "lines.2.until", "lines.2.note",
    ]);

    let list = |rules: &[&str]| RuleValue::List(rules.iter().map(|r| r.to_string()).collect());
    assert_eq!(rules.get("lines.2.from"), Some(&list(&["date", "after:2024-01-01"])));
    assert_eq!(rules.get("lines.2.until"), Some(&list(&["after:lines.2.from"])));
    assert_eq!(rules.get("lines.0.note"), Some(&list(&["required_with:lines.0.name,lines.0.until"])));
}

#[test]
fn empty_list_only_keeps_the_field_rule() {
    let schema = parse_schema(USER_UPDATE).unwrap();
    let rules = derive(&schema, &json!({ "lines": [] }));
    assert_eq!(rules, json!({ "lines": ["array"] }));
}

#[test]
fn computed_rules_receive_the_whole_request() {
    let period = InputObjectType::new("PeriodInput", [
        FieldDef::new("start", TypeRef::leaf("Int")),
        FieldDef::new("end", TypeRef::leaf("Int")).with_rules(RuleSpec::computed(|local, full| {
            let strict = full["strict"].as_bool().unwrap_or(false);
            let rules = match (strict, local.get("start")) {
                (true, Some(_)) => vec!["required".to_owned(), "gt:period.start".to_owned()],
                _ => vec!["nullable".to_owned()],
            };
            Ok(RuleValue::List(rules))
        })),
    ]);
    let schema = Schema::new([FieldDef::new("period", TypeRef::non_null(TypeRef::composite(&period)))]);

    let strict = derive(&schema, &json!({ "strict": true, "period": { "start": 1 } }));
    assert_eq!(strict, json!({ "period.end": ["required", "gt:period.start"] }));

    let loose = derive(&schema, &json!({ "period": { "start": 1 } }));
    assert_eq!(loose, json!({ "period.end": ["nullable"] }));
}

#[test]
fn malformed_rules_fail_the_whole_pass() {
    let schema = parse_schema(r#"{
        "types": { "A": { "fields": { "x": { "type": "Int", "rules": "between:" } } } },
        "arguments": { "a": { "type": "A" } }
    }"#).unwrap();

    let err = Rules::new(schema.arguments(), &json!({ "a": {} })).get().unwrap_err();
    assert!(err.to_string().contains("between:"), "{err}");

    // not descended into, so never parsed
    assert!(Rules::new(schema.arguments(), &json!({})).get().unwrap().is_empty());
}

#[test]
fn depth_limit_is_configurable() {
    let schema = parse_schema(r#"{
        "types": { "Node": { "fields": {
            "next": { "type": "Node" },
            "value": { "type": "Int", "rules": "int" }
        } } },
        "arguments": { "head": { "type": "Node" } }
    }"#).unwrap();
    let request = json!({ "head": { "next": { "next": { "next": {} } } } });

    let rules = Rules::new(schema.arguments(), &request).get().unwrap();
    assert!(rules.get("head.next.next.next.value").is_some());

    let shallow = RulesConfig::default().with_max_depth(2);
    let err = Rules::new(schema.arguments(), &request).with_config(shallow).get().unwrap_err();
    assert!(err.to_string().contains("head.next.next"), "{err}");
}
