use crate::types::{AbstractionPattern, Type};

#[test]
fn test_leaf_count_flattens_nested_tuples() {
    let ty = Type::tuple(vec![
        Type::int(64),
        Type::tuple(vec![Type::String, Type::Bool]),
        Type::tuple(vec![]),
    ]);
    assert_eq!(ty.leaf_count(), 3);
    assert_eq!(Type::String.leaf_count(), 1);
}

#[test]
fn test_type_display() {
    let ty = Type::tuple(vec![
        Type::func(vec![Type::int(64)], Type::Bool),
        Type::Param {
            name: "T".to_string(),
        },
        Type::Existential {
            protocol: "Show".to_string(),
        },
    ]);
    assert_eq!(ty.to_string(), "(fn(i64) -> bool, T, any Show)");
}

#[test]
fn test_type_deserialize() {
    let json = r#"{
        "kind": "tuple",
        "field_tys": [
            { "kind": "string" },
            { "kind": "int", "signed": false, "bits": 32 }
        ]
    }"#;
    let ty: Type = serde_json::from_str(json).expect("valid type");
    assert_eq!(ty, Type::tuple(vec![Type::String, Type::uint(32)]));
}

#[test]
fn test_pattern_tuple_shape() {
    let concrete = AbstractionPattern::concrete(Type::tuple(vec![Type::int(64), Type::Bool]));
    assert!(concrete.is_tuple());
    assert_eq!(concrete.tuple_arity(), Some(2));
    assert_eq!(
        concrete.tuple_element(1),
        Some(AbstractionPattern::concrete(Type::Bool))
    );

    // An opaque pattern is never destructured, whatever it is bound to.
    let opaque = AbstractionPattern::opaque("T");
    assert!(!opaque.is_tuple());
    assert_eq!(opaque.tuple_element(0), None);
}

#[test]
fn test_pattern_component_of_opaque_stays_opaque() {
    let subst = Type::tuple(vec![Type::int(64), Type::Bool]);
    let opaque = AbstractionPattern::opaque("T");
    assert_eq!(opaque.component(1, &subst), opaque);

    let tuple = AbstractionPattern::tuple(vec![
        AbstractionPattern::opaque("U"),
        AbstractionPattern::concrete(Type::Bool),
    ]);
    assert_eq!(tuple.component(0, &subst), AbstractionPattern::opaque("U"));
}

#[test]
fn test_pattern_deserialize_and_display() {
    let json = r#"{
        "kind": "tuple",
        "elements": [
            { "kind": "opaque", "name": "T" },
            { "kind": "type", "ty": { "kind": "bool" } }
        ]
    }"#;
    let pattern: AbstractionPattern = serde_json::from_str(json).expect("valid pattern");
    assert_eq!(pattern.to_string(), "(<T>, bool)");
}
