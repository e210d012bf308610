use crate::ir::{LocalSize, format_type};
use crate::types::{AbstractionPattern, PatternMismatch, Type, TypeLowerer};

fn fn_i64_to_i64() -> Type {
    Type::func(vec![Type::int(64)], Type::int(64))
}

#[test]
fn test_lower_type_is_cached() {
    let mut lowerer = TypeLowerer::new();
    let first = lowerer.lower_type(&Type::tuple(vec![Type::int(64), Type::Bool]));
    let second = lowerer.lower_type(&Type::tuple(vec![Type::int(64), Type::Bool]));
    assert_eq!(first, second);
}

#[test]
fn test_string_is_named_resource() {
    let mut lowerer = TypeLowerer::new();
    let lowering = lowerer.type_lowering(&Type::String);

    assert_eq!(format_type(lowerer.types(), lowering.ty), "string");
    assert!(!lowering.trivial);
    assert!(lowering.is_loadable());
}

#[test]
fn test_generic_param_is_address_only() {
    let mut lowerer = TypeLowerer::new();
    let param = Type::Param {
        name: "T".to_string(),
    };

    let lowering = lowerer.type_lowering(&param);
    assert!(lowering.is_address_only());
    assert_eq!(format_type(lowerer.types(), lowering.ty), "opaque<T>");

    let tuple = lowerer.type_lowering(&Type::tuple(vec![param, Type::int(64)]));
    assert!(tuple.is_address_only());
    assert_eq!(lowerer.local_size(tuple.ty), LocalSize::Dynamic);
}

#[test]
fn test_opaque_fn_is_maximally_abstracted() {
    let mut lowerer = TypeLowerer::new();
    let subst = fn_i64_to_i64();

    let abstracted = lowerer
        .lower_abstracted(&AbstractionPattern::opaque("T"), &subst)
        .expect("pattern fits");
    let natural = lowerer.lower_type(&subst);

    assert_eq!(
        format_type(lowerer.types(), abstracted),
        "fn(ptr<i64>, ptr<i64>) -> ()"
    );
    assert_eq!(format_type(lowerer.types(), natural), "fn(i64) -> i64");
    assert!(
        lowerer
            .types()
            .has_abstraction_difference(abstracted, natural)
    );
}

#[test]
fn test_opaque_scalar_has_no_abstraction_difference() {
    let mut lowerer = TypeLowerer::new();
    let abstracted = lowerer
        .lower_abstracted(&AbstractionPattern::opaque("T"), &Type::int(64))
        .expect("pattern fits");
    let natural = lowerer.lower_type(&Type::int(64));
    assert!(
        !lowerer
            .types()
            .has_abstraction_difference(abstracted, natural)
    );
}

#[test]
fn test_opaque_tuple_abstracts_elementwise() {
    let mut lowerer = TypeLowerer::new();
    let subst = Type::tuple(vec![fn_i64_to_i64(), Type::Bool]);

    let abstracted = lowerer
        .lower_abstracted(&AbstractionPattern::opaque("T"), &subst)
        .expect("pattern fits");

    assert_eq!(
        format_type(lowerer.types(), abstracted),
        "(fn(ptr<i64>, ptr<i64>) -> (), bool)"
    );
}

#[test]
fn test_foreign_lowering() {
    let mut lowerer = TypeLowerer::new();

    let string = lowerer.lower_foreign(&Type::String);
    let flag = lowerer.lower_foreign(&Type::Bool);
    let pair = lowerer.lower_foreign(&Type::tuple(vec![Type::String, Type::int(32)]));

    assert_eq!(format_type(lowerer.types(), string), "ptr<u8>");
    assert_eq!(format_type(lowerer.types(), flag), "u8");
    assert_eq!(format_type(lowerer.types(), pair), "(ptr<u8>, i32)");
}

#[test]
fn test_local_size_of_loadable_tuple() {
    let mut lowerer = TypeLowerer::new();
    let ty = lowerer.lower_type(&Type::tuple(vec![Type::int(64), Type::Bool]));
    assert_eq!(
        lowerer.local_size(ty),
        LocalSize::Static { size: 16, align: 8 }
    );
}

#[test]
fn test_fn_pattern_over_non_fn_type_is_rejected() {
    let mut lowerer = TypeLowerer::new();
    let orig = AbstractionPattern::func(Vec::new(), AbstractionPattern::opaque("T"));

    let err = lowerer
        .lower_abstracted(&orig, &Type::int(64))
        .expect_err("fn pattern over i64");
    assert_eq!(
        err,
        PatternMismatch {
            orig,
            subst: Type::int(64),
        }
    );

    let nested = AbstractionPattern::func(
        vec![AbstractionPattern::tuple(vec![AbstractionPattern::opaque("T")])],
        AbstractionPattern::concrete(Type::Unit),
    );
    let subst = Type::func(vec![Type::int(64)], Type::Unit);
    assert!(lowerer.lower_abstracted(&nested, &subst).is_err());
}
