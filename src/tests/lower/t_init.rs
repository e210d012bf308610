use crate::ir::format_func;
use crate::lower::{
    Address, CleanupState, ExistentialInitialization, FuncLowerer, InitArena,
    KnownAddressInitialization, LowerOpts, LowerToIrError, TuplePatternInitialization,
};
use crate::types::Type;
use indoc::indoc;

fn new_lowerer(name: &str) -> FuncLowerer {
    FuncLowerer::new(name, &LowerOpts::default())
}

#[test]
fn test_temporary_cleanup_activates_on_finish() {
    let mut lw = new_lowerer("temp");
    let mut inits = InitArena::new();
    let string_ty = lw.lower_type(&Type::String);

    let temp = inits.emit_temporary(&mut lw, string_ty);
    let handle = inits
        .temporary(temp)
        .expect("temporary")
        .cleanup()
        .expect("string temporaries need a cleanup");
    assert_eq!(lw.cleanups.state(handle), CleanupState::Dormant);
    assert!(inits.address_for_in_place_init(temp).is_some());

    inits
        .finish_initialization(&mut lw, temp)
        .expect("first finish");
    assert!(inits.is_finished(temp));
    assert_eq!(lw.cleanups.state(handle), CleanupState::Active);

    let err = inits
        .finish_initialization(&mut lw, temp)
        .expect_err("second finish");
    assert!(matches!(err, LowerToIrError::InitFinishedTwice(id) if id == temp));
}

#[test]
fn test_trivial_temporary_has_no_cleanup() {
    let mut lw = new_lowerer("temp");
    let mut inits = InitArena::new();
    let i64_ty = lw.lower_type(&Type::int(64));

    let temp = inits.emit_temporary(&mut lw, i64_ty);

    assert_eq!(inits.temporary(temp).expect("temporary").cleanup(), None);
}

#[test]
fn test_temporary_splits_into_field_addresses() {
    let mut lw = new_lowerer("split");
    let mut inits = InitArena::new();
    let subst = Type::tuple(vec![Type::int(64), Type::String]);
    let tuple_ty = lw.lower_type(&subst);

    let temp = inits.emit_temporary(&mut lw, tuple_ty);
    assert!(inits.can_split_into_tuple_elements(&lw, temp));

    let elements = inits
        .split_into_tuple_elements(&mut lw, temp, &subst)
        .expect("split");
    assert_eq!(elements.len(), 2);

    let i64_ty = lw.lower_type(&Type::int(64));
    let string_ty = lw.lower_type(&Type::String);
    let first = inits.address_for_in_place_init(elements[0]).expect("address");
    let second = inits.address_for_in_place_init(elements[1]).expect("address");
    assert_eq!(first.ty, i64_ty);
    assert_eq!(second.ty, string_ty);

    // Element destinations are plain addresses, not temporaries.
    assert!(matches!(
        inits.temporary(elements[0]),
        Err(LowerToIrError::NotATemporary(_))
    ));
}

#[test]
fn test_tuple_pattern_split_returns_elements() {
    let mut lw = new_lowerer("pattern");
    let mut inits = InitArena::new();
    let i64_ty = lw.lower_type(&Type::int(64));
    let a = inits.emit_temporary(&mut lw, i64_ty);
    let b = inits.emit_temporary(&mut lw, i64_ty);
    let pattern = inits.alloc(TuplePatternInitialization::new(vec![a, b]));

    assert!(inits.address_for_in_place_init(pattern).is_none());
    assert!(inits.can_split_into_tuple_elements(&lw, pattern));

    let subst = Type::tuple(vec![Type::int(64), Type::int(64)]);
    let elements = inits
        .split_into_tuple_elements(&mut lw, pattern, &subst)
        .expect("split");
    assert_eq!(elements, vec![a, b]);

    let wrong = Type::tuple(vec![Type::int(64)]);
    let err = inits
        .split_into_tuple_elements(&mut lw, pattern, &wrong)
        .expect_err("arity mismatch");
    assert!(matches!(err, LowerToIrError::ExpectedTuple(_)));
}

#[test]
fn test_existential_cannot_split() {
    let mut lw = new_lowerer("exist");
    let mut inits = InitArena::new();
    let container_ty = lw.lower_type(&Type::Existential {
        protocol: "Show".to_string(),
    });
    let container = lw.add_address_param(container_ty);
    let init = inits.alloc(ExistentialInitialization::new(container));

    assert!(inits.address_for_in_place_init(init).is_none());
    assert!(!inits.can_split_into_tuple_elements(&lw, init));

    let subst = Type::tuple(vec![Type::int(64), Type::Bool]);
    let err = inits
        .split_into_tuple_elements(&mut lw, init, &subst)
        .expect_err("not splittable");
    assert!(matches!(err, LowerToIrError::CannotSplit(id) if id == init));
}

#[test]
fn test_existential_projects_payload_on_copy() {
    let mut lw = new_lowerer("exist");
    let mut inits = InitArena::new();
    let container_ty = lw.lower_type(&Type::Existential {
        protocol: "Show".to_string(),
    });
    let container = lw.add_address_param(container_ty);
    let value = lw.add_param(&Type::int(64));
    let init = inits.alloc(ExistentialInitialization::new(container));

    inits
        .copy_or_init_value_into(&mut lw, init, value)
        .expect("copy");
    inits.finish_initialization(&mut lw, init).expect("finish");
    lw.emit_return(None);

    let (func, types) = lw.finish();
    let expected = indoc! {"
        fn exist(ptr<opaque<any Show>>, i64) -> () {
          bb0(%v0: ptr<opaque<any Show>>, %v1: i64):
            %v2: ptr<i64> = init_existential %v0, i64
            store %v2, %v1

            ret
        }
    "};
    assert_eq!(format_func(&func, &types), expected);
}

#[test]
fn test_tuple_pattern_copy_finishes_each_element() {
    let mut lw = new_lowerer("pattern");
    let mut inits = InitArena::new();
    let i64_ty = lw.lower_type(&Type::int(64));
    let bool_ty = lw.lower_type(&Type::Bool);
    let a = inits.emit_temporary(&mut lw, i64_ty);
    let b_addr = lw.add_address_param(bool_ty);
    let b = inits.alloc(KnownAddressInitialization::new(Address {
        value: b_addr,
        ty: bool_ty,
    }));
    let pattern = inits.alloc(TuplePatternInitialization::new(vec![a, b]));

    let value = lw.add_param(&Type::tuple(vec![Type::int(64), Type::Bool]));
    inits
        .copy_or_init_value_into(&mut lw, pattern, value)
        .expect("copy");

    assert!(inits.is_finished(a));
    assert!(inits.is_finished(b));
    assert!(!inits.is_finished(pattern));
    inits
        .finish_initialization(&mut lw, pattern)
        .expect("finish parent");
    lw.emit_return(None);

    let (func, types) = lw.finish();
    let expected = indoc! {"
        fn pattern(ptr<bool>, (i64, bool)) -> () {
          locals:
            %l0: i64 [8, align=8]
          bb0(%v1: ptr<bool>, %v2: (i64, bool)):
            %v0: ptr<i64> = addr_of %l0
            %v3: i64 = tuple_extract %v2, 0
            %v4: bool = tuple_extract %v2, 1
            store %v0, %v3
            store %v1, %v4

            ret
        }
    "};
    assert_eq!(format_func(&func, &types), expected);
}
