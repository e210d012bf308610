use crate::ir::format_type;
use crate::lower::{
    FuncLowerer, FunctionRepresentation, LowerOpts, LowerToIrError, ResultConvention,
    ResultInfo, ResultInfoQueue, lower_result_infos,
};
use crate::types::{AbstractionPattern, Type};

fn new_lowerer() -> FuncLowerer {
    FuncLowerer::new("conv", &LowerOpts::default())
}

fn describe(lw: &FuncLowerer, infos: &[ResultInfo]) -> Vec<String> {
    infos
        .iter()
        .map(|info| {
            let convention = match info.convention {
                ResultConvention::Indirect => "indirect",
                ResultConvention::Direct => "direct",
            };
            format!("{convention} {}", format_type(lw.types(), info.storage_ty))
        })
        .collect()
}

#[test]
fn test_concrete_tuple_results_are_direct() {
    let mut lw = new_lowerer();
    let subst = Type::tuple(vec![Type::int(64), Type::String]);
    let orig = AbstractionPattern::concrete(subst.clone());

    let infos = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::Native)
        .expect("infos");

    assert_eq!(describe(&lw, &infos), vec!["direct i64", "direct string"]);
}

#[test]
fn test_opaque_result_is_indirect_even_when_loadable() {
    let mut lw = new_lowerer();
    let orig = AbstractionPattern::opaque("T");

    let infos = lower_result_infos(&mut lw, &orig, &Type::int(64), FunctionRepresentation::Native)
        .expect("infos");

    assert_eq!(describe(&lw, &infos), vec!["indirect ptr<i64>"]);
    let i64_ty = lw.lower_type(&Type::int(64));
    assert_eq!(infos[0].value_ty(lw.types()), i64_ty);
}

#[test]
fn test_opaque_tuple_result_is_one_leaf() {
    let mut lw = new_lowerer();
    let orig = AbstractionPattern::opaque("T");
    let subst = Type::tuple(vec![Type::int(64), Type::Bool]);

    let infos = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::Native)
        .expect("infos");

    assert_eq!(describe(&lw, &infos), vec!["indirect ptr<(i64, bool)>"]);
}

#[test]
fn test_mixed_tuple_pattern_flattens_in_order() {
    let mut lw = new_lowerer();
    let orig = AbstractionPattern::tuple(vec![
        AbstractionPattern::opaque("T"),
        AbstractionPattern::tuple(vec![
            AbstractionPattern::concrete(Type::Bool),
            AbstractionPattern::opaque("U"),
        ]),
    ]);
    let subst = Type::tuple(vec![
        Type::String,
        Type::tuple(vec![Type::Bool, Type::func(vec![], Type::int(64))]),
    ]);

    let infos = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::Native)
        .expect("infos");

    assert_eq!(
        describe(&lw, &infos),
        vec![
            "indirect ptr<string>",
            "direct bool",
            "indirect ptr<fn(ptr<i64>) -> ()>",
        ]
    );
}

#[test]
fn test_address_only_concrete_result_is_indirect() {
    let mut lw = new_lowerer();
    let subst = Type::Param {
        name: "T".to_string(),
    };
    let orig = AbstractionPattern::concrete(subst.clone());

    let infos = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::Native)
        .expect("infos");

    assert_eq!(describe(&lw, &infos), vec!["indirect ptr<opaque<T>>"]);
}

#[test]
fn test_foreign_results_use_c_types() {
    let mut lw = new_lowerer();
    let subst = Type::tuple(vec![Type::String, Type::Bool]);
    let orig = AbstractionPattern::concrete(subst.clone());

    let infos = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::C)
        .expect("infos");

    assert_eq!(describe(&lw, &infos), vec!["direct ptr<u8>", "direct u8"]);
}

#[test]
fn test_tuple_arity_mismatch_is_reported() {
    let mut lw = new_lowerer();
    let orig = AbstractionPattern::tuple(vec![
        AbstractionPattern::opaque("T"),
        AbstractionPattern::opaque("U"),
    ]);
    let subst = Type::tuple(vec![Type::int(64)]);

    let err = lower_result_infos(&mut lw, &orig, &subst, FunctionRepresentation::Native)
        .expect_err("arity mismatch");
    assert!(matches!(err, LowerToIrError::TupleArityMismatch { .. }));

    let err = lower_result_infos(&mut lw, &orig, &Type::Bool, FunctionRepresentation::Native)
        .expect_err("not a tuple");
    assert!(matches!(err, LowerToIrError::ExpectedTuple(Type::Bool)));
}

#[test]
fn test_result_queue_claims_in_order() {
    let mut lw = new_lowerer();
    let i64_ty = lw.lower_type(&Type::int(64));
    let ptr_ty = lw.ptr_to(i64_ty);
    let infos = vec![ResultInfo::indirect(ptr_ty), ResultInfo::direct(i64_ty)];
    let mut queue = ResultInfoQueue::new(&infos);

    assert_eq!(queue.remaining(), 2);
    assert_eq!(queue.claim_next().expect("first"), infos[0]);
    assert_eq!(queue.claim_next().expect("second"), infos[1]);
    assert_eq!(queue.remaining(), 0);
    assert!(matches!(
        queue.claim_next(),
        Err(LowerToIrError::ResultInfosExhausted)
    ));
}

#[test]
fn test_fn_pattern_over_scalar_is_a_mismatch() {
    let mut lw = new_lowerer();
    let orig = AbstractionPattern::func(Vec::new(), AbstractionPattern::opaque("T"));

    let err = lower_result_infos(&mut lw, &orig, &Type::int(64), FunctionRepresentation::Native)
        .expect_err("fn pattern over i64");

    assert!(matches!(
        err,
        LowerToIrError::PatternMismatch { ref subst, .. } if *subst == Type::int(64)
    ));
}
