use crate::ir::{
    FunctionBuilder, FunctionSig, IrTypeCache, IrTypeKind, LocalSize, Terminator, ValueId,
    verify_function,
};

#[test]
fn test_verify_accepts_well_formed_function() {
    let mut types = IrTypeCache::new();
    let unit_ty = types.add(IrTypeKind::Unit);
    let i64_ty = types.add(IrTypeKind::Int {
        signed: true,
        bits: 64,
    });
    let ptr_ty = types.add(IrTypeKind::Ptr { elem: i64_ty });

    let mut builder = FunctionBuilder::new(
        "ok",
        FunctionSig {
            params: vec![],
            ret: unit_ty,
        },
    );
    let value = builder.add_param(i64_ty);
    let local = builder.add_local(i64_ty, LocalSize::Static { size: 8, align: 8 }, None);
    let addr = builder.addr_of_local(local, ptr_ty);
    builder.store(addr, value);
    builder.terminate(Terminator::Return { value: None });
    let func = builder.finish();

    assert!(verify_function(&func, &types).is_ok());
}

#[test]
fn test_verify_rejects_undefined_use() {
    let mut types = IrTypeCache::new();
    let unit_ty = types.add(IrTypeKind::Unit);

    let mut builder = FunctionBuilder::new(
        "bad",
        FunctionSig {
            params: vec![],
            ret: unit_ty,
        },
    );
    builder.release(ValueId(7));
    builder.terminate(Terminator::Return { value: None });
    let func = builder.finish();

    let err = verify_function(&func, &types).expect_err("undefined use");
    assert_eq!(err.to_string(), "bad bb0: use of undefined value %v7");
}

#[test]
fn test_verify_rejects_non_pointer_load() {
    let mut types = IrTypeCache::new();
    let unit_ty = types.add(IrTypeKind::Unit);
    let i64_ty = types.add(IrTypeKind::Int {
        signed: true,
        bits: 64,
    });

    let mut builder = FunctionBuilder::new(
        "bad_load",
        FunctionSig {
            params: vec![],
            ret: unit_ty,
        },
    );
    let value = builder.add_param(i64_ty);
    let _ = builder.load(value, i64_ty);
    builder.terminate(Terminator::Return { value: None });
    let func = builder.finish();

    let err = verify_function(&func, &types).expect_err("non-pointer load");
    assert!(
        err.to_string().contains("expected pointer operand %v0"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_verify_rejects_undefined_return() {
    let mut types = IrTypeCache::new();
    let i64_ty = types.add(IrTypeKind::Int {
        signed: true,
        bits: 64,
    });

    let mut builder = FunctionBuilder::new(
        "bad_ret",
        FunctionSig {
            params: vec![],
            ret: i64_ty,
        },
    );
    builder.terminate(Terminator::Return {
        value: Some(ValueId(3)),
    });
    let func = builder.finish();

    let err = verify_function(&func, &types).expect_err("undefined return");
    assert_eq!(err.to_string(), "bad_ret bb0: return of undefined value %v3");
}
