use crate::ir::{IrStructField, IrTypeCache, IrTypeKind};

#[test]
fn test_layout_tuple_offsets() {
    let mut types = IrTypeCache::new();
    let u8_ty = types.add(IrTypeKind::Int {
        signed: false,
        bits: 8,
    });
    let u64_ty = types.add(IrTypeKind::Int {
        signed: false,
        bits: 64,
    });
    let tuple_ty = types.add(IrTypeKind::Tuple {
        fields: vec![u8_ty, u64_ty],
    });

    let layout = types.layout(tuple_ty);

    assert_eq!(layout.size(), 16);
    assert_eq!(layout.align(), 8);
    assert_eq!(layout.field_offsets(), &[0u64, 8]);
}

#[test]
fn test_layout_struct_offsets() {
    let mut types = IrTypeCache::new();
    let u8_ty = types.add(IrTypeKind::Int {
        signed: false,
        bits: 8,
    });
    let u32_ty = types.add(IrTypeKind::Int {
        signed: false,
        bits: 32,
    });
    let u16_ty = types.add(IrTypeKind::Int {
        signed: false,
        bits: 16,
    });
    let struct_ty = types.add_named_resource(
        IrTypeKind::Struct {
            fields: vec![
                IrStructField {
                    name: "a".to_string(),
                    ty: u8_ty,
                },
                IrStructField {
                    name: "b".to_string(),
                    ty: u32_ty,
                },
                IrStructField {
                    name: "c".to_string(),
                    ty: u16_ty,
                },
            ],
        },
        "Foo".to_string(),
    );

    let layout = types.layout(struct_ty);

    assert_eq!(layout.size(), 12);
    assert_eq!(layout.align(), 4);
    assert_eq!(layout.field_offsets(), &[0u64, 4, 8]);
}

#[test]
fn test_layout_fn_is_code_and_context() {
    let mut types = IrTypeCache::new();
    let unit_ty = types.add(IrTypeKind::Unit);
    let fn_ty = types.add(IrTypeKind::Fn {
        params: vec![],
        ret: unit_ty,
    });

    let layout = types.layout(fn_ty);

    assert_eq!(layout.size(), 16);
    assert_eq!(layout.align(), 8);
}

#[test]
fn test_layout_unit_is_empty() {
    let mut types = IrTypeCache::new();
    let unit_ty = types.add(IrTypeKind::Unit);

    let layout = types.layout(unit_ty);

    assert_eq!(layout.size(), 0);
    assert_eq!(layout.align(), 1);
}

#[test]
#[should_panic(expected = "opaque type T")]
fn test_layout_opaque_panics() {
    let mut types = IrTypeCache::new();
    let opaque_ty = types.add(IrTypeKind::Opaque {
        name: "T".to_string(),
    });
    let _ = types.layout(opaque_ty);
}
