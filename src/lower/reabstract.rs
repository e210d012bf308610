//! Representation conversions applied to call results.
//!
//! Reabstraction converts a value from its abstraction-pattern
//! representation into its natural substituted representation. Bridging
//! converts a foreign (C) result into the native representation.

use crate::ir::{Callee, CmpOp, IrTypeId, IrTypeKind, RuntimeFn, ValueId};
use crate::lower::cleanup::ManagedValue;
use crate::lower::errors::LowerToIrError;
use crate::lower::init::{InitArena, InitId};
use crate::lower::lowerer::FuncLowerer;
use crate::types::{AbstractionPattern, Type};

#[must_use]
#[derive(Debug)]
pub enum Reabstracted {
    /// The converted value was emitted into the given context.
    InContext,
    Value(ManagedValue),
}

/// Converts `value` from the representation of `orig` to the natural
/// representation of `subst`.
///
/// When `ctx` offers an in-place address, the result is emitted there, the
/// context is finished, and `InContext` is returned.
pub fn reabstract_orig_to_subst(
    lw: &mut FuncLowerer,
    inits: &mut InitArena,
    value: ManagedValue,
    orig: &AbstractionPattern,
    subst: &Type,
    ctx: Option<InitId>,
) -> Result<Reabstracted, LowerToIrError> {
    tracing::trace!(%orig, %subst, "reabstract result");
    let value = convert_orig_to_subst(lw, value, orig, subst)?;

    if let Some(init) = ctx
        && inits.address_for_in_place_init(init).is_some()
    {
        inits.copy_or_init_value_into(lw, init, value)?;
        inits.finish_initialization(lw, init)?;
        return Ok(Reabstracted::InContext);
    }
    Ok(Reabstracted::Value(value))
}

fn convert_orig_to_subst(
    lw: &mut FuncLowerer,
    value: ManagedValue,
    orig: &AbstractionPattern,
    subst: &Type,
) -> Result<ManagedValue, LowerToIrError> {
    let lowering = lw.type_lowering(subst);
    if !lw
        .types()
        .has_abstraction_difference(value.ty(), lowering.ty)
    {
        return Ok(value);
    }

    match subst {
        Type::Fn { .. } if matches!(lw.types().kind(value.ty()), IrTypeKind::Fn { .. }) => {
            let value = take_loadable(lw, value, lowering.is_loadable());
            let func = value.forward(&mut lw.cleanups);
            let converted = lw.builder.reabstract(func, lowering.ty);
            Ok(lw.managed_rvalue(converted, lowering.ty))
        }
        Type::Tuple { field_tys }
            if lw
                .types()
                .tuple_fields(value.ty())
                .is_some_and(|fields| fields.len() == field_tys.len()) =>
        {
            let value = take_loadable(lw, value, lowering.is_loadable());
            let parts = lw.emit_destructure(value);
            let converted = field_tys
                .iter()
                .zip(parts)
                .enumerate()
                .map(|(index, (field_ty, part))| {
                    let field_orig = orig.component(index, subst);
                    convert_orig_to_subst(lw, part, &field_orig, field_ty)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rebuild_tuple(
                lw,
                converted,
                lowering.ty,
                lowering.is_address_only(),
            ))
        }
        _ => Err(LowerToIrError::PatternMismatch {
            orig: orig.clone(),
            subst: subst.clone(),
        }),
    }
}

fn take_loadable(lw: &mut FuncLowerer, value: ManagedValue, loadable: bool) -> ManagedValue {
    if value.is_address() && loadable {
        lw.emit_load_take(value)
    } else {
        value
    }
}

/// Converts a foreign result into the native representation of `subst`.
pub fn bridge_to_native(lw: &mut FuncLowerer, value: ManagedValue, subst: &Type) -> ManagedValue {
    let lowering = lw.type_lowering(subst);
    if !lw
        .types()
        .has_abstraction_difference(value.ty(), lowering.ty)
    {
        return value;
    }
    tracing::trace!(%subst, "bridge foreign result");

    match subst {
        Type::String => {
            let cstr = value.forward(&mut lw.cleanups);
            let string = lw
                .builder
                .call(
                    Callee::Runtime(RuntimeFn::StringFromCStr),
                    vec![cstr],
                    Some(lowering.ty),
                )
                .unwrap_or_else(|| panic!("backend runtime call produced no value"));
            lw.managed_rvalue(string, lowering.ty)
        }
        Type::Bool => {
            let byte_ty = value.ty();
            let byte = value.forward(&mut lw.cleanups);
            let zero = lw.builder.const_int(0, false, 8, byte_ty);
            let flag = lw.builder.cmp(CmpOp::Ne, byte, zero, lowering.ty);
            ManagedValue::for_unmanaged(flag, lowering.ty)
        }
        Type::Tuple { field_tys } => {
            let parts = lw.emit_destructure(value);
            let converted = field_tys
                .iter()
                .zip(parts)
                .map(|(field_ty, part)| bridge_to_native(lw, part, field_ty))
                .collect::<Vec<_>>();
            rebuild_tuple(lw, converted, lowering.ty, false)
        }
        _ => panic!("backend cannot bridge foreign result of type {subst}"),
    }
}

fn rebuild_tuple(
    lw: &mut FuncLowerer,
    fields: Vec<ManagedValue>,
    ty: IrTypeId,
    address_only: bool,
) -> ManagedValue {
    if !address_only {
        let values: Vec<ValueId> = fields
            .into_iter()
            .map(|field| field.forward(&mut lw.cleanups))
            .collect();
        let tuple = lw.builder.make_tuple(values, ty);
        return lw.managed_rvalue(tuple, ty);
    }

    let addr = lw.alloc_stack(ty, None);
    let field_tys = lw.types().tuple_fields(ty).unwrap_or(&[]).to_vec();
    for (index, (field, field_ty)) in fields.into_iter().zip(field_tys).enumerate() {
        let ptr_ty = lw.ptr_to(field_ty);
        let field_addr = lw.builder.field_addr(addr, index, ptr_ty);
        lw.emit_store_or_copy(field, field_addr);
    }
    lw.managed_buffer(addr, ty)
}

#[cfg(test)]
#[path = "../tests/lower/t_reabstract.rs"]
mod tests;
