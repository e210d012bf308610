//! R-values: the outcome of finishing a result plan.
//!
//! A result either went straight into its destination (`InContext`), or it
//! is held as an exploded list of owned leaf values, one per non-tuple leaf
//! of the substituted type in left-to-right order.

use crate::ir::ValueId;
use crate::lower::cleanup::ManagedValue;
use crate::lower::errors::LowerToIrError;
use crate::lower::init::{InitArena, InitId};
use crate::lower::lowerer::FuncLowerer;
use crate::types::Type;

#[must_use]
#[derive(Debug)]
pub enum RValue {
    /// The value was emitted into its initialization; nothing to hold.
    InContext,
    Value {
        ty: Type,
        elements: Vec<ManagedValue>,
    },
}

impl RValue {
    /// An empty tuple r-value to be filled element by element.
    pub fn new_tuple(ty: Type) -> Self {
        RValue::Value {
            ty,
            elements: Vec::new(),
        }
    }

    /// Wraps a single owned value of substituted type `ty`, exploding tuples
    /// into their leaves.
    pub fn from_value(lw: &mut FuncLowerer, ty: &Type, value: ManagedValue) -> Self {
        let mut elements = Vec::with_capacity(ty.leaf_count());
        explode(lw, ty, value, &mut elements);
        RValue::Value {
            ty: ty.clone(),
            elements,
        }
    }

    pub fn is_in_context(&self) -> bool {
        matches!(self, RValue::InContext)
    }

    pub fn ty(&self) -> Option<&Type> {
        match self {
            RValue::InContext => None,
            RValue::Value { ty, .. } => Some(ty),
        }
    }

    pub fn elements(&self) -> &[ManagedValue] {
        match self {
            RValue::InContext => &[],
            RValue::Value { elements, .. } => elements,
        }
    }

    /// True once every leaf of the type has a value.
    pub fn is_complete(&self) -> bool {
        match self {
            RValue::InContext => true,
            RValue::Value { ty, elements } => elements.len() == ty.leaf_count(),
        }
    }

    /// Appends the leaves of `element` to this tuple r-value.
    pub fn add_element(&mut self, element: RValue) -> Result<(), LowerToIrError> {
        let RValue::Value { elements, .. } = self else {
            return Err(LowerToIrError::RValueInContext);
        };
        match element {
            RValue::InContext => Err(LowerToIrError::RValueInContext),
            RValue::Value {
                elements: leaves, ..
            } => {
                elements.extend(leaves);
                Ok(())
            }
        }
    }

    /// Reassembles the leaves into one owned value.
    ///
    /// Loadable tuples become a `tuple` instruction; address-only tuples are
    /// built in a fresh stack buffer.
    pub fn into_single_value(self, lw: &mut FuncLowerer) -> Result<ManagedValue, LowerToIrError> {
        assert!(self.is_complete(), "backend incomplete r-value {self:?}");
        let RValue::Value { ty, elements } = self else {
            return Err(LowerToIrError::RValueInContext);
        };
        let mut leaves = elements.into_iter();
        let value = implode(lw, &ty, &mut leaves);
        Ok(value)
    }

    /// Moves the value into `init` and finishes it.
    pub fn forward_into(
        self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        init: InitId,
    ) -> Result<(), LowerToIrError> {
        let value = self.into_single_value(lw)?;
        inits.copy_or_init_value_into(lw, init, value)?;
        inits.finish_initialization(lw, init)
    }
}

fn explode(lw: &mut FuncLowerer, ty: &Type, value: ManagedValue, out: &mut Vec<ManagedValue>) {
    let Some(field_tys) = ty.tuple_fields() else {
        out.push(value);
        return;
    };
    let parts = lw.emit_destructure(value);
    for (field_ty, part) in field_tys.iter().zip(parts) {
        explode(lw, field_ty, part, out);
    }
}

fn implode(
    lw: &mut FuncLowerer,
    ty: &Type,
    leaves: &mut std::vec::IntoIter<ManagedValue>,
) -> ManagedValue {
    if !ty.is_tuple() {
        return leaves
            .next()
            .unwrap_or_else(|| panic!("backend r-value missing leaf for {ty}"));
    }

    let lowering = lw.type_lowering(ty);
    if lowering.is_loadable() {
        let fields = implode_fields(lw, ty, leaves);
        let value = lw.builder.make_tuple(fields, lowering.ty);
        return lw.managed_rvalue(value, lowering.ty);
    }

    let addr = lw.alloc_stack(lowering.ty, None);
    init_buffer(lw, ty, addr, leaves);
    lw.managed_buffer(addr, lowering.ty)
}

fn implode_fields(
    lw: &mut FuncLowerer,
    ty: &Type,
    leaves: &mut std::vec::IntoIter<ManagedValue>,
) -> Vec<ValueId> {
    let field_tys = ty.tuple_fields().unwrap_or(&[]);
    field_tys
        .iter()
        .map(|field_ty| {
            let value = implode(lw, field_ty, leaves);
            value.forward(&mut lw.cleanups)
        })
        .collect()
}

fn init_buffer(
    lw: &mut FuncLowerer,
    ty: &Type,
    addr: ValueId,
    leaves: &mut std::vec::IntoIter<ManagedValue>,
) {
    let Some(field_tys) = ty.tuple_fields() else {
        let leaf = leaves
            .next()
            .unwrap_or_else(|| panic!("backend r-value missing leaf for {ty}"));
        lw.emit_store_or_copy(leaf, addr);
        return;
    };
    for (index, field_ty) in field_tys.iter().enumerate() {
        let field_ir_ty = lw.lower_type(field_ty);
        let ptr_ty = lw.ptr_to(field_ir_ty);
        let field_addr = lw.builder.field_addr(addr, index, ptr_ty);
        init_buffer(lw, field_ty, field_addr, leaves);
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_rvalue.rs"]
mod tests;
