//! Result calling conventions.
//!
//! A callee's formal result is flattened into an ordered list of
//! [`ResultInfo`] descriptors, one per non-tuple leaf of its abstraction
//! pattern. Indirect results are written by the callee through a caller
//! provided address; direct results come back as call return values.

use serde::Deserialize;

use crate::ir::{IrTypeCache, IrTypeId};
use crate::lower::errors::LowerToIrError;
use crate::lower::lowerer::FuncLowerer;
use crate::types::{AbstractionPattern, Type};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionRepresentation {
    #[default]
    Native,
    /// C calling convention; results need bridging into native form.
    C,
}

impl FunctionRepresentation {
    pub fn is_foreign(self) -> bool {
        matches!(self, FunctionRepresentation::C)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultConvention {
    Indirect,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultInfo {
    pub convention: ResultConvention,
    /// Storage type: `ptr<T>` for indirect results, `T` for direct ones.
    pub storage_ty: IrTypeId,
}

impl ResultInfo {
    pub fn direct(storage_ty: IrTypeId) -> Self {
        Self {
            convention: ResultConvention::Direct,
            storage_ty,
        }
    }

    pub fn indirect(storage_ty: IrTypeId) -> Self {
        Self {
            convention: ResultConvention::Indirect,
            storage_ty,
        }
    }

    pub fn is_indirect(&self) -> bool {
        self.convention == ResultConvention::Indirect
    }

    /// The type of the value itself (the pointee for indirect results).
    pub fn value_ty(&self, types: &IrTypeCache) -> IrTypeId {
        if self.is_indirect() {
            types
                .pointee(self.storage_ty)
                .unwrap_or_else(|| panic!("backend indirect result without pointer storage"))
        } else {
            self.storage_ty
        }
    }
}

/// Computes the result descriptors for a callee with formal result `orig`
/// applied at substituted result type `subst`.
pub fn lower_result_infos(
    lw: &mut FuncLowerer,
    orig: &AbstractionPattern,
    subst: &Type,
    rep: FunctionRepresentation,
) -> Result<Vec<ResultInfo>, LowerToIrError> {
    let mut infos = Vec::new();
    collect_result_infos(lw, orig, subst, rep, &mut infos)?;
    Ok(infos)
}

fn collect_result_infos(
    lw: &mut FuncLowerer,
    orig: &AbstractionPattern,
    subst: &Type,
    rep: FunctionRepresentation,
    out: &mut Vec<ResultInfo>,
) -> Result<(), LowerToIrError> {
    if let Some(arity) = orig.tuple_arity() {
        let field_tys = subst
            .tuple_fields()
            .ok_or_else(|| LowerToIrError::ExpectedTuple(subst.clone()))?;
        if field_tys.len() != arity {
            return Err(LowerToIrError::TupleArityMismatch {
                orig: orig.clone(),
                subst: subst.clone(),
            });
        }
        for (index, field_ty) in field_tys.iter().enumerate() {
            let field_orig = orig.component(index, subst);
            collect_result_infos(lw, &field_orig, field_ty, rep, out)?;
        }
        return Ok(());
    }

    let info = if rep.is_foreign() {
        ResultInfo::direct(lw.type_lowerer.lower_foreign(subst))
    } else {
        let value_ty = lw.type_lowerer.lower_abstracted(orig, subst)?;
        if orig.is_opaque() || lw.types().is_address_only(value_ty) {
            ResultInfo::indirect(lw.ptr_to(value_ty))
        } else {
            ResultInfo::direct(value_ty)
        }
    };
    out.push(info);
    Ok(())
}

/// Cursor over result descriptors, consumed in order by plan building.
pub struct ResultInfoQueue<'r> {
    infos: &'r [ResultInfo],
    next: usize,
}

impl<'r> ResultInfoQueue<'r> {
    pub fn new(infos: &'r [ResultInfo]) -> Self {
        Self { infos, next: 0 }
    }

    pub fn claim_next(&mut self) -> Result<ResultInfo, LowerToIrError> {
        let info = self
            .infos
            .get(self.next)
            .copied()
            .ok_or(LowerToIrError::ResultInfosExhausted)?;
        self.next += 1;
        Ok(info)
    }

    pub fn remaining(&self) -> usize {
        self.infos.len() - self.next
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_conventions.rs"]
mod tests;
