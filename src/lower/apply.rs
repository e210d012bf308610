//! Call emission with planned result materialization.

use crate::ir::{Callee, IrTypeId, IrTypeKind, ValueId};
use crate::lower::cleanup::ManagedValue;
use crate::lower::conventions::{FunctionRepresentation, ResultInfo, lower_result_infos};
use crate::lower::errors::LowerToIrError;
use crate::lower::init::{InitArena, InitId};
use crate::lower::lowerer::FuncLowerer;
use crate::lower::plan_builder::ResultPlanBuilder;
use crate::lower::result_plan::DirectResults;
use crate::lower::rvalue::RValue;
use crate::types::{AbstractionPattern, Type};

/// Everything needed to emit one call.
#[derive(Debug, Clone)]
pub struct ApplySite<'s> {
    pub callee: Callee,
    pub args: Vec<ValueId>,
    pub orig_result: &'s AbstractionPattern,
    pub subst_result: &'s Type,
    pub rep: FunctionRepresentation,
    pub results: &'s [ResultInfo],
    pub init: Option<InitId>,
}

#[derive(Debug)]
pub struct AppliedCall {
    pub result: RValue,
    /// Addresses passed for indirect results, in descriptor order.
    pub indirect_result_addrs: Vec<ValueId>,
}

/// Emits a call whose result descriptors are derived from `orig`/`subst`.
#[allow(clippy::too_many_arguments)]
pub fn lower_call_result(
    lw: &mut FuncLowerer,
    inits: &mut InitArena,
    callee: Callee,
    args: Vec<ValueId>,
    orig: &AbstractionPattern,
    subst: &Type,
    rep: FunctionRepresentation,
    init: Option<InitId>,
) -> Result<AppliedCall, LowerToIrError> {
    let results = lower_result_infos(lw, orig, subst, rep)?;
    emit_apply(
        lw,
        inits,
        ApplySite {
            callee,
            args,
            orig_result: orig,
            subst_result: subst,
            rep,
            results: &results,
            init,
        },
    )
}

/// Plans the result, emits the call with indirect result addresses
/// prepended to the arguments, and finishes the plan against the call's
/// direct results.
pub fn emit_apply(
    lw: &mut FuncLowerer,
    inits: &mut InitArena,
    site: ApplySite<'_>,
) -> Result<AppliedCall, LowerToIrError> {
    let mut builder = ResultPlanBuilder::new(site.results, site.rep);
    let plan = builder.build(lw, inits, site.init, site.orig_result, site.subst_result)?;
    let indirect_result_addrs = builder.finish()?;
    tracing::debug!(
        plan = plan.kind_name(),
        indirect = indirect_result_addrs.len(),
        "emit apply"
    );

    let direct_tys: Vec<IrTypeId> = site
        .results
        .iter()
        .filter(|info| !info.is_indirect())
        .map(|info| info.storage_ty)
        .collect();

    let mut args = indirect_result_addrs.clone();
    args.extend(site.args);
    let direct_values = emit_call(lw, site.callee, args, &direct_tys);

    let mut direct_results = DirectResults::new(direct_values);
    let result = plan.finish(lw, inits, site.subst_result, &mut direct_results)?;
    direct_results.ensure_consumed()?;

    Ok(AppliedCall {
        result,
        indirect_result_addrs,
    })
}

fn emit_call(
    lw: &mut FuncLowerer,
    callee: Callee,
    args: Vec<ValueId>,
    direct_tys: &[IrTypeId],
) -> Vec<ManagedValue> {
    match direct_tys {
        [] => {
            lw.builder.call(callee, args, None);
            Vec::new()
        }
        [ty] => {
            let value = lw
                .builder
                .call(callee, args, Some(*ty))
                .unwrap_or_else(|| panic!("backend call produced no value"));
            vec![lw.managed_rvalue(value, *ty)]
        }
        _ => {
            let tuple_ty = lw.type_lowerer.ir_type_cache.add(IrTypeKind::Tuple {
                fields: direct_tys.to_vec(),
            });
            let tuple = lw
                .builder
                .call(callee, args, Some(tuple_ty))
                .unwrap_or_else(|| panic!("backend call produced no value"));
            direct_tys
                .iter()
                .enumerate()
                .map(|(index, ty)| {
                    let value = lw.builder.tuple_extract(tuple, index, *ty);
                    lw.managed_rvalue(value, *ty)
                })
                .collect()
        }
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_apply.rs"]
mod tests;
