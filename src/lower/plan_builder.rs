use crate::ir::ValueId;
use crate::lower::conventions::{FunctionRepresentation, ResultInfo, ResultInfoQueue};
use crate::lower::errors::LowerToIrError;
use crate::lower::init::{InitArena, InitId, TemporaryInitialization};
use crate::lower::lowerer::FuncLowerer;
use crate::lower::result_plan::ResultPlan;
use crate::types::{AbstractionPattern, Type};

/// Builds a [`ResultPlan`] for one call, claiming result descriptors in
/// order and collecting the addresses to pass for indirect results.
pub struct ResultPlanBuilder<'r> {
    all_results: ResultInfoQueue<'r>,
    rep: FunctionRepresentation,
    indirect_result_addrs: Vec<ValueId>,
}

impl<'r> ResultPlanBuilder<'r> {
    pub fn new(results: &'r [ResultInfo], rep: FunctionRepresentation) -> Self {
        Self {
            all_results: ResultInfoQueue::new(results),
            rep,
            indirect_result_addrs: Vec::new(),
        }
    }

    /// Addresses registered so far, in descriptor order.
    pub fn indirect_result_addrs(&self) -> &[ValueId] {
        &self.indirect_result_addrs
    }

    pub fn build(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        init: Option<InitId>,
        orig: &AbstractionPattern,
        subst: &Type,
    ) -> Result<ResultPlan, LowerToIrError> {
        if orig.is_tuple() {
            return self.build_for_tuple(lw, inits, init, orig, subst);
        }

        let result = self.all_results.claim_next()?;

        // Emit straight into the destination when the callee's storage
        // matches its buffer exactly.
        if result.is_indirect()
            && let Some(init) = init
            && let Some(addr) = inits.address_for_in_place_init(init)
        {
            let addr_ty = lw.ptr_to(addr.ty);
            if !lw
                .types()
                .has_abstraction_difference(addr_ty, result.storage_ty)
            {
                tracing::debug!(%init, %subst, "result plan: in-place init");
                self.indirect_result_addrs.push(addr.value);
                return Ok(ResultPlan::InPlaceInit { init });
            }
        }

        let temporary = if result.is_indirect() {
            let value_ty = result.value_ty(lw.types());
            lw.trace_plan(format!(
                "result: temporary for indirect result #{}",
                self.indirect_result_addrs.len()
            ));
            let temp = TemporaryInitialization::emit(lw, value_ty);
            self.indirect_result_addrs.push(temp.address().value);
            Some(inits.alloc_temporary(temp))
        } else {
            None
        };
        tracing::debug!(
            %orig,
            %subst,
            indirect = temporary.is_some(),
            "result plan: scalar"
        );

        Ok(ResultPlan::Scalar {
            temporary,
            orig: orig.clone(),
            init,
            rep: self.rep,
        })
    }

    pub fn build_for_tuple(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        init: Option<InitId>,
        orig: &AbstractionPattern,
        subst: &Type,
    ) -> Result<ResultPlan, LowerToIrError> {
        let field_tys = subst
            .tuple_fields()
            .ok_or_else(|| LowerToIrError::ExpectedTuple(subst.clone()))?;
        if orig.tuple_arity() != Some(field_tys.len()) {
            return Err(LowerToIrError::TupleArityMismatch {
                orig: orig.clone(),
                subst: subst.clone(),
            });
        }

        let Some(init) = init else {
            tracing::debug!(%subst, "result plan: tuple r-value");
            let elements = self.build_elements(lw, inits, None, orig, field_tys)?;
            return Ok(ResultPlan::TupleRValue { elements });
        };

        if inits.can_split_into_tuple_elements(lw, init) {
            tracing::debug!(%init, %subst, "result plan: split tuple initialization");
            let element_inits = inits.split_into_tuple_elements(lw, init, subst)?;
            if element_inits.len() != field_tys.len() {
                return Err(LowerToIrError::ExpectedTuple(subst.clone()));
            }
            let elements =
                self.build_elements(lw, inits, Some(&element_inits), orig, field_tys)?;
            return Ok(ResultPlan::TupleInitialization {
                init,
                element_inits,
                elements,
            });
        }

        let lowering = lw.type_lowering(subst);
        if lowering.is_address_only() {
            tracing::debug!(%init, %subst, "result plan: init from temporary");
            lw.trace_plan(format!("result: temporary for {subst}"));
            let temporary = inits.emit_temporary(lw, lowering.ty);
            let sub_plan = self.build_for_tuple(lw, inits, Some(temporary), orig, subst)?;
            return Ok(ResultPlan::InitFromTemporary {
                init,
                sub_plan: Box::new(sub_plan),
                temporary,
            });
        }

        tracing::debug!(%init, %subst, "result plan: init from r-value");
        let sub_plan = self.build_for_tuple(lw, inits, None, orig, subst)?;
        Ok(ResultPlan::InitFromRValue {
            init,
            sub_plan: Box::new(sub_plan),
        })
    }

    fn build_elements(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        element_inits: Option<&[InitId]>,
        orig: &AbstractionPattern,
        field_tys: &[Type],
    ) -> Result<Vec<ResultPlan>, LowerToIrError> {
        let parent = Type::tuple(field_tys.to_vec());
        field_tys
            .iter()
            .enumerate()
            .map(|(index, field_ty)| {
                let field_orig = orig.component(index, &parent);
                let field_init = element_inits.map(|ids| ids[index]);
                self.build(lw, inits, field_init, &field_orig, field_ty)
            })
            .collect()
    }

    /// Returns the indirect result addresses, failing if any result
    /// descriptor was left unclaimed.
    pub fn finish(self) -> Result<Vec<ValueId>, LowerToIrError> {
        match self.all_results.remaining() {
            0 => Ok(self.indirect_result_addrs),
            remaining => Err(LowerToIrError::ResultInfosUnconsumed { remaining }),
        }
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_plan_builder.rs"]
mod tests;
