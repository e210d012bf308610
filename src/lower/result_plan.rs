//! Result plans.
//!
//! A result plan is built before a call is emitted and records, for every
//! piece of the formal result, where the callee's output lands and how it
//! reaches its final destination. After the call, `finish` walks the plan,
//! consuming the call's direct results in order, and produces an [`RValue`].

use crate::lower::cleanup::ManagedValue;
use crate::lower::conventions::FunctionRepresentation;
use crate::lower::errors::LowerToIrError;
use crate::lower::init::{InitArena, InitId};
use crate::lower::lowerer::FuncLowerer;
use crate::lower::reabstract::{Reabstracted, bridge_to_native, reabstract_orig_to_subst};
use crate::lower::rvalue::RValue;
use crate::types::{AbstractionPattern, Type};

/// The call's direct results, claimed in order while finishing a plan.
#[derive(Debug)]
pub struct DirectResults {
    values: std::vec::IntoIter<ManagedValue>,
}

impl DirectResults {
    pub fn new(values: Vec<ManagedValue>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    pub fn claim_next(&mut self) -> Result<ManagedValue, LowerToIrError> {
        self.values
            .next()
            .ok_or(LowerToIrError::DirectResultsExhausted)
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Fails unless every direct result was claimed.
    pub fn ensure_consumed(&self) -> Result<(), LowerToIrError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(LowerToIrError::DirectResultsUnconsumed { remaining }),
        }
    }
}

#[derive(Debug)]
pub enum ResultPlan {
    /// The callee writes the result straight into the destination's buffer.
    InPlaceInit { init: InitId },
    /// One leaf result, direct or through a temporary buffer.
    Scalar {
        temporary: Option<InitId>,
        orig: AbstractionPattern,
        init: Option<InitId>,
        rep: FunctionRepresentation,
    },
    /// A non-splittable destination fed through an address-only temporary.
    InitFromTemporary {
        init: InitId,
        sub_plan: Box<ResultPlan>,
        temporary: InitId,
    },
    /// A non-splittable destination fed from a loadable r-value.
    InitFromRValue {
        init: InitId,
        sub_plan: Box<ResultPlan>,
    },
    /// A tuple result with no destination.
    TupleRValue { elements: Vec<ResultPlan> },
    /// A tuple result whose destination was split into element destinations.
    TupleInitialization {
        init: InitId,
        element_inits: Vec<InitId>,
        elements: Vec<ResultPlan>,
    },
}

impl ResultPlan {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResultPlan::InPlaceInit { .. } => "in_place_init",
            ResultPlan::Scalar { .. } => "scalar",
            ResultPlan::InitFromTemporary { .. } => "init_from_temporary",
            ResultPlan::InitFromRValue { .. } => "init_from_rvalue",
            ResultPlan::TupleRValue { .. } => "tuple_rvalue",
            ResultPlan::TupleInitialization { .. } => "tuple_initialization",
        }
    }

    /// Materializes the result described by this plan after the call.
    ///
    /// Each plan node is consumed exactly once, so every temporary and
    /// initialization it owns is finished at most once.
    pub fn finish(
        self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        subst: &Type,
        direct_results: &mut DirectResults,
    ) -> Result<RValue, LowerToIrError> {
        tracing::trace!(plan = self.kind_name(), %subst, "finish result plan");
        match self {
            ResultPlan::InPlaceInit { init } => {
                inits.finish_initialization(lw, init)?;
                Ok(RValue::InContext)
            }

            ResultPlan::Scalar {
                temporary,
                orig,
                init,
                rep,
            } => finish_scalar(
                lw,
                inits,
                temporary,
                &orig,
                init,
                rep,
                subst,
                direct_results,
            ),

            ResultPlan::InitFromTemporary {
                init,
                sub_plan,
                temporary,
            } => {
                let sub_result = sub_plan.finish(lw, inits, subst, direct_results)?;
                if !sub_result.is_in_context() {
                    return Err(LowerToIrError::SubPlanNotInContext);
                }
                let value = inits.temporary_mut(temporary)?.take_managed_address();
                inits.copy_or_init_value_into(lw, init, value)?;
                inits.finish_initialization(lw, init)?;
                Ok(RValue::InContext)
            }

            ResultPlan::InitFromRValue { init, sub_plan } => {
                let sub_result = sub_plan.finish(lw, inits, subst, direct_results)?;
                sub_result.forward_into(lw, inits, init)?;
                Ok(RValue::InContext)
            }

            ResultPlan::TupleRValue { elements } => {
                let field_tys = tuple_fields_for(subst, elements.len())?;
                let mut tuple = RValue::new_tuple(subst.clone());
                for (plan, field_ty) in elements.into_iter().zip(field_tys) {
                    let element = plan.finish(lw, inits, field_ty, direct_results)?;
                    tuple.add_element(element)?;
                }
                Ok(tuple)
            }

            ResultPlan::TupleInitialization {
                init,
                element_inits: _,
                elements,
            } => {
                let field_tys = tuple_fields_for(subst, elements.len())?;
                for (index, (plan, field_ty)) in elements.into_iter().zip(field_tys).enumerate() {
                    let element = plan.finish(lw, inits, field_ty, direct_results)?;
                    if !element.is_in_context() {
                        return Err(LowerToIrError::ElementNotInContext { index });
                    }
                }
                inits.finish_initialization(lw, init)?;
                Ok(RValue::InContext)
            }
        }
    }
}

fn tuple_fields_for(subst: &Type, arity: usize) -> Result<&[Type], LowerToIrError> {
    let field_tys = subst
        .tuple_fields()
        .ok_or_else(|| LowerToIrError::ExpectedTuple(subst.clone()))?;
    if field_tys.len() != arity {
        return Err(LowerToIrError::ExpectedTuple(subst.clone()));
    }
    Ok(field_tys)
}

#[allow(clippy::too_many_arguments)]
fn finish_scalar(
    lw: &mut FuncLowerer,
    inits: &mut InitArena,
    temporary: Option<InitId>,
    orig: &AbstractionPattern,
    init: Option<InitId>,
    rep: FunctionRepresentation,
    subst: &Type,
    direct_results: &mut DirectResults,
) -> Result<RValue, LowerToIrError> {
    let lowering = lw.type_lowering(subst);

    let mut value = match temporary {
        Some(temporary) => {
            inits.finish_initialization(lw, temporary)?;
            let value = inits.temporary_mut(temporary)?.take_managed_address();
            if lowering.is_loadable() {
                lw.trace_plan(format!("result: load indirect {subst}"));
                lw.emit_load_take(value)
            } else {
                value
            }
        }
        None => direct_results.claim_next()?,
    };

    if lw
        .types()
        .has_abstraction_difference(value.ty(), lowering.ty)
    {
        if rep.is_foreign() {
            lw.trace_plan(format!("result: bridge {subst}"));
            value = bridge_to_native(lw, value, subst);
        } else {
            lw.trace_plan(format!("result: reabstract {orig} to {subst}"));
            match reabstract_orig_to_subst(lw, inits, value, orig, subst, init)? {
                Reabstracted::InContext => return Ok(RValue::InContext),
                Reabstracted::Value(converted) => value = converted,
            }
        }
    }

    if let Some(init) = init {
        inits.copy_or_init_value_into(lw, init, value)?;
        inits.finish_initialization(lw, init)?;
        return Ok(RValue::InContext);
    }

    Ok(RValue::from_value(lw, subst, value))
}

#[cfg(test)]
#[path = "../tests/lower/t_result_plan.rs"]
mod tests;
