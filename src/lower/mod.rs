//! Lowering of call results into SSA IR.
//!
//! Before a call is emitted, a [`ResultPlan`] is built from the callee's
//! result abstraction pattern, the substituted result type, and an optional
//! destination. The plan decides which results are returned directly and
//! which are written through caller-provided addresses. After the call, the
//! plan is finished: results are loaded, reabstracted or bridged as needed
//! and moved into their destinations.

pub mod apply;
pub mod cleanup;
pub mod conventions;
pub mod errors;
pub mod init;
pub mod lowerer;
pub mod plan_builder;
pub mod reabstract;
pub mod result_plan;
pub mod rvalue;

pub use apply::{AppliedCall, ApplySite, emit_apply, lower_call_result};
pub use cleanup::{CleanupHandle, CleanupKind, CleanupStack, CleanupState, ManagedValue};
pub use conventions::{
    FunctionRepresentation, ResultConvention, ResultInfo, ResultInfoQueue, lower_result_infos,
};
pub use errors::LowerToIrError;
pub use init::{
    Address, ExistentialInitialization, InitArena, InitId, Initialization,
    KnownAddressInitialization, TemporaryInitialization, TuplePatternInitialization,
};
pub use lowerer::FuncLowerer;
pub use plan_builder::ResultPlanBuilder;
pub use reabstract::{Reabstracted, bridge_to_native, reabstract_orig_to_subst};
pub use result_plan::{DirectResults, ResultPlan};
pub use rvalue::RValue;

/// Environment variable enabling result-plan trace comments in emitted IR.
pub const TRACE_ENV_VAR: &str = "RESULTPLAN_TRACE";

/// Options for call result lowering.
#[derive(Debug, Clone, Default)]
pub struct LowerOpts {
    /// Annotate emitted instructions with the plan decision that produced
    /// them.
    pub trace_plans: bool,
}

impl LowerOpts {
    pub fn from_env() -> Self {
        Self {
            trace_plans: std::env::var(TRACE_ENV_VAR).is_ok_and(|value| value == "1"),
        }
    }
}
