//! Scenario driver: lowers each scenario's call into its own IR function.

pub mod scenario;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ir::{
    Callee, Function, IrTypeCache, ValueId, VerifyError, format_func, format_func_with_comments,
    verify_function,
};
use crate::lower::{
    Address, ExistentialInitialization, FuncLowerer, InitArena, InitId,
    KnownAddressInitialization, LowerOpts, LowerToIrError, RValue, TuplePatternInitialization,
    lower_call_result,
};
use crate::types::Type;

pub use scenario::{Destination, Scenario, ScenarioSet, parse_scenarios};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),

    #[error("scenario `{name}`: {source}")]
    Lower {
        name: String,
        #[source]
        source: LowerToIrError,
    },

    #[error("scenario `{name}`: invalid IR: {source}")]
    Verify {
        name: String,
        #[source]
        source: VerifyError,
    },

    #[error("scenario `{name}`: tuple destination elements cannot be `none`")]
    InvalidDestination { name: String },
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub lower: LowerOpts,
    /// Print instruction comments (trace annotations) with the IR.
    pub comments: bool,
    /// Only lower the named scenario.
    pub only: Option<String>,
}

pub struct LoweredScenario {
    pub name: String,
    pub func: Function,
    pub types: IrTypeCache,
}

impl LoweredScenario {
    pub fn format(&self, comments: bool) -> String {
        if comments {
            format_func_with_comments(&self.func, &self.types)
        } else {
            format_func(&self.func, &self.types)
        }
    }
}

/// Reads a scenario file and returns the formatted IR of every scenario.
pub fn run_file(path: &Path, opts: &DriverOptions) -> Result<String, DriverError> {
    let source = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    run(&source, opts)
}

pub fn run(source: &str, opts: &DriverOptions) -> Result<String, DriverError> {
    let scenarios = parse_scenarios(source)?;
    let lowered = match &opts.only {
        Some(name) => {
            let scenario = scenarios
                .get(name)
                .ok_or_else(|| DriverError::UnknownScenario(name.clone()))?;
            vec![lower_scenario(name, scenario, &opts.lower)?]
        }
        None => lower_scenarios(&scenarios, &opts.lower)?,
    };

    let output = lowered
        .iter()
        .map(|scenario| scenario.format(opts.comments))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(output)
}

pub fn lower_scenarios(
    scenarios: &ScenarioSet,
    opts: &LowerOpts,
) -> Result<Vec<LoweredScenario>, DriverError> {
    scenarios
        .iter()
        .map(|(name, scenario)| lower_scenario(name, scenario, opts))
        .collect()
}

/// Lowers one scenario into a function that performs the call, delivers
/// the result to the scenario's destination, and returns any value result.
pub fn lower_scenario(
    name: &str,
    scenario: &Scenario,
    opts: &LowerOpts,
) -> Result<LoweredScenario, DriverError> {
    tracing::debug!(scenario = name, callee = %scenario.callee, "lower scenario");
    let lower_err = |source| DriverError::Lower {
        name: name.to_string(),
        source,
    };

    let mut lw = FuncLowerer::new(name, opts);
    let mut inits = InitArena::new();

    let init = build_destination(&mut lw, &mut inits, name, &scenario.dest, &scenario.subst)?;
    let args: Vec<ValueId> = scenario
        .args
        .iter()
        .map(|ty| {
            let param = lw.add_param(ty);
            param.forward(&mut lw.cleanups)
        })
        .collect();

    let applied = lower_call_result(
        &mut lw,
        &mut inits,
        Callee::Symbol(scenario.callee.clone()),
        args,
        &scenario.orig,
        &scenario.subst,
        scenario.rep,
        init,
    )
    .map_err(lower_err)?;

    let ret = match applied.result {
        RValue::InContext => None,
        rvalue => {
            let value = rvalue.into_single_value(&mut lw).map_err(lower_err)?;
            // Address-only results stay in their buffer until scope exit.
            if value.is_address() {
                None
            } else {
                Some(value)
            }
        }
    };
    lw.emit_return(ret);

    let (func, types) = lw.finish();
    verify_function(&func, &types).map_err(|source| DriverError::Verify {
        name: name.to_string(),
        source,
    })?;

    Ok(LoweredScenario {
        name: name.to_string(),
        func,
        types,
    })
}

fn build_destination(
    lw: &mut FuncLowerer,
    inits: &mut InitArena,
    name: &str,
    dest: &Destination,
    subst: &Type,
) -> Result<Option<InitId>, DriverError> {
    let init = match dest {
        Destination::None => return Ok(None),
        Destination::Local => {
            let ty = lw.lower_type(subst);
            inits.emit_temporary(lw, ty)
        }
        Destination::Param => {
            let ty = lw.lower_type(subst);
            let value = lw.add_address_param(ty);
            inits.alloc(KnownAddressInitialization::new(Address { value, ty }))
        }
        Destination::Existential { protocol } => {
            let container_ty = lw.lower_type(&Type::Existential {
                protocol: protocol.clone(),
            });
            let container = lw.add_address_param(container_ty);
            inits.alloc(ExistentialInitialization::new(container))
        }
        Destination::Tuple { elements } => {
            let field_tys = match subst.tuple_fields() {
                Some(fields) if fields.len() == elements.len() => fields,
                _ => {
                    return Err(DriverError::Lower {
                        name: name.to_string(),
                        source: LowerToIrError::ExpectedTuple(subst.clone()),
                    });
                }
            };
            let mut element_inits = Vec::with_capacity(elements.len());
            for (element, field_ty) in elements.iter().zip(field_tys) {
                let Some(init) = build_destination(lw, inits, name, element, field_ty)? else {
                    return Err(DriverError::InvalidDestination {
                        name: name.to_string(),
                    });
                };
                element_inits.push(init);
            }
            inits.alloc(TuplePatternInitialization::new(element_inits))
        }
    };
    Ok(Some(init))
}

#[cfg(test)]
#[path = "../tests/driver/t_driver.rs"]
mod tests;
