use std::collections::HashMap;
use std::fmt;

use crate::ir::model::{BlockId, Function, InstKind, Terminator, ValueId, for_each_inst_use};
use crate::ir::{IrTypeCache, IrTypeId, IrTypeKind};

#[derive(Debug, Clone)]
pub struct VerifyError {
    message: String,
}

impl VerifyError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for VerifyError {}

fn err(func: &str, block: BlockId, message: impl Into<String>) -> VerifyError {
    VerifyError::new(format!("{func} bb{}: {}", block.0, message.into()))
}

/// Checks that every used value is defined earlier in its block (or is a block
/// param) and that memory operands have pointer types.
pub fn verify_function(func: &Function, types: &IrTypeCache) -> Result<(), VerifyError> {
    let mut value_types: HashMap<ValueId, IrTypeId> = HashMap::new();

    for block in &func.blocks {
        for param in &block.params {
            if value_types.insert(param.value.id, param.value.ty).is_some() {
                return Err(err(
                    &func.name,
                    block.id,
                    format!("duplicate value %v{}", param.value.id.0),
                ));
            }
        }

        for inst in &block.insts {
            let mut undefined = None;
            for_each_inst_use(&inst.kind, |value| {
                if undefined.is_none() && !value_types.contains_key(&value) {
                    undefined = Some(value);
                }
            });
            if let Some(value) = undefined {
                return Err(err(
                    &func.name,
                    block.id,
                    format!("use of undefined value %v{}", value.0),
                ));
            }

            match &inst.kind {
                InstKind::Load { ptr }
                | InstKind::Store { ptr, .. }
                | InstKind::Drop { ptr }
                | InstKind::FieldAddr { base: ptr, .. }
                | InstKind::InitExistential {
                    container: ptr, ..
                } => {
                    expect_ptr(func, block.id, types, &value_types, *ptr)?;
                }
                InstKind::CopyAddr { dst, src } => {
                    expect_ptr(func, block.id, types, &value_types, *dst)?;
                    expect_ptr(func, block.id, types, &value_types, *src)?;
                }
                _ => {}
            }

            if let Some(result) = &inst.result
                && value_types.insert(result.id, result.ty).is_some()
            {
                return Err(err(
                    &func.name,
                    block.id,
                    format!("duplicate value %v{}", result.id.0),
                ));
            }
        }

        if let Terminator::Return { value: Some(value) } = &block.term
            && !value_types.contains_key(value)
        {
            return Err(err(
                &func.name,
                block.id,
                format!("return of undefined value %v{}", value.0),
            ));
        }
    }

    Ok(())
}

fn expect_ptr(
    func: &Function,
    block: BlockId,
    types: &IrTypeCache,
    value_types: &HashMap<ValueId, IrTypeId>,
    value: ValueId,
) -> Result<(), VerifyError> {
    let ty = value_types[&value];
    match types.kind(ty) {
        IrTypeKind::Ptr { .. } => Ok(()),
        other => Err(err(
            &func.name,
            block,
            format!("expected pointer operand %v{}, found {:?}", value.0, other),
        )),
    }
}

#[cfg(test)]
#[path = "../tests/ir/t_verify.rs"]
mod tests;
