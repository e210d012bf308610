//! Type lowering: semantic types to IR types.
//!
//! Three lowerings are provided:
//! - natural: the representation a value has in a concrete context,
//! - abstracted: the representation under an abstraction pattern,
//! - foreign: the C representation used by foreign calling conventions.

use std::collections::HashMap;

use thiserror::Error;

use crate::ir::{IrStructField, IrTypeCache, IrTypeId, IrTypeKind, LocalSize};
use crate::types::{AbstractionPattern, Type};

/// An abstraction pattern whose shape does not fit its substituted type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern {orig} does not fit type {subst}")]
pub struct PatternMismatch {
    pub orig: AbstractionPattern,
    pub subst: Type,
}

/// Storage facts about a lowered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLowering {
    pub ty: IrTypeId,
    pub address_only: bool,
    pub trivial: bool,
}

impl TypeLowering {
    pub fn is_address_only(&self) -> bool {
        self.address_only
    }

    pub fn is_loadable(&self) -> bool {
        !self.address_only
    }
}

pub struct TypeLowerer {
    pub ir_type_cache: IrTypeCache,
    natural_cache: HashMap<Type, IrTypeId>,
    ptr_cache: HashMap<IrTypeId, IrTypeId>,
}

impl Default for TypeLowerer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeLowerer {
    pub fn new() -> Self {
        Self {
            ir_type_cache: IrTypeCache::new(),
            natural_cache: HashMap::new(),
            ptr_cache: HashMap::new(),
        }
    }

    pub fn types(&self) -> &IrTypeCache {
        &self.ir_type_cache
    }

    /// Lowers a type in a fully concrete context.
    pub fn lower_type(&mut self, ty: &Type) -> IrTypeId {
        if let Some(id) = self.natural_cache.get(ty) {
            return *id;
        }

        let id = match ty {
            Type::Unit => self.ir_type_cache.add(IrTypeKind::Unit),
            Type::Bool => self.ir_type_cache.add(IrTypeKind::Bool),
            Type::Int { signed, bits } => self.ir_type_cache.add(IrTypeKind::Int {
                signed: *signed,
                bits: *bits,
            }),
            Type::String => self.lower_string(),
            Type::Tuple { field_tys } => {
                let fields = field_tys.iter().map(|ty| self.lower_type(ty)).collect();
                self.ir_type_cache.add(IrTypeKind::Tuple { fields })
            }
            Type::Fn { params, ret_ty } => {
                let params = params.iter().map(|ty| self.lower_type(ty)).collect();
                let ret = self.lower_type(ret_ty);
                self.ir_type_cache.add(IrTypeKind::Fn { params, ret })
            }
            Type::Param { name } => self.ir_type_cache.add(IrTypeKind::Opaque { name: name.clone() }),
            Type::Existential { protocol } => self.ir_type_cache.add(IrTypeKind::Opaque {
                name: format!("any {protocol}"),
            }),
        };

        self.natural_cache.insert(ty.clone(), id);
        id
    }

    fn lower_string(&mut self) -> IrTypeId {
        let u8_ty = self.lower_type(&Type::uint(8));
        let u64_ty = self.lower_type(&Type::uint(64));
        let ptr_ty = self.ptr_to(u8_ty);
        self.ir_type_cache.add_named_resource(
            IrTypeKind::Struct {
                fields: vec![
                    IrStructField {
                        name: "ptr".to_string(),
                        ty: ptr_ty,
                    },
                    IrStructField {
                        name: "len".to_string(),
                        ty: u64_ty,
                    },
                    IrStructField {
                        name: "cap".to_string(),
                        ty: u64_ty,
                    },
                ],
            },
            "string".to_string(),
        )
    }

    /// Returns the storage facts for a substituted type.
    pub fn type_lowering(&mut self, ty: &Type) -> TypeLowering {
        let lowered = self.lower_type(ty);
        TypeLowering {
            ty: lowered,
            address_only: self.ir_type_cache.is_address_only(lowered),
            trivial: self.ir_type_cache.is_trivial(lowered),
        }
    }

    /// Lowers `subst` as seen through the abstraction pattern `orig`.
    ///
    /// Generic positions force maximal abstraction: function values take and
    /// return everything indirectly.
    pub fn lower_abstracted(
        &mut self,
        orig: &AbstractionPattern,
        subst: &Type,
    ) -> Result<IrTypeId, PatternMismatch> {
        let mismatch = || PatternMismatch {
            orig: orig.clone(),
            subst: subst.clone(),
        };
        match orig {
            AbstractionPattern::Type { .. } => Ok(self.lower_type(subst)),
            AbstractionPattern::Tuple { elements } => {
                let field_tys = subst.tuple_fields().ok_or_else(mismatch)?;
                if elements.len() != field_tys.len() {
                    return Err(mismatch());
                }
                let fields = elements
                    .iter()
                    .zip(field_tys)
                    .map(|(elem, field)| self.lower_abstracted(elem, field))
                    .collect::<Result<_, _>>()?;
                Ok(self.ir_type_cache.add(IrTypeKind::Tuple { fields }))
            }
            AbstractionPattern::Opaque { .. } => match subst {
                Type::Fn { params, .. } => {
                    let opaque_fn = AbstractionPattern::func(
                        params.iter().map(|_| orig.clone()).collect(),
                        orig.clone(),
                    );
                    self.lower_abstracted(&opaque_fn, subst)
                }
                Type::Tuple { field_tys } => {
                    let fields = field_tys
                        .iter()
                        .map(|field| self.lower_abstracted(orig, field))
                        .collect::<Result<_, _>>()?;
                    Ok(self.ir_type_cache.add(IrTypeKind::Tuple { fields }))
                }
                _ => Ok(self.lower_type(subst)),
            },
            AbstractionPattern::Fn {
                params: param_pats,
                ret: ret_pat,
            } => {
                let Type::Fn { params, ret_ty } = subst else {
                    return Err(mismatch());
                };
                if param_pats.len() != params.len() {
                    return Err(mismatch());
                }
                let mut lowered_params = Vec::with_capacity(params.len() + 1);
                let ret = if ret_pat.is_opaque() {
                    let ret = self.lower_abstracted(ret_pat, ret_ty)?;
                    lowered_params.push(self.ptr_to(ret));
                    self.lower_type(&Type::Unit)
                } else {
                    self.lower_abstracted(ret_pat, ret_ty)?
                };
                for (pat, param) in param_pats.iter().zip(params) {
                    let lowered = self.lower_abstracted(pat, param)?;
                    lowered_params.push(if pat.is_opaque() {
                        self.ptr_to(lowered)
                    } else {
                        lowered
                    });
                }
                Ok(self.ir_type_cache.add(IrTypeKind::Fn {
                    params: lowered_params,
                    ret,
                }))
            }
        }
    }

    /// Lowers a type as a foreign (C) function would produce it.
    pub fn lower_foreign(&mut self, ty: &Type) -> IrTypeId {
        match ty {
            Type::String => {
                let u8_ty = self.lower_type(&Type::uint(8));
                self.ptr_to(u8_ty)
            }
            Type::Bool => self.lower_type(&Type::uint(8)),
            Type::Tuple { field_tys } => {
                let fields = field_tys.iter().map(|ty| self.lower_foreign(ty)).collect();
                self.ir_type_cache.add(IrTypeKind::Tuple { fields })
            }
            _ => self.lower_type(ty),
        }
    }

    pub fn ptr_to(&mut self, elem: IrTypeId) -> IrTypeId {
        if let Some(id) = self.ptr_cache.get(&elem) {
            return *id;
        }
        let id = self.ir_type_cache.add(IrTypeKind::Ptr { elem });
        self.ptr_cache.insert(elem, id);
        id
    }

    pub fn unit_type(&mut self) -> IrTypeId {
        self.lower_type(&Type::Unit)
    }

    /// Stack storage needed for a local of type `ty`.
    pub fn local_size(&mut self, ty: IrTypeId) -> LocalSize {
        if self.ir_type_cache.is_address_only(ty) {
            return LocalSize::Dynamic;
        }
        let layout = self.ir_type_cache.layout(ty);
        LocalSize::Static {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/types/t_lowering.rs"]
mod tests;
