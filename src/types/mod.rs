mod lowering;
mod pattern;

pub use lowering::{PatternMismatch, TypeLowerer, TypeLowering};
pub use pattern::AbstractionPattern;

use std::fmt;

use serde::Deserialize;

/// A substituted (fully instantiated) semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Unit,
    Bool,
    Int {
        signed: bool,
        bits: u8,
    },
    String,
    Tuple {
        field_tys: Vec<Type>,
    },
    Fn {
        params: Vec<Type>,
        ret_ty: Box<Type>,
    },
    /// An unbound generic parameter of the enclosing function.
    Param {
        name: String,
    },
    Existential {
        protocol: String,
    },
}

impl Type {
    pub fn int(bits: u8) -> Self {
        Type::Int { signed: true, bits }
    }

    pub fn uint(bits: u8) -> Self {
        Type::Int {
            signed: false,
            bits,
        }
    }

    pub fn tuple(field_tys: Vec<Type>) -> Self {
        Type::Tuple { field_tys }
    }

    pub fn func(params: Vec<Type>, ret_ty: Type) -> Self {
        Type::Fn {
            params,
            ret_ty: Box::new(ret_ty),
        }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Type::Tuple { .. })
    }

    pub fn tuple_fields(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple { field_tys } => Some(field_tys),
            _ => None,
        }
    }

    /// Number of scalar leaves after flattening nested tuples.
    pub fn leaf_count(&self) -> usize {
        match self {
            Type::Tuple { field_tys } => field_tys.iter().map(Type::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Bool => write!(f, "bool"),
            Type::Int { signed, bits } => {
                let prefix = if *signed { "i" } else { "u" };
                write!(f, "{}{}", prefix, bits)
            }
            Type::String => write!(f, "string"),
            Type::Tuple { field_tys } => {
                let fields = field_tys.iter().map(|ty| ty.to_string()).collect::<Vec<_>>();
                write!(f, "({})", fields.join(", "))
            }
            Type::Fn { params, ret_ty } => {
                let params = params.iter().map(|ty| ty.to_string()).collect::<Vec<_>>();
                write!(f, "fn({}) -> {}", params.join(", "), ret_ty)
            }
            Type::Param { name } => write!(f, "{}", name),
            Type::Existential { protocol } => write!(f, "any {}", protocol),
        }
    }
}

#[cfg(test)]
#[path = "../tests/types/t_types.rs"]
mod tests;
