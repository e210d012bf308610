//! Abstraction patterns: the declared, pre-substitution shape of a type.

use std::fmt;

use serde::Deserialize;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbstractionPattern {
    /// A generic parameter; any substitution is handled at maximal abstraction.
    Opaque { name: String },
    Tuple { elements: Vec<AbstractionPattern> },
    Fn {
        params: Vec<AbstractionPattern>,
        ret: Box<AbstractionPattern>,
    },
    /// A concrete declared type (no generic parameters).
    Type { ty: Type },
}

impl AbstractionPattern {
    pub fn opaque(name: impl Into<String>) -> Self {
        AbstractionPattern::Opaque { name: name.into() }
    }

    pub fn concrete(ty: Type) -> Self {
        AbstractionPattern::Type { ty }
    }

    pub fn tuple(elements: Vec<AbstractionPattern>) -> Self {
        AbstractionPattern::Tuple { elements }
    }

    pub fn func(params: Vec<AbstractionPattern>, ret: AbstractionPattern) -> Self {
        AbstractionPattern::Fn {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, AbstractionPattern::Opaque { .. })
    }

    /// Tuple-shaped patterns are destructured by the result plan builder; an
    /// opaque pattern is never tuple-shaped, even if its substitution is.
    pub fn is_tuple(&self) -> bool {
        self.tuple_arity().is_some()
    }

    pub fn tuple_arity(&self) -> Option<usize> {
        match self {
            AbstractionPattern::Tuple { elements } => Some(elements.len()),
            AbstractionPattern::Type {
                ty: Type::Tuple { field_tys },
            } => Some(field_tys.len()),
            _ => None,
        }
    }

    /// Returns the pattern for element `index` of a tuple-shaped pattern.
    pub fn tuple_element(&self, index: usize) -> Option<AbstractionPattern> {
        match self {
            AbstractionPattern::Tuple { elements } => elements.get(index).cloned(),
            AbstractionPattern::Type {
                ty: Type::Tuple { field_tys },
            } => field_tys.get(index).cloned().map(AbstractionPattern::concrete),
            _ => None,
        }
    }

    /// Pattern for a component of a value lowered under this pattern.
    ///
    /// Components of an opaque value stay opaque.
    pub(crate) fn component(&self, index: usize, subst: &Type) -> AbstractionPattern {
        match self {
            AbstractionPattern::Opaque { .. } => self.clone(),
            _ => self.tuple_element(index).unwrap_or_else(|| {
                let field = subst
                    .tuple_fields()
                    .and_then(|fields| fields.get(index))
                    .unwrap_or_else(|| panic!("pattern component {index} out of range for {subst}"));
                AbstractionPattern::concrete(field.clone())
            }),
        }
    }
}

impl fmt::Display for AbstractionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractionPattern::Opaque { name } => write!(f, "<{}>", name),
            AbstractionPattern::Tuple { elements } => {
                let elements = elements.iter().map(|p| p.to_string()).collect::<Vec<_>>();
                write!(f, "({})", elements.join(", "))
            }
            AbstractionPattern::Fn { params, ret } => {
                let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
                write!(f, "fn({}) -> {}", params.join(", "), ret)
            }
            AbstractionPattern::Type { ty } => write!(f, "{}", ty),
        }
    }
}
