use super::layout::{IrLayout, IrLayoutCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IrTypeId(pub u32);

impl IrTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrTypeKind {
    Unit,
    Bool,
    Int {
        signed: bool,
        bits: u8,
    },
    Ptr {
        elem: IrTypeId,
    },
    Tuple {
        fields: Vec<IrTypeId>,
    },
    Struct {
        fields: Vec<IrStructField>,
    },
    /// A thick function value (code pointer + retained context).
    Fn {
        params: Vec<IrTypeId>,
        ret: IrTypeId,
    },
    /// A value whose layout is unknown to the caller; only handled by address.
    Opaque {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrStructField {
    pub name: String,
    pub ty: IrTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrTypeInfo {
    pub kind: IrTypeKind,
    pub name: Option<String>,
    /// Values of this type own a resource and must be released.
    pub owns_resource: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IrTypeCache {
    types: Vec<IrTypeInfo>,
    layout_cache: IrLayoutCache,
}

impl IrTypeCache {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            layout_cache: IrLayoutCache::new(),
        }
    }

    /// Adds an anonymous type definition to the table.
    pub fn add(&mut self, kind: IrTypeKind) -> IrTypeId {
        self.push(IrTypeInfo {
            kind,
            name: None,
            owns_resource: false,
        })
    }

    /// Adds a named type whose values own a resource (heap buffer, context).
    pub fn add_named_resource(&mut self, kind: IrTypeKind, name: String) -> IrTypeId {
        self.push(IrTypeInfo {
            kind,
            name: Some(name),
            owns_resource: true,
        })
    }

    fn push(&mut self, info: IrTypeInfo) -> IrTypeId {
        let id = IrTypeId(self.types.len() as u32);
        self.types.push(info);
        id
    }

    pub fn get(&self, id: IrTypeId) -> &IrTypeInfo {
        &self.types[id.index()]
    }

    pub fn kind(&self, id: IrTypeId) -> &IrTypeKind {
        &self.get(id).kind
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns layout information for a type, computing it on demand.
    pub fn layout(&mut self, id: IrTypeId) -> IrLayout {
        self.layout_cache.layout(&self.types, id)
    }

    /// Returns the pointee of a pointer type.
    pub fn pointee(&self, id: IrTypeId) -> Option<IrTypeId> {
        match self.kind(id) {
            IrTypeKind::Ptr { elem } => Some(*elem),
            _ => None,
        }
    }

    /// Returns the field types of a tuple type.
    pub fn tuple_fields(&self, id: IrTypeId) -> Option<&[IrTypeId]> {
        match self.kind(id) {
            IrTypeKind::Tuple { fields } => Some(fields),
            _ => None,
        }
    }

    /// Returns true if copying a value of this type needs no retain/release.
    pub fn is_trivial(&self, id: IrTypeId) -> bool {
        let info = self.get(id);
        if info.owns_resource {
            return false;
        }
        match &info.kind {
            IrTypeKind::Unit | IrTypeKind::Bool | IrTypeKind::Int { .. } | IrTypeKind::Ptr { .. } => {
                true
            }
            IrTypeKind::Tuple { fields } => fields.iter().all(|field| self.is_trivial(*field)),
            IrTypeKind::Struct { fields } => fields.iter().all(|field| self.is_trivial(field.ty)),
            IrTypeKind::Fn { .. } | IrTypeKind::Opaque { .. } => false,
        }
    }

    /// Returns true if values of this type can only live in memory.
    pub fn is_address_only(&self, id: IrTypeId) -> bool {
        match self.kind(id) {
            IrTypeKind::Opaque { .. } => true,
            IrTypeKind::Tuple { fields } => fields.iter().any(|field| self.is_address_only(*field)),
            IrTypeKind::Struct { fields } => {
                fields.iter().any(|field| self.is_address_only(field.ty))
            }
            _ => false,
        }
    }

    /// Structural representation equality.
    ///
    /// Two ids denote the same representation when their kinds match
    /// recursively. Named types additionally require equal names.
    pub fn same_repr(&self, a: IrTypeId, b: IrTypeId) -> bool {
        if a == b {
            return true;
        }
        let (lhs, rhs) = (self.get(a), self.get(b));
        if lhs.name != rhs.name {
            return false;
        }
        match (&lhs.kind, &rhs.kind) {
            (IrTypeKind::Unit, IrTypeKind::Unit) | (IrTypeKind::Bool, IrTypeKind::Bool) => true,
            (
                IrTypeKind::Int { signed, bits },
                IrTypeKind::Int {
                    signed: other_signed,
                    bits: other_bits,
                },
            ) => signed == other_signed && bits == other_bits,
            (IrTypeKind::Ptr { elem }, IrTypeKind::Ptr { elem: other }) => {
                self.same_repr(*elem, *other)
            }
            (IrTypeKind::Tuple { fields }, IrTypeKind::Tuple { fields: other }) => {
                self.same_repr_list(fields, other)
            }
            (IrTypeKind::Struct { fields }, IrTypeKind::Struct { fields: other }) => {
                fields.len() == other.len()
                    && fields
                        .iter()
                        .zip(other)
                        .all(|(l, r)| l.name == r.name && self.same_repr(l.ty, r.ty))
            }
            (
                IrTypeKind::Fn { params, ret },
                IrTypeKind::Fn {
                    params: other_params,
                    ret: other_ret,
                },
            ) => self.same_repr_list(params, other_params) && self.same_repr(*ret, *other_ret),
            (IrTypeKind::Opaque { name }, IrTypeKind::Opaque { name: other }) => name == other,
            _ => false,
        }
    }

    fn same_repr_list(&self, lhs: &[IrTypeId], rhs: &[IrTypeId]) -> bool {
        lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| self.same_repr(*l, *r))
    }

    /// Returns true when values of the two types cannot be used
    /// interchangeably without a conversion.
    pub fn has_abstraction_difference(&self, a: IrTypeId, b: IrTypeId) -> bool {
        !self.same_repr(a, b)
    }
}
