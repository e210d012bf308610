use std::collections::HashMap;

use crate::ir::{IrTypeId, IrTypeInfo, IrTypeKind};

/// Layout information for an IR type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrLayout {
    size: u64,
    align: u64,
    field_offsets: Vec<u64>,
}

impl IrLayout {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn align(&self) -> u64 {
        self.align
    }

    pub fn field_offsets(&self) -> &[u64] {
        &self.field_offsets
    }

    fn scalar(size: u64) -> Self {
        IrLayout {
            size,
            align: size.max(1),
            field_offsets: Vec::new(),
        }
    }
}

fn align_to(value: u64, align: u64) -> u64 {
    debug_assert!(align != 0);
    (value + align - 1) & !(align - 1)
}

/// Caches computed layouts for IR types.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IrLayoutCache {
    layouts: HashMap<IrTypeId, IrLayout>,
}

impl IrLayoutCache {
    pub fn new() -> Self {
        Self {
            layouts: HashMap::new(),
        }
    }

    /// Returns the cached layout or computes it on demand.
    ///
    /// Opaque types have no static layout; callers must size them at runtime,
    /// so this panics when asked for one.
    pub fn layout(&mut self, types: &[IrTypeInfo], ty: IrTypeId) -> IrLayout {
        if let Some(layout) = self.layouts.get(&ty) {
            return layout.clone();
        }

        let layout = self.compute_layout(types, ty);
        self.layouts.insert(ty, layout.clone());
        layout
    }

    fn compute_layout(&mut self, types: &[IrTypeInfo], ty: IrTypeId) -> IrLayout {
        match &types[ty.index()].kind {
            IrTypeKind::Unit => IrLayout {
                size: 0,
                align: 1,
                field_offsets: Vec::new(),
            },
            IrTypeKind::Bool => IrLayout::scalar(1),
            IrTypeKind::Int { bits, .. } => IrLayout::scalar((*bits as u64) / 8),
            IrTypeKind::Ptr { .. } => IrLayout::scalar(8),
            // Code pointer + context pointer.
            IrTypeKind::Fn { .. } => IrLayout {
                size: 16,
                align: 8,
                field_offsets: vec![0, 8],
            },
            IrTypeKind::Tuple { fields } => self.layout_fields(types, fields.iter().copied()),
            IrTypeKind::Struct { fields } => {
                self.layout_fields(types, fields.iter().map(|field| field.ty))
            }
            IrTypeKind::Opaque { name } => {
                panic!("ir layout requested for opaque type {name}")
            }
        }
    }

    fn layout_fields(
        &mut self,
        types: &[IrTypeInfo],
        fields: impl Iterator<Item = IrTypeId>,
    ) -> IrLayout {
        let mut offsets = Vec::new();
        let mut offset = 0u64;
        let mut max_align = 1u64;

        for field_ty in fields {
            let field_layout = self.layout(types, field_ty);
            offset = align_to(offset, field_layout.align);
            offsets.push(offset);
            offset += field_layout.size;
            max_align = max_align.max(field_layout.align);
        }

        IrLayout {
            size: align_to(offset, max_align),
            align: max_align,
            field_offsets: offsets,
        }
    }
}

#[cfg(test)]
#[path = "../tests/ir/t_layout.rs"]
mod tests;
