//! Initialization destinations.
//!
//! An initialization is a place a call result will be written to: a stack
//! temporary, a known address, a tuple of sub-destinations, or an
//! existential container. Initializations live in an [`InitArena`] and are
//! referenced by [`InitId`] so that result plans can refer to destinations
//! created while splitting a parent destination.

use std::fmt;

use crate::ir::{IrTypeId, ValueId};
use crate::lower::cleanup::{CleanupHandle, CleanupKind, ManagedValue};
use crate::lower::errors::LowerToIrError;
use crate::lower::lowerer::FuncLowerer;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitId(u32);

impl InitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "init{}", self.0)
    }
}

/// A buffer address together with the type stored in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub value: ValueId,
    pub ty: IrTypeId,
}

pub trait Initialization: fmt::Debug {
    /// The buffer a result may be emitted into directly, if any.
    fn address_for_in_place_init(&self) -> Option<Address> {
        None
    }

    fn can_split_into_tuple_elements(&self, _lw: &FuncLowerer) -> bool {
        false
    }

    /// Returns one initialization per element of the tuple type `subst`.
    fn split_into_tuple_elements(
        &mut self,
        _lw: &mut FuncLowerer,
        _inits: &mut InitArena,
        subst: &Type,
    ) -> Result<Vec<InitId>, LowerToIrError> {
        panic!("backend split of non-splittable initialization for {subst}");
    }

    /// Moves `value` into the destination.
    fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError>;

    /// Marks the destination fully initialized.
    fn finish_initialization(&mut self, _lw: &mut FuncLowerer) {}
}

// --- Concrete initializations ---

/// A fresh stack buffer owned by the current scope.
///
/// The buffer's destroy cleanup stays dormant until the buffer is finished;
/// after that, `take_managed_address` hands the owning address out once.
#[derive(Debug)]
pub struct TemporaryInitialization {
    addr: Address,
    cleanup: Option<CleanupHandle>,
    claimed: bool,
}

impl TemporaryInitialization {
    pub fn emit(lw: &mut FuncLowerer, ty: IrTypeId) -> Self {
        let value = lw.alloc_stack(ty, None);
        let cleanup = if lw.types().is_trivial(ty) {
            None
        } else {
            Some(lw.cleanups.push_dormant(CleanupKind::Destroy(value)))
        };
        Self {
            addr: Address { value, ty },
            cleanup,
            claimed: false,
        }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn cleanup(&self) -> Option<CleanupHandle> {
        self.cleanup
    }

    /// The owning address of the finished buffer.
    pub fn take_managed_address(&mut self) -> ManagedValue {
        assert!(
            !self.claimed,
            "backend temporary {:?} claimed twice",
            self.addr.value
        );
        self.claimed = true;
        ManagedValue::address_with_cleanup(self.addr.value, self.addr.ty, self.cleanup)
    }
}

impl Initialization for TemporaryInitialization {
    fn address_for_in_place_init(&self) -> Option<Address> {
        Some(self.addr)
    }

    fn can_split_into_tuple_elements(&self, lw: &FuncLowerer) -> bool {
        lw.types().tuple_fields(self.addr.ty).is_some()
    }

    fn split_into_tuple_elements(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        _subst: &Type,
    ) -> Result<Vec<InitId>, LowerToIrError> {
        Ok(split_address(lw, inits, self.addr))
    }

    fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        _inits: &mut InitArena,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError> {
        lw.emit_store_or_copy(value, self.addr.value);
        Ok(())
    }

    fn finish_initialization(&mut self, lw: &mut FuncLowerer) {
        if let Some(cleanup) = self.cleanup {
            lw.cleanups.activate(cleanup);
        }
    }
}

/// A buffer owned by someone else (an element of a parent buffer, or a
/// caller-provided result slot).
#[derive(Debug)]
pub struct KnownAddressInitialization {
    addr: Address,
}

impl KnownAddressInitialization {
    pub fn new(addr: Address) -> Self {
        Self { addr }
    }
}

impl Initialization for KnownAddressInitialization {
    fn address_for_in_place_init(&self) -> Option<Address> {
        Some(self.addr)
    }

    fn can_split_into_tuple_elements(&self, lw: &FuncLowerer) -> bool {
        lw.types().tuple_fields(self.addr.ty).is_some()
    }

    fn split_into_tuple_elements(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        _subst: &Type,
    ) -> Result<Vec<InitId>, LowerToIrError> {
        Ok(split_address(lw, inits, self.addr))
    }

    fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        _inits: &mut InitArena,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError> {
        lw.emit_store_or_copy(value, self.addr.value);
        Ok(())
    }
}

fn split_address(lw: &mut FuncLowerer, inits: &mut InitArena, addr: Address) -> Vec<InitId> {
    let field_tys = lw
        .types()
        .tuple_fields(addr.ty)
        .unwrap_or_else(|| panic!("backend split of non-tuple buffer {:?}", addr.value))
        .to_vec();
    field_tys
        .into_iter()
        .enumerate()
        .map(|(index, field_ty)| {
            let ptr_ty = lw.ptr_to(field_ty);
            let value = lw.builder.field_addr(addr.value, index, ptr_ty);
            inits.alloc(KnownAddressInitialization::new(Address {
                value,
                ty: field_ty,
            }))
        })
        .collect()
}

/// A tuple-shaped destination made of independent element destinations,
/// e.g. `let (a, b) = f()`.
#[derive(Debug)]
pub struct TuplePatternInitialization {
    elements: Vec<InitId>,
}

impl TuplePatternInitialization {
    pub fn new(elements: Vec<InitId>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[InitId] {
        &self.elements
    }
}

impl Initialization for TuplePatternInitialization {
    fn can_split_into_tuple_elements(&self, _lw: &FuncLowerer) -> bool {
        true
    }

    fn split_into_tuple_elements(
        &mut self,
        _lw: &mut FuncLowerer,
        _inits: &mut InitArena,
        subst: &Type,
    ) -> Result<Vec<InitId>, LowerToIrError> {
        match subst.tuple_fields() {
            Some(fields) if fields.len() == self.elements.len() => Ok(self.elements.clone()),
            _ => Err(LowerToIrError::ExpectedTuple(subst.clone())),
        }
    }

    fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        inits: &mut InitArena,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError> {
        let parts = lw.emit_destructure(value);
        if parts.len() != self.elements.len() {
            panic!(
                "backend tuple pattern of {} elements given {} values",
                self.elements.len(),
                parts.len()
            );
        }
        for (element, part) in self.elements.iter().zip(parts) {
            inits.copy_or_init_value_into(lw, *element, part)?;
            inits.finish_initialization(lw, *element)?;
        }
        Ok(())
    }
}

/// An existential container; the payload is projected out when the value
/// arrives, so there is no address to emit into ahead of time.
#[derive(Debug)]
pub struct ExistentialInitialization {
    container: ValueId,
}

impl ExistentialInitialization {
    pub fn new(container: ValueId) -> Self {
        Self { container }
    }
}

impl Initialization for ExistentialInitialization {
    fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        _inits: &mut InitArena,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError> {
        let payload_ty = value.ty();
        let ptr_ty = lw.ptr_to(payload_ty);
        let payload = lw
            .builder
            .init_existential(self.container, payload_ty, ptr_ty);
        lw.emit_store_or_copy(value, payload);
        Ok(())
    }
}

// --- Arena ---

#[derive(Debug)]
enum InitSlotKind {
    Temporary(TemporaryInitialization),
    Other(Box<dyn Initialization>),
}

impl InitSlotKind {
    fn as_dyn(&self) -> &dyn Initialization {
        match self {
            InitSlotKind::Temporary(temp) => temp,
            InitSlotKind::Other(init) => init.as_ref(),
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn Initialization {
        match self {
            InitSlotKind::Temporary(temp) => temp,
            InitSlotKind::Other(init) => init.as_mut(),
        }
    }
}

#[derive(Debug)]
struct InitSlot {
    kind: InitSlotKind,
    finished: bool,
}

/// Owns every initialization created while lowering a function.
///
/// Operations that may recurse into other initializations temporarily take
/// the slot out of the arena; touching a slot while it is out is a bug.
#[derive(Debug, Default)]
pub struct InitArena {
    slots: Vec<Option<InitSlot>>,
}

impl InitArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, init: impl Initialization + 'static) -> InitId {
        self.push(InitSlotKind::Other(Box::new(init)))
    }

    pub fn alloc_temporary(&mut self, temp: TemporaryInitialization) -> InitId {
        self.push(InitSlotKind::Temporary(temp))
    }

    /// Allocates a stack temporary of `ty` and registers it.
    pub fn emit_temporary(&mut self, lw: &mut FuncLowerer, ty: IrTypeId) -> InitId {
        let temp = TemporaryInitialization::emit(lw, ty);
        self.alloc_temporary(temp)
    }

    fn push(&mut self, kind: InitSlotKind) -> InitId {
        let id = InitId(self.slots.len() as u32);
        self.slots.push(Some(InitSlot {
            kind,
            finished: false,
        }));
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_finished(&self, id: InitId) -> bool {
        self.slot(id).finished
    }

    pub fn address_for_in_place_init(&self, id: InitId) -> Option<Address> {
        self.slot(id).kind.as_dyn().address_for_in_place_init()
    }

    pub fn can_split_into_tuple_elements(&self, lw: &FuncLowerer, id: InitId) -> bool {
        self.slot(id).kind.as_dyn().can_split_into_tuple_elements(lw)
    }

    pub fn split_into_tuple_elements(
        &mut self,
        lw: &mut FuncLowerer,
        id: InitId,
        subst: &Type,
    ) -> Result<Vec<InitId>, LowerToIrError> {
        if !self.can_split_into_tuple_elements(lw, id) {
            return Err(LowerToIrError::CannotSplit(id));
        }
        self.with_slot(id, |slot, inits| {
            slot.kind
                .as_dyn_mut()
                .split_into_tuple_elements(lw, inits, subst)
        })
    }

    pub fn copy_or_init_value_into(
        &mut self,
        lw: &mut FuncLowerer,
        id: InitId,
        value: ManagedValue,
    ) -> Result<(), LowerToIrError> {
        self.with_slot(id, |slot, inits| {
            slot.kind.as_dyn_mut().copy_or_init_value_into(lw, inits, value)
        })
    }

    pub fn finish_initialization(
        &mut self,
        lw: &mut FuncLowerer,
        id: InitId,
    ) -> Result<(), LowerToIrError> {
        let slot = self.slot_mut(id);
        if slot.finished {
            return Err(LowerToIrError::InitFinishedTwice(id));
        }
        slot.finished = true;
        slot.kind.as_dyn_mut().finish_initialization(lw);
        Ok(())
    }

    pub fn temporary(&self, id: InitId) -> Result<&TemporaryInitialization, LowerToIrError> {
        match &self.slot(id).kind {
            InitSlotKind::Temporary(temp) => Ok(temp),
            InitSlotKind::Other(_) => Err(LowerToIrError::NotATemporary(id)),
        }
    }

    pub fn temporary_mut(
        &mut self,
        id: InitId,
    ) -> Result<&mut TemporaryInitialization, LowerToIrError> {
        match &mut self.slot_mut(id).kind {
            InitSlotKind::Temporary(temp) => Ok(temp),
            InitSlotKind::Other(_) => Err(LowerToIrError::NotATemporary(id)),
        }
    }

    fn with_slot<R>(&mut self, id: InitId, f: impl FnOnce(&mut InitSlot, &mut Self) -> R) -> R {
        let mut slot = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("backend initialization {id} re-entered"));
        let result = f(&mut slot, self);
        self.slots[id.index()] = Some(slot);
        result
    }

    fn slot(&self, id: InitId) -> &InitSlot {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("backend unknown or in-use initialization {id}"))
    }

    fn slot_mut(&mut self, id: InitId) -> &mut InitSlot {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("backend unknown or in-use initialization {id}"))
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_init.rs"]
mod tests;
