//! Cleanup bookkeeping and managed values.
//!
//! Every owned value produced during lowering is paired with a cleanup that
//! releases it if control leaves the scope before ownership is transferred.
//! Transferring ownership ("forwarding") kills the cleanup.

use crate::ir::{IrTypeId, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CleanupHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupState {
    /// Registered but not yet responsible for anything (uninitialized buffer).
    Dormant,
    Active,
    /// Ownership was forwarded or the cleanup was emitted.
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupKind {
    /// Release an owned loadable value.
    Release(ValueId),
    /// Destroy the value stored at an address.
    Destroy(ValueId),
}

#[derive(Debug, Clone)]
struct CleanupEntry {
    kind: CleanupKind,
    state: CleanupState,
}

#[derive(Debug, Default)]
pub struct CleanupStack {
    entries: Vec<CleanupEntry>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_active(&mut self, kind: CleanupKind) -> CleanupHandle {
        self.push(kind, CleanupState::Active)
    }

    pub fn push_dormant(&mut self, kind: CleanupKind) -> CleanupHandle {
        self.push(kind, CleanupState::Dormant)
    }

    fn push(&mut self, kind: CleanupKind, state: CleanupState) -> CleanupHandle {
        let handle = CleanupHandle(self.entries.len() as u32);
        self.entries.push(CleanupEntry { kind, state });
        handle
    }

    pub fn state(&self, handle: CleanupHandle) -> CleanupState {
        self.entry(handle).state
    }

    pub fn kind(&self, handle: CleanupHandle) -> CleanupKind {
        self.entry(handle).kind
    }

    /// Dormant -> Active.
    pub fn activate(&mut self, handle: CleanupHandle) {
        let entry = self.entry_mut(handle);
        assert_eq!(
            entry.state,
            CleanupState::Dormant,
            "cleanup {:?} activated from {:?}",
            handle,
            entry.state
        );
        entry.state = CleanupState::Active;
    }

    /// Active -> Dead. Forwarding anything but an active cleanup means the
    /// same value was consumed twice.
    pub fn forward(&mut self, handle: CleanupHandle) {
        let entry = self.entry_mut(handle);
        assert_eq!(
            entry.state,
            CleanupState::Active,
            "cleanup {:?} forwarded from {:?}",
            handle,
            entry.state
        );
        entry.state = CleanupState::Dead;
    }

    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state == CleanupState::Active)
            .count()
    }

    /// Kills every active cleanup and returns them innermost first.
    pub(super) fn pop_active(&mut self) -> Vec<CleanupKind> {
        let mut popped = Vec::new();
        for entry in self.entries.iter_mut().rev() {
            if entry.state == CleanupState::Active {
                entry.state = CleanupState::Dead;
                popped.push(entry.kind);
            }
        }
        popped
    }

    fn entry(&self, handle: CleanupHandle) -> &CleanupEntry {
        self.entries
            .get(handle.0 as usize)
            .unwrap_or_else(|| panic!("unknown cleanup {:?}", handle))
    }

    fn entry_mut(&mut self, handle: CleanupHandle) -> &mut CleanupEntry {
        self.entries
            .get_mut(handle.0 as usize)
            .unwrap_or_else(|| panic!("unknown cleanup {:?}", handle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    /// An SSA value held in registers.
    Object,
    /// The address of a buffer holding the value.
    Address,
}

/// An SSA value (or buffer address) paired with its release obligation.
///
/// Not `Clone`: a managed value is consumed exactly once, either by
/// `forward` (ownership transferred) or by being dropped, which leaves its
/// cleanup active for the enclosing scope to emit.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct ManagedValue {
    value: ValueId,
    ty: IrTypeId,
    category: ValueCategory,
    cleanup: Option<CleanupHandle>,
}

impl ManagedValue {
    pub fn for_unmanaged(value: ValueId, ty: IrTypeId) -> Self {
        Self {
            value,
            ty,
            category: ValueCategory::Object,
            cleanup: None,
        }
    }

    pub fn with_cleanup(value: ValueId, ty: IrTypeId, cleanup: Option<CleanupHandle>) -> Self {
        Self {
            value,
            ty,
            category: ValueCategory::Object,
            cleanup,
        }
    }

    pub fn address_with_cleanup(
        addr: ValueId,
        ty: IrTypeId,
        cleanup: Option<CleanupHandle>,
    ) -> Self {
        Self {
            value: addr,
            ty,
            category: ValueCategory::Address,
            cleanup,
        }
    }

    pub fn value(&self) -> ValueId {
        self.value
    }

    /// The type of the value; for addresses, the type stored at the address.
    pub fn ty(&self) -> IrTypeId {
        self.ty
    }

    pub fn is_address(&self) -> bool {
        self.category == ValueCategory::Address
    }

    pub fn cleanup(&self) -> Option<CleanupHandle> {
        self.cleanup
    }

    /// Transfers ownership out of this value and returns the raw SSA value.
    pub fn forward(self, cleanups: &mut CleanupStack) -> ValueId {
        if let Some(handle) = self.cleanup {
            cleanups.forward(handle);
        }
        self.value
    }
}

#[cfg(test)]
#[path = "../tests/lower/t_cleanup.rs"]
mod tests;
