use crate::ir::{
    Function, FunctionBuilder, FunctionSig, IrTypeCache, IrTypeId, Terminator, ValueId,
};
use crate::lower::LowerOpts;
use crate::lower::cleanup::{CleanupHandle, CleanupKind, CleanupStack, ManagedValue};
use crate::types::{Type, TypeLowerer, TypeLowering};

/// Per-function lowering context.
///
/// Owns:
/// - Type lowering context for converting types
/// - SSA function builder for emitting instructions
/// - Cleanup stack tracking ownership of emitted values
pub struct FuncLowerer {
    pub builder: FunctionBuilder,
    pub type_lowerer: TypeLowerer,
    pub cleanups: CleanupStack,
    pub(crate) trace_plans: bool,
}

impl FuncLowerer {
    pub fn new(name: impl Into<String>, opts: &LowerOpts) -> Self {
        let mut type_lowerer = TypeLowerer::new();
        let unit = type_lowerer.unit_type();
        let builder = FunctionBuilder::new(
            name,
            FunctionSig {
                params: Vec::new(),
                ret: unit,
            },
        );
        Self {
            builder,
            type_lowerer,
            cleanups: CleanupStack::new(),
            trace_plans: opts.trace_plans,
        }
    }

    pub fn finish(self) -> (Function, IrTypeCache) {
        (self.builder.finish(), self.type_lowerer.ir_type_cache)
    }

    pub fn types(&self) -> &IrTypeCache {
        self.type_lowerer.types()
    }

    pub fn lower_type(&mut self, ty: &Type) -> IrTypeId {
        self.type_lowerer.lower_type(ty)
    }

    pub fn type_lowering(&mut self, ty: &Type) -> TypeLowering {
        self.type_lowerer.type_lowering(ty)
    }

    pub fn ptr_to(&mut self, elem: IrTypeId) -> IrTypeId {
        self.type_lowerer.ptr_to(elem)
    }

    pub(crate) fn trace_plan(&mut self, message: impl Into<String>) {
        if self.trace_plans {
            self.builder.annotate_next_inst(message);
        }
    }

    /// Adds a by-value parameter of natural type `ty`.
    pub fn add_param(&mut self, ty: &Type) -> ManagedValue {
        let ir_ty = self.lower_type(ty);
        let value = self.builder.add_param(ir_ty);
        ManagedValue::for_unmanaged(value, ir_ty)
    }

    /// Adds a pointer parameter addressing storage of type `ty`.
    pub fn add_address_param(&mut self, ty: IrTypeId) -> ValueId {
        let ptr_ty = self.ptr_to(ty);
        self.builder.add_param(ptr_ty)
    }

    // --- Storage ---

    /// Allocates a stack slot for `ty` and returns its address.
    pub fn alloc_stack(&mut self, ty: IrTypeId, name: Option<String>) -> ValueId {
        let size = self.type_lowerer.local_size(ty);
        let local = self.builder.add_local(ty, size, name);
        let ptr_ty = self.ptr_to(ty);
        self.builder.addr_of_local(local, ptr_ty)
    }

    fn cleanup_for(&mut self, kind: CleanupKind, ty: IrTypeId) -> Option<CleanupHandle> {
        if self.types().is_trivial(ty) {
            None
        } else {
            Some(self.cleanups.push_active(kind))
        }
    }

    /// Takes ownership of a freshly produced SSA value.
    pub fn managed_rvalue(&mut self, value: ValueId, ty: IrTypeId) -> ManagedValue {
        let cleanup = self.cleanup_for(CleanupKind::Release(value), ty);
        ManagedValue::with_cleanup(value, ty, cleanup)
    }

    /// Takes ownership of an initialized buffer.
    pub fn managed_buffer(&mut self, addr: ValueId, ty: IrTypeId) -> ManagedValue {
        let cleanup = self.cleanup_for(CleanupKind::Destroy(addr), ty);
        ManagedValue::address_with_cleanup(addr, ty, cleanup)
    }

    /// Loads the value out of an owned buffer, moving ownership to the loaded
    /// value.
    pub fn emit_load_take(&mut self, value: ManagedValue) -> ManagedValue {
        assert!(
            value.is_address(),
            "backend load-take of non-address {:?}",
            value.value()
        );
        let ty = value.ty();
        let addr = value.forward(&mut self.cleanups);
        let loaded = self.builder.load(addr, ty);
        self.managed_rvalue(loaded, ty)
    }

    /// Moves `value` into the uninitialized buffer at `dst`.
    pub fn emit_store_or_copy(&mut self, value: ManagedValue, dst: ValueId) {
        let is_address = value.is_address();
        let src = value.forward(&mut self.cleanups);
        if is_address {
            self.builder.copy_addr(dst, src);
        } else {
            self.builder.store(dst, src);
        }
    }

    /// Splits an owned tuple into its owned elements, one level deep.
    pub fn emit_destructure(&mut self, value: ManagedValue) -> Vec<ManagedValue> {
        let field_tys = self
            .types()
            .tuple_fields(value.ty())
            .unwrap_or_else(|| panic!("backend destructure of non-tuple {:?}", value.value()))
            .to_vec();
        let is_address = value.is_address();
        let base = value.forward(&mut self.cleanups);

        field_tys
            .into_iter()
            .enumerate()
            .map(|(index, field_ty)| {
                if !is_address {
                    let elem = self.builder.tuple_extract(base, index, field_ty);
                    return self.managed_rvalue(elem, field_ty);
                }
                let ptr_ty = self.ptr_to(field_ty);
                let field_addr = self.builder.field_addr(base, index, ptr_ty);
                if self.types().is_address_only(field_ty) {
                    self.managed_buffer(field_addr, field_ty)
                } else {
                    let elem = self.builder.load(field_addr, field_ty);
                    self.managed_rvalue(elem, field_ty)
                }
            })
            .collect()
    }

    // --- Scope exit ---

    /// Emits every active cleanup, innermost first.
    pub fn emit_scope_cleanups(&mut self) {
        for kind in self.cleanups.pop_active() {
            match kind {
                CleanupKind::Release(value) => self.builder.release(value),
                CleanupKind::Destroy(addr) => self.builder.drop_addr(addr),
            }
        }
    }

    /// Emits scope cleanups and returns `value` (or nothing).
    pub fn emit_return(&mut self, value: Option<ManagedValue>) {
        let value = value.map(|value| {
            assert!(
                !value.is_address(),
                "backend return of address {:?}",
                value.value()
            );
            self.builder.set_ret_type(value.ty());
            value.forward(&mut self.cleanups)
        });
        self.emit_scope_cleanups();
        self.builder.terminate(Terminator::Return { value });
    }
}
