//! Cursor-based SSA function builder.
//!
//! Manages ID allocation and appends instructions to the current block.

use crate::ir::model::*;
use crate::ir::IrTypeId;

/// Constructs SSA functions while managing ID allocation.
pub struct FunctionBuilder {
    func: Function,
    curr_block: BlockId,
    next_value: u32,
    pending_comments: Vec<String>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, sig: FunctionSig) -> Self {
        let mut builder = Self {
            func: Function {
                name: name.into(),
                sig,
                locals: Vec::new(),
                blocks: Vec::new(),
            },
            curr_block: BlockId(0),
            next_value: 0,
            pending_comments: Vec::new(),
        };
        let entry = builder.add_block();
        builder.select_block(entry);
        builder
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(Block {
            id,
            params: Vec::new(),
            insts: Vec::new(),
            term: Terminator::Unreachable,
        });
        id
    }

    pub fn select_block(&mut self, block: BlockId) {
        assert!(
            block.index() < self.func.blocks.len(),
            "ir builder invalid block id {:?}",
            block
        );
        self.curr_block = block;
    }

    pub fn add_block_param(&mut self, block: BlockId, ty: IrTypeId) -> ValueId {
        let value = self.alloc_value();
        self.block_mut(block).params.push(BlockParam {
            value: ValueDef { id: value, ty },
        });
        value
    }

    /// Appends a function parameter (an entry block param).
    pub fn add_param(&mut self, ty: IrTypeId) -> ValueId {
        self.func.sig.params.push(ty);
        self.add_block_param(BlockId(0), ty)
    }

    pub fn set_ret_type(&mut self, ty: IrTypeId) {
        self.func.sig.ret = ty;
    }

    pub fn add_local(&mut self, ty: IrTypeId, size: LocalSize, name: Option<String>) -> LocalId {
        let id = LocalId(self.func.locals.len() as u32);
        self.func.locals.push(Local { id, ty, size, name });
        id
    }

    /// Attaches a comment to the next emitted instruction.
    pub fn annotate_next_inst(&mut self, comment: impl Into<String>) {
        self.pending_comments.push(comment.into());
    }

    pub fn const_int(&mut self, value: i128, signed: bool, bits: u8, ty: IrTypeId) -> ValueId {
        self.emit_value(
            InstKind::Const {
                value: ConstValue::Int {
                    value,
                    signed,
                    bits,
                },
            },
            ty,
        )
    }

    pub fn cmp(&mut self, op: CmpOp, lhs: ValueId, rhs: ValueId, ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::Cmp { op, lhs, rhs }, ty)
    }

    pub fn addr_of_local(&mut self, local: LocalId, ptr_ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::AddrOfLocal { local }, ptr_ty)
    }

    pub fn field_addr(&mut self, base: ValueId, index: usize, ptr_ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::FieldAddr { base, index }, ptr_ty)
    }

    pub fn load(&mut self, ptr: ValueId, ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::Load { ptr }, ty)
    }

    pub fn store(&mut self, ptr: ValueId, value: ValueId) {
        self.emit(InstKind::Store { ptr, value });
    }

    pub fn copy_addr(&mut self, dst: ValueId, src: ValueId) {
        self.emit(InstKind::CopyAddr { dst, src });
    }

    pub fn make_tuple(&mut self, fields: Vec<ValueId>, ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::MakeTuple { fields }, ty)
    }

    pub fn tuple_extract(&mut self, value: ValueId, index: usize, ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::TupleExtract { value, index }, ty)
    }

    pub fn reabstract(&mut self, value: ValueId, ty: IrTypeId) -> ValueId {
        self.emit_value(InstKind::Reabstract { value }, ty)
    }

    pub fn init_existential(
        &mut self,
        container: ValueId,
        payload_ty: IrTypeId,
        ptr_ty: IrTypeId,
    ) -> ValueId {
        self.emit_value(
            InstKind::InitExistential {
                container,
                payload_ty,
            },
            ptr_ty,
        )
    }

    /// Emits a call. Calls returning `()` produce no SSA value.
    pub fn call(&mut self, callee: Callee, args: Vec<ValueId>, ret: Option<IrTypeId>) -> Option<ValueId> {
        let kind = InstKind::Call { callee, args };
        match ret {
            Some(ty) => Some(self.emit_value(kind, ty)),
            None => {
                self.emit(kind);
                None
            }
        }
    }

    pub fn release(&mut self, value: ValueId) {
        self.emit(InstKind::Release { value });
    }

    pub fn drop_addr(&mut self, ptr: ValueId) {
        self.emit(InstKind::Drop { ptr });
    }

    pub fn terminate(&mut self, term: Terminator) {
        let block = self.curr_block;
        self.block_mut(block).term = term;
    }

    pub fn finish(self) -> Function {
        self.func
    }

    fn emit_value(&mut self, kind: InstKind, ty: IrTypeId) -> ValueId {
        let id = self.alloc_value();
        self.push_inst(Some(ValueDef { id, ty }), kind);
        id
    }

    fn emit(&mut self, kind: InstKind) {
        self.push_inst(None, kind);
    }

    fn push_inst(&mut self, result: Option<ValueDef>, kind: InstKind) {
        let comments = std::mem::take(&mut self.pending_comments);
        let block = self.curr_block;
        self.block_mut(block).insts.push(Instruction {
            result,
            kind,
            comments,
        });
    }

    fn alloc_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn block_mut(&mut self, block: BlockId) -> &mut Block {
        let index = block.index();
        self.func
            .blocks
            .get_mut(index)
            .unwrap_or_else(|| panic!("ir builder invalid block id {:?}", block))
    }
}
