//! SSA + explicit-memory IR model.
//!
//! Defines the SSA entities (functions, blocks, values, instructions) that
//! call lowering emits into.

use crate::ir::IrTypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

impl LocalId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDef {
    pub id: ValueId,
    pub ty: IrTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockParam {
    pub value: ValueDef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub params: Vec<BlockParam>,
    pub insts: Vec<Instruction>,
    pub term: Terminator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub sig: FunctionSig,
    pub locals: Vec<Local>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    pub params: Vec<IrTypeId>,
    pub ret: IrTypeId,
}

/// Stack storage requirement for a local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSize {
    Static { size: u64, align: u64 },
    /// Sized from type metadata at runtime (opaque types).
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub id: LocalId,
    pub ty: IrTypeId,
    pub size: LocalSize,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Unit,
    Bool(bool),
    Int { value: i128, signed: bool, bits: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeFn {
    StringFromCStr,
}

impl RuntimeFn {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeFn::StringFromCStr => "__rt_string_from_cstr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Symbol(String),
    Value(ValueId),
    Runtime(RuntimeFn),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub result: Option<ValueDef>,
    pub kind: InstKind,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Const {
        value: ConstValue,
    },
    Cmp {
        op: CmpOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    AddrOfLocal {
        local: LocalId,
    },
    FieldAddr {
        base: ValueId,
        index: usize,
    },
    /// Loads (and takes ownership of) the value stored at `ptr`.
    Load {
        ptr: ValueId,
    },
    /// Stores (and gives up ownership of) `value` into uninitialized memory.
    Store {
        ptr: ValueId,
        value: ValueId,
    },
    /// Moves the value at `src` into uninitialized memory at `dst`.
    CopyAddr {
        dst: ValueId,
        src: ValueId,
    },
    MakeTuple {
        fields: Vec<ValueId>,
    },
    TupleExtract {
        value: ValueId,
        index: usize,
    },
    /// Applies a reabstraction thunk to a function value.
    Reabstract {
        value: ValueId,
    },
    /// Prepares an existential container for a payload and returns the
    /// payload address.
    InitExistential {
        container: ValueId,
        payload_ty: IrTypeId,
    },
    Call {
        callee: Callee,
        args: Vec<ValueId>,
    },
    /// Releases an owned loadable value.
    Release {
        value: ValueId,
    },
    /// Destroys the value stored at `ptr`.
    Drop {
        ptr: ValueId,
    },
}

/// Visits each SSA value used by an instruction.
pub fn for_each_inst_use(kind: &InstKind, mut f: impl FnMut(ValueId)) {
    match kind {
        InstKind::Const { .. } | InstKind::AddrOfLocal { .. } => {}
        InstKind::Cmp { lhs, rhs, .. } => {
            f(*lhs);
            f(*rhs);
        }
        InstKind::FieldAddr { base: value, .. }
        | InstKind::Load { ptr: value }
        | InstKind::TupleExtract { value, .. }
        | InstKind::Reabstract { value }
        | InstKind::InitExistential {
            container: value, ..
        }
        | InstKind::Release { value }
        | InstKind::Drop { ptr: value } => f(*value),
        InstKind::Store { ptr, value } => {
            f(*ptr);
            f(*value);
        }
        InstKind::CopyAddr { dst, src } => {
            f(*dst);
            f(*src);
        }
        InstKind::MakeTuple { fields } => {
            for field in fields {
                f(*field);
            }
        }
        InstKind::Call { callee, args } => {
            if let Callee::Value(value) = callee {
                f(*value);
            }
            for arg in args {
                f(*arg);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Return { value: Option<ValueId> },
    Unreachable,
}
