//! Text formatter for SSA IR.

use std::fmt;
use std::fmt::Write as _;

use crate::ir::model::*;
use crate::ir::{IrTypeCache, IrTypeId, IrTypeKind};

pub fn format_func(func: &Function, types: &IrTypeCache) -> String {
    let mut formatter = Formatter::new(types, false);
    formatter.write_function(func);
    formatter.finish()
}

pub fn format_func_with_comments(func: &Function, types: &IrTypeCache) -> String {
    let mut formatter = Formatter::new(types, true);
    formatter.write_function(func);
    formatter.finish()
}

/// Renders a single type the way the function formatter does.
pub fn format_type(types: &IrTypeCache, ty: IrTypeId) -> String {
    let mut formatter = Formatter::new(types, false);
    formatter.write_type(ty);
    formatter.finish()
}

struct Formatter<'a> {
    types: &'a IrTypeCache,
    show_comments: bool,
    out: String,
}

impl<'a> Formatter<'a> {
    fn new(types: &'a IrTypeCache, show_comments: bool) -> Self {
        Self {
            types,
            show_comments,
            out: String::new(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a String cannot fail.
        let _ = self.out.write_fmt(args);
    }

    fn value(&mut self, value: ValueId) {
        self.emit(format_args!("%v{}", value.0));
    }

    fn comma_list<T: Copy>(&mut self, items: &[T], mut write_item: impl FnMut(&mut Self, T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            write_item(self, *item);
        }
    }

    fn write_function(&mut self, func: &Function) {
        self.emit(format_args!("fn {}(", func.name));
        self.comma_list(&func.sig.params, Self::write_type);
        self.push(") -> ");
        self.write_type(func.sig.ret);
        self.push(" {\n");

        if !func.locals.is_empty() {
            self.push("  locals:\n");
            for local in &func.locals {
                self.emit(format_args!("    %l{}: ", local.id.0));
                self.write_type(local.ty);
                match local.size {
                    LocalSize::Static { size, align } => {
                        self.emit(format_args!(" [{size}, align={align}]"))
                    }
                    LocalSize::Dynamic => self.push(" [dynamic]"),
                }
                if let Some(name) = &local.name {
                    self.emit(format_args!(" // {name}"));
                }
                self.push("\n");
            }
        }

        for (index, block) in func.blocks.iter().enumerate() {
            if index > 0 {
                self.push("\n");
            }
            self.write_block(block);
        }

        self.push("}\n");
    }

    fn write_block(&mut self, block: &Block) {
        self.emit(format_args!("  bb{}(", block.id.0));
        for (i, param) in block.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.value(param.value.id);
            self.push(": ");
            self.write_type(param.value.ty);
        }
        self.push("):\n");

        for (idx, inst) in block.insts.iter().enumerate() {
            self.write_instruction(inst, idx > 0);
        }
        if !block.insts.is_empty() {
            self.push("\n");
        }
        self.write_terminator(&block.term);
    }

    fn write_instruction(&mut self, inst: &Instruction, add_blank_before_comments: bool) {
        if self.show_comments && !inst.comments.is_empty() {
            if add_blank_before_comments {
                self.push("\n");
            }
            for comment in &inst.comments {
                self.emit(format_args!("    // {comment}\n"));
            }
        }
        self.push("    ");
        if let Some(result) = &inst.result {
            self.value(result.id);
            self.push(": ");
            self.write_type(result.ty);
            self.push(" = ");
        }
        self.write_inst_kind(&inst.kind);
        self.push("\n");
    }

    fn write_inst_kind(&mut self, kind: &InstKind) {
        match kind {
            InstKind::Const { value } => {
                self.push("const ");
                self.write_const(value);
            }
            InstKind::Cmp { op, lhs, rhs } => {
                let op = match op {
                    CmpOp::Eq => "eq",
                    CmpOp::Ne => "ne",
                };
                self.emit(format_args!("cmp.{op} %v{}, %v{}", lhs.0, rhs.0));
            }
            InstKind::AddrOfLocal { local } => self.emit(format_args!("addr_of %l{}", local.0)),
            InstKind::FieldAddr { base, index } => {
                self.emit(format_args!("field_addr %v{}, {index}", base.0))
            }
            InstKind::Load { ptr } => self.emit(format_args!("load %v{}", ptr.0)),
            InstKind::Store { ptr, value } => {
                self.emit(format_args!("store %v{}, %v{}", ptr.0, value.0))
            }
            InstKind::CopyAddr { dst, src } => {
                self.emit(format_args!("copy_addr %v{}, %v{}", dst.0, src.0))
            }
            InstKind::MakeTuple { fields } => {
                self.push("tuple (");
                self.comma_list(fields, Self::value);
                self.push(")");
            }
            InstKind::TupleExtract { value, index } => {
                self.emit(format_args!("tuple_extract %v{}, {index}", value.0))
            }
            InstKind::Reabstract { value } => self.emit(format_args!("reabstract %v{}", value.0)),
            InstKind::InitExistential {
                container,
                payload_ty,
            } => {
                self.emit(format_args!("init_existential %v{}, ", container.0));
                self.write_type(*payload_ty);
            }
            InstKind::Call { callee, args } => {
                self.push("call ");
                match callee {
                    Callee::Symbol(name) => self.emit(format_args!("@{name}")),
                    Callee::Value(value) => self.value(*value),
                    Callee::Runtime(func) => self.push(func.name()),
                }
                self.push("(");
                self.comma_list(args, Self::value);
                self.push(")");
            }
            InstKind::Release { value } => self.emit(format_args!("release %v{}", value.0)),
            InstKind::Drop { ptr } => self.emit(format_args!("drop %v{}", ptr.0)),
        }
    }

    fn write_terminator(&mut self, term: &Terminator) {
        self.push("    ");
        match term {
            Terminator::Return { value } => {
                self.push("ret");
                if let Some(value) = value {
                    self.push(" ");
                    self.value(*value);
                }
            }
            Terminator::Unreachable => self.push("unreachable"),
        }
        self.push("\n");
    }

    fn write_const(&mut self, value: &ConstValue) {
        match value {
            ConstValue::Unit => self.push("()"),
            ConstValue::Bool(value) => self.emit(format_args!("{value}")),
            ConstValue::Int { value, .. } => self.emit(format_args!("{value}")),
        }
    }

    fn write_type(&mut self, ty: IrTypeId) {
        let types = self.types;
        let info = types.get(ty);
        if let Some(name) = &info.name {
            self.push(name);
            return;
        }
        match &info.kind {
            IrTypeKind::Unit => self.push("()"),
            IrTypeKind::Bool => self.push("bool"),
            IrTypeKind::Int { signed, bits } => {
                let prefix = if *signed { "i" } else { "u" };
                self.emit(format_args!("{prefix}{bits}"));
            }
            IrTypeKind::Ptr { elem } => {
                self.push("ptr<");
                self.write_type(*elem);
                self.push(">");
            }
            IrTypeKind::Tuple { fields } => {
                self.push("(");
                self.comma_list(fields, Self::write_type);
                self.push(")");
            }
            IrTypeKind::Struct { fields } => {
                self.push("struct { ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit(format_args!("{}: ", field.name));
                    self.write_type(field.ty);
                }
                self.push(" }");
            }
            IrTypeKind::Fn { params, ret } => {
                self.push("fn(");
                self.comma_list(params, Self::write_type);
                self.push(") -> ");
                self.write_type(*ret);
            }
            IrTypeKind::Opaque { name } => self.emit(format_args!("opaque<{name}>")),
        }
    }
}

#[cfg(test)]
#[path = "../tests/ir/t_format.rs"]
mod tests;
