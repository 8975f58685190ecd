//! OLLIR-style text rendering.

use super::{Call, CallKind, ClassUnit, Condition, Field, Instruction, Method};
use std::fmt;

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.args.len() + 3);
        if self.kind == CallKind::NewArray {
            parts.push("array".to_string());
        }
        if let Some(receiver) = &self.receiver {
            parts.push(receiver.to_string());
        }
        if let Some(method) = &self.method {
            parts.push(format!("\"{method}\""));
        }
        parts.extend(self.args.iter().map(ToString::to_string));
        write!(f, "{}({}).{}", self.kind, parts.join(", "), self.ret)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand(operand) => write!(f, "{operand}"),
            Self::Compare { op, lhs, rhs } => write!(f, "{lhs} {op}.bool {rhs}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign { dest, ty, rhs } => write!(f, "{dest} :=.{ty} {rhs}"),
            Self::BinaryOp { op, lhs, rhs } => write!(f, "{lhs} {op}.{} {rhs}", op.result_type()),
            Self::UnaryOp { op, operand } => write!(f, "{op}.bool {operand}"),
            Self::SingleOp(operand) => write!(f, "{operand}"),
            Self::Call(call) => write!(f, "{call}"),
            Self::GetField { object, field, ty } => {
                write!(f, "getfield({object}, {field}.{ty}).{ty}")
            }
            Self::PutField { object, field, value } => {
                write!(f, "putfield({object}, {field}.{}, {value}).V", value.ty())
            }
            Self::Branch { cond, target } => write!(f, "if ({cond}) goto {target}"),
            Self::Goto(target) => write!(f, "goto {target}"),
            Self::Return(Some(value)) => write!(f, "ret.{} {value}", value.ty()),
            Self::Return(None) => f.write_str("ret.V"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".field {}", self.access)?;
        if self.is_static {
            f.write_str(" static")?;
        }
        if self.is_final {
            f.write_str(" final")?;
        }
        write!(f, " {}.{};", self.name, self.ty)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".method ")?;
        if self.is_public {
            f.write_str("public ")?;
        }
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{}(", self.name)?;
        for (i, (name, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}.{ty}")?;
        }
        writeln!(f, ").{} {{", self.return_type)?;
        for (id, inst) in self.insts.iter_enumerated() {
            for label in self.labels_at(id) {
                writeln!(f, "  {label}:")?;
            }
            writeln!(f, "    {inst};")?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for ClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "import {import};")?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "{} extends {} {{", self.name, self.super_name.as_deref().unwrap_or("Object"))?;
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        writeln!(f)?;
        writeln!(f, ".construct {}().V {{", self.name)?;
        writeln!(f, "    invokespecial(this, \"<init>\").V;")?;
        writeln!(f, "}}")?;
        for method in &self.methods {
            writeln!(f)?;
            writeln!(f, "{method}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::*;
    use snapbox::{assert_data_eq, str};

    #[test]
    fn method_text() {
        let mut b = IrBuilder::new("Counter", "bump", IrType::Int);
        b.public().param("n", IrType::Int);
        let n = Operand::var("n", IrType::Int);
        let tmp = Operand::var("tmp0", IrType::Int);
        let end = Label::new(LabelKind::EndIf, 0);
        b.assign(
            tmp.clone(),
            Instruction::GetField {
                object: Operand::This("Counter".into()),
                field: "count".into(),
                ty: IrType::Int,
            },
        );
        b.branch(Condition::Compare { op: BinOp::Lt, lhs: n.clone(), rhs: Operand::Int(0) }, end);
        b.emit(Instruction::PutField {
            object: Operand::This("Counter".into()),
            field: "count".into(),
            value: n.clone(),
        });
        b.emit(Instruction::Call(Call::invoke(
            CallKind::Static,
            Operand::Class("io".into()),
            "println",
            vec![tmp.clone()],
            IrType::Void,
        )));
        b.label(end);
        b.ret(Some(tmp));
        let method = b.finish().unwrap();

        assert_data_eq!(
            method.to_string(),
            str![[r#"
.method public bump(n.i32).i32 {
    tmp0.i32 :=.i32 getfield(this.Counter, count.i32).i32;
    if (n.i32 <.bool 0.i32) goto endif0;
    putfield(this.Counter, count.i32, n.i32).V;
    invokestatic(io, "println", tmp0.i32).V;
  endif0:
    ret.i32 tmp0.i32;
}"#]]
        );
    }

    #[test]
    fn allocating_calls() {
        let size = Operand::var("n", IrType::Int);
        assert_eq!(Call::new_int_array(size).to_string(), "new(array, n.i32).array.i32");
        assert_eq!(Call::new_object("Foo").to_string(), "new(Foo).Foo");
        let a = Operand::var("a", IrType::int_array());
        assert_eq!(Call::array_length(a).to_string(), "arraylength(a.array.i32).i32");
    }
}
