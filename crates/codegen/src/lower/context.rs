use crate::ir::{IrType, Operand};
use jmmc_ast::SymbolTable;
use rustc_hash::FxHashSet;

/// Naming state shared by all methods of one compilation unit.
///
/// Temporaries and labels are numbered per unit, never per method, so IR printed for different
/// methods of the same class never reuses a name.
#[derive(Debug, Default)]
pub struct GenContext {
    next_temp: u32,
    next_label: u32,
    /// Declared names that temporaries must not shadow.
    reserved: FxHashSet<String>,
}

impl GenContext {
    /// Creates a context that avoids every name declared in `table`.
    pub fn new(table: &SymbolTable) -> Self {
        let mut reserved: FxHashSet<String> = FxHashSet::default();
        reserved.insert(table.class_name().to_string());
        reserved.extend(
            table.imports().iter().filter_map(|path| path.rsplit('.').next()).map(str::to_string),
        );
        reserved.extend(table.fields().iter().map(|f| f.name.clone()));
        for method in table.methods() {
            reserved.extend(method.params.iter().chain(&method.locals).map(|s| s.name.clone()));
        }
        Self { next_temp: 0, next_label: 0, reserved }
    }

    /// Returns a fresh temporary of type `ty`.
    pub fn temp(&mut self, ty: IrType) -> Operand {
        Operand::var(self.temp_name(), ty)
    }

    /// Returns the name of a fresh temporary.
    pub fn temp_name(&mut self) -> String {
        loop {
            let name = format!("tmp{}", self.next_temp);
            self.next_temp += 1;
            if !self.reserved.contains(&name) {
                return name;
            }
        }
    }

    /// Returns a fresh label id. All labels of one construct share an id.
    pub fn label_id(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_ast::build::*;

    #[test]
    fn temps_skip_declared_names() {
        let ast = AstBuilder::new()
            .class(
                ClassBuilder::new("A")
                    .field("tmp1", ty("int"))
                    .method(MethodBuilder::new("f", ty("void")).local("tmp2", ty("boolean"))),
            )
            .build()
            .unwrap();
        let mut cx = GenContext::new(&SymbolTable::build(&ast).unwrap());
        let names: Vec<_> = (0..3).map(|_| cx.temp(IrType::Int).to_string()).collect();
        assert_eq!(names, ["tmp0.i32", "tmp3.i32", "tmp4.i32"]);
        assert_eq!((cx.label_id(), cx.label_id()), (0, 1));
    }
}
