use super::{IrType, Method};

/// Field visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: IrType,
    pub access: Access,
    pub is_static: bool,
    pub is_final: bool,
}

/// A lowered compilation unit: one class and its imports.
#[derive(Clone, Debug, Default)]
pub struct ClassUnit {
    pub name: String,
    /// The declared superclass; `None` means `Object`.
    pub super_name: Option<String>,
    /// Import paths, dotted.
    pub imports: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Returns the full dotted import path whose last segment is `simple_name`.
    pub fn import_path(&self, simple_name: &str) -> Option<&str> {
        self.imports
            .iter()
            .map(String::as_str)
            .find(|path| path.rsplit('.').next() == Some(simple_name))
    }
}
