//! JVM names and type descriptors.

use crate::ir::{ClassUnit, IrType};

/// Resolves a jmm class name to its JVM internal name.
///
/// Imported classes use their full path with `/` separators; the unit's own class and unknown
/// names are used as written, except `Object`.
pub fn class_path(unit: &ClassUnit, name: &str) -> String {
    match unit.import_path(name) {
        Some(path) => path.replace('.', "/"),
        None if name == "Object" && unit.name != name => "java/lang/Object".to_string(),
        None => name.to_string(),
    }
}

/// Internal name of the superclass.
pub fn super_path(unit: &ClassUnit) -> String {
    match unit.super_name.as_deref() {
        Some(name) => class_path(unit, name),
        None => "java/lang/Object".to_string(),
    }
}

/// Field descriptor of `ty`: `I`, `Z`, `[I`, `Ljava/lang/String;`...
pub fn type_descriptor(unit: &ClassUnit, ty: &IrType) -> String {
    match ty {
        IrType::Int => "I".to_string(),
        IrType::Bool => "Z".to_string(),
        IrType::Void => "V".to_string(),
        IrType::String => "Ljava/lang/String;".to_string(),
        IrType::Array(elem) => format!("[{}", type_descriptor(unit, elem)),
        IrType::Class(name) => format!("L{};", class_path(unit, name)),
    }
}

/// Method descriptor: `(params)ret`.
pub fn method_descriptor<'a>(
    unit: &ClassUnit,
    params: impl IntoIterator<Item = &'a IrType>,
    ret: &IrType,
) -> String {
    let params: String = params.into_iter().map(|ty| type_descriptor(unit, ty)).collect();
    format!("({params}){}", type_descriptor(unit, ret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let unit = ClassUnit {
            name: "Main".into(),
            imports: vec!["java.util.List".into(), "io".into()],
            ..Default::default()
        };
        assert_eq!(class_path(&unit, "List"), "java/util/List");
        assert_eq!(class_path(&unit, "io"), "io");
        assert_eq!(class_path(&unit, "Main"), "Main");
        assert_eq!(super_path(&unit), "java/lang/Object");

        let args = IrType::Array(Box::new(IrType::String));
        assert_eq!(type_descriptor(&unit, &args), "[Ljava/lang/String;");
        assert_eq!(type_descriptor(&unit, &IrType::Class("List".into())), "Ljava/util/List;");
        let params = [IrType::Int, IrType::Bool, IrType::int_array()];
        assert_eq!(method_descriptor(&unit, &params, &IrType::Void), "(IZ[I)V");
    }
}
