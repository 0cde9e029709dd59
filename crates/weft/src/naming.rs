//! Go identifier helpers shared by the component and host generators.

/// Capitalise the first letter so Go exports the name: `count` → `Count`.
pub(crate) fn exported(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_names() {
        assert_eq!(exported("pos"), "Pos");
        assert_eq!(exported("Vel"), "Vel");
        assert_eq!(exported("élan"), "Élan");
        assert_eq!(exported(""), "");
    }
}
