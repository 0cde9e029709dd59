//! Go spelling of names, types and literals.

use weft_core::ast::{Literal, Primary, TypeDesc};

/// Render `ty` as Go. The built-in `Node` type is qualified with the
/// runtime alias; `uses_runtime` is set when that happens.
pub(super) fn go_type(ty: &TypeDesc, alias: &str, uses_runtime: &mut bool) -> String {
    match ty {
        TypeDesc::Named { name, arg: None } if name == "Node" => {
            *uses_runtime = true;
            format!("{alias}.Node")
        }
        TypeDesc::Named { name, arg: None } => name.clone(),
        TypeDesc::Named {
            name,
            arg: Some(arg),
        } => format!("{name}[{}]", go_type(arg, alias, uses_runtime)),
        TypeDesc::Chan { recv_only, elem } => {
            let elem = go_type(elem, alias, uses_runtime);
            if *recv_only {
                format!("<-chan {elem}")
            } else {
                format!("chan {elem}")
            }
        }
        TypeDesc::Slice(elem) => format!("[]{}", go_type(elem, alias, uses_runtime)),
        TypeDesc::Pointer(elem) => format!("*{}", go_type(elem, alias, uses_runtime)),
        TypeDesc::Func { params, results } => {
            let params: Vec<String> = params
                .iter()
                .map(|p| go_type(p, alias, uses_runtime))
                .collect();
            let results: Vec<String> = results
                .iter()
                .map(|r| go_type(r, alias, uses_runtime))
                .collect();
            format!("func({}){}", params.join(", "), result_suffix(&results))
        }
    }
}

/// ` T`, ` (T, U)` or nothing.
pub(super) fn result_suffix(results: &[String]) -> String {
    match results {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => format!(" ({})", many.join(", ")),
    }
}

/// A Go interpreted string literal holding `text`.
pub(super) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x80 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Type of a hoisted variable from its initializer, where obvious.
pub(super) fn infer_type(value: &Primary) -> Option<TypeDesc> {
    match value {
        Primary::Literal(Literal::Int(_)) => Some(TypeDesc::named("int")),
        Primary::Literal(Literal::Float(_)) => Some(TypeDesc::named("float64")),
        Primary::Literal(Literal::String(_) | Literal::Template(_)) => {
            Some(TypeDesc::named("string"))
        }
        Primary::Composite(composite) => Some(composite.ty.inner().clone()),
        Primary::Make(make) => Some(make.ty.inner().clone()),
        Primary::FuncLit(func) => Some(TypeDesc::Func {
            params: func.params.iter().map(|p| p.ty.inner().clone()).collect(),
            results: func.results.iter().map(|r| r.inner().clone()).collect(),
        }),
        Primary::Paren(inner) => infer_type(inner.as_primary()?),
        _ => None,
    }
}

/// Rows of a struct or const block with the first column padded the way
/// gofmt aligns it.
pub(super) fn align(rows: &[(String, String)], separator: &str) -> Vec<String> {
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, rest)| format!("{name:<width$}{separator}{rest}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_is_qualified() {
        let mut used = false;
        let ty = TypeDesc::slice(TypeDesc::named("Node"));
        assert_eq!(go_type(&ty, "rt", &mut used), "[]rt.Node");
        assert!(used);

        let mut used = false;
        let ty = TypeDesc::Func {
            params: vec![TypeDesc::named("int")],
            results: vec![TypeDesc::named("string"), TypeDesc::named("error")],
        };
        assert_eq!(go_type(&ty, "rt", &mut used), "func(int) (string, error)");
        assert!(!used);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a \"b\"\n"), r#""a \"b\"\n""#);
        assert_eq!(quote("tab\there"), r#""tab\there""#);
        assert_eq!(quote("back\\slash"), r#""back\\slash""#);
        assert_eq!(quote("\u{1}"), r#""\x01""#);
        assert_eq!(quote("\u{7f}"), r#""\x7f""#);
        assert_eq!(quote("a\u{85}b"), r#""a\u0085b""#);
    }

    #[test]
    fn test_align_pads_first_column() {
        let rows = vec![
            ("n".to_string(), "int".to_string()),
            ("clicks".to_string(), "int".to_string()),
        ];
        assert_eq!(align(&rows, " "), vec!["n      int", "clicks int"]);
    }
}
