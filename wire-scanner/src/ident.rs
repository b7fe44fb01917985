//! Identifier rewriting shared by every code-generation template: protocol
//! XML names are `snake_case` (interfaces, messages, enum entries); this
//! module turns them into the `CamelCase`/`snake_case` forms idiomatic Rust
//! expects for types vs. functions/fields, stripping the configured prefix.

/// `foo_bar_baz` -> `FooBarBaz`.
pub fn camel(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    let mut upper_next = true;
    for c in v.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper_next = false;
    }
    out
}

/// `FooBar` -> `foo_bar`.
pub fn snake(v: &str) -> String {
    let mut out = String::with_capacity(v.len() + 4);
    for (i, c) in v.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Strip the protocol's configured prefix (e.g. `wl_`) before camel-casing,
/// so `wl_surface` becomes the type name `Surface` rather than `WlSurface`.
pub fn interface_type_name(interface: &str, prefix: &str) -> String {
    let trimmed = interface.strip_prefix(prefix).unwrap_or(interface);
    camel(trimmed)
}

/// Append an underscore if `v` collides with a Rust keyword, the same
/// escape hatch `r#ident` raw identifiers exist for.
pub fn unkeyword(v: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false",
        "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
        "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
        "unsafe", "use", "where", "while", "async", "await", "dyn", "abstract", "become", "box",
        "do", "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield",
        "try", "gen",
    ];
    if KEYWORDS.contains(&v) {
        format!("{v}_")
    } else {
        v.to_owned()
    }
}

/// Reformat a protocol doc comment: trim each line, emit as `///` lines.
pub fn doc_comment(text: &str, indent: &str) -> String {
    text.lines()
        .map(str::trim)
        .map(|line| {
            if line.is_empty() {
                format!("{indent}///")
            } else {
                format!("{indent}/// {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel("wl_surface"), "WlSurface");
        assert_eq!(camel("get_registry"), "GetRegistry");
        assert_eq!(camel("x"), "X");
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(snake("WlSurface"), "wl_surface");
        assert_eq!(snake("GetRegistry"), "get_registry");
    }

    #[test]
    fn strips_configured_prefix() {
        assert_eq!(interface_type_name("wl_surface", "wl_"), "Surface");
        assert_eq!(interface_type_name("xdg_shell", "wl_"), "XdgShell");
    }

    #[test]
    fn keyword_collision_is_escaped() {
        assert_eq!(unkeyword("move"), "move_");
        assert_eq!(unkeyword("surface"), "surface");
    }
}
