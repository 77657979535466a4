//! Lossy rewrite for modules that cannot be parsed.
//!
//! Works on the raw text with regular expressions. Nested braces in
//! exported object literals and mixed `import d, { a }` forms are not
//! rewritten. Exported declarations lose their `export` keyword even when
//! no name can be read from them. Any remaining line that still starts with
//! an `import` or `export` declaration is commented out.

use crate::commonjs::EXPORTS_PREAMBLE;
use crate::utilities::quote_string;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref EMPTY_EXPORT: Regex = Regex::new(r"(?m)^([ \t]*)export\s*\{\s*\}[ \t]*;?[ \t]*$").unwrap();
    static ref EXPORT_NAMESPACE_FROM: Regex = Regex::new(
        r#"(?m)^([ \t]*)export\s+\*\s+as\s+([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"\n]+)['"][ \t]*;?"#
    )
    .unwrap();
    static ref EXPORT_ALL_FROM: Regex =
        Regex::new(r#"(?m)^([ \t]*)export\s+\*\s*from\s*['"]([^'"\n]+)['"][ \t]*;?"#).unwrap();
    static ref EXPORT_LIST_FROM: Regex =
        Regex::new(r#"(?m)^([ \t]*)export\s*\{([^}]*)\}\s*from\s*['"]([^'"\n]+)['"][ \t]*;?"#).unwrap();
    static ref IMPORT_NAMESPACE: Regex = Regex::new(
        r#"(?m)^([ \t]*)import\s+\*\s+as\s+([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"\n]+)['"][ \t]*;?"#
    )
    .unwrap();
    static ref IMPORT_DEFAULT: Regex = Regex::new(
        r#"(?m)^([ \t]*)import\s+([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"\n]+)['"][ \t]*;?"#
    )
    .unwrap();
    static ref IMPORT_NAMED: Regex =
        Regex::new(r#"(?m)^([ \t]*)import\s*\{([^}]*)\}\s*from\s*['"]([^'"\n]+)['"][ \t]*;?"#).unwrap();
    static ref IMPORT_SIDE_EFFECT: Regex =
        Regex::new(r#"(?m)^([ \t]*)import\s*['"]([^'"\n]+)['"][ \t]*;?"#).unwrap();
    static ref EXPORT_DEFAULT: Regex = Regex::new(r"(?m)^([ \t]*)export\s+default\s+").unwrap();
    static ref EXPORT_DECLARATION: Regex = Regex::new(
        r"(?m)^([ \t]*)export\s+((?:async\s+)?(?:function\s*\*?|class\s|const\s|let\s|var\s)\s*([A-Za-z_$][\w$]*))"
    )
    .unwrap();
    static ref EXPORT_DESTRUCTURING: Regex = Regex::new(
        r"(?m)^([ \t]*)export\s+((?:const|let|var)\s*(?:\{([^{}\[\]\n]*)\}|\[([^{}\[\]\n]*)\]))"
    )
    .unwrap();
    static ref EXPORT_KEYWORD: Regex =
        Regex::new(r"(?m)^([ \t]*)export\s+((?:async\s+)?(?:function|class|const|let|var)\b)").unwrap();
    static ref BINDING_NAME: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
    static ref EXPORT_LIST: Regex = Regex::new(r"(?m)^([ \t]*)export\s*\{([^}]*)\}[ \t]*;?").unwrap();
    static ref MODULE_KEYWORD_LINE: Regex = Regex::new(r"^\s*(?:import|export)\b\s*(.?)").unwrap();
}

/// Rewrite `source` into CommonJS without parsing it.
pub fn fallback_transform(source: &str) -> String {
    let mut exported: Vec<(String, String)> = Vec::new();

    let text = EMPTY_EXPORT.replace_all(source, "${1}");
    let text = EXPORT_NAMESPACE_FROM.replace_all(&text, |caps: &Captures| {
        format!("{}exports.{} = require({});", &caps[1], &caps[2], quote_string(&caps[3]))
    });
    let text = EXPORT_ALL_FROM.replace_all(&text, |caps: &Captures| {
        format!("{}Object.assign(exports, require({}));", &caps[1], quote_string(&caps[2]))
    });
    let text = EXPORT_LIST_FROM.replace_all(&text, |caps: &Captures| {
        let source = quote_string(&caps[3]);
        split_specifiers(&caps[2])
            .map(|(local, exported)| {
                format!("{}exports.{} = require({}).{};", &caps[1], exported, source, local)
            })
            .collect::<Vec<_>>()
            .join("\n")
    });
    let text = IMPORT_NAMESPACE.replace_all(&text, |caps: &Captures| {
        format!("{}const {} = require({});", &caps[1], &caps[2], quote_string(&caps[3]))
    });
    let text = IMPORT_DEFAULT.replace_all(&text, |caps: &Captures| {
        format!("{}const {} = require({}).default;", &caps[1], &caps[2], quote_string(&caps[3]))
    });
    let text = IMPORT_NAMED.replace_all(&text, |caps: &Captures| {
        let bindings: Vec<String> = split_specifiers(&caps[2])
            .map(|(imported, local)| {
                if imported == local {
                    local.to_string()
                } else {
                    format!("{}: {}", imported, local)
                }
            })
            .collect();
        format!(
            "{}const {{ {} }} = require({});",
            &caps[1],
            bindings.join(", "),
            quote_string(&caps[3])
        )
    });
    let text = IMPORT_SIDE_EFFECT.replace_all(&text, |caps: &Captures| {
        format!("{}require({});", &caps[1], quote_string(&caps[2]))
    });
    let text = EXPORT_DEFAULT.replace_all(&text, "${1}exports.default = ");
    let text = EXPORT_DESTRUCTURING.replace_all(&text, |caps: &Captures| {
        let names = match (caps.get(3), caps.get(4)) {
            (Some(object), _) => pattern_names(object.as_str(), true),
            (None, Some(array)) => pattern_names(array.as_str(), false),
            (None, None) => Vec::new(),
        };
        exported.extend(names.into_iter().map(|name| (name.to_string(), name.to_string())));
        format!("{}{}", &caps[1], &caps[2])
    });
    let text = EXPORT_DECLARATION.replace_all(&text, |caps: &Captures| {
        exported.push((caps[3].to_string(), caps[3].to_string()));
        format!("{}{}", &caps[1], &caps[2])
    });
    // Declarations the patterns above cannot name still keep their binding.
    let text = EXPORT_KEYWORD.replace_all(&text, "${1}${2}");
    let text = EXPORT_LIST.replace_all(&text, |caps: &Captures| {
        exported.extend(
            split_specifiers(&caps[2]).map(|(local, name)| (name.to_string(), local.to_string())),
        );
        caps[1].to_string()
    });

    let mut output = format!(
        "{}\n\n// Fallback transformation due to parsing error\n",
        EXPORTS_PREAMBLE
    );
    for line in text.lines() {
        if is_module_declaration_line(line) {
            output.push_str("// ");
        }
        output.push_str(line);
        output.push('\n');
    }
    for (name, local) in &exported {
        output.push_str(&format!("exports.{} = {};\n", name, local));
    }
    output.push_str("\nmodule.exports = exports;");
    output
}

/// Split a `{ .. }` specifier list into `(name, alias)` pairs.
fn split_specifiers(list: &str) -> impl Iterator<Item = (&str, &str)> {
    list.split(',').filter_map(|item| {
        let item = item.trim();
        if item.is_empty() {
            return None;
        }
        let mut parts = item.split_whitespace();
        let name = parts.next()?;
        match (parts.next(), parts.next()) {
            (Some("as"), Some(alias)) => Some((name, alias)),
            _ => Some((name, name)),
        }
    })
}

/// Names bound by a flat object (`{ a, b: c, d = 1 }`) or array
/// (`[x, , ...rest]`) pattern.
fn pattern_names(pattern: &str, object: bool) -> Vec<&str> {
    pattern
        .split(',')
        .filter_map(|element| {
            let element = element.split('=').next()?.trim();
            let element = element.strip_prefix("...").unwrap_or(element);
            let name = if object {
                element.rsplit(':').next()?.trim()
            } else {
                element
            };
            BINDING_NAME.is_match(name).then_some(name)
        })
        .collect()
}

/// A line still starting with a static `import`/`export` (not `import(` or
/// `import.meta`).
fn is_module_declaration_line(line: &str) -> bool {
    match MODULE_KEYWORD_LINE.captures(line) {
        Some(caps) => !matches!(&caps[1], "(" | "."),
        None => false,
    }
}
