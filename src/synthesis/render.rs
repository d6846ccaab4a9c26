//! # Template Rendering
//!
//! One minijinja environment per build. Undefined variables are errors, so a
//! template referencing a field the component config lacks fails the pass
//! instead of rendering an empty string.

use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};

pub(crate) fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    // Manifests are YAML; never escape interpolated values
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("to_yaml", to_yaml);
    env.add_filter("indent", indent);
    env
}

/// Serialize a value as a YAML block, without the trailing newline
fn to_yaml(value: Value) -> Result<String, Error> {
    let rendered = serde_yaml::to_string(&value).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, "value cannot be rendered as YAML")
            .with_source(e)
    })?;
    Ok(rendered.trim_end().to_string())
}

/// Prefix every line, including the first, with `width` spaces
fn indent(value: String, width: usize) -> String {
    let pad = " ".repeat(width);
    value
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
