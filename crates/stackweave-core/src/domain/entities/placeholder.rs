//! `{{symbol}}` placeholder scanning and substitution.
//!
//! A placeholder is two opening braces, a symbol, and two closing braces.
//! Symbols are dotted lowercase names (`db.url_var`, `app.port`).
//!
//! # Brace runs
//!
//! A run of three or more opening braces keeps everything but the last two
//! literal, so fragments can wrap a placeholder in shell or compose syntax:
//!
//! | Body                        | Rendered (`app.port_var = PORT`) |
//! |-----------------------------|----------------------------------|
//! | `{{app.port_var}}`          | `PORT`                           |
//! | `${{{app.port_var}}}`       | `${PORT}`                        |
//! | `{{ not a symbol }}`        | `{{ not a symbol }}`             |
//!
//! Anything that does not parse as a placeholder is copied through untouched.

use crate::domain::error::DomainError;

/// One piece of a scanned template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Whether `name` is a well-formed symbol.
///
/// Lowercase ASCII letters, digits and `_`, in one or more dot-separated
/// parts, each starting with a letter.
pub fn is_symbol(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            part.chars().next().is_some_and(|c| c.is_ascii_lowercase())
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

/// Split `text` into literal runs and placeholders, in order.
pub fn scan(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < bytes.len() && bytes[i] == b'{' {
            i += 1;
        }
        if i - run_start < 2 {
            continue;
        }

        // The last two braces of the run open the placeholder.
        let name_start = i;
        let Some(close) = text[name_start..].find("}}") else {
            continue;
        };
        let name = &text[name_start..name_start + close];
        if !is_symbol(name) {
            continue;
        }

        let open = i - 2;
        if open > literal_start {
            segments.push(Segment::Literal(&text[literal_start..open]));
        }
        segments.push(Segment::Placeholder(name));
        i = name_start + close + 2;
        literal_start = i;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    segments
}

/// Every distinct symbol referenced in `text`, in first-seen order.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for segment in scan(text) {
        match segment {
            Segment::Placeholder(name) if !seen.contains(&name) => seen.push(name),
            _ => {}
        }
    }
    seen
}

/// Substitute every placeholder in `text` using `lookup`.
///
/// The first symbol `lookup` cannot resolve aborts rendering with
/// [`DomainError::UnresolvedIdentifier`] attributed to `fragment`.
pub fn render<'v>(
    text: &str,
    fragment: &str,
    lookup: impl Fn(&str) -> Option<&'v str>,
) -> Result<String, DomainError> {
    let mut out = String::with_capacity(text.len());
    for segment in scan(text) {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Placeholder(name) => {
                let value = lookup(name).ok_or_else(|| DomainError::UnresolvedIdentifier {
                    name: name.to_string(),
                    fragment: fragment.to_string(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<&'static str> {
        match name {
            "app.port_var" => Some("PORT"),
            "app.port" => Some("8000"),
            "project.name" => Some("shop"),
            _ => None,
        }
    }

    #[test]
    fn plain_placeholder_is_replaced() {
        let out = render("name: {{project.name}}\n", "f", lookup).unwrap();
        assert_eq!(out, "name: shop\n");
    }

    #[test]
    fn outer_braces_of_a_long_run_stay_literal() {
        let out = render("${{{app.port_var}}:-{{app.port}}}", "f", lookup).unwrap();
        assert_eq!(out, "${PORT:-8000}");
    }

    #[test]
    fn non_symbols_are_copied_through() {
        let text = "{{ Not A Symbol }} and {single} and {{";
        assert_eq!(render(text, "f", lookup).unwrap(), text);
    }

    #[test]
    fn unknown_symbol_names_fragment_and_identifier() {
        let err = render("{{db.url_var}}", "compose-app-db-env", lookup).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnresolvedIdentifier {
                name: "db.url_var".into(),
                fragment: "compose-app-db-env".into(),
            }
        );
    }

    #[test]
    fn placeholders_are_deduplicated_in_order() {
        let names = placeholders("{{b.x}} {{a.y}} {{b.x}}");
        assert_eq!(names, vec!["b.x", "a.y"]);
    }

    #[test]
    fn symbol_shape() {
        assert!(is_symbol("db.url_var"));
        assert!(is_symbol("project"));
        assert!(!is_symbol("DB.url"));
        assert!(!is_symbol("db..url"));
        assert!(!is_symbol("db.1x"));
        assert!(!is_symbol(""));
    }

    #[test]
    fn compose_escapes_are_untouched() {
        let text = "pg_isready -U $${POSTGRES_USER}";
        assert_eq!(scan(text), vec![Segment::Literal(text)]);
    }
}
