//! `${VAR}` expansion for launch arguments.
//!
//! Credentials for the tool services come from the environment rather than
//! the config file:
//!
//! ```toml
//! args = ["--access-token=${SUPABASE_ACCESS_TOKEN}", "--project-ref=${SUPABASE_PROJECT_REF:-demo}"]
//! ```
//!
//! `${VAR}` must resolve; `${VAR:-default}` falls back to `default` when the
//! variable is unset or empty. A `$` not followed by `{` is kept as-is.

use crate::{ConfigError, Result};

/// Expand variable references in `input` using `lookup`.
///
/// `context` names the field being expanded and is only used in errors.
pub fn expand_with<F>(input: &str, context: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find("${") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        let end = after.find('}').ok_or_else(|| ConfigError::InvalidReference {
            context: context.to_string(),
            message: "unterminated '${'".to_string(),
        })?;

        let body = &after[..end];
        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        if !is_valid_name(name) {
            return Err(ConfigError::InvalidReference {
                context: context.to_string(),
                message: format!("invalid variable name '{}'", name),
            });
        }

        match (lookup(name).filter(|v| !v.is_empty()), default) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(default)) => out.push_str(default),
            (None, None) => {
                return Err(ConfigError::UnresolvedVar {
                    var: name.to_string(),
                    context: context.to_string(),
                });
            }
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Expand variable references from the process environment.
pub fn expand_env(input: &str, context: &str) -> Result<String> {
    expand_with(input, context, &|name| std::env::var(name).ok())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TOKEN" => Some("s3cret".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    fn expand(input: &str) -> Result<String> {
        expand_with(input, "test", &lookup)
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(expand("python server.py").unwrap(), "python server.py");
        assert_eq!(expand("cost: $5").unwrap(), "cost: $5");
    }

    #[test]
    fn test_expands_set_variable() {
        assert_eq!(
            expand("--access-token=${TOKEN}").unwrap(),
            "--access-token=s3cret"
        );
        assert_eq!(expand("${TOKEN}-${TOKEN}").unwrap(), "s3cret-s3cret");
    }

    #[test]
    fn test_default_used_when_unset_or_empty() {
        assert_eq!(
            expand("--project-ref=${MISSING:-YOUR_PROJECT_REF}").unwrap(),
            "--project-ref=YOUR_PROJECT_REF"
        );
        assert_eq!(expand("${EMPTY:-fallback}").unwrap(), "fallback");
        assert_eq!(expand("${MISSING:-}").unwrap(), "");
        assert_eq!(expand("${TOKEN:-unused}").unwrap(), "s3cret");
    }

    #[test]
    fn test_unresolved_without_default_is_error() {
        let err = expand("${MISSING}").unwrap_err();
        match err {
            ConfigError::UnresolvedVar { var, context } => {
                assert_eq!(var, "MISSING");
                assert_eq!(context, "test");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_references() {
        assert!(matches!(
            expand("${TOKEN").unwrap_err(),
            ConfigError::InvalidReference { .. }
        ));
        assert!(matches!(
            expand("${1BAD}").unwrap_err(),
            ConfigError::InvalidReference { .. }
        ));
        assert!(matches!(
            expand("${}").unwrap_err(),
            ConfigError::InvalidReference { .. }
        ));
    }
}
