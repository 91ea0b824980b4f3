//! Parameter binding for the read-only SQL sent to the database service.
//!
//! The service only accepts a finished query string, so values are rendered
//! into `$n` placeholders here, one at a time, each validated and escaped for
//! its type. Caller text is never spliced into a template directly.

use std::fmt::Write as _;

use crate::error::{Result, ToolsError};

/// A typed query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Integer literal.
    Int(i64),
    /// Finite float literal.
    Float(f64),
    /// Single-quoted string literal.
    Text(String),
    /// pgvector literal, e.g. `'[0.1,0.2]'`. Must be non-empty and finite.
    Vector(Vec<f64>),
}

impl SqlParam {
    /// Render this value as a SQL literal.
    pub fn render(&self) -> Result<String> {
        match self {
            Self::Int(n) => Ok(n.to_string()),
            Self::Float(f) => {
                if !f.is_finite() {
                    return Err(ToolsError::invalid_input(format!(
                        "non-finite number {} cannot be sent to the database",
                        f
                    )));
                }
                Ok(f.to_string())
            }
            Self::Text(s) => {
                if s.contains('\0') {
                    return Err(ToolsError::invalid_input("text parameter contains a NUL byte"));
                }
                Ok(format!("'{}'", s.replace('\'', "''")))
            }
            Self::Vector(values) => {
                if values.is_empty() {
                    return Err(ToolsError::invalid_input("embedding must not be empty"));
                }
                let mut out = String::from("'[");
                for (i, v) in values.iter().enumerate() {
                    if !v.is_finite() {
                        return Err(ToolsError::invalid_input(format!(
                            "embedding component {} is not finite",
                            i
                        )));
                    }
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}", v);
                }
                out.push_str("]'");
                Ok(out)
            }
        }
    }
}

impl From<i64> for SqlParam {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Substitute `$1`, `$2`, ... in `template` with rendered `params`.
///
/// A `$` not followed by a digit is copied through, so regex anchors such as
/// `'^[0-9]+$'` survive. Referencing a parameter that was not supplied is an
/// error; a parameter may be referenced more than once.
pub fn bind(template: &str, params: &[SqlParam]) -> Result<String> {
    let rendered = params
        .iter()
        .map(SqlParam::render)
        .collect::<Result<Vec<_>>>()?;

    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        if digits.is_empty() {
            out.push('$');
            continue;
        }

        let index: usize = digits
            .parse()
            .map_err(|_| ToolsError::invalid_input(format!("bad placeholder ${}", digits)))?;
        let value = index
            .checked_sub(1)
            .and_then(|i| rendered.get(i))
            .ok_or_else(|| {
                ToolsError::invalid_input(format!(
                    "placeholder ${} has no parameter ({} supplied)",
                    index,
                    rendered.len()
                ))
            })?;
        out.push_str(value);
    }

    Ok(out)
}

/// Validate a five-digit US ZIP code.
pub fn validate_zip(zip: &str) -> Result<&str> {
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(zip)
    } else {
        Err(ToolsError::invalid_input(format!(
            "ZIP code must be five digits, got '{}'",
            zip
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_basic() {
        let sql = bind(
            "SELECT * FROM t WHERE id = $1 AND zip = $2",
            &[SqlParam::Int(7), SqlParam::from("11215")],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id = 7 AND zip = '11215'");
    }

    #[test]
    fn test_text_is_escaped() {
        let sql = bind(
            "SELECT * FROM t WHERE name = $1",
            &[SqlParam::from("O'Brien'; DROP TABLE t; --")],
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM t WHERE name = 'O''Brien''; DROP TABLE t; --'"
        );
    }

    #[test]
    fn test_rendered_values_are_not_rebound() {
        let sql = bind("$1 $2", &[SqlParam::from("$2"), SqlParam::Int(1)]).unwrap();
        assert_eq!(sql, "'$2' 1");
    }

    #[test]
    fn test_dollar_without_digits_is_literal() {
        let sql = bind(
            "WHERE \"SALE PRICE\" ~ '^[0-9]+$' AND x = $1",
            &[SqlParam::Int(3)],
        )
        .unwrap();
        assert_eq!(sql, "WHERE \"SALE PRICE\" ~ '^[0-9]+$' AND x = 3");
    }

    #[test]
    fn test_repeated_and_multi_digit_placeholders() {
        let params: Vec<SqlParam> = (1..=10).map(SqlParam::Int).collect();
        assert_eq!(bind("$10 $1 $1", &params).unwrap(), "10 1 1");
    }

    #[test]
    fn test_missing_parameter() {
        assert!(matches!(
            bind("$2", &[SqlParam::Int(1)]).unwrap_err(),
            ToolsError::InvalidInput(_)
        ));
        assert!(bind("$0", &[SqlParam::Int(1)]).is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(SqlParam::Float(f64::NAN).render().is_err());
        assert!(SqlParam::Float(f64::INFINITY).render().is_err());
        assert!(SqlParam::Vector(vec![0.1, f64::NAN]).render().is_err());
        assert!(bind("$1", &[SqlParam::Float(f64::NEG_INFINITY)]).is_err());
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(
            SqlParam::Vector(vec![0.1, -2.0, 3.25]).render().unwrap(),
            "'[0.1,-2,3.25]'"
        );
        assert!(SqlParam::Vector(vec![]).render().is_err());
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(SqlParam::Float(0.5).render().unwrap(), "0.5");
    }

    #[test]
    fn test_nul_rejected() {
        assert!(SqlParam::from("a\0b").render().is_err());
    }

    #[test]
    fn test_validate_zip() {
        assert_eq!(validate_zip("11215").unwrap(), "11215");
        assert!(validate_zip("1121").is_err());
        assert!(validate_zip("112155").is_err());
        assert!(validate_zip("11a15").is_err());
        assert!(validate_zip("' OR 1=1 --").is_err());
        assert!(validate_zip("１１２１５").is_err());
    }
}
