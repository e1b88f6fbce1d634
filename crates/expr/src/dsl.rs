use crate::ast::{Expr, Literal};
use crate::error::DslError;

/// Parses the elevata surrogate/FK expression DSL into an `Expr` tree.
///
/// Supported grammar:
/// - `HASH256(expr)`
/// - `CONCAT(expr1, expr2, ...)`
/// - `CONCAT_WS(sep, expr1, expr2, ...)`
/// - `COALESCE(expr, null_literal)`
/// - `COL(name)` (optionally quoted with `"`, `'`, `` ` ``, or `[]`)
/// - `'literal'` / `"literal"`
/// - `{expr:column_name}` placeholders, substituted with a `ColumnRef`
///   qualified by `table_alias` (used when deriving FK expressions against
///   the child side's own columns)
pub fn parse(dsl: &str, table_alias: Option<&str>) -> Result<Expr, DslError> {
    let dsl = dsl.trim();

    if let Some(colname) = parse_placeholder(dsl) {
        return Ok(col_ref(colname, table_alias));
    }

    if let Some(inner) = unquote(dsl) {
        return Ok(Expr::Literal(Literal::String(inner.to_string())));
    }

    if let Some(inner) = strip_call(dsl, "COL(") {
        return Ok(col_ref(unquote_ident(inner), table_alias));
    }

    if let Some(inner) = strip_call(dsl, "HASH256(") {
        let arg = parse(inner, table_alias)?;
        return Ok(Expr::func("HASH256", vec![arg]));
    }

    if let Some(inner) = strip_call(dsl, "CONCAT_WS(") {
        let (sep_raw, rest) = split_first_arg(inner);
        let sep = parse(sep_raw.trim(), table_alias)?;
        let mut args = vec![sep];
        for part in split_args(&rest) {
            args.push(parse(&part, table_alias)?);
        }
        return Ok(Expr::func("CONCAT_WS", args));
    }

    if let Some(inner) = strip_call(dsl, "CONCAT(") {
        let parts = split_args(inner)
            .iter()
            .map(|p| parse(p, table_alias))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::Concat(parts));
    }

    if let Some(inner) = strip_call(dsl, "COALESCE(") {
        let parts = split_args(inner);
        if parts.len() != 2 {
            return Err(DslError::CoalesceArity(parts.len()));
        }
        let left = parse(&parts[0], table_alias)?.cast("string");
        let right = parse(&parts[1], table_alias)?;
        return Ok(Expr::Coalesce(vec![left, right]));
    }

    Err(DslError::Unsupported(dsl.to_string()))
}

fn col_ref(name: &str, table_alias: Option<&str>) -> Expr {
    match table_alias {
        Some(alias) => Expr::qualified_col(alias, name),
        None => Expr::col(name),
    }
}

fn parse_placeholder(dsl: &str) -> Option<&str> {
    let inner = dsl.strip_prefix("{expr:")?.strip_suffix('}')?;
    if !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(inner)
    } else {
        None
    }
}

fn unquote(dsl: &str) -> Option<&str> {
    let bytes = dsl.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"'))
    {
        Some(&dsl[1..dsl.len() - 1])
    } else {
        None
    }
}

fn unquote_ident(raw: &str) -> &str {
    let raw = raw.trim();
    unquote(raw)
        .or_else(|| {
            let bytes = raw.as_bytes();
            if bytes.len() >= 2 && bytes[0] == b'`' && bytes[bytes.len() - 1] == b'`' {
                Some(&raw[1..raw.len() - 1])
            } else if bytes.len() >= 2 && bytes[0] == b'[' && bytes[bytes.len() - 1] == b']' {
                Some(&raw[1..raw.len() - 1])
            } else {
                None
            }
        })
        .unwrap_or(raw)
        .trim()
}

/// Case-insensitively matches a `PREFIX(...)` call shape and returns the
/// trimmed interior, or `None` if `dsl` isn't that call form.
fn strip_call<'a>(dsl: &'a str, prefix: &str) -> Option<&'a str> {
    if dsl.len() >= prefix.len()
        && dsl[..prefix.len()].eq_ignore_ascii_case(prefix)
        && dsl.ends_with(')')
    {
        Some(dsl[prefix.len()..dsl.len() - 1].trim())
    } else {
        None
    }
}

/// Splits `s` at top-level commas (ignoring commas nested inside parens).
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                args.push(s[start..i].trim().to_string());
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    args.push(s[start..].trim().to_string());
    args
}

/// Splits the first top-level argument from the rest, e.g. for `CONCAT_WS`
/// where the separator is distinguished from the variadic tail.
fn split_first_arg(s: &str) -> (&str, String) {
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                return (&s[..i], s[i + ch.len_utf8()..].to_string());
            }
            _ => {}
        }
    }
    (s, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn parses_column_reference() {
        let expr = parse("COL(customer_id)", None).unwrap();
        assert_eq!(expr, Expr::col("customer_id"));
    }

    #[test]
    fn parses_quoted_col_identifier() {
        let expr = parse(r#"COL("order date")"#, None).unwrap();
        assert_eq!(expr, Expr::col("order date"));
    }

    #[test]
    fn parses_placeholder_against_table_alias() {
        let expr = parse("{expr:customer_key}", Some("s")).unwrap();
        assert_eq!(expr, Expr::qualified_col("s", "customer_key"));
    }

    #[test]
    fn parses_string_literal() {
        let expr = parse("'unknown'", None).unwrap();
        assert_eq!(expr, Expr::string_lit("unknown"));
    }

    #[test]
    fn parses_nested_hash256_concat_ws() {
        let expr = parse("HASH256(CONCAT_WS('|', COL(a), COL(b)))", None).unwrap();
        match expr {
            Expr::FuncCall { name, args } => {
                assert_eq!(name, "HASH256");
                assert_eq!(args.len(), 1);
                match &args[0] {
                    Expr::FuncCall { name, args } => {
                        assert_eq!(name, "CONCAT_WS");
                        assert_eq!(args.len(), 3);
                        assert_eq!(args[0], Expr::string_lit("|"));
                        assert_eq!(args[1], Expr::col("a"));
                        assert_eq!(args[2], Expr::col("b"));
                    }
                    other => panic!("expected nested FuncCall, got {other:?}"),
                }
            }
            other => panic!("expected FuncCall, got {other:?}"),
        }
    }

    #[test]
    fn parses_coalesce_with_cast_on_left() {
        let expr = parse("COALESCE(COL(amount), '0')", None).unwrap();
        match expr {
            Expr::Coalesce(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(
                    parts[0],
                    Expr::col("amount").cast("string")
                );
                assert_eq!(parts[1], Expr::string_lit("0"));
            }
            other => panic!("expected Coalesce, got {other:?}"),
        }
    }

    #[test]
    fn coalesce_requires_exactly_two_arguments() {
        let err = parse("COALESCE(COL(a), COL(b), COL(c))", None).unwrap_err();
        assert_eq!(err, DslError::CoalesceArity(3));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        let err = parse("UPPER(COL(a))", None).unwrap_err();
        assert!(matches!(err, DslError::Unsupported(_)));
    }

    #[test]
    fn parses_concat_of_three_parts() {
        let expr = parse("CONCAT(COL(a), 'x', COL(b))", None).unwrap();
        assert_eq!(
            expr,
            Expr::Concat(vec![
                Expr::col("a"),
                Expr::string_lit("x"),
                Expr::col("b"),
            ])
        );
    }
}
