//! Statement execution seam between records and database backends.

use async_trait::async_trait;
use std::borrow::Cow;

use crate::{OrmError, Row, Value};

/// Native bound-parameter syntax of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` (MySQL, SQLite). Statements pass through unchanged.
    QuestionMark,
    /// `%s`, with literal `%` doubled.
    Format,
    /// `$1`, `$2`, ... numbered by position.
    Numbered,
}

/// Rewrite every `?` parameter token in `sql` into `style`.
///
/// Tokens inside quoted strings or quoted identifiers are left alone. Inside
/// a string literal a backslash escapes the next character.
pub fn translate_placeholders(sql: &str, style: Placeholder) -> Cow<'_, str> {
    if style == Placeholder::QuestionMark {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut position = 0usize;

    for c in sql.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                if c == '%' && style == Placeholder::Format {
                    out.push('%');
                }
                out.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    position += 1;
                    match style {
                        Placeholder::Format => out.push_str("%s"),
                        Placeholder::Numbered => {
                            out.push('$');
                            out.push_str(&position.to_string());
                        }
                        Placeholder::QuestionMark => out.push('?'),
                    }
                }
                '%' if style == Placeholder::Format => out.push_str("%%"),
                _ => out.push(c),
            },
        }
    }

    Cow::Owned(out)
}

/// Runs generated statements against a store.
///
/// Implemented by backend pool types (e.g. `MySqlPool`, `SqlitePool`). Each
/// call borrows one pooled connection for its duration and returns it on every
/// exit path.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a read-only statement and return at most `limit` rows (all rows
    /// when `limit` is `None` or zero), keyed by column name in select order.
    async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, OrmError>;

    /// Run a write statement and return the affected row count.
    ///
    /// With `autocommit == false` the statement runs inside an explicit
    /// transaction that is committed on success and rolled back on failure.
    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool)
    -> Result<u64, OrmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_is_borrowed_unchanged() {
        let sql = "select `id` from `users` where `id`=?";
        let out = translate_placeholders(sql, Placeholder::QuestionMark);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, sql);
    }

    #[test]
    fn format_style() {
        let out = translate_placeholders(
            "update `users` set `name`=? where `id`=?",
            Placeholder::Format,
        );
        assert_eq!(out, "update `users` set `name`=%s where `id`=%s");
    }

    #[test]
    fn numbered_style_counts_positions() {
        let out = translate_placeholders(
            "insert into `t` (`a`, `b`, `id`) values (?, ?, ?)",
            Placeholder::Numbered,
        );
        assert_eq!(out, "insert into `t` (`a`, `b`, `id`) values ($1, $2, $3)");
    }

    #[test]
    fn quoted_question_marks_are_kept() {
        let out = translate_placeholders(
            "select * from `t` where `note`='why?' and `id`=?",
            Placeholder::Numbered,
        );
        assert_eq!(out, "select * from `t` where `note`='why?' and `id`=$1");
    }

    #[test]
    fn escaped_quote_does_not_end_the_string() {
        let out = translate_placeholders(
            r"select * from `t` where `n`='it\'s ?' and `id`=?",
            Placeholder::Numbered,
        );
        assert_eq!(out, r"select * from `t` where `n`='it\'s ?' and `id`=$1");

        let out = translate_placeholders(
            r#"select * from `t` where `n`="a\\" and `id`=?"#,
            Placeholder::Format,
        );
        assert_eq!(out, r#"select * from `t` where `n`="a\\" and `id`=%s"#);

        let out = translate_placeholders(
            "select * from `t` where `n`='it''s ?' and `id`=?",
            Placeholder::Numbered,
        );
        assert_eq!(out, "select * from `t` where `n`='it''s ?' and `id`=$1");
    }

    #[test]
    fn format_style_escapes_percent() {
        let out = translate_placeholders(
            "select * from `t` where `name` like '%a%' and `id`=?",
            Placeholder::Format,
        );
        assert_eq!(out, "select * from `t` where `name` like '%%a%%' and `id`=%s");
    }
}
