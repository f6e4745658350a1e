//! Rewrites the engine's backend-neutral `?` positional placeholders into a
//! specific backend's dialect. SQLite accepts bare `?`; Postgres requires
//! numbered `$1`, `$2`, ... Single-quoted string literals are skipped so a
//! literal `?` inside one is never mistaken for a placeholder.

/// Rewrite `?` placeholders into Postgres's `$N` dialect.
pub fn to_postgres(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_string = false;
    let mut n = 0u32;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_string = !in_string;
                out.push(c);
            }
            '?' if !in_string => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_sequential_placeholders() {
        assert_eq!(
            to_postgres("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
    }

    #[test]
    fn ignores_question_marks_inside_string_literals() {
        assert_eq!(
            to_postgres("SELECT ? WHERE x = 'is this a ?'"),
            "SELECT $1 WHERE x = 'is this a ?'"
        );
    }
}
