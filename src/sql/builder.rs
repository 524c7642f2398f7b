//! Parameterized statement builders over explicit column projections.
//! Identifiers come from resolved descriptors; values always bind as
//! placeholders.

use serde_json::Value;

/// Quote an identifier for SQLite.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

fn projection(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT with one placeholder per pair, in the order given. The caller
/// supplies pairs in resolver order so columns and values stay aligned.
pub fn insert(table: &str, pairs: Vec<(String, Value)>) -> QueryBuf {
    let mut columns = Vec::with_capacity(pairs.len());
    let mut placeholders = Vec::with_capacity(pairs.len());
    let mut params = Vec::with_capacity(pairs.len());
    for (column, value) in pairs {
        columns.push(quoted(&column));
        placeholders.push("?");
        params.push(value);
    }
    QueryBuf {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(table),
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    }
}

/// UPDATE by identity, setting only the given pairs.
pub fn update_by_id(table: &str, pairs: Vec<(String, Value)>, id: &str) -> QueryBuf {
    let mut sets = Vec::with_capacity(pairs.len());
    let mut params = Vec::with_capacity(pairs.len() + 1);
    for (column, value) in pairs {
        sets.push(format!("{} = ?", quoted(&column)));
        params.push(value);
    }
    params.push(Value::String(id.to_string()));
    QueryBuf {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quoted(table),
            sets.join(", "),
            quoted("id")
        ),
        params,
    }
}

pub fn select_by_id(table: &str, columns: &[String], id: &str) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "SELECT {} FROM {} WHERE {} = ?",
            projection(columns),
            quoted(table),
            quoted("id")
        ),
        params: vec![Value::String(id.to_string())],
    }
}

/// Single-row lookup by an arbitrary column; first row wins when duplicates
/// exist.
pub fn select_by_column(table: &str, columns: &[String], column: &str, value: Value) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            projection(columns),
            quoted(table),
            quoted(column)
        ),
        params: vec![value],
    }
}

/// Full scan; ordering is storage-defined.
pub fn select_all(table: &str, columns: &[String]) -> QueryBuf {
    QueryBuf {
        sql: format!("SELECT {} FROM {}", projection(columns), quoted(table)),
        params: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<String> {
        vec!["id".into(), "name".into(), "owner_id".into()]
    }

    #[test]
    fn insert_aligns_columns_and_params() {
        let q = insert(
            "Widget",
            vec![
                ("id".into(), json!("abc")),
                ("name".into(), json!("a")),
                ("owner_id".into(), Value::Null),
            ],
        );
        assert_eq!(
            q.sql,
            r#"INSERT INTO "Widget" ("id", "name", "owner_id") VALUES (?, ?, ?)"#
        );
        assert_eq!(q.params, vec![json!("abc"), json!("a"), Value::Null]);
    }

    #[test]
    fn update_appends_id_as_last_param() {
        let q = update_by_id("Widget", vec![("name".into(), json!("b"))], "abc");
        assert_eq!(q.sql, r#"UPDATE "Widget" SET "name" = ? WHERE "id" = ?"#);
        assert_eq!(q.params, vec![json!("b"), json!("abc")]);
    }

    #[test]
    fn selects_use_the_explicit_projection() {
        let cols = columns();
        assert_eq!(
            select_by_id("Widget", &cols, "abc").sql,
            r#"SELECT "id", "name", "owner_id" FROM "Widget" WHERE "id" = ?"#
        );
        assert_eq!(
            select_by_column("Widget", &cols, "name", json!("a")).sql,
            r#"SELECT "id", "name", "owner_id" FROM "Widget" WHERE "name" = ? LIMIT 1"#
        );
        assert_eq!(
            select_all("Widget", &cols).sql,
            r#"SELECT "id", "name", "owner_id" FROM "Widget""#
        );
    }

    #[test]
    fn identifiers_with_quotes_are_escaped() {
        assert_eq!(quoted(r#"we"ird"#), r#""we""ird""#);
    }
}
