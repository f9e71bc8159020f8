use sqlx::MySqlPool;

use crate::model::attendance::AttendancePatch;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Null,
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        v.map(SqlValue::String).unwrap_or(SqlValue::Null)
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(v: Option<f64>) -> Self {
        v.map(SqlValue::F64).unwrap_or(SqlValue::Null)
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names must come from code, never from request payloads.
/// Returns `None` when there is nothing to set.
pub fn build_update_sql(
    table: &str,
    assignments: Vec<(&'static str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> Option<SqlUpdate> {
    if assignments.is_empty() {
        return None;
    }

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    let mut values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Some(SqlUpdate { sql, values })
}

/// Column assignments of an attendance patch, in a stable order.
pub fn attendance_assignments(patch: &AttendancePatch) -> Vec<(&'static str, SqlValue)> {
    let mut out = Vec::new();
    if let Some(v) = &patch.check_in {
        out.push(("check_in", SqlValue::from(v.clone())));
    }
    if let Some(v) = &patch.check_out {
        out.push(("check_out", SqlValue::from(v.clone())));
    }
    if let Some(v) = patch.work_hours {
        out.push(("work_hours", SqlValue::F64(v)));
    }
    if let Some(v) = patch.ot_hours {
        out.push(("ot_hours", SqlValue::from(v)));
    }
    if let Some(v) = &patch.remark {
        out.push(("remark", SqlValue::from(v.clone())));
    }
    if let Some(v) = &patch.absent {
        out.push(("absent", SqlValue::from(v.clone())));
    }
    out
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
