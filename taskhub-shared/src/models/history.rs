/// Append-only change history for projects and tasks
///
/// Every create/update/delete of a project or task appends exactly one
/// history row inside the same transaction as the mutation, so the audit
/// record and the entity change commit or roll back together.
///
/// # Payload shapes
///
/// - `create`: full field snapshot of the new entity
/// - `update`: `{ "before": {...}, "after": {...} }`, with `before`
///   captured prior to applying the mutation; status-only updates use the
///   compact `{ "field": "status", "before": ..., "after": ... }` form
/// - `delete`: snapshot of the fields at deletion time, written before the
///   row is removed
///
/// Rows are never mutated; they disappear only when their parent cascades.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::user::UserSummary;

/// Kind of mutation a history row records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

/// Project history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectHistory {
    pub id: Uuid,
    pub action: ActionType,
    pub changes: Value,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Task history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    pub id: Uuid,
    pub action: ActionType,
    pub changes: Value,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// History entry with the acting user's summary loaded
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub action: ActionType,
    pub changes: Value,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    action: ActionType,
    changes: Value,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    u_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    profile_image: Option<String>,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            action: row.action,
            changes: row.changes,
            user_id: row.user_id,
            created_at: row.created_at,
            user: UserSummary {
                id: row.u_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                profile_image: row.profile_image,
            },
        }
    }
}

/// Builds the update payload from before/after snapshots
pub fn update_diff(before: Value, after: Value) -> Value {
    json!({ "before": before, "after": after })
}

/// Builds the compact single-field payload used by status updates
pub fn field_diff(field: &str, before: impl Serialize, after: impl Serialize) -> Value {
    json!({
        "field": field,
        "before": before,
        "after": after,
    })
}

impl ProjectHistory {
    /// Appends one immutable history row
    ///
    /// Pass the transaction's executor so the row commits together with
    /// the triggering mutation.
    pub async fn record(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
        user_id: Uuid,
        action: ActionType,
        changes: Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectHistory>(
            r#"
            INSERT INTO project_history (action, changes, project_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, action, changes, project_id, user_id, created_at
            "#,
        )
        .bind(action)
        .bind(changes)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Lists a project's history newest-first, with acting users loaded
    pub async fn list_for_project(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT h.id, h.action, h.changes, h.user_id, h.created_at,
                   u.id AS u_id, u.first_name, u.last_name, u.email, u.profile_image
            FROM project_history h
            JOIN users u ON u.id = h.user_id
            WHERE h.project_id = $1
            ORDER BY h.created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }
}

impl TaskHistory {
    /// Appends one immutable history row
    pub async fn record(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
        user_id: Uuid,
        action: ActionType,
        changes: Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskHistory>(
            r#"
            INSERT INTO task_history (action, changes, task_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, action, changes, task_id, user_id, created_at
            "#,
        )
        .bind(action)
        .bind(changes)
        .bind(task_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Lists a task's history newest-first, with acting users loaded
    pub async fn list_for_task(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT h.id, h.action, h.changes, h.user_id, h.created_at,
                   u.id AS u_id, u.first_name, u.last_name, u.email, u.profile_image
            FROM task_history h
            JOIN users u ON u.id = h.user_id
            WHERE h.task_id = $1
            ORDER BY h.created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }
}
