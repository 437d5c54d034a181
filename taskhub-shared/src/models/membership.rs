/// Project and task membership join rows
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// -- task_members is identical with task_id in place of project_id
/// ```
///
/// A user belongs to a project or task at most once; the unique constraint
/// enforces it and inserts use `ON CONFLICT DO NOTHING` so re-adding an
/// existing member is a no-op rather than an error.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::user::UserSummary;

/// Project membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Task membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskMember {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Membership entry with the member's user summary loaded
#[derive(Debug, Clone, Serialize)]
pub struct ProjectMemberEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// Task membership entry with the member's user summary loaded
#[derive(Debug, Clone, Serialize)]
pub struct TaskMemberEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    u_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    profile_image: Option<String>,
}

impl MemberRow {
    fn into_summary(self) -> (Uuid, Uuid, DateTime<Utc>, UserSummary) {
        (
            self.id,
            self.user_id,
            self.created_at,
            UserSummary {
                id: self.u_id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                profile_image: self.profile_image,
            },
        )
    }
}

impl ProjectMember {
    /// Adds a user to a project; a duplicate pair is silently ignored
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Removes every member of a project (used for full replacement)
    pub async fn delete_for_project(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// User ids of a project's members
    pub async fn user_ids(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM project_members WHERE project_id = $1")
                .bind(project_id)
                .fetch_all(executor)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

impl ProjectMemberEntry {
    /// Lists a project's members with their user summaries
    pub async fn list_for_project(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT pm.id, pm.user_id, pm.created_at,
                   u.id AS u_id, u.first_name, u.last_name, u.email, u.profile_image
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1
            ORDER BY pm.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (id, user_id, created_at, user) = row.into_summary();
                Self {
                    id,
                    user_id,
                    created_at,
                    user,
                }
            })
            .collect())
    }
}

impl TaskMember {
    /// Adds a user to a task; a duplicate pair is silently ignored
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_members (task_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Removes every member of a task (used for full replacement)
    pub async fn delete_for_task(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_members WHERE task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

impl TaskMemberEntry {
    /// Lists a task's members with their user summaries
    pub async fn list_for_task(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT tm.id, tm.user_id, tm.created_at,
                   u.id AS u_id, u.first_name, u.last_name, u.email, u.profile_image
            FROM task_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.task_id = $1
            ORDER BY tm.created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (id, user_id, created_at, user) = row.into_summary();
                Self {
                    id,
                    user_id,
                    created_at,
                    user,
                }
            })
            .collect())
    }
}
