/// Task model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     deadline DATE NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     images TEXT[] NOT NULL DEFAULT '{}',
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A task's deadline may never exceed its parent project's deadline; the
/// task service enforces this on create and on every deadline change.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::membership::{ProjectMember, TaskMemberEntry};
use super::user::UserSummary;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Must be on or before the parent project's deadline
    pub deadline: NaiveDate,

    pub status: TaskStatus,

    /// Image paths resolved by upstream file handling
    pub images: Vec<String>,

    pub project_id: Uuid,

    /// User who created (assigned) the task
    pub assigned_by_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// Status is not part of the input; new tasks always start `pending`.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub images: Vec<String>,
    pub project_id: Uuid,
    pub assigned_by_id: Uuid,
}

/// Partial update for a task
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub images: Option<Vec<String>>,
}

/// Parent project projection embedded in task responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskProjectRef {
    pub id: Uuid,
    pub name: String,
    pub deadline: NaiveDate,
    pub owner_id: Uuid,
}

/// Task with its loaded relations
///
/// Carries the parent project's member ids alongside the task's own
/// members because read access extends to every project member.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,

    pub project: TaskProjectRef,

    pub assigned_by: UserSummary,

    pub members: Vec<TaskMemberEntry>,

    /// User ids of the parent project's members (policy input, not output)
    #[serde(skip_serializing)]
    pub project_member_ids: Vec<Uuid>,
}

impl TaskDetail {
    /// Ids of the task's own member users
    pub fn member_user_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.user_id).collect()
    }
}

const TASK_COLUMNS: &str =
    "id, name, description, deadline, status, images, project_id, assigned_by_id, created_at, updated_at";

impl Task {
    /// Inserts a new task in `pending` status
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (name, description, deadline, images, project_id, assigned_by_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.images)
        .bind(data.project_id)
        .bind(data.assigned_by_id)
        .fetch_one(executor)
        .await
    }

    /// Finds a task row by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads a task with project, assigner, and member relations
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let project = sqlx::query_as::<_, TaskProjectRef>(
            "SELECT id, name, deadline, owner_id FROM projects WHERE id = $1",
        )
        .bind(task.project_id)
        .fetch_one(pool)
        .await?;

        let assigned_by = sqlx::query_as::<_, UserSummary>(
            "SELECT id, first_name, last_name, email, profile_image FROM users WHERE id = $1",
        )
        .bind(task.assigned_by_id)
        .fetch_one(pool)
        .await?;

        let members = TaskMemberEntry::list_for_task(pool, id).await?;
        let project_member_ids = ProjectMember::user_ids(pool, task.project_id).await?;

        Ok(Some(TaskDetail {
            task,
            project,
            assigned_by,
            members,
            project_member_ids,
        }))
    }

    /// Applies a partial update, bumping `updated_at`
    pub async fn apply_update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.deadline.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deadline = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.images.is_some() {
            bind_count += 1;
            query.push_str(&format!(", images = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(deadline) = data.deadline {
            q = q.bind(deadline);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(images) = data.images {
            q = q.bind(images);
        }

        q.fetch_optional(executor).await
    }

    /// Updates only the status column
    pub async fn set_status(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a task; members and history cascade
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Full field snapshot for create/update history payloads
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "description": self.description,
            "deadline": self.deadline,
            "status": self.status,
            "images": self.images,
        })
    }

    /// Snapshot recorded just before deletion
    pub fn deletion_snapshot(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "description": self.description,
            "status": self.status,
            "deadline": self.deadline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_shape() {
        let task = Task {
            id: Uuid::new_v4(),
            name: "Write copy".to_string(),
            description: "Landing page copy".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            status: TaskStatus::Pending,
            images: vec![],
            project_id: Uuid::new_v4(),
            assigned_by_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let snapshot = task.snapshot();
        assert_eq!(snapshot["status"], "pending");
        assert_eq!(snapshot["name"], "Write copy");
        assert!(snapshot.get("project_id").is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }
}
