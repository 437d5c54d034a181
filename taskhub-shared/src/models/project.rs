/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     deadline DATE NOT NULL,
///     status project_status NOT NULL DEFAULT 'planning',
///     images TEXT[] NOT NULL DEFAULT '{}',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Every project has exactly one owner; the owner implicitly has full
/// access. Membership rows widen read access, change history is recorded
/// in `project_history`.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::membership::ProjectMemberEntry;
use super::user::UserSummary;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Hard deadline; child task deadlines may not exceed it
    pub deadline: NaiveDate,

    pub status: ProjectStatus,

    /// Image paths resolved by upstream file handling
    pub images: Vec<String>,

    /// Owning user; owner has full access to the project
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
///
/// Status is not part of the input; new projects always start in
/// `planning`.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub images: Vec<String>,
    pub owner_id: Uuid,
}

/// Partial update for a project
///
/// `None` leaves the column untouched; the field list is the explicit
/// allow-list of what a project update may change.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<ProjectStatus>,
    pub images: Option<Vec<String>>,
}

/// Project with its loaded relations: owner and members
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,

    pub owner: UserSummary,

    pub members: Vec<ProjectMemberEntry>,
}

impl ProjectDetail {
    /// Ids of all member users (not including the owner)
    pub fn member_user_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.user_id).collect()
    }
}

const PROJECT_COLUMNS: &str =
    "id, name, description, deadline, status, images, owner_id, created_at, updated_at";

impl Project {
    /// Inserts a new project in `planning` status
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, deadline, images, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.images)
        .bind(data.owner_id)
        .fetch_one(executor)
        .await
    }

    /// Finds a project row by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Loads a project with its owner and member relations
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<ProjectDetail>, sqlx::Error> {
        let Some(project) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let owner = sqlx::query_as::<_, UserSummary>(
            "SELECT id, first_name, last_name, email, profile_image FROM users WHERE id = $1",
        )
        .bind(project.owner_id)
        .fetch_one(pool)
        .await?;

        let members = ProjectMemberEntry::list_for_project(pool, id).await?;

        Ok(Some(ProjectDetail {
            project,
            owner,
            members,
        }))
    }

    /// Applies a partial update, bumping `updated_at`
    ///
    /// Builds the UPDATE dynamically so absent fields stay untouched.
    pub async fn apply_update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
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

        query.push_str(&format!(" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

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
        status: ProjectStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a project; members, tasks, and history cascade
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
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

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Website relaunch".to_string(),
            description: "Rebuild the marketing site".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            status: ProjectStatus::Planning,
            images: vec!["uploads/mockup.png".to_string()],
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_contains_all_tracked_fields() {
        let project = sample_project();
        let snapshot = project.snapshot();

        assert_eq!(snapshot["name"], "Website relaunch");
        assert_eq!(snapshot["status"], "planning");
        assert_eq!(snapshot["images"][0], "uploads/mockup.png");
        assert!(snapshot.get("owner_id").is_none());
    }

    #[test]
    fn test_deletion_snapshot_shape() {
        let project = sample_project();
        let snapshot = project.deletion_snapshot();

        assert!(snapshot.get("name").is_some());
        assert!(snapshot.get("status").is_some());
        assert!(snapshot.get("deadline").is_some());
        assert!(snapshot.get("images").is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(ProjectStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(ProjectStatus::OnHold.as_str(), "on_hold");
    }
}
