/// Project service
///
/// Project CRUD with membership management and audit history. Every
/// mutation appends one history row inside the same transaction as the
/// change itself.
///
/// Membership semantics: requested member ids are resolved against
/// existing users and unknown ids are silently dropped, so a stale id in
/// the request never fails project creation or update.
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use taskhub_shared::{
    auth::policy::{self, Actor, ProjectAccess},
    models::{
        history::{self, ActionType, HistoryEntry, ProjectHistory},
        membership::ProjectMember,
        project::{CreateProject, Project, ProjectDetail, ProjectStatus, UpdateProject},
        user::User,
    },
    pagination::{Page, PageParams},
};

use crate::error::{ApiError, ApiResult};

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub images: Vec<String>,
    pub member_ids: Vec<Uuid>,
}

/// Input for updating a project
///
/// `member_ids: Some(...)` replaces the full membership set; `None`
/// leaves memberships untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    pub fields: UpdateProject,
    pub member_ids: Option<Vec<Uuid>>,
}

/// Listing filters for projects
#[derive(Debug, Clone, Default)]
pub struct ProjectListQuery {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub owner_id: Option<Uuid>,
    pub deadline_start: Option<NaiveDate>,
    pub deadline_end: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: PageParams,
}

/// Creates a project owned by the actor
///
/// Inserts the project (status starts at `planning`), resolves the
/// requested member ids, and records the CREATE history row, all in one
/// transaction.
pub async fn create(pool: &PgPool, actor: &Actor, input: CreateProjectInput) -> ApiResult<ProjectDetail> {
    // The token was validated upstream, but the row may be gone
    User::find_by_id(pool, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut tx = pool.begin().await?;

    let project = Project::insert(
        &mut *tx,
        CreateProject {
            name: input.name,
            description: input.description,
            deadline: input.deadline,
            images: input.images,
            owner_id: actor.id,
        },
    )
    .await?;

    let member_ids = User::find_existing_ids(&mut *tx, &input.member_ids).await?;
    for user_id in &member_ids {
        ProjectMember::insert(&mut *tx, project.id, *user_id).await?;
    }

    ProjectHistory::record(
        &mut *tx,
        project.id,
        actor.id,
        ActionType::Create,
        project.snapshot(),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project.id, owner_id = %actor.id, "Project created");

    load_detail(pool, project.id).await
}

/// Lists projects visible to the actor
///
/// Admins see everything; everyone else sees projects they own or are a
/// member of. Filters and sorting per the query; results come back as a
/// `Page` of full detail views.
pub async fn find_all(
    pool: &PgPool,
    actor: &Actor,
    query: &ProjectListQuery,
) -> ApiResult<Page<ProjectDetail>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM projects p WHERE 1=1");
    push_filters(&mut count_qb, actor, query);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new("SELECT p.id FROM projects p WHERE 1=1");
    push_filters(&mut qb, actor, query);

    qb.push(" ORDER BY p.");
    qb.push(sort_column(query.sort_by.as_deref()));
    qb.push(sort_direction(query.order.as_deref()));
    qb.push(" LIMIT ");
    qb.push_bind(query.page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(query.page.offset());

    let ids: Vec<(Uuid,)> = qb.build_query_as().fetch_all(pool).await?;

    let mut details = Vec::with_capacity(ids.len());
    for (id,) in ids {
        if let Some(detail) = Project::find_detail(pool, id).await? {
            details.push(detail);
        }
    }

    Ok(Page::new(details, total, query.page.page(), query.page.limit()))
}

/// Fetches one project with relations, enforcing read access
pub async fn find_by_id(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<ProjectDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_read_project(actor, &ProjectAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    Ok(detail)
}

/// Applies a partial update and optionally replaces the membership set
pub async fn update(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    input: UpdateProjectInput,
) -> ApiResult<ProjectDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_write_project(actor, &ProjectAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to update this project".to_string(),
        ));
    }

    let before = detail.project.snapshot();

    let mut tx = pool.begin().await?;

    let updated = Project::apply_update(&mut *tx, id, input.fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if let Some(requested) = input.member_ids {
        ProjectMember::delete_for_project(&mut *tx, id).await?;
        let member_ids = User::find_existing_ids(&mut *tx, &requested).await?;
        for user_id in member_ids {
            ProjectMember::insert(&mut *tx, id, user_id).await?;
        }
    }

    ProjectHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Update,
        history::update_diff(before, updated.snapshot()),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %id, "Project updated");

    load_detail(pool, id).await
}

/// Changes only the project status, recording a single-field diff
pub async fn update_status(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    status: ProjectStatus,
) -> ApiResult<ProjectDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_write_project(actor, &ProjectAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to update this project".to_string(),
        ));
    }

    let previous = detail.project.status;

    let mut tx = pool.begin().await?;

    Project::set_status(&mut *tx, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    ProjectHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Update,
        history::field_diff("status", previous, status),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %id, status = status.as_str(), "Project status changed");

    load_detail(pool, id).await
}

/// Deletes a project (admin only); members, tasks, and history cascade
pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<()> {
    if !policy::can_delete_project(actor) {
        return Err(ApiError::Forbidden(
            "Only admins can delete projects".to_string(),
        ));
    }

    let project = Project::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let mut tx = pool.begin().await?;

    // Cascades away with the project; ordering matches the other flows
    ProjectHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Delete,
        project.deletion_snapshot(),
    )
    .await?;

    ProjectMember::delete_for_project(&mut *tx, id).await?;
    Project::delete(&mut *tx, id).await?;

    tx.commit().await?;

    info!(project_id = %id, "Project deleted");
    Ok(())
}

/// Lists a project's history newest-first, enforcing read access
pub async fn find_history(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<Vec<HistoryEntry>> {
    find_by_id(pool, actor, id).await?;
    Ok(ProjectHistory::list_for_project(pool, id).await?)
}

async fn load_detail(pool: &PgPool, id: Uuid) -> ApiResult<ProjectDetail> {
    Project::find_detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, actor: &Actor, query: &ProjectListQuery) {
    if !actor.is_admin() {
        qb.push(" AND (p.owner_id = ");
        qb.push_bind(actor.id);
        qb.push(" OR EXISTS (SELECT 1 FROM project_members pm WHERE pm.project_id = p.id AND pm.user_id = ");
        qb.push_bind(actor.id);
        qb.push("))");
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (p.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(status) = query.status {
        qb.push(" AND p.status = ");
        qb.push_bind(status);
    }

    if let Some(owner_id) = query.owner_id {
        qb.push(" AND p.owner_id = ");
        qb.push_bind(owner_id);
    }

    if let Some(start) = query.deadline_start {
        qb.push(" AND p.deadline >= ");
        qb.push_bind(start);
    }

    if let Some(end) = query.deadline_end {
        qb.push(" AND p.deadline <= ");
        qb.push_bind(end);
    }
}

// Sort inputs are interpolated into SQL, so both go through a whitelist.

fn sort_column(requested: Option<&str>) -> &'static str {
    match requested {
        Some("name") => "name",
        Some("deadline") => "deadline",
        Some("status") => "status",
        Some("updated_at") => "updated_at",
        _ => "created_at",
    }
}

fn sort_direction(requested: Option<&str>) -> &'static str {
    match requested {
        Some("asc") => " ASC",
        _ => " DESC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column(Some("name")), "name");
        assert_eq!(sort_column(Some("created_at; DROP TABLE users")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }

    #[test]
    fn test_sort_direction_defaults_desc() {
        assert_eq!(sort_direction(Some("asc")), " ASC");
        assert_eq!(sort_direction(Some("desc")), " DESC");
        assert_eq!(sort_direction(None), " DESC");
    }
}
