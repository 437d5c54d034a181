/// Task service
///
/// Tasks live under a project and inherit their authorization from it:
/// only the project owner (or an admin) may create, edit, or delete
/// tasks, while task members may additionally report status.
///
/// Two invariants are enforced here rather than in the database:
///
/// - A task's deadline may never exceed its project's deadline, checked
///   on create and on every deadline change.
/// - Task members must already belong to the project (owner or project
///   member). Unlike project membership, an invalid id fails the whole
///   operation instead of being dropped.
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use taskhub_shared::{
    auth::policy::{self, Actor, ProjectAccess, TaskAccess},
    models::{
        history::{self, ActionType, HistoryEntry, TaskHistory},
        membership::TaskMember,
        project::Project,
        task::{CreateTask, Task, TaskDetail, TaskStatus, UpdateTask},
    },
    pagination::{Page, PageParams},
};

use crate::error::{ApiError, ApiResult};

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub images: Vec<String>,
    pub project_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

/// Input for updating a task
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub fields: UpdateTask,
    pub member_ids: Option<Vec<Uuid>>,
}

/// Listing filters for tasks
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<Uuid>,
    pub assigned_by_id: Option<Uuid>,
    pub deadline_start: Option<NaiveDate>,
    pub deadline_end: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: PageParams,
}

/// Creates a task under a project
///
/// Resolves the parent project first; only the project owner or an
/// admin may add tasks to it.
pub async fn create(pool: &PgPool, actor: &Actor, input: CreateTaskInput) -> ApiResult<TaskDetail> {
    let project = Project::find_detail(pool, input.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !policy::can_write_project(actor, &ProjectAccess::from(&project)) {
        return Err(ApiError::Forbidden(
            "Only the project owner can create tasks".to_string(),
        ));
    }

    if input.deadline > project.project.deadline {
        return Err(ApiError::Validation(
            "Task deadline cannot be after the project deadline".to_string(),
        ));
    }

    validate_member_ids(&input.member_ids, &project.project.owner_id, &project.member_user_ids())?;

    let mut tx = pool.begin().await?;

    let task = Task::insert(
        &mut *tx,
        CreateTask {
            name: input.name,
            description: input.description,
            deadline: input.deadline,
            images: input.images,
            project_id: input.project_id,
            assigned_by_id: actor.id,
        },
    )
    .await?;

    for user_id in &input.member_ids {
        TaskMember::insert(&mut *tx, task.id, *user_id).await?;
    }

    TaskHistory::record(&mut *tx, task.id, actor.id, ActionType::Create, task.snapshot()).await?;

    tx.commit().await?;

    info!(task_id = %task.id, project_id = %input.project_id, "Task created");

    load_detail(pool, task.id).await
}

/// Lists tasks visible to the actor
///
/// Visibility extends to the project owner, task members, and every
/// member of the parent project.
pub async fn find_all(
    pool: &PgPool,
    actor: &Actor,
    query: &TaskListQuery,
) -> ApiResult<Page<TaskDetail>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks t WHERE 1=1");
    push_filters(&mut count_qb, actor, query);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new("SELECT t.id FROM tasks t WHERE 1=1");
    push_filters(&mut qb, actor, query);

    qb.push(" ORDER BY t.");
    qb.push(sort_column(query.sort_by.as_deref()));
    qb.push(sort_direction(query.order.as_deref()));
    qb.push(" LIMIT ");
    qb.push_bind(query.page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(query.page.offset());

    let ids: Vec<(Uuid,)> = qb.build_query_as().fetch_all(pool).await?;

    let mut details = Vec::with_capacity(ids.len());
    for (id,) in ids {
        if let Some(detail) = Task::find_detail(pool, id).await? {
            details.push(detail);
        }
    }

    Ok(Page::new(details, total, query.page.page(), query.page.limit()))
}

/// Fetches one task with relations, enforcing read access
pub async fn find_by_id(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<TaskDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_read_task(actor, &TaskAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    Ok(detail)
}

/// Applies a partial update and optionally replaces the member set
pub async fn update(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    input: UpdateTaskInput,
) -> ApiResult<TaskDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_write_task(actor, &TaskAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to update this task".to_string(),
        ));
    }

    if let Some(deadline) = input.fields.deadline {
        if deadline > detail.project.deadline {
            return Err(ApiError::Validation(
                "Task deadline cannot be after the project deadline".to_string(),
            ));
        }
    }

    if let Some(requested) = &input.member_ids {
        validate_member_ids(requested, &detail.project.owner_id, &detail.project_member_ids)?;
    }

    let before = detail.task.snapshot();

    let mut tx = pool.begin().await?;

    let updated = Task::apply_update(&mut *tx, id, input.fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if let Some(requested) = input.member_ids {
        TaskMember::delete_for_task(&mut *tx, id).await?;
        for user_id in requested {
            TaskMember::insert(&mut *tx, id, user_id).await?;
        }
    }

    TaskHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Update,
        history::update_diff(before, updated.snapshot()),
    )
    .await?;

    tx.commit().await?;

    info!(task_id = %id, "Task updated");

    load_detail(pool, id).await
}

/// Changes only the task status
///
/// Delegated wider than a full update: task members may report status
/// on their own tasks.
pub async fn update_status(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    status: TaskStatus,
) -> ApiResult<TaskDetail> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_update_task_status(actor, &TaskAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to update this task's status".to_string(),
        ));
    }

    let previous = detail.task.status;

    let mut tx = pool.begin().await?;

    Task::set_status(&mut *tx, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    TaskHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Update,
        history::field_diff("status", previous, status),
    )
    .await?;

    tx.commit().await?;

    info!(task_id = %id, status = status.as_str(), "Task status changed");

    load_detail(pool, id).await
}

/// Deletes a task; only the project owner or an admin may do so
pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<()> {
    let detail = load_detail(pool, id).await?;

    if !policy::can_delete_task(actor, &TaskAccess::from(&detail)) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this task".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // Cascades away with the task; ordering matches the other flows
    TaskHistory::record(
        &mut *tx,
        id,
        actor.id,
        ActionType::Delete,
        detail.task.deletion_snapshot(),
    )
    .await?;

    TaskMember::delete_for_task(&mut *tx, id).await?;
    Task::delete(&mut *tx, id).await?;

    tx.commit().await?;

    info!(task_id = %id, "Task deleted");
    Ok(())
}

/// Lists a task's history newest-first, enforcing read access
pub async fn find_history(pool: &PgPool, actor: &Actor, id: Uuid) -> ApiResult<Vec<HistoryEntry>> {
    find_by_id(pool, actor, id).await?;
    Ok(TaskHistory::list_for_task(pool, id).await?)
}

async fn load_detail(pool: &PgPool, id: Uuid) -> ApiResult<TaskDetail> {
    Task::find_detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Every requested member must be the project owner or a project member
fn validate_member_ids(
    requested: &[Uuid],
    project_owner_id: &Uuid,
    project_member_ids: &[Uuid],
) -> ApiResult<()> {
    for user_id in requested {
        if user_id != project_owner_id && !project_member_ids.contains(user_id) {
            return Err(ApiError::Validation(
                "All task members must belong to the project".to_string(),
            ));
        }
    }

    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, actor: &Actor, query: &TaskListQuery) {
    if !actor.is_admin() {
        qb.push(" AND (EXISTS (SELECT 1 FROM projects pr WHERE pr.id = t.project_id AND pr.owner_id = ");
        qb.push_bind(actor.id);
        qb.push(") OR EXISTS (SELECT 1 FROM task_members tm WHERE tm.task_id = t.id AND tm.user_id = ");
        qb.push_bind(actor.id);
        qb.push(") OR EXISTS (SELECT 1 FROM project_members pm WHERE pm.project_id = t.project_id AND pm.user_id = ");
        qb.push_bind(actor.id);
        qb.push("))");
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (t.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR t.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(status) = query.status {
        qb.push(" AND t.status = ");
        qb.push_bind(status);
    }

    if let Some(project_id) = query.project_id {
        qb.push(" AND t.project_id = ");
        qb.push_bind(project_id);
    }

    if let Some(assigned_by_id) = query.assigned_by_id {
        qb.push(" AND t.assigned_by_id = ");
        qb.push_bind(assigned_by_id);
    }

    if let Some(start) = query.deadline_start {
        qb.push(" AND t.deadline >= ");
        qb.push_bind(start);
    }

    if let Some(end) = query.deadline_end {
        qb.push(" AND t.deadline <= ");
        qb.push_bind(end);
    }
}

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
