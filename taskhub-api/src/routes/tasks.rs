/// Task endpoints
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskhub_shared::{
    auth::policy::Actor,
    models::{
        history::HistoryEntry,
        task::{TaskDetail, TaskStatus, UpdateTask},
    },
    pagination::{Page, PageParams},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{success, SuccessResponse},
    services::{
        self,
        task::{CreateTaskInput, TaskListQuery, UpdateTaskInput},
    },
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub deadline: NaiveDate,

    pub project_id: Uuid,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub deadline: Option<NaiveDate>,

    pub status: Option<TaskStatus>,

    pub images: Option<Vec<String>>,

    pub member_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct TaskListParams {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<Uuid>,
    pub assigned_by_id: Option<Uuid>,
    pub deadline_start: Option<NaiveDate>,
    pub deadline_end: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<TaskListParams> for TaskListQuery {
    fn from(params: TaskListParams) -> Self {
        Self {
            search: params.search,
            status: params.status,
            project_id: params.project_id,
            assigned_by_id: params.assigned_by_id,
            deadline_start: params.deadline_start,
            deadline_end: params.deadline_end,
            sort_by: params.sort_by,
            order: params.order,
            page: PageParams {
                page: params.page,
                limit: params.limit,
            },
        }
    }
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<TaskDetail>>)> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let detail = services::task::create(
        &state.db,
        &actor,
        CreateTaskInput {
            name: payload.name,
            description: payload.description,
            deadline: payload.deadline,
            images: payload.images,
            project_id: payload.project_id,
            member_ids: payload.member_ids,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, success(detail)))
}

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<SuccessResponse<Page<TaskDetail>>>> {
    let page = services::task::find_all(&state.db, &actor, &params.into()).await?;
    Ok(success(page))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<TaskDetail>>> {
    let detail = services::task::find_by_id(&state.db, &actor, id).await?;
    Ok(success(detail))
}

/// PATCH /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<SuccessResponse<TaskDetail>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let detail = services::task::update(
        &state.db,
        &actor,
        id,
        UpdateTaskInput {
            fields: UpdateTask {
                name: payload.name,
                description: payload.description,
                deadline: payload.deadline,
                status: payload.status,
                images: payload.images,
            },
            member_ids: payload.member_ids,
        },
    )
    .await?;

    Ok(success(detail))
}

/// PATCH /api/tasks/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<SuccessResponse<TaskDetail>>> {
    let detail = services::task::update_status(&state.db, &actor, id, payload.status).await?;
    Ok(success(detail))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    services::task::delete(&state.db, &actor, id).await?;
    Ok(success(json!({ "message": "Task deleted" })))
}

/// GET /api/tasks/:id/history
pub async fn get_history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<Vec<HistoryEntry>>>> {
    let entries = services::task::find_history(&state.db, &actor, id).await?;
    Ok(success(entries))
}
