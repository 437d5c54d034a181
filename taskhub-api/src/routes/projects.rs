/// Project endpoints
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
        project::{ProjectDetail, ProjectStatus, UpdateProject},
    },
    pagination::{Page, PageParams},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{success, SuccessResponse},
    services::{
        self,
        project::{CreateProjectInput, ProjectListQuery, UpdateProjectInput},
    },
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub deadline: NaiveDate,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub deadline: Option<NaiveDate>,

    pub status: Option<ProjectStatus>,

    pub images: Option<Vec<String>>,

    pub member_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ProjectStatus,
}

/// Listing query string; page/limit are inlined because `Query` works
/// on the flat key=value format
#[derive(Debug, Deserialize, Default)]
pub struct ProjectListParams {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub owner_id: Option<Uuid>,
    pub deadline_start: Option<NaiveDate>,
    pub deadline_end: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<ProjectListParams> for ProjectListQuery {
    fn from(params: ProjectListParams) -> Self {
        Self {
            search: params.search,
            status: params.status,
            owner_id: params.owner_id,
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

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<ProjectDetail>>)> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let detail = services::project::create(
        &state.db,
        &actor,
        CreateProjectInput {
            name: payload.name,
            description: payload.description,
            deadline: payload.deadline,
            images: payload.images,
            member_ids: payload.member_ids,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, success(detail)))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ProjectListParams>,
) -> ApiResult<Json<SuccessResponse<Page<ProjectDetail>>>> {
    let page = services::project::find_all(&state.db, &actor, &params.into()).await?;
    Ok(success(page))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<ProjectDetail>>> {
    let detail = services::project::find_by_id(&state.db, &actor, id).await?;
    Ok(success(detail))
}

/// PATCH /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<SuccessResponse<ProjectDetail>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let detail = services::project::update(
        &state.db,
        &actor,
        id,
        UpdateProjectInput {
            fields: UpdateProject {
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

/// PATCH /api/projects/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<SuccessResponse<ProjectDetail>>> {
    let detail = services::project::update_status(&state.db, &actor, id, payload.status).await?;
    Ok(success(detail))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    services::project::delete(&state.db, &actor, id).await?;
    Ok(success(json!({ "message": "Project deleted" })))
}

/// GET /api/projects/:id/history
pub async fn get_history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<Vec<HistoryEntry>>>> {
    let entries = services::project::find_history(&state.db, &actor, id).await?;
    Ok(success(entries))
}
