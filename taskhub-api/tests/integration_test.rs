/// Integration tests for the Taskhub API
///
/// These exercise the full stack end-to-end: router, auth middleware,
/// services, and a real PostgreSQL database. Each test creates its own
/// users and cleans up after itself; a missing DATABASE_URL skips the
/// whole suite.
mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};
use taskhub_shared::models::user::UserRole;
use uuid::Uuid;

async fn create_project(
    ctx: &TestContext,
    token: &str,
    deadline: &str,
    member_ids: Vec<Uuid>,
) -> Value {
    let (status, body) = ctx
        .request(
            "POST",
            "/api/projects",
            Some(token),
            Some(json!({
                "name": "Test Project",
                "description": "A project for testing",
                "deadline": deadline,
                "member_ids": member_ids,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
    body["data"].clone()
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let ctx = require_db!();

    let email = format!("flow-{}@example.com", Uuid::new_v4());

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": "a-strong-password",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert!(body["data"]["access_token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // Duplicate registration conflicts
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": "a-strong-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "a-strong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    // Wrong password gets the same message as an unknown email
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    // The issued token works against a protected route
    let user_id = {
        let (status, body) = ctx
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "a-strong-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["user"]["id"].as_str().unwrap().to_string()
    };

    let (status, _) = ctx
        .request("GET", &format!("/api/users/{}", user_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Cleanup: registered directly, so delete by id
    let _ = taskhub_shared::models::user::User::delete(
        &ctx.db,
        user_id.parse().unwrap(),
    )
    .await;
}

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let ctx = require_db!();

    let (status, body) = ctx.request("GET", "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, _) = ctx
        .request("GET", "/api/projects", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let ctx = require_db!();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_project_round_trip_with_members() {
    let mut ctx = require_db!();

    let (owner, owner_token) = ctx.create_user(UserRole::User).await;
    let (member, _) = ctx.create_user(UserRole::User).await;

    // One real member, one id that matches no user
    let project = create_project(
        &ctx,
        &owner_token,
        "2030-12-31",
        vec![member.id, Uuid::new_v4()],
    )
    .await;

    let project_id = project["id"].as_str().unwrap();
    assert_eq!(project["status"], "planning");
    assert_eq!(project["owner_id"].as_str().unwrap(), owner.id.to_string());

    // The unknown id was silently dropped
    let members = project["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(
        members[0]["user_id"].as_str().unwrap(),
        member.id.to_string()
    );

    // Owner sees it in the listing
    let (status, body) = ctx
        .request("GET", "/api/projects", Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["pagination"]["total"].as_i64().unwrap() >= 1);

    // Creation produced exactly one CREATE history row
    let (status, body) = ctx
        .request(
            "GET",
            &format!("/api/projects/{}/history", project_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "create");
    assert_eq!(entries[0]["changes"]["name"], "Test Project");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_project_access_control() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;
    let (member, member_token) = ctx.create_user(UserRole::User).await;
    let (_, stranger_token) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![member.id]).await;
    let project_id = project["id"].as_str().unwrap();
    let uri = format!("/api/projects/{}", project_id);

    // Member reads, stranger does not
    let (status, _) = ctx.request("GET", &uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.request("GET", &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Members cannot edit
    let (status, _) = ctx
        .request(
            "PATCH",
            &uri,
            Some(&member_token),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_project_update_records_before_after_history() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![]).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/api/projects/{}", project_id),
            Some(&owner_token),
            Some(json!({ "name": "Renamed Project" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/api/projects/{}/status", project_id),
            Some(&owner_token),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/projects/{}/history", project_id),
            Some(&owner_token),
            None,
        )
        .await;

    // Newest first: status change, field update, create
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0]["action"], "update");
    assert_eq!(entries[0]["changes"]["field"], "status");
    assert_eq!(entries[0]["changes"]["before"], "planning");
    assert_eq!(entries[0]["changes"]["after"], "in_progress");

    assert_eq!(entries[1]["changes"]["before"]["name"], "Test Project");
    assert_eq!(entries[1]["changes"]["after"]["name"], "Renamed Project");

    assert_eq!(entries[2]["action"], "create");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_project_delete_requires_admin_and_cascades() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;
    let (member, _) = ctx.create_user(UserRole::User).await;
    let (_, admin_token) = ctx.create_user(UserRole::Admin).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![member.id]).await;
    let project_id: Uuid = project["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/projects/{}", project_id);

    // Give the project a task so the cascade has something to reach
    let (status, body) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&owner_token),
            Some(json!({
                "name": "Doomed task",
                "description": "Dies with the project",
                "deadline": "2030-12-01",
                "project_id": project_id,
                "member_ids": [member.id],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "task create failed: {}", body);
    let task_uri = format!("/api/tasks/{}", body["data"]["id"].as_str().unwrap());

    // Even the owner cannot delete
    let (status, _) = ctx.request("DELETE", &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.request("DELETE", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.request("GET", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.request("GET", &task_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Tasks, members, and history rows are gone, not just unreachable
    for table in ["tasks", "project_members", "project_history"] {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE project_id = $1",
            table
        ))
        .bind(project_id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
        assert_eq!(count, 0, "{} rows survived the cascade", table);
    }

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_membership_uniqueness_on_readd() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;
    let (member, _) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![member.id]).await;
    let project_id: Uuid = project["id"].as_str().unwrap().parse().unwrap();

    // Re-adding the same member, even twice in one request, keeps one row
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/api/projects/{}", project_id),
            Some(&owner_token),
            Some(json!({ "member_ids": [member.id, member.id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);

    // A direct duplicate insert is a no-op rather than an error
    taskhub_shared::models::membership::ProjectMember::insert(&ctx.db, project_id, member.id)
        .await
        .unwrap();

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM project_members WHERE project_id = $1 AND user_id = $2",
    )
    .bind(project_id)
    .bind(member.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_profile_returns_current_user() {
    let mut ctx = require_db!();

    let (user, token) = ctx.create_user(UserRole::User).await;

    let (status, body) = ctx
        .request("GET", "/api/auth/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["data"]["email"], user.email);
    assert!(body["data"].get("password_hash").is_none());

    let (status, _) = ctx.request("GET", "/api/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_deadline_cannot_exceed_project_deadline() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-06-30", vec![]).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&owner_token),
            Some(json!({
                "name": "Late task",
                "description": "Due after the project ends",
                "deadline": "2030-07-01",
                "project_id": project_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Task deadline cannot be after the project deadline"
    );

    // On the boundary is fine
    let (status, body) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&owner_token),
            Some(json!({
                "name": "On-time task",
                "description": "Due with the project",
                "deadline": "2030-06-30",
                "project_id": project_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "task create failed: {}", body);
    let task_id = body["data"]["id"].as_str().unwrap().to_string();

    // Moving the deadline past the project's fails too
    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/api/tasks/{}", task_id),
            Some(&owner_token),
            Some(json!({ "deadline": "2031-01-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_members_must_belong_to_project() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;
    let (outsider, _) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![]).await;
    let project_id = project["id"].as_str().unwrap();

    // The outsider exists but is not a project member, so the whole
    // create fails instead of dropping the id
    let (status, body) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&owner_token),
            Some(json!({
                "name": "Task",
                "description": "With an outsider",
                "deadline": "2030-12-01",
                "project_id": project_id,
                "member_ids": [outsider.id],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All task members must belong to the project");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_status_update_delegation() {
    let mut ctx = require_db!();

    let (_, owner_token) = ctx.create_user(UserRole::User).await;
    let (member, member_token) = ctx.create_user(UserRole::User).await;
    let (_, stranger_token) = ctx.create_user(UserRole::User).await;

    let project = create_project(&ctx, &owner_token, "2030-12-31", vec![member.id]).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&owner_token),
            Some(json!({
                "name": "Assigned task",
                "description": "For the member",
                "deadline": "2030-12-01",
                "project_id": project_id,
                "member_ids": [member.id],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "task create failed: {}", body);
    let task_id = body["data"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/tasks/{}/status", task_id);

    // Task member may report status
    let (status, _) = ctx
        .request(
            "PATCH",
            &status_uri,
            Some(&member_token),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A stranger may not
    let (status, _) = ctx
        .request(
            "PATCH",
            &status_uri,
            Some(&stranger_token),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // But a member cannot edit other task fields
    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/api/tasks/{}", task_id),
            Some(&member_token),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The status change left a single-field history entry
    let (_, body) = ctx
        .request(
            "GET",
            &format!("/api/tasks/{}/history", task_id),
            Some(&owner_token),
            None,
        )
        .await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries[0]["changes"]["field"], "status");
    assert_eq!(entries[0]["changes"]["after"], "in_progress");
    assert_eq!(
        entries[0]["user"]["id"].as_str().unwrap(),
        member.id.to_string()
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_user_listing_is_admin_gated() {
    let mut ctx = require_db!();

    let (_, user_token) = ctx.create_user(UserRole::User).await;
    let (_, admin_token) = ctx.create_user(UserRole::Admin).await;

    let (status, _) = ctx
        .request("GET", "/api/users", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .request("GET", "/api/users?page=1&limit=5", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["limit"], 5);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_role_change_requires_live_admin_row() {
    let mut ctx = require_db!();

    let (target, _) = ctx.create_user(UserRole::User).await;
    let (demoted_admin, admin_token) = ctx.create_user(UserRole::Admin).await;

    // Demote the admin behind their token's back
    taskhub_shared::models::user::User::update_role(&ctx.db, demoted_admin.id, UserRole::User)
        .await
        .unwrap();

    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/api/users/{}/role", target.id),
            Some(&admin_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_inactive_user_rejected_by_middleware() {
    let mut ctx = require_db!();

    let (user, token) = ctx.create_user(UserRole::User).await;

    taskhub_shared::models::user::User::set_active(&ctx.db, user.id, false)
        .await
        .unwrap();

    let (status, body) = ctx.request("GET", "/api/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User account is inactive");

    ctx.cleanup().await;
}
