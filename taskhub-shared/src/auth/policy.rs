/// Access policy for projects and tasks
///
/// Pure predicate functions deciding whether an actor may read or write a
/// resource, based on role, ownership, and membership. Every check fails
/// closed: no matching rule means access denied, which the services
/// surface as a Forbidden error.
///
/// # Rules
///
/// | Operation            | admin | owner | project member | task member |
/// |----------------------|-------|-------|----------------|-------------|
/// | read project         | yes   | yes   | yes            | —           |
/// | write project        | yes   | yes   | no             | —           |
/// | delete project       | yes   | no    | no             | —           |
/// | read task            | yes   | yes   | yes            | yes         |
/// | write/delete task    | yes   | yes   | no             | no          |
/// | update task status   | yes   | yes   | no             | yes         |
///
/// "owner" always means the parent project's owner.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::project::ProjectDetail;
use crate::models::task::TaskDetail;
use crate::models::user::UserRole;

/// The authenticated caller of a service method
///
/// Threaded explicitly into every service call rather than read from
/// ambient request state, so the services work unchanged across
/// transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Access-relevant view of a project with loaded members
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl From<&ProjectDetail> for ProjectAccess {
    fn from(detail: &ProjectDetail) -> Self {
        Self {
            owner_id: detail.project.owner_id,
            member_ids: detail.member_user_ids(),
        }
    }
}

/// Access-relevant view of a task with its project relations loaded
#[derive(Debug, Clone)]
pub struct TaskAccess {
    pub project_owner_id: Uuid,
    pub task_member_ids: Vec<Uuid>,
    pub project_member_ids: Vec<Uuid>,
}

impl From<&TaskDetail> for TaskAccess {
    fn from(detail: &TaskDetail) -> Self {
        Self {
            project_owner_id: detail.project.owner_id,
            task_member_ids: detail.member_user_ids(),
            project_member_ids: detail.project_member_ids.clone(),
        }
    }
}

/// Admin, owner, or project member may read a project
pub fn can_read_project(actor: &Actor, project: &ProjectAccess) -> bool {
    actor.is_admin()
        || actor.id == project.owner_id
        || project.member_ids.contains(&actor.id)
}

/// Only admin or owner may edit project fields; members cannot
pub fn can_write_project(actor: &Actor, project: &ProjectAccess) -> bool {
    actor.is_admin() || actor.id == project.owner_id
}

/// Only admins may delete projects
pub fn can_delete_project(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Wider than project read: any project member may view its tasks
pub fn can_read_task(actor: &Actor, task: &TaskAccess) -> bool {
    actor.is_admin()
        || actor.id == task.project_owner_id
        || task.task_member_ids.contains(&actor.id)
        || task.project_member_ids.contains(&actor.id)
}

/// Only admin or the project owner may edit task fields
pub fn can_write_task(actor: &Actor, task: &TaskAccess) -> bool {
    actor.is_admin() || actor.id == task.project_owner_id
}

/// Only admin or the project owner may delete a task
pub fn can_delete_task(actor: &Actor, task: &TaskAccess) -> bool {
    actor.is_admin() || actor.id == task.project_owner_id
}

/// Status updates are delegated to assignees: admin, project owner, or
/// task member
pub fn can_update_task_status(actor: &Actor, task: &TaskAccess) -> bool {
    actor.is_admin()
        || actor.id == task.project_owner_id
        || task.task_member_ids.contains(&actor.id)
}
