/// Database models
///
/// Each model owns its table's CRUD operations. Write operations take an
/// `impl PgExecutor` so they can run either directly on the pool or inside
/// a caller-owned transaction; multi-step mutations (entity + membership +
/// history) must share one transaction.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Projects owned by a user
/// - `task`: Tasks belonging to a project
/// - `membership`: Project/task membership join rows
/// - `history`: Append-only change history for projects and tasks

pub mod history;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
