/// Domain services
///
/// Each service method takes the pool plus an explicit `Actor` where
/// authorization applies. Multi-step writes run inside a single
/// transaction so the entity change, membership changes, and the history
/// row commit or roll back together.

pub mod auth;
pub mod project;
pub mod task;
pub mod user;
