/// Authentication and authorization utilities
///
/// - `password`: Argon2id password hashing
/// - `jwt`: Access and refresh token handling
/// - `policy`: Pure access-control predicates for projects and tasks
/// - `reset`: Password-reset token generation and digesting

pub mod jwt;
pub mod password;
pub mod policy;
pub mod reset;
