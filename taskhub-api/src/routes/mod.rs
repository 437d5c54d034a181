/// HTTP route handlers
///
/// Handlers own request DTOs (with `validator` derives) and translate
/// between the wire format and the service layer. Every success response
/// uses the same envelope:
///
/// ```json
/// { "status": "success", "data": { ... } }
/// ```
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

/// Uniform success envelope
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    /// Always "success"
    pub status: &'static str,

    pub data: T,
}

/// Wraps a payload in the success envelope
pub fn success<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        status: "success",
        data,
    })
}

/// Distinguishes an absent field from an explicit `null`
///
/// With `#[serde(default, deserialize_with = "double_option")]` a missing
/// field stays `None` while `"field": null` becomes `Some(None)`, which
/// the models translate into clearing the column.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
