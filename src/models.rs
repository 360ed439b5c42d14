use serde::{Deserialize, Serialize};

/// Access-token claims as issued by the external auth service: the user id
/// in `sub`, the role name ("ADMIN" / "HR") in `role`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
