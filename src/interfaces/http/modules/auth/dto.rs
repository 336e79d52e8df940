//! Unlock DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UnlockRequest {
    #[validate(length(max = 1024, message = "phrase is too long"))]
    pub phrase: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnlockResponse {
    pub success: bool,
    pub message: String,
}
