pub mod auth;
pub mod task;
pub mod user;

pub use auth::{LoginRequest, TokenResponse};
pub use task::{InsertedTask, NewTask, TaskListQuery, TaskState, TodoTask, UpdateTask};
pub use user::{InsertedUser, NewUser, TodoUser};

use utoipa::OpenApi;

/// Groups the OpenAPI schema definitions for this package's DTOs so they can be merged
/// into the top-level API documentation
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        user::NewUser,
        user::InsertedUser,
        user::TodoUser,
        task::NewTask,
        task::UpdateTask,
        task::TodoTask,
        task::InsertedTask,
        task::TaskState,
        auth::LoginRequest,
        auth::TokenResponse,
        crate::routing_utils::ExtraInfo,
        crate::routing_utils::ValidationErrorSchema,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError404,
        err_resps::BasicError500,
    )
))]
pub struct OpenApiSchemas;

/// OpenAPI response definitions for the error statuses shared by most endpoints
pub mod err_resps {
    use utoipa::ToResponse;

    #[derive(ToResponse)]
    #[response(
        description = "Invalid request body or parameters were passed (400)",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": null
        })
    )]
    pub struct BasicError400;

    #[derive(ToResponse)]
    #[response(
        description = "The caller is not authenticated or their token is no longer valid (401)",
        example = json!({
            "error_code": "invalid_token",
            "error_description": "The provided access token could not be verified.",
            "extra_info": null
        })
    )]
    pub struct BasicError401;

    #[derive(ToResponse)]
    #[response(
        description = "Entity could not be found (404)",
        example = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )]
    pub struct BasicError404;

    #[derive(ToResponse)]
    #[response(
        description = "Something unexpected went wrong inside the server (500)",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500;
}
