use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post};
use log::{error, info};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

use crate::domain::user::driving_ports::CreateUserError;
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::security::Authenticated;
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(register_user, get_own_profile, delete_own_account))]
pub struct UsersApi;

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::NewUser>| async move {
                    let user_service = domain::user::UserService {};

                    register_user(new_user, &app_data.ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/me",
            get(
                |Authenticated(user_id): Authenticated, State(app_data): AppState| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    get_own_profile(user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/me",
            delete(
                |Authenticated(user_id): Authenticated, State(app_data): AppState| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    delete_own_account(user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

/// Registers a new user account. The whole registration happens in a single
/// transaction so a half-created account never becomes visible.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = dto::NewUser,
    responses(
        (status = 201, description = "User created", body = dto::InsertedUser),
        (status = 400, response = dto::err_resps::BasicError400),
        (
            status = 409,
            description = "Username or email already taken",
            body = BasicErrorResponse,
            example = json!({
                "error_code": "user_exists",
                "error_description": "A user with that username or email already exists.",
                "extra_info": null
            })
        ),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn register_user(
    new_user: dto::NewUser,
    ext_cxn: &impl Transactable,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::InsertedUser>), ErrorResponse> {
    info!("Attempt to create user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;
    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let domain_user = domain::user::CreateUser::from(new_user);

    let mut txn = ext_cxn.start_transaction().await.map_err(|txn_err| {
        GenericErrorResponse(txn_err.context("Starting user registration transaction"))
    })?;
    let creation_result = user_service
        .create_user(&domain_user, &mut txn, &user_writer, &user_detector)
        .await;
    let new_user_id = match creation_result {
        Ok(id) => id,
        Err(CreateUserError::UserAlreadyExists) => {
            info!("Rejected duplicate registration for {}", domain_user.username);
            return Err((
                StatusCode::CONFLICT,
                Json(BasicErrorResponse {
                    error_code: "user_exists".into(),
                    error_description: "A user with that username or email already exists."
                        .into(),
                    extra_info: None,
                }),
            )
                .into());
        }
        Err(CreateUserError::PortError(port_err)) => {
            error!("User create failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };
    txn.commit().await.map_err(|commit_err| {
        GenericErrorResponse(commit_err.context("Committing user registration"))
    })?;

    Ok((
        StatusCode::CREATED,
        Json(dto::InsertedUser { id: new_user_id }),
    ))
}

/// Retrieves the profile of the authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = dto::TodoUser),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_own_profile(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<dto::TodoUser>, ErrorResponse> {
    info!("Fetching profile for user {user_id}");
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;

    let fetched_user = user_service
        .user_by_id(user_id, &mut *ext_cxn, &user_reader)
        .await
        .map_err(GenericErrorResponse)?;
    match fetched_user {
        Some(user) => Ok(Json(dto::TodoUser::from(user))),
        // The account behind a still-valid token may have been deleted
        None => Err((
            StatusCode::NOT_FOUND,
            Json(BasicErrorResponse {
                error_code: "not_found".into(),
                error_description: "The requested entity could not be found.".into(),
                extra_info: None,
            }),
        )
            .into()),
    }
}

/// Deletes the authenticated user's account along with all of their tasks
#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "users",
    security(("bearer_token" = [])),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_own_account(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting account of user {user_id}");
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;

    user_service
        .delete_user(user_id, &mut *ext_cxn, &user_writer)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(StatusCode::NO_CONTENT)
}
