use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use log::{error, info};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::security::Authenticated;
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(create_task, list_tasks, get_task, update_task, delete_task))]
pub struct TasksApi;

/// Builds a router for all the task routes. Every route requires a bearer token, and
/// callers only ever see their own tasks.
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |Authenticated(user_id): Authenticated,
                 State(app_data): AppState,
                 Json(new_task): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    create_task(user_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/",
            get(
                |Authenticated(user_id): Authenticated,
                 State(app_data): AppState,
                 Query(list_query): Query<dto::TaskListQuery>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    list_tasks(user_id, list_query, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |Authenticated(user_id): Authenticated,
                 State(app_data): AppState,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    get_task(user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            patch(
                |Authenticated(user_id): Authenticated,
                 State(app_data): AppState,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::UpdateTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    update_task(user_id, task_id, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            delete(
                |Authenticated(user_id): Authenticated,
                 State(app_data): AppState,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    delete_task(user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

/// Maps task domain failures onto API responses. Tasks owned by somebody else report
/// as missing so callers can't probe which task IDs exist.
fn handle_task_error(err: TaskError) -> ErrorResponse {
    match err {
        TaskError::UserDoesNotExist | TaskError::TaskNotFound => (
            StatusCode::NOT_FOUND,
            Json(BasicErrorResponse {
                error_code: "not_found".into(),
                error_description: "The requested entity could not be found.".into(),
                extra_info: None,
            }),
        )
            .into(),

        TaskError::PortError(port_err) => {
            error!("Task operation failure: {port_err}");
            GenericErrorResponse(port_err).into()
        }
    }
}

/// Creates a task owned by the authenticated user
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::InsertedTask),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_task(
    user_id: i32,
    new_task: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::InsertedTask>), ErrorResponse> {
    info!("Creating task for user {user_id}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;
    let domain_task = domain::todo::NewTask::from(new_task);

    let new_task_id = task_service
        .create_task_for_user(
            user_id,
            &domain_task,
            &mut *ext_cxn,
            &user_detector,
            &task_writer,
        )
        .await
        .map_err(handle_task_error)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::InsertedTask { id: new_task_id }),
    ))
}

/// Lists the authenticated user's tasks. Title and description narrow the listing by
/// substring, state matches exactly, and results are paginated.
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    params(dto::TaskListQuery),
    responses(
        (status = 200, description = "The caller's tasks", body = Vec<dto::TodoTask>),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn list_tasks(
    user_id: i32,
    list_query: dto::TaskListQuery,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<Vec<dto::TodoTask>>, ErrorResponse> {
    info!("Listing tasks for user {user_id}");
    list_query
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let task_reader = persistence::db_task_driven_ports::DbTaskReader;
    let (filter, page) = list_query.into_filter_and_page();

    let tasks = task_service
        .tasks_for_user(
            user_id,
            &filter,
            &page,
            &mut *ext_cxn,
            &user_detector,
            &task_reader,
        )
        .await
        .map_err(handle_task_error)?;

    Ok(Json(tasks.into_iter().map(dto::TodoTask::from).collect()))
}

/// Retrieves one of the authenticated user's tasks by ID
#[utoipa::path(
    get,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(("task_id" = i32, Path, description = "ID of the task to fetch")),
    responses(
        (status = 200, description = "The requested task", body = dto::TodoTask),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::TodoTask>, ErrorResponse> {
    info!("Fetching task {task_id} for user {user_id}");
    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let task_reader = persistence::db_task_driven_ports::DbTaskReader;

    let fetched_task = task_service
        .user_task_by_id(user_id, task_id, &mut *ext_cxn, &user_detector, &task_reader)
        .await
        .map_err(handle_task_error)?;
    match fetched_task {
        Some(task) => Ok(Json(dto::TodoTask::from(task))),
        None => Err(handle_task_error(TaskError::TaskNotFound)),
    }
}

/// Partially updates one of the authenticated user's tasks. Fields left out of the
/// request body keep their current value.
#[utoipa::path(
    patch,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(("task_id" = i32, Path, description = "ID of the task to update")),
    request_body = dto::UpdateTask,
    responses(
        (status = 200, description = "Task updated"),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_task(
    user_id: i32,
    task_id: i32,
    task_data: dto::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Updating task {task_id} for user {user_id}");
    task_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;
    let domain_update = domain::todo::UpdateTask::from(task_data);

    task_service
        .update_task_for_user(user_id, task_id, &domain_update, &mut *ext_cxn, &task_writer)
        .await
        .map_err(handle_task_error)?;

    Ok(StatusCode::OK)
}

/// Deletes one of the authenticated user's tasks
#[utoipa::path(
    delete,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(("task_id" = i32, Path, description = "ID of the task to delete")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id} for user {user_id}");
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

    task_service
        .delete_task_for_user(user_id, task_id, &mut *ext_cxn, &task_writer)
        .await
        .map_err(handle_task_error)?;

    Ok(StatusCode::NO_CONTENT)
}
