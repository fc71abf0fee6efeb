use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::post;
use log::{error, info};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

use crate::domain::user::driving_ports::AuthError;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::security::TokenAuthority;
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(log_in))]
pub struct AuthApi;

/// Builds a router for the login route
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/",
        post(
            |State(app_data): AppState, Json(credentials): Json<dto::LoginRequest>| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();
                let user_service = domain::user::UserService {};
                let user_reader = persistence::db_user_driven_ports::DbReadUsers;

                log_in(
                    credentials,
                    &mut ext_cxn,
                    &user_service,
                    &user_reader,
                    &app_data.tokens,
                )
                .await
            },
        ),
    )
}

/// Exchanges a username and password for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = dto::LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = dto::TokenResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (
            status = 401,
            description = "Incorrect username or password",
            body = BasicErrorResponse,
            example = json!({
                "error_code": "bad_credentials",
                "error_description": "The username or password was incorrect.",
                "extra_info": null
            })
        ),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn log_in(
    credentials: dto::LoginRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
    user_reader: &impl domain::user::driven_ports::UserReader,
    tokens: &TokenAuthority,
) -> Result<Json<dto::TokenResponse>, ErrorResponse> {
    info!("Login attempt for {credentials}");
    credentials
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_credentials = domain::user::UserCredentials::from(credentials);
    let auth_result = user_service
        .authenticate(&domain_credentials, &mut *ext_cxn, user_reader)
        .await;
    let user_id = match auth_result {
        Ok(id) => id,
        Err(AuthError::BadCredentials) => {
            info!("Rejected login for {}", domain_credentials.username);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(BasicErrorResponse {
                    error_code: "bad_credentials".into(),
                    error_description: "The username or password was incorrect.".into(),
                    extra_info: None,
                }),
            )
                .into());
        }
        Err(AuthError::PortError(port_err)) => {
            error!("Login failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let token = tokens
        .issue_token(user_id)
        .map_err(GenericErrorResponse)?;
    Ok(Json(dto::TokenResponse::bearer(token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::error_code_of;
    use crate::domain::user::test_util::{InMemoryUserPersistence, MockUserService};
    use crate::external_connections;
    use anyhow::anyhow;
    use axum::response::IntoResponse;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    fn test_tokens() -> TokenAuthority {
        TokenAuthority::new(b"login-route-test-secret")
    }

    #[tokio::test]
    async fn issues_token_for_good_credentials() {
        let mut user_service_raw = MockUserService::new();
        user_service_raw.authenticate_result.set_returned_result(Ok(17));
        let user_service = std::sync::Mutex::new(user_service_raw);
        let user_reader = RwLock::new(InMemoryUserPersistence::new());
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let tokens = test_tokens();

        let login_result = log_in(
            dto::LoginRequest {
                username: "doug_heffernan".to_owned(),
                password: "password123".to_owned(),
            },
            &mut ext_cxn,
            &user_service,
            &user_reader,
            &tokens,
        )
        .await;

        let Ok(Json(token_response)) = login_result else {
            panic!("Login should have succeeded");
        };
        assert_that!(token_response.token_type).is_equal_to("bearer".to_owned());
        assert_that!(tokens.decode_token(&token_response.access_token)).is_ok_containing(17);
    }

    #[tokio::test]
    async fn returns_401_on_bad_credentials() {
        let mut user_service_raw = MockUserService::new();
        user_service_raw
            .authenticate_result
            .set_returned_result(Err(AuthError::BadCredentials));
        let user_service = std::sync::Mutex::new(user_service_raw);
        let user_reader = RwLock::new(InMemoryUserPersistence::new());
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let tokens = test_tokens();

        let login_result = log_in(
            dto::LoginRequest {
                username: "doug_heffernan".to_owned(),
                password: "hunter2wrong".to_owned(),
            },
            &mut ext_cxn,
            &user_service,
            &user_reader,
            &tokens,
        )
        .await;
        let real_response = login_result.into_response();

        assert_eq!(StatusCode::UNAUTHORIZED, real_response.status());
        let error_code = error_code_of(real_response.into_body()).await;
        assert_that!(error_code).is_equal_to("bad_credentials".to_owned());
    }

    #[tokio::test]
    async fn returns_400_on_empty_username() {
        let user_service = MockUserService::new_locked();
        let user_reader = RwLock::new(InMemoryUserPersistence::new());
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let tokens = test_tokens();

        let login_result = log_in(
            dto::LoginRequest {
                username: String::new(),
                password: "password123".to_owned(),
            },
            &mut ext_cxn,
            &user_service,
            &user_reader,
            &tokens,
        )
        .await;
        let real_response = login_result.into_response();

        assert_eq!(StatusCode::BAD_REQUEST, real_response.status());
        let error_code = error_code_of(real_response.into_body()).await;
        assert_that!(error_code).is_equal_to("invalid_input".to_owned());
    }

    #[tokio::test]
    async fn returns_500_on_port_failure() {
        let mut user_service_raw = MockUserService::new();
        user_service_raw
            .authenticate_result
            .set_returned_result(Err(AuthError::PortError(anyhow!("database caught fire"))));
        let user_service = std::sync::Mutex::new(user_service_raw);
        let user_reader = RwLock::new(InMemoryUserPersistence::new());
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let tokens = test_tokens();

        let login_result = log_in(
            dto::LoginRequest {
                username: "doug_heffernan".to_owned(),
                password: "password123".to_owned(),
            },
            &mut ext_cxn,
            &user_service,
            &user_reader,
            &tokens,
        )
        .await;
        let real_response = login_result.into_response();

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, real_response.status());
    }
}
