use super::Count;
use crate::domain;
use crate::domain::user::TodoUser;
use crate::domain::user::driven_ports::{StoredCredentials, UserRecord};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::prelude::FromRow;

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user_with_id_count: Count =
            sqlx::query_as("SELECT count(*) FROM todo_user tu WHERE tu.id = $1")
                .bind(user_id)
                .fetch_one(connection.borrow_connection())
                .await
                .context("Detecting user with ID")?;

        Ok(user_with_id_count.count() > 0)
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let claimed_count: Count = sqlx::query_as(
            "SELECT count(*) FROM todo_user tu WHERE tu.username = $1 OR tu.email = $2",
        )
        .bind(username)
        .bind(email)
        .fetch_one(connection.borrow_connection())
        .await
        .context("Detecting user via username or email")?;

        Ok(claimed_count.count() > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i32,
    username: String,
    email: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            username: value.username,
            email: value.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    id: i32,
    password_hash: String,
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user: Option<TodoUserRow> =
            sqlx::query_as("SELECT tu.id, tu.username, tu.email FROM todo_user tu WHERE tu.id = $1")
                .bind(id)
                .fetch_optional(cxn_handle.borrow_connection())
                .await
                .context("Fetching a user by id")?;

        Ok(user.map(TodoUser::from))
    }

    async fn credentials_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let credentials: Option<CredentialsRow> = sqlx::query_as(
            "SELECT tu.id, tu.password_hash FROM todo_user tu WHERE tu.username = $1",
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user's login credentials")?;

        Ok(credentials.map(|row| StoredCredentials {
            user_id: row.id,
            password_hash: row.password_hash,
        }))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &UserRecord<'_>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_user: super::NewId = sqlx::query_as(
            "INSERT INTO todo_user(username, email, password_hash) \
             VALUES ($1, $2, $3) RETURNING todo_user.id",
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(new_user.id)
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // The user's tasks disappear with the account via ON DELETE CASCADE
        sqlx::query("DELETE FROM todo_user WHERE id = $1")
            .bind(user_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Removing a user account")?;

        Ok(())
    }
}
