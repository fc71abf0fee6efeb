use crate::domain::user::driving_ports::{AuthError, CreateUserError};
use crate::external_connections::ExternalConnectivity;
use crate::security;
use anyhow::Context;
use thiserror::Error;

/// A registered user of the API. The user's password hash deliberately lives only on
/// [driven_ports::StoredCredentials], never on this struct, so it can't leak upward.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// A request to register a new user. The password is raw here and hashed by the
/// user service before it reaches any driven port.
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A login attempt's raw credentials
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    /// A user as persisted, with the password already hashed
    pub struct UserRecord<'strings> {
        pub username: &'strings str,
        pub email: &'strings str,
        pub password_hash: &'strings str,
    }

    /// The stored login material for a user
    #[cfg_attr(test, derive(Clone, Debug))]
    pub struct StoredCredentials {
        pub user_id: i32,
        pub password_hash: String,
    }

    pub trait UserReader {
        async fn get_by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;

        async fn credentials_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &UserRecord<'_>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_exists(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Detects whether a user already claimed [username] or [email], either of which
        /// must be unique
        async fn username_or_email_exists(
            &self,
            username: &str,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("A user with that username or email already exists.")]
        UserAlreadyExists,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum AuthError {
        #[error("The username or password was incorrect.")]
        BadCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[cfg(test)]
    mod error_clone {
        use super::{AuthError, CreateUserError};
        use anyhow::anyhow;

        impl Clone for CreateUserError {
            fn clone(&self) -> Self {
                match self {
                    Self::UserAlreadyExists => Self::UserAlreadyExists,
                    Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
                }
            }
        }

        impl Clone for AuthError {
            fn clone(&self) -> Self {
                match self {
                    Self::BadCredentials => Self::BadCredentials,
                    Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
                }
            }
        }
    }

    pub trait UserPort {
        async fn create_user(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<i32, CreateUserError>;

        /// Checks a login attempt, returning the ID of the authenticated user on success
        async fn authenticate(
            &self,
            credentials: &UserCredentials,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<i32, AuthError>;

        /// Fetches a user's profile
        async fn user_by_id(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Option<TodoUser>, anyhow::Error>;

        /// Removes a user's account. The user's tasks go with it.
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<(), anyhow::Error>;
    }
}

pub struct UserService {}

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user with ID {0} does not exist")]
    UserDoesNotExist(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Fails with [UserExistsErr::UserDoesNotExist] if the given user isn't in the system
pub(super) async fn verify_user_exists(
    id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(id, &mut *ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(id))
    }
}

impl driving_ports::UserPort for UserService {
    async fn create_user(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<i32, CreateUserError> {
        let user_exists = u_detect
            .username_or_email_exists(&new_user.username, &new_user.email, &mut *ext_cxn)
            .await
            .context("Looking up user during creation")?;
        if user_exists {
            return Err(CreateUserError::UserAlreadyExists);
        }

        let password_hash =
            security::hash_password(&new_user.password).context("Hashing a new user's password")?;
        let persisted_user = driven_ports::UserRecord {
            username: &new_user.username,
            email: &new_user.email,
            password_hash: &password_hash,
        };

        Ok(u_writer
            .create_user(&persisted_user, &mut *ext_cxn)
            .await
            .context("Trying to create user at service level")?)
    }

    async fn authenticate(
        &self,
        credentials: &UserCredentials,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<i32, AuthError> {
        let stored_credentials = u_reader
            .credentials_by_username(&credentials.username, &mut *ext_cxn)
            .await
            .context("Looking up login credentials")?;
        // An unknown username gets the same error as a bad password so callers can't
        // probe which usernames are registered
        let Some(stored_credentials) = stored_credentials else {
            return Err(AuthError::BadCredentials);
        };

        let password_matches =
            security::verify_password(&credentials.password, &stored_credentials.password_hash)
                .context("Checking a login password")?;
        if !password_matches {
            return Err(AuthError::BadCredentials);
        }

        Ok(stored_credentials.user_id)
    }

    async fn user_by_id(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Option<TodoUser>, anyhow::Error> {
        let user_result = u_reader.get_by_id(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = user_result {
            log::error!("User fetch failure: {port_err}");
        }

        user_result.context("Fetching a user profile")
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<(), anyhow::Error> {
        u_writer
            .delete_user(user_id, &mut *ext_cxn)
            .await
            .context("deleting a user account")?;

        Ok(())
    }
}

#[cfg(test)]
mod verify_user_exists_tests {
    use super::*;
    use crate::domain::test_util::Connectivity;
    use crate::domain::user::driven_ports::UserWriter;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn detects_user() {
        let user_stuff = test_util::InMemoryUserPersistence::new_locked();
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let create_request = test_util::user_create_default();
        let persisted = driven_ports::UserRecord {
            username: &create_request.username,
            email: &create_request.email,
            password_hash: "fake-hash",
        };
        let new_user_id = user_stuff
            .create_user(&persisted, &mut db_cxn)
            .await
            .expect("user creation against the fake should succeed");

        let exists_result = verify_user_exists(new_user_id, &mut db_cxn, &user_stuff).await;
        assert_that!(exists_result).is_ok();
    }

    #[tokio::test]
    async fn errors_when_user_doesnt_exist() {
        let user_stuff = test_util::InMemoryUserPersistence::new_locked();
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let exists_result = verify_user_exists(5, &mut db_cxn, &user_stuff).await;
        assert_that!(exists_result)
            .is_err()
            .matches(|inner_err| matches!(inner_err, UserExistsErr::UserDoesNotExist(5)));
    }

    #[tokio::test]
    async fn propagates_port_error() {
        let mut user_persistence = test_util::InMemoryUserPersistence::new();
        user_persistence.connectivity = Connectivity::Disconnected;

        let user_stuff = RwLock::new(user_persistence);
        let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let exists_result = verify_user_exists(5, &mut db_cxn, &user_stuff).await;
        assert_that!(exists_result)
            .is_err()
            .matches(|inner_err| matches!(inner_err, UserExistsErr::PortError(_)));
    }
}
