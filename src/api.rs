pub mod auth;
pub mod swagger_main;
pub mod todo;
pub mod user;

#[cfg(test)]
pub mod test_util;
