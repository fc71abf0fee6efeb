/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see
/// [EnvFilter's directive documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Secret used to sign and verify access tokens. Must be identical across replicas
/// so a token issued by one instance validates on another
pub const JWT_SECRET: &str = "JWT_SECRET";
/// Socket address the HTTP server binds to, e.g. 0.0.0.0:8080
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
