use std::env;

/// Runtime configuration, read once at startup from the environment
/// (`.env` is loaded by `dotenvy` in `main` before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub bind_port: u16,
    pub amqp_host: String,
    pub amqp_port: u16,
    pub amqp_user: String,
    pub amqp_password: String,
    /// Base invite allowance for people without an explicit assignation.
    pub regular_invites_per_user: i32,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL should be set"),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            bind_port: parse_var("BIND_PORT", 8080),
            amqp_host: env::var("AMQP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            amqp_port: parse_var("AMQP_PORT", 5672),
            amqp_user: env::var("AMQP_USER").unwrap_or_else(|_| "guest".to_string()),
            amqp_password: env::var("AMQP_PASSWORD").unwrap_or_else(|_| "guest".to_string()),
            regular_invites_per_user: parse_var("REGULAR_INVITES_PER_USER", 5),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}
