use crate::gate::{is_truthy, Environment, WriteGate};
use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/activities.db";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub gate: WriteGate,
}

impl ServerConfig {
    /// Reads `PORT`, `APP_DATABASE_PATH`, `APP_ENV` and `ALLOW_PRODUCTION_WRITES`.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_path = env::var("APP_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));

        let environment = Environment::parse(env::var("APP_ENV").ok().as_deref());
        let allow = is_truthy(env::var("ALLOW_PRODUCTION_WRITES").ok().as_deref());

        Self {
            port,
            database_path,
            gate: WriteGate::new(environment, allow),
        }
    }
}
