use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub env: Environment,
}

impl Config {
    /// Reads the process environment once at startup; nothing else in the
    /// crate consults environment variables.
    pub fn from_env() -> Self {
        let port = match std::env::var("TASKBOARD_PORT") {
            Ok(raw) => raw.parse().expect("TASKBOARD_PORT must be a port number"),
            Err(_) => 3000,
        };

        let db_path =
            std::env::var("TASKBOARD_DB").unwrap_or_else(|_| "taskboard.db".to_string());

        let env = match std::env::var("TASKBOARD_ENV").as_deref() {
            Ok("production") => Environment::Production,
            Ok("test") => Environment::Test,
            Ok("development") | Err(_) => Environment::Development,
            Ok(other) => panic!("TASKBOARD_ENV must be development, production or test, got {other:?}"),
        };

        Config { port, db_path, env }
    }
}
