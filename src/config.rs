use crate::error::{BadEnvVarSnafu, ParsePortSnafu, StudentsError, StudentsResult, UnknownStoreKindSnafu};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use sqlx::postgres::PgConnectOptions;
use std::{str::FromStr, sync::Arc};

pub const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";

fn env_var(name: &'static str) -> StudentsResult<String> {
    var(name).context(BadEnvVarSnafu { name })
}

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: String,
    store_config: Arc<StoreConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> StudentsResult<Self> {
        let server_ip =
            var("STUDENTS_SERVER_IP").unwrap_or_else(|_| DEFAULT_SERVER_IP.to_string());

        Ok(Self {
            server_ip,
            store_config: Arc::new(StoreConfig::from_env()?),
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn store_config(&self) -> Arc<StoreConfig> {
        self.store_config.clone()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = StudentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => UnknownStoreKindSnafu { found: s }.fail(),
        }
    }
}

#[derive(Debug)]
pub enum StoreConfig {
    Postgres(DbConfig),
    Memory,
}

impl StoreConfig {
    ///`STUDENTS_STORE` picks the store, and the `DB_*` variables are only read for postgres
    pub fn from_env() -> StudentsResult<Self> {
        let kind = var("STUDENTS_STORE").map_or(Ok(StoreKind::Postgres), |kind| kind.parse())?;

        Ok(match kind {
            StoreKind::Postgres => Self::Postgres(DbConfig {
                user: env_var("DB_USER")?,
                password: SecretString::from(env_var("DB_PASSWORD")?),
                host: env_var("DB_PATH")?,
                port: env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
                database: env_var("DB_NAME")?,
            }),
            StoreKind::Memory => Self::Memory,
        })
    }

    pub const fn kind(&self) -> StoreKind {
        match self {
            Self::Postgres(_) => StoreKind::Postgres,
            Self::Memory => StoreKind::Memory,
        }
    }
}

/// Where the student table lives. The password only leaves the secret when
/// the connection options are built.
#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    host: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_is_forgiving_about_case() {
        assert_eq!(" Memory ".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert_eq!("postgres".parse::<StoreKind>().unwrap(), StoreKind::Postgres);
        assert!(matches!(
            "sqlite".parse::<StoreKind>(),
            Err(StudentsError::UnknownStoreKind { .. })
        ));
    }

    #[test]
    fn connect_options_carry_every_part() {
        let config = DbConfig {
            user: "registrar".to_string(),
            password: SecretString::from("hunter2"),
            host: "localhost".to_string(),
            port: 5433,
            database: "students".to_string(),
        };

        let options = config.connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "registrar");
        assert_eq!(options.get_database(), Some("students"));

        assert!(!format!("{config:?}").contains("hunter2"));
        assert_eq!(StoreConfig::Postgres(config).kind(), StoreKind::Postgres);
    }
}
