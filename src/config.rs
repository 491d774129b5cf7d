use std::path::Path;

use serde::Deserialize;

use crate::error::ClientError;

fn default_port() -> u16 {
    3306
}

/// Options handed to the driver when establishing a session.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Initial default database; empty selects none.
    #[serde(default)]
    pub database: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect over a local socket instead of TCP when set.
    #[serde(default)]
    pub unix_socket: Option<String>,
    /// Driver-defined capability flags, passed through verbatim.
    #[serde(default)]
    pub client_flags: u64,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
            port: default_port(),
            unix_socket: None,
            client_flags: 0,
        }
    }
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_unix_socket(mut self, socket: impl Into<String>) -> Self {
        self.unix_socket = Some(socket.into());
        self
    }

    pub fn with_client_flags(mut self, flags: u64) -> Self {
        self.client_flags = flags;
        self
    }

    /// Load options from a config file, layered with `MYNA_`-prefixed
    /// environment variables (environment wins).
    pub fn load(config_path: &Path) -> Result<Self, ClientError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(config_path).required(true))
            .add_source(config::Environment::with_prefix("MYNA"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
