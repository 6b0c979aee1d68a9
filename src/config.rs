use thiserror::Error;

/// Ten years; keeps session expiry arithmetic within chrono's range.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub clickup: ClickUpConfig,
    pub node: NodeConfig,
    pub releases: ReleasesConfig,
    pub storage: StorageConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Required to self-register as admin. Without it, only the very first
    /// account may register as admin.
    pub admin_registration_code: Option<String>,
    /// PBKDF2 rounds for newly hashed passwords
    pub password_iterations: u32,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct ClickUpConfig {
    pub api_url: String,
    /// Upper bound on task pages fetched per request
    pub max_pages: u32,
}

#[derive(Debug, Clone)]
pub struct ReleasesConfig {
    /// Releases per page in the browsing view
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory for uploaded release media
    pub media_storage_path: String,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_registration_code: None,
            password_iterations: 100_000,
            session_ttl_hours: 24 * 7,
        }
    }
}

impl Default for ClickUpConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.clickup.com/api/v2".to_string(),
            max_pages: 10,
        }
    }
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self { page_size: 8 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_storage_path: "./media".to_string(),
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let node_defaults = NodeConfig::default();
        let auth_defaults = AuthConfig::default();
        let clickup_defaults = ClickUpConfig::default();
        let storage_defaults = StorageConfig::default();

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or(node_defaults.bind_address);
        let data_dir = std::env::var("DATA_DIR").unwrap_or(node_defaults.data_dir);

        let media_storage_path =
            std::env::var("MEDIA_STORAGE_PATH").unwrap_or(storage_defaults.media_storage_path);
        let max_upload_size =
            env_parse("MAX_UPLOAD_SIZE").unwrap_or(storage_defaults.max_upload_size);

        let page_size = env_parse("PAGE_SIZE").unwrap_or(ReleasesConfig::default().page_size);

        let admin_registration_code = std::env::var("ADMIN_REGISTRATION_CODE")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let password_iterations =
            env_parse("PASSWORD_ITERATIONS").unwrap_or(auth_defaults.password_iterations);
        let session_ttl_hours =
            env_parse("SESSION_TTL_HOURS").unwrap_or(auth_defaults.session_ttl_hours);

        let clickup_api_url = std::env::var("CLICKUP_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(clickup_defaults.api_url);
        let clickup_max_pages =
            env_parse("CLICKUP_MAX_PAGES").unwrap_or(clickup_defaults.max_pages);

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            auth: AuthConfig {
                admin_registration_code,
                password_iterations,
                session_ttl_hours,
            },
            clickup: ClickUpConfig {
                api_url: clickup_api_url,
                max_pages: clickup_max_pages,
            },
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            releases: ReleasesConfig { page_size },
            storage: StorageConfig {
                media_storage_path,
                max_upload_size,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.releases.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.auth.password_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "PASSWORD_ITERATIONS must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_ttl_hours <= 0 || self.auth.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }

        if self.clickup.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "CLICKUP_MAX_PAGES must be greater than 0".to_string(),
            ));
        }

        if self.auth.password_iterations < 10_000 && !self.test_mode {
            tracing::warn!(
                "PASSWORD_ITERATIONS is {}. Values below 10000 weaken stored password hashes.",
                self.auth.password_iterations
            );
        }

        Ok(())
    }
}
