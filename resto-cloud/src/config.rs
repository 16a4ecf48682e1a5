//! Service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Shared secret presented by the voice assistant (`x-voice-secret`)
    pub voice_api_secret: String,
    /// SES sender email address
    pub ses_from_email: String,
    /// SES region when it differs from the default AWS region
    pub ses_region: Option<String>,
    /// Public URL of the dashboard, used in emails
    pub public_base_url: String,
    /// Transfer number given to the voice assistant when a restaurant has no phone
    pub default_transfer_phone: String,
    /// First administrator account, created at startup if missing
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            voice_api_secret: Self::require_secret("VOICE_API_SECRET", &environment)?,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@resto-vocal.fr".into()),
            ses_region: std::env::var("SES_REGION").ok().filter(|s| !s.is_empty()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            default_transfer_phone: std::env::var("DEFAULT_TRANSFER_PHONE")
                .unwrap_or_else(|_| "+33100000000".into()),
            bootstrap_admin_email: std::env::var("BOOTSTRAP_ADMIN_EMAIL")
                .ok()
                .filter(|s| !s.is_empty()),
            bootstrap_admin_password: std::env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
