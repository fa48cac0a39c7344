use std::env;

/// Process-wide configuration, resolved once at startup from the environment
/// and passed into the app as shared data. Nothing else in the codebase reads
/// environment variables mid-request.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// HS256 secret for session tokens.
    pub jwt_secret: String,
    /// Public base URL of this API, used to build verification links.
    pub api_url: String,
    /// Public base URL of the frontend, used to build password reset links.
    pub base_url: String,
    /// When set, redeeming an email verification token also grants admin
    /// approval, collapsing the dual gate into a single step.
    pub auto_approve_on_email_verify: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            auto_approve_on_email_verify: env::var("AUTO_APPROVE_ON_EMAIL_VERIFY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("JWT_SECRET", "test-secret");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.jwt_secret, "test-secret");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert!(!config.auto_approve_on_email_verify);

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("AUTO_APPROVE_ON_EMAIL_VERIFY", "true");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
        assert!(config.auto_approve_on_email_verify);
    }
}
