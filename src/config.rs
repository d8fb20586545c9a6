//! Service configuration loaded from environment variables (and `.env`).
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_API_TOKEN` - Bearer token guarding `/admin` routes
//!
//! ## Optional
//! - `HOST` (default `0.0.0.0`), `PORT` (default `3000`)
//! - `PUBLIC_BASE_URL` - Used for upload URLs and admin links in emails
//! - `SMTP_HOST` (default `smtp.gmail.com`), `SMTP_PORT` (default `587`)
//! - `SMTP_USER`, `SMTP_PASS` - Without both, emails are logged instead of sent
//! - `ADMIN_EMAIL` - Recipient of payment verification requests
//! - `EMAIL_SENDER_NAME` - Display name on outgoing mail
//! - `UPLOAD_DIR` (default `uploads`), `UPLOAD_MAX_BYTES` (default 10 MiB)

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_ADMIN_EMAIL: &str = "admin@vrindavan.com";
const DEFAULT_SENDER_NAME: &str = "Vrindavan Ras Desh";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Public URL of this service, without a trailing slash.
    pub public_base_url: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_token: SecretString,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// `None` unless both the user and password are configured.
    pub smtp_credentials: Option<SmtpCredentials>,
    pub admin_email: String,
    pub sender_name: String,
}

#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary lookup; `load` passes the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
        };

        let server = ServerConfig {
            host: parse_or(get("HOST"), "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{DEFAULT_PORT}"))
                .trim_end_matches('/')
                .to_string(),
        };

        let auth = AuthConfig {
            admin_token: SecretString::from(required("ADMIN_API_TOKEN")?),
        };

        let smtp_credentials = match (get("SMTP_USER"), get("SMTP_PASS")) {
            (Some(username), Some(password)) => Some(SmtpCredentials {
                username,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        let email = EmailConfig {
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: parse_or(get("SMTP_PORT"), "SMTP_PORT", DEFAULT_SMTP_PORT)?,
            smtp_credentials,
            admin_email: get("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            sender_name: get("EMAIL_SENDER_NAME")
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
        };

        let uploads = UploadConfig {
            dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_bytes: parse_or(
                get("UPLOAD_MAX_BYTES"),
                "UPLOAD_MAX_BYTES",
                DEFAULT_UPLOAD_MAX_BYTES,
            )?,
        };

        Ok(Self {
            database,
            server,
            auth,
            email,
            uploads,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err: T::Err| ConfigError::InvalidEnvVar(key.to_string(), err.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_required_vars() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/rasdesh"),
            ("ADMIN_API_TOKEN", "s3cr3t-admin-token"),
        ]))
        .expect("valid config");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.public_base_url, "http://localhost:3000");
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.email.admin_email, "admin@vrindavan.com");
        assert!(config.email.smtp_credentials.is_none());
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert_eq!(config.auth.admin_token.expose_secret(), "s3cr3t-admin-token");
    }

    #[test]
    fn test_missing_required_var() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")]))
            .expect_err("missing token");
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "ADMIN_API_TOKEN"));
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_API_TOKEN", "token"),
            ("PORT", "eighty"),
        ]))
        .expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_smtp_credentials_need_user_and_password() {
        let base = [
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_API_TOKEN", "token"),
            ("SMTP_USER", "store@vrindavan.com"),
        ];
        let config = AppConfig::from_lookup(lookup(&base)).expect("valid");
        assert!(config.email.smtp_credentials.is_none());

        let mut with_pass = base.to_vec();
        with_pass.push(("SMTP_PASS", "app-password"));
        with_pass.push(("PUBLIC_BASE_URL", "https://vrindavanrasdesh.com/"));
        let config = AppConfig::from_lookup(lookup(&with_pass)).expect("valid");
        let credentials = config.email.smtp_credentials.expect("configured");
        assert_eq!(credentials.username, "store@vrindavan.com");
        assert_eq!(config.server.public_base_url, "https://vrindavanrasdesh.com");
    }
}
