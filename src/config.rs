use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

const INSECURE_DEV_KEY: &str = "dev-insecure-secret-key-change-me";
const PROD_HOSTS: [&str; 2] = ["flowtels.com", "www.flowtels.com"];
const PROD_ORIGINS: [&str; 2] = ["https://flowtels.com", "https://www.flowtels.com"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl FromStr for Profile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Profile::Dev),
            "prod" | "production" => Ok(Profile::Prod),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailBackend {
    /// Messages are written to the log instead of being sent.
    Console,
    /// Messages are POSTed as JSON to an HTTP mail API.
    Http,
}

#[derive(Clone, Debug)]
pub struct EnvConfig {
    pub profile: Profile,
    pub port: u16,
    pub workers: Option<usize>,
    pub secret_key: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,
    pub domain: String,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub csrf_trusted_origins: Vec<String>,
    pub security: SecurityConfig,
    pub session_age: Duration,
    pub password_validation: bool,
    pub max_body_bytes: usize,
    pub mail: MailConfig,
    pub paths: PathsConfig,
    pub google: GoogleConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    /// Host and port the entrypoint waits on before migrating.
    pub host: String,
    pub port: u16,
    pub log_sql: bool,
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allow_all: bool,
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    pub ssl_redirect: bool,
    pub hsts_seconds: u64,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,
    pub content_type_nosniff: bool,
    pub browser_xss_filter: bool,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub backend: EmailBackend,
    pub api_key: String,
    pub endpoint: String,
    pub default_from: String,
}

#[derive(Clone, Debug)]
pub struct PathsConfig {
    pub static_root: PathBuf,
    pub static_dirs: Vec<PathBuf>,
    pub media_root: PathBuf,
    pub backup_dir: PathBuf,
    /// Write `.gz` siblings of text assets during collectstatic.
    pub compress_static: bool,
}

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub service_account_file: PathBuf,
    pub poll_interval_secs: u64,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. `APP_ENV` picks the profile (dev by default);
    /// every other key falls back to the profile default when absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup: &lookup };

        let profile = match vars.get("APP_ENV") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key: "APP_ENV", value: v })?,
            None => Profile::Dev,
        };
        let prod = profile == Profile::Prod;

        let secret_key = match (vars.get("SECRET_KEY"), profile) {
            (Some(key), _) => key,
            (None, Profile::Dev) => INSECURE_DEV_KEY.to_string(),
            (None, Profile::Prod) => return Err(ConfigError::Missing("SECRET_KEY")),
        };

        let debug = vars.parse("DEBUG", !prod)?;
        let domain = vars.get("DOMAIN").unwrap_or_else(|| {
            if prod { PROD_HOSTS[0].to_string() } else { "localhost".to_string() }
        });

        let allowed_hosts = vars.list("ALLOWED_HOSTS").unwrap_or_else(|| {
            if prod {
                owned(&PROD_HOSTS)
            } else {
                owned(&["localhost", "127.0.0.1", "0.0.0.0"])
            }
        });

        let database = Self::database(&vars, profile)?;

        let cors = if prod {
            CorsConfig {
                allow_all: false,
                allowed_origins: vars.list("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| owned(&PROD_ORIGINS)),
                allow_credentials: true,
            }
        } else {
            CorsConfig {
                allow_all: true,
                allowed_origins: vars.list("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
                allow_credentials: false,
            }
        };

        let csrf_trusted_origins = vars.list("CSRF_TRUSTED_ORIGINS").unwrap_or_else(|| {
            if prod { owned(&PROD_ORIGINS) } else { Vec::new() }
        });

        let security = if prod {
            SecurityConfig {
                ssl_redirect: vars.parse("SECURE_SSL_REDIRECT", true)?,
                hsts_seconds: vars.parse("SECURE_HSTS_SECONDS", 31_536_000)?,
                hsts_include_subdomains: true,
                hsts_preload: true,
                content_type_nosniff: true,
                browser_xss_filter: true,
            }
        } else {
            SecurityConfig::default()
        };

        let mail_backend = match vars.get("EMAIL_BACKEND") {
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "console" => EmailBackend::Console,
                "http" | "api" => EmailBackend::Http,
                _ => return Err(ConfigError::Invalid { key: "EMAIL_BACKEND", value: v }),
            },
            None if prod => EmailBackend::Http,
            None => EmailBackend::Console,
        };

        let mail = MailConfig {
            backend: mail_backend,
            api_key: vars.get("EMAIL_API_KEY").unwrap_or_default(),
            endpoint: vars
                .get("EMAIL_ENDPOINT")
                .unwrap_or_else(|| "https://api.resend.com/emails".to_string()),
            default_from: vars
                .get("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|| format!("noreply@{domain}")),
        };
        if mail.backend == EmailBackend::Http && mail.api_key.is_empty() {
            return Err(ConfigError::Missing("EMAIL_API_KEY"));
        }

        let paths = PathsConfig {
            static_root: vars.path("STATIC_ROOT", "staticfiles"),
            static_dirs: vars
                .list("STATICFILES_DIRS")
                .map(|dirs| dirs.into_iter().map(PathBuf::from).collect())
                .unwrap_or_else(|| vec![PathBuf::from("static")]),
            media_root: vars.path("MEDIA_ROOT", "media"),
            backup_dir: vars.path("BACKUP_DIR", "backups"),
            compress_static: prod,
        };

        let google = GoogleConfig {
            service_account_file: vars.path("GOOGLE_SERVICE_ACCOUNT_FILE", "service-account.json"),
            poll_interval_secs: vars.parse("BOOKING_POLL_INTERVAL", 300)?,
        };

        Ok(EnvConfig {
            profile,
            port: vars.parse("PORT", 8000)?,
            workers: vars.get("WEB_WORKERS").map(|v| {
                v.parse().map_err(|_| ConfigError::Invalid { key: "WEB_WORKERS", value: v })
            }).transpose()?,
            secret_key,
            debug,
            allowed_hosts,
            domain,
            database,
            cors,
            csrf_trusted_origins,
            security,
            session_age: if prod { Duration::days(7) } else { Duration::weeks(2) },
            password_validation: prod,
            max_body_bytes: if prod { 5 * 1024 * 1024 } else { 2_621_440 },
            mail,
            paths,
            google,
        })
    }

    fn database<F>(vars: &Vars<'_, F>, profile: Profile) -> Result<DatabaseConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match vars.get("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = vars.get("POSTGRES_USER").ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let password = vars.get("POSTGRES_PASSWORD").unwrap_or_default();
                let name = vars.get("POSTGRES_DB").unwrap_or_else(|| user.clone());
                let host = vars.get("POSTGRES_HOST").unwrap_or_else(|| "db".to_string());
                let port = vars.get("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());
                format!(
                    "postgres://{}:{}@{host}:{port}/{name}",
                    urlencoding::encode(&user),
                    urlencoding::encode(&password)
                )
            }
        };

        let parsed = reqwest::Url::parse(&url).map_err(|_| ConfigError::Invalid {
            key: "DATABASE_URL",
            value: url.clone(),
        })?;

        let host = vars
            .get("DB_HOST")
            .or_else(|| parsed.host_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        let port = match vars.get("DB_PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid { key: "DB_PORT", value: p })?,
            None => parsed.port().unwrap_or(5432),
        };

        Ok(DatabaseConfig {
            url,
            host,
            port,
            log_sql: profile == Profile::Dev,
        })
    }

    pub fn is_prod(&self) -> bool {
        self.profile == Profile::Prod
    }

    /// `*` in ALLOWED_HOSTS accepts any host; a leading dot matches the domain and its subdomains.
    pub fn host_allowed(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            if allowed == "*" {
                return true;
            }
            match allowed.strip_prefix('.') {
                Some(domain) => host == domain || host.ends_with(&allowed),
                None => host == allowed,
            }
        })
    }

    pub fn hsts_header(&self) -> Option<String> {
        if self.security.hsts_seconds == 0 {
            return None;
        }
        let mut value = format!("max-age={}", self.security.hsts_seconds);
        if self.security.hsts_include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.security.hsts_preload {
            value.push_str("; preload");
        }
        Some(value)
    }
}

fn strip_port(host: &str) -> &str {
    // bracketed IPv6 literals keep their colons
    if let Some(end) = host.strip_prefix('[').and_then(|h| h.find(']')) {
        return &host[1..=end];
    }
    host.split(':').next().unwrap_or(host)
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct Vars<'a, F> {
    lookup: &'a F,
}

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn path(&self, key: &str, default: &str) -> PathBuf {
        PathBuf::from(self.get(key).unwrap_or_else(|| default.to_string()))
    }

    fn parse<T: ParseEnv>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => T::parse_env(&value).ok_or(ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}

trait ParseEnv: Sized {
    fn parse_env(value: &str) -> Option<Self>;
}

impl ParseEnv for bool {
    fn parse_env(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

macro_rules! parse_env_number {
    ($($t:ty),*) => {
        $(impl ParseEnv for $t {
            fn parse_env(value: &str) -> Option<Self> {
                value.parse().ok()
            }
        })*
    };
}

parse_env_number!(u16, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<EnvConfig, ConfigError> {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn dev_defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://app:pw@db:5433/app")]).unwrap();
        assert_eq!(cfg.profile, Profile::Dev);
        assert!(cfg.debug);
        assert_eq!(cfg.secret_key, INSECURE_DEV_KEY);
        assert!(cfg.cors.allow_all);
        assert_eq!(cfg.hsts_header(), None);
        assert_eq!(cfg.mail.backend, EmailBackend::Console);
        assert_eq!((cfg.database.host.as_str(), cfg.database.port), ("db", 5433));
        assert!(cfg.host_allowed("localhost:8000"));
        assert!(!cfg.host_allowed("flowtels.com"));
    }

    #[test]
    fn prod_requires_secrets() {
        let err = config(&[("APP_ENV", "production"), ("DATABASE_URL", "postgres://db/app")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY")));

        let err = config(&[
            ("APP_ENV", "prod"),
            ("SECRET_KEY", "s3cret"),
            ("DATABASE_URL", "postgres://db/app"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("EMAIL_API_KEY")));
    }

    #[test]
    fn prod_hardening() {
        let cfg = config(&[
            ("APP_ENV", "prod"),
            ("SECRET_KEY", "s3cret"),
            ("EMAIL_API_KEY", "key"),
            ("POSTGRES_USER", "flow tels"),
            ("POSTGRES_PASSWORD", "p@ss"),
            ("POSTGRES_DB", "flowtels"),
            ("DB_HOST", "pgbouncer"),
        ])
        .unwrap();
        assert!(!cfg.debug);
        assert!(cfg.security.ssl_redirect);
        assert_eq!(cfg.hsts_header().as_deref(), Some("max-age=31536000; includeSubDomains; preload"));
        assert_eq!(cfg.database.url, "postgres://flow%20tels:p%40ss@db:5432/flowtels");
        assert_eq!(cfg.database.host, "pgbouncer");
        assert!(cfg.host_allowed("www.flowtels.com"));
        assert!(!cfg.host_allowed("localhost"));
        assert_eq!(cfg.session_age, Duration::days(7));
    }

    #[test]
    fn host_patterns() {
        let cfg = config(&[("DATABASE_URL", "postgres://db/app"), ("ALLOWED_HOSTS", ".flowtels.com, ::1")]).unwrap();
        assert!(cfg.host_allowed("flowtels.com"));
        assert!(cfg.host_allowed("api.flowtels.com:443"));
        assert!(cfg.host_allowed("[::1]:8000"));
        assert!(!cfg.host_allowed("notflowtels.com"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = config(&[("DATABASE_URL", "postgres://db/app"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        assert!(config(&[("APP_ENV", "staging")]).is_err());
    }
}
