use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// S3-compatible bucket. Absent means uploads fall back to local disk.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub s3: Option<S3Config>,
    pub uploads_dir: String,
    pub server_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub smtp: Option<SmtpConfig>,
    pub cookie_secure: bool,
    pub frontend_url: Option<String>,
}

fn var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var_opt(key).unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: var_or("JWT_ISSUER", "hireboard"),
            audience: var_or("JWT_AUDIENCE", "hireboard-users"),
            ttl_minutes: var_opt("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };

        let s3 = match (
            var_opt("S3_ENDPOINT"),
            var_opt("S3_BUCKET"),
            var_opt("S3_ACCESS_KEY"),
            var_opt("S3_SECRET_KEY"),
        ) {
            (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key)) => Some(S3Config {
                endpoint,
                bucket,
                access_key,
                secret_key,
                region: var_or("S3_REGION", "us-east-1"),
                public_url: var_opt("S3_PUBLIC_URL"),
            }),
            _ => None,
        };
        let storage = StorageConfig {
            s3,
            uploads_dir: var_or("UPLOADS_DIR", "uploads"),
            server_url: var_or("SERVER_URL", "http://localhost:8080"),
        };

        let smtp = match (
            var_opt("SMTP_HOST"),
            var_opt("SMTP_USERNAME"),
            var_opt("SMTP_PASSWORD"),
            var_opt("MAIL_FROM"),
        ) {
            (Some(host), Some(username), Some(password), Some(from)) => Some(SmtpConfig {
                host,
                username,
                password,
                from,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            database_max_connections: var_opt("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            storage,
            smtp,
            cookie_secure: var_opt("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            frontend_url: var_opt("FRONTEND_URL"),
        })
    }

    /// Origins allowed to send the session cookie cross-site.
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = [
            "http://localhost:5173",
            "http://localhost:5174",
            "http://localhost:3000",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if let Some(url) = &self.frontend_url {
            origins.push(url.trim_end_matches('/').to_string());
        }
        origins
    }
}
