//! Environment-derived settings.
//!
//! The hosting platform injects its variables under a prefix
//! (`VERCEL_SUPABASE_URL`) while the application reads the generic names
//! (`SUPABASE_URL`). [`SettingsResolver`] reconciles the two before the
//! application is constructed:
//!
//! 1. `<PREFIX>_<KEY>` if set and non-empty
//! 2. `<KEY>` if set and non-empty
//! 3. the documented default for the key
//!
//! Resolution never fails. Validation happens in [`Settings`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

/// Placeholder token secret shipped in deployment templates.
pub const PLACEHOLDER_JWT_SECRET: &str = "default-secret-change-in-production";

/// Placeholder session secret shipped in deployment templates.
pub const PLACEHOLDER_SESSION_SECRET: &str = "default-session-secret";

/// Secrets shorter than this are replaced with generated ones.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("required setting {0} is empty")]
    MissingRequired(&'static str),

    #[error("failed to generate secret: {0}")]
    Entropy(String),
}

/// Read access to a set of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Configuration keys recognized by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    StoreUrl,
    StoreAnonKey,
    StoreServiceRoleKey,
    DatabaseUrl,
    JwtSecret,
    CorsOrigins,
    SessionSecret,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::StoreUrl,
        SettingKey::StoreAnonKey,
        SettingKey::StoreServiceRoleKey,
        SettingKey::DatabaseUrl,
        SettingKey::JwtSecret,
        SettingKey::CorsOrigins,
        SettingKey::SessionSecret,
    ];

    /// Generic variable name read by the application.
    pub fn env_name(self) -> &'static str {
        match self {
            SettingKey::StoreUrl => "SUPABASE_URL",
            SettingKey::StoreAnonKey => "SUPABASE_ANON_KEY",
            SettingKey::StoreServiceRoleKey => "SUPABASE_SERVICE_ROLE_KEY",
            SettingKey::DatabaseUrl => "DATABASE_URL",
            SettingKey::JwtSecret => "JWT_SECRET",
            SettingKey::CorsOrigins => "CORS_ORIGINS_STR",
            SettingKey::SessionSecret => "SESSION_SECRET",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            SettingKey::JwtSecret => PLACEHOLDER_JWT_SECRET,
            SettingKey::SessionSecret => PLACEHOLDER_SESSION_SECRET,
            SettingKey::CorsOrigins => "*",
            _ => "",
        }
    }
}

/// Resolves platform-prefixed variables over generic ones.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    prefix: String,
}

impl SettingsResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Name of the platform-specific variable for `key`.
    pub fn prefixed_name(&self, key: SettingKey) -> String {
        if self.prefix.is_empty() {
            key.env_name().to_string()
        } else {
            format!("{}_{}", self.prefix, key.env_name())
        }
    }

    pub fn resolve(&self, env: &impl EnvSource) -> ResolvedEnv {
        let non_empty = |name: &str| env.var(name).filter(|v| !v.is_empty());

        let values = SettingKey::ALL
            .into_iter()
            .map(|key| {
                let value = non_empty(&self.prefixed_name(key))
                    .or_else(|| non_empty(key.env_name()))
                    .unwrap_or_else(|| key.default_value().to_string());
                (key, value)
            })
            .collect();

        ResolvedEnv { values }
    }
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PLATFORM_PREFIX)
    }
}

/// Resolved values keyed by setting, prior to validation.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedEnv {
    values: BTreeMap<SettingKey, String>,
}

impl ResolvedEnv {
    pub fn get(&self, key: SettingKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Write every non-empty resolved value back under its generic name.
    ///
    /// # Safety
    ///
    /// Mutates the process environment. Must be called before any other
    /// thread is spawned (see [`std::env::set_var`]).
    pub unsafe fn export(&self) {
        for (key, value) in &self.values {
            if value.is_empty() {
                continue;
            }
            let name = key.env_name();
            if std::env::var(name).ok().as_deref() != Some(value.as_str()) {
                // SAFETY: upheld by the caller.
                unsafe { std::env::set_var(name, value) };
                debug!(var = name, "exported resolved setting");
            }
        }
    }
}

impl fmt::Debug for ResolvedEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            match key {
                SettingKey::JwtSecret
                | SettingKey::SessionSecret
                | SettingKey::StoreServiceRoleKey => map.entry(key, &"<redacted>"),
                _ => map.entry(key, value),
            };
        }
        map.finish()
    }
}

/// Immutable snapshot of the application's configuration.
#[derive(Clone)]
pub struct Settings {
    pub store_url: String,
    pub store_anon_key: String,
    store_service_role_key: String,
    pub database_url: Option<String>,
    jwt_secret: String,
    pub jwt_algorithm: String,
    pub jwt_expiration_hours: u32,
    pub cors_origins_str: String,
    session_secret: String,
}

impl Settings {
    /// Build settings from resolved values, replacing placeholder or weak
    /// secrets with generated ones.
    pub fn from_resolved(env: &ResolvedEnv) -> Result<Self, SettingsError> {
        let database_url = Some(env.get(SettingKey::DatabaseUrl).to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            store_url: env.get(SettingKey::StoreUrl).to_string(),
            store_anon_key: env.get(SettingKey::StoreAnonKey).to_string(),
            store_service_role_key: env.get(SettingKey::StoreServiceRoleKey).to_string(),
            database_url,
            jwt_secret: harden_secret(
                SettingKey::JwtSecret,
                env.get(SettingKey::JwtSecret),
                PLACEHOLDER_JWT_SECRET,
            )?,
            jwt_algorithm: "HS256".to_string(),
            jwt_expiration_hours: 24,
            cors_origins_str: env.get(SettingKey::CorsOrigins).to_string(),
            session_secret: harden_secret(
                SettingKey::SessionSecret,
                env.get(SettingKey::SessionSecret),
                PLACEHOLDER_SESSION_SECRET,
            )?,
        })
    }

    /// Check the values the application cannot start without.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.store_url.is_empty() {
            return Err(SettingsError::MissingRequired(SettingKey::StoreUrl.env_name()));
        }
        if self.store_anon_key.is_empty() {
            return Err(SettingsError::MissingRequired(
                SettingKey::StoreAnonKey.env_name(),
            ));
        }
        Ok(())
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    pub fn store_service_role_key(&self) -> &str {
        &self.store_service_role_key
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins_str
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_origins()
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("store_url", &self.store_url)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("cors_origins_str", &self.cors_origins_str)
            .finish_non_exhaustive()
    }
}

fn harden_secret(
    key: SettingKey,
    value: &str,
    placeholder: &str,
) -> Result<String, SettingsError> {
    if value != placeholder && value.len() >= MIN_SECRET_LEN {
        return Ok(value.to_string());
    }
    warn!(
        var = key.env_name(),
        "secret is a placeholder or shorter than {MIN_SECRET_LEN} bytes; using a generated value"
    );
    generate_secret()
}

fn generate_secret() -> Result<String, SettingsError> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| SettingsError::Entropy(e.to_string()))?;
    Ok(hex::encode(buf))
}
