//! Application Configuration

use platform::clock::{DAYS, HOURS, MINUTES};
use platform::cookie::CookieConfig;

// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Absolute base URL used in outbound mail links
    pub base_url: String,
    /// Session cookie name
    pub session_cookie_name: String,
    /// Privilege elevation cookie name
    pub elevation_cookie_name: String,
    /// Whether to require the Secure cookie attribute
    pub cookie_secure: bool,
    /// Session TTL (30 days)
    pub session_ttl_ms: i64,
    /// Email verification token TTL (60 days)
    pub verify_email_ttl_ms: i64,
    /// Password reset token TTL (15 minutes)
    pub password_reset_ttl_ms: i64,
    /// Login link token TTL (15 minutes)
    pub login_token_ttl_ms: i64,
    /// Privilege elevation TTL (10 minutes)
    pub elevation_ttl_ms: i64,
    /// Inactivity gap after which the previous-visit snapshot updates (1 hour)
    pub inactivity_refresh_ms: i64,
    /// Length of generated account ids
    pub account_id_length: usize,
    /// Default length of generated token ids
    pub token_id_length: usize,
    /// Bearer token guarding the cron endpoints
    pub cron_api_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_cookie_name: "sid".to_string(),
            elevation_cookie_name: "priv".to_string(),
            cookie_secure: true,
            session_ttl_ms: 30 * DAYS,
            verify_email_ttl_ms: 60 * DAYS,
            password_reset_ttl_ms: 15 * MINUTES,
            login_token_ttl_ms: 15 * MINUTES,
            elevation_ttl_ms: 10 * MINUTES,
            inactivity_refresh_ms: HOURS,
            account_id_length: 13,
            token_id_length: 32,
            cron_api_token: String::new(),
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    /// Session cookie: Lax so normal navigation carries it, Max-Age
    /// mirroring the token TTL
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(self.session_ttl_ms / 1000),
        }
    }

    /// Elevation cookie: Strict and short-lived, an independent channel
    /// from the session-stored elevation token
    pub fn elevation_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.elevation_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age_secs: Some(self.elevation_ttl_ms / 1000),
        }
    }
}
