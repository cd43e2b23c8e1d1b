use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_CLINIC_UTC_OFFSET: &str = "-05:00";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_narrative_model: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Offset of the clinic's wall clock, e.g. "-05:00".
    pub clinic_utc_offset: String,
    pub port: u16,
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn with_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default", name);
        default.to_string()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required("SUPABASE_URL"),
            supabase_anon_key: required("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET"),
            openai_api_key: required("OPENAI_API_KEY"),
            openai_base_url: with_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            openai_model: with_default("OPENAI_MODEL", "gpt-4o"),
            openai_narrative_model: with_default("OPENAI_NARRATIVE_MODEL", "gpt-4"),
            gemini_api_key: required("GEMINI_API_KEY"),
            gemini_base_url: with_default("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            gemini_model: with_default("GEMINI_MODEL", "gemini-2.5-flash"),
            clinic_utc_offset: with_default("CLINIC_UTC_OFFSET", DEFAULT_CLINIC_UTC_OFFSET),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_openai_configured(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    pub fn is_gemini_configured(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }

    /// The clinic's UTC offset. Falls back to UTC-05:00 when the configured
    /// value cannot be parsed.
    pub fn clinic_offset(&self) -> FixedOffset {
        parse_utc_offset(&self.clinic_utc_offset).unwrap_or_else(|| {
            warn!(
                "Invalid CLINIC_UTC_OFFSET '{}', using {}",
                self.clinic_utc_offset, DEFAULT_CLINIC_UTC_OFFSET
            );
            FixedOffset::west_opt(5 * 3600).unwrap_or_else(|| Utc.fix())
        })
    }
}

/// Parses "+HH:MM", "-HH:MM" or "Z".
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };

    let (hours, minutes) = rest.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
}
