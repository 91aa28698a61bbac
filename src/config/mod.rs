//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::controller::ListingOptions;
use crate::application::polling::PollPolicy;
use crate::domain::uploads::{
    DEFAULT_LOGO_MAX_BYTES, DEFAULT_PROJECT_FILE_MAX_BYTES, DEFAULT_SPREADSHEET_MAX_BYTES,
    UploadPolicy,
};

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "collabdesk";
const ENV_PREFIX: &str = "COLLABDESK";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_FETCH_LIMIT: u64 = 1000;
const DEFAULT_POLL_INTERVAL_SECS: f64 = 3.0;
const DEFAULT_POLL_BACKOFF_FACTOR: f64 = 1.0;
const DEFAULT_POLL_MAX_INTERVAL_SECS: f64 = 30.0;
const DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS: u64 = 5;

/// Fully-resolved console settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub listing: ListingSettings,
    pub polling: PollingSettings,
    pub uploads: UploadSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Option<Url>,
    pub token: Option<String>,
    /// Takes precedence over `token` when set.
    pub token_file: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub page_size: NonZeroUsize,
    pub fetch_limit: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct PollingSettings {
    pub interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub max_consecutive_errors: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub logo_max_bytes: NonZeroU64,
    pub project_file_max_bytes: NonZeroU64,
    pub spreadsheet_max_bytes: NonZeroU64,
}

impl From<&ListingSettings> for ListingOptions {
    fn from(listing: &ListingSettings) -> Self {
        Self {
            page_size: listing.page_size,
            fetch_limit: listing.fetch_limit,
        }
    }
}

impl From<&PollingSettings> for PollPolicy {
    fn from(polling: &PollingSettings) -> Self {
        Self {
            interval: polling.interval,
            backoff_factor: polling.backoff_factor,
            max_interval: polling.max_interval,
            max_consecutive_errors: polling.max_consecutive_errors.get(),
        }
    }
}

impl From<&UploadSettings> for UploadPolicy {
    fn from(uploads: &UploadSettings) -> Self {
        Self {
            logo_max_bytes: uploads.logo_max_bytes,
            project_file_max_bytes: uploads.project_file_max_bytes,
            spreadsheet_max_bytes: uploads.spreadsheet_max_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_global_overrides(&cli.overrides);
    if let Some(page_size) = cli.command.page_size_override() {
        raw.listing.page_size = Some(page_size as u64);
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    listing: RawListingSettings,
    polling: RawPollingSettings,
    uploads: RawUploadSettings,
}

impl RawSettings {
    fn apply_global_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(path) = overrides.api_token_file.as_ref() {
            self.api.token_file = Some(path.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            logging,
            listing,
            polling,
            uploads,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            logging: build_logging_settings(logging)?,
            listing: build_listing_settings(listing)?,
            polling: build_polling_settings(polling)?,
            uploads: build_upload_settings(uploads)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = match api.base_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => {
            let parsed = Url::parse(value)
                .map_err(|err| LoadError::invalid("api.base_url", format!("{err}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "api.base_url",
                    "scheme must be http or https",
                ));
            }
            Some(parsed)
        }
    };

    let token = api.token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });
    let token_file = api
        .token_file
        .filter(|path| !path.as_os_str().is_empty());

    let timeout_secs = api.timeout_seconds.unwrap_or(DEFAULT_API_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        base_url,
        token,
        token_file,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let page_size_value = listing.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let page_size = usize::try_from(page_size_value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("listing.page_size", "must be greater than zero"))?;

    let fetch_limit = non_zero_u32(
        listing.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT),
        "listing.fetch_limit",
    )?;

    Ok(ListingSettings {
        page_size,
        fetch_limit,
    })
}

fn build_polling_settings(polling: RawPollingSettings) -> Result<PollingSettings, LoadError> {
    let interval = positive_seconds(
        polling.interval_seconds.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        "polling.interval_seconds",
    )?;
    let max_interval = positive_seconds(
        polling
            .max_interval_seconds
            .unwrap_or(DEFAULT_POLL_MAX_INTERVAL_SECS),
        "polling.max_interval_seconds",
    )?;
    if max_interval < interval {
        return Err(LoadError::invalid(
            "polling.max_interval_seconds",
            "must not be smaller than polling.interval_seconds",
        ));
    }

    let backoff_factor = polling
        .backoff_factor
        .unwrap_or(DEFAULT_POLL_BACKOFF_FACTOR);
    if !backoff_factor.is_finite() || backoff_factor < 1.0 {
        return Err(LoadError::invalid(
            "polling.backoff_factor",
            "must be a finite number of at least 1.0",
        ));
    }

    let max_consecutive_errors = non_zero_u32(
        polling
            .max_consecutive_errors
            .unwrap_or(DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS),
        "polling.max_consecutive_errors",
    )?;

    Ok(PollingSettings {
        interval,
        backoff_factor,
        max_interval,
        max_consecutive_errors,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    Ok(UploadSettings {
        logo_max_bytes: non_zero_u64(
            uploads.logo_max_bytes.unwrap_or(DEFAULT_LOGO_MAX_BYTES),
            "uploads.logo_max_bytes",
        )?,
        project_file_max_bytes: non_zero_u64(
            uploads
                .project_file_max_bytes
                .unwrap_or(DEFAULT_PROJECT_FILE_MAX_BYTES),
            "uploads.project_file_max_bytes",
        )?,
        spreadsheet_max_bytes: non_zero_u64(
            uploads
                .spreadsheet_max_bytes
                .unwrap_or(DEFAULT_SPREADSHEET_MAX_BYTES),
            "uploads.spreadsheet_max_bytes",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    page_size: Option<u64>,
    fetch_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPollingSettings {
    interval_seconds: Option<f64>,
    backoff_factor: Option<f64>,
    max_interval_seconds: Option<f64>,
    max_consecutive_errors: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    logo_max_bytes: Option<u64>,
    project_file_max_bytes: Option<u64>,
    spreadsheet_max_bytes: Option<u64>,
}

fn positive_seconds(value: f64, key: &'static str) -> Result<Duration, LoadError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Duration::try_from_secs_f64(value).map_err(|err| LoadError::invalid(key, err.to_string()))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_u64(value: u64, key: &'static str) -> Result<NonZeroU64, LoadError> {
    NonZeroU64::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
