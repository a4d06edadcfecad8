use clap::Args;

pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";

/// Bytes pulled from an archive entry per read call.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Per-entry ceiling; anything past this is dropped with a warning.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Connection and limit flags shared by both binaries.
#[derive(Args, Clone, Debug)]
pub struct HarnessArgs {
    /// Harness API base URL
    #[arg(long, env = "HARNESS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Harness API key (x-api-key)
    #[arg(long, env = "HARNESS_API_KEY", default_value = "")]
    pub api_key: String,

    /// Account identifier; derived from a PAT-style API key when omitted
    #[arg(long, env = "HARNESS_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Default organization identifier
    #[arg(long, env = "HARNESS_DEFAULT_ORG_ID")]
    pub org_id: Option<String>,

    /// Default project identifier
    #[arg(long, env = "HARNESS_DEFAULT_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Use the internal line limits (100 default / 100 max)
    #[arg(long, env = "HARNESS_INTERNAL_MODE")]
    pub internal: bool,

    /// Maximum bytes read from a single archive entry
    #[arg(long, env = "HARNESS_LOG_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    pub max_file_bytes: u64,
}

/// Bounds on how many log lines a caller may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineLimits {
    pub default: usize,
    pub max: usize,
}

impl LineLimits {
    pub const fn standard() -> Self {
        Self {
            default: 10,
            max: 20,
        }
    }

    pub const fn internal() -> Self {
        Self {
            default: 100,
            max: 100,
        }
    }

    /// Absent or non-positive requests get the default; large ones the max.
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 0 => (n as u64).min(self.max as u64) as usize,
            _ => self.default,
        }
    }
}

impl Default for LineLimits {
    fn default() -> Self {
        Self::standard()
    }
}

/// Bounds on how an archive entry is read into memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadLimits {
    pub chunk_size: usize,
    pub max_file_bytes: u64,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub lines: LineLimits,
    pub read: ReadLimits,
}

impl From<HarnessArgs> for Config {
    fn from(args: HarnessArgs) -> Self {
        let account_id = args
            .account_id
            .filter(|a| !a.is_empty())
            .or_else(|| account_from_api_key(&args.api_key))
            .unwrap_or_default();

        Config {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            api_key: args.api_key,
            account_id,
            org_id: args.org_id.filter(|o| !o.is_empty()),
            project_id: args.project_id.filter(|p| !p.is_empty()),
            lines: if args.internal {
                LineLimits::internal()
            } else {
                LineLimits::standard()
            },
            read: ReadLimits {
                max_file_bytes: args.max_file_bytes,
                ..ReadLimits::default()
            },
        }
    }
}

/// Personal access tokens look like `pat.<account>.<token>.<secret>`.
pub fn account_from_api_key(api_key: &str) -> Option<String> {
    let mut parts = api_key.split('.');
    match (parts.next(), parts.next()) {
        (Some("pat") | Some("sat"), Some(account)) if !account.is_empty() => {
            Some(account.to_string())
        }
        _ => None,
    }
}
