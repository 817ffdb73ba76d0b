use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Extra consecutive ports tried when `port` is already taken.
    pub port_fallbacks: u16,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub tagging_timeout: Duration,
    pub bcrypt_cost: u32,
    pub seed_samples: bool,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            port_fallbacks: 3,
            uploads_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4".to_string(),
            tagging_timeout: Duration::from_secs(5),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            seed_samples: true,
            log_json: false,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            port_fallbacks: env_parse("PORT_FALLBACKS", defaults.port_fallbacks),
            uploads_dir: env_string("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_base_url: env_string("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: env_string("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            tagging_timeout: Duration::from_millis(env_parse(
                "TAGGING_TIMEOUT_MS",
                defaults.tagging_timeout.as_millis() as u64,
            )),
            bcrypt_cost: env_parse("BCRYPT_COST", defaults.bcrypt_cost),
            seed_samples: env_bool("SEED_SAMPLES", defaults.seed_samples),
            log_json: env_bool("LOG_JSON", defaults.log_json),
        }
    }

    /// `port` followed by its fallbacks, skipping anything past `u16::MAX`.
    pub fn candidate_ports(&self) -> Vec<u16> {
        (0..=self.port_fallbacks)
            .filter_map(|offset| self.port.checked_add(offset))
            .collect()
    }

    /// Request body cap: the image limit plus room for the text parts of the form.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(64 * 1024)
    }
}
