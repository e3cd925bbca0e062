use std::collections::HashMap;
use std::env;
use std::fs;

/// Key=value configuration, loaded from the file named by `CONFIG_FILE`
/// when that variable is set. Lookups fall back to process environment
/// variables, so either source works for any key.
///
/// Recognized keys: `RUN_MODE` (api|cli), `API_PORT`, `DEFAULT_USER_ID`,
/// `USER_TIMEZONE`, `OPENAI_API_KEY`, `CALENDAR_MODE` (google|memory),
/// `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REFRESH_TOKEN`.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> Self {
        match env::var("CONFIG_FILE") {
            Ok(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
                eprintln!("Failed to read config file {}: {}", path, err);
                AppConfig::default()
            }),
            Err(_) => AppConfig::default(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            values.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
        Ok(Self { values })
    }

    /// File value first, then the process environment.
    pub fn prop(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
