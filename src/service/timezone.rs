use chrono_tz::Tz;

/// Resolves which timezone a user's commands should be read in.
pub trait TimezoneResolver: Send + Sync {
    fn resolve(&self, user_id: &str) -> Tz;
}

/// Single configured timezone applied to every user. Falls back to UTC
/// when the configured name does not parse.
pub struct ConfiguredTimezones {
    default_tz: Tz,
}

impl ConfiguredTimezones {
    pub fn from_config(raw: Option<String>) -> Self {
        let default_tz = match raw {
            Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                eprintln!("Unrecognized timezone {:?}, falling back to UTC", name);
                Tz::UTC
            }),
            None => Tz::UTC,
        };
        Self { default_tz }
    }

    pub fn new(default_tz: Tz) -> Self {
        Self { default_tz }
    }
}

impl TimezoneResolver for ConfiguredTimezones {
    fn resolve(&self, _user_id: &str) -> Tz {
        self.default_tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_parses_iana_names() {
        let resolver = ConfiguredTimezones::from_config(Some("America/New_York".to_string()));
        assert_eq!(resolver.resolve("u1"), chrono_tz::America::New_York);
    }

    #[test]
    fn from_config_falls_back_to_utc() {
        let resolver = ConfiguredTimezones::from_config(Some("Mars/Olympus".to_string()));
        assert_eq!(resolver.resolve("u1"), Tz::UTC);
        let resolver = ConfiguredTimezones::from_config(None);
        assert_eq!(resolver.resolve("u1"), Tz::UTC);
    }
}
