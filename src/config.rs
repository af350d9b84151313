use std::env;
use std::time::Duration;

/// One year. Longer lifetimes are rejected at startup.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub session_ttl_hours: i64,
    pub mock_latency: Duration,
    pub seed_demo_data: bool,
    pub demo_user: Option<(String, String)>,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let session_ttl_hours = match get("SESSION_TTL_HOURS") {
            Some(s) => {
                let hours = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| anyhow::anyhow!("SESSION_TTL_HOURS: {e}"))?;
                if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
                    anyhow::bail!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}, got {hours}");
                }
                hours
            }
            None => 24,
        };
        let mock_latency = get("MOCK_LATENCY_MS")
            .map(|s| s.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("MOCK_LATENCY_MS: {e}"))?
            .map(Duration::from_millis)
            .unwrap_or_default();
        let seed_demo_data = get("SEED_DEMO_DATA")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(true);
        let demo_user = match (get("DEMO_USER_EMAIL"), get("DEMO_USER_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            session_ttl_hours,
            mock_latency,
            seed_demo_data,
            demo_user,
        })
    }
}
