use std::env;

pub const DEFAULT_MAX_ATTENDEES: u64 = 500;

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` runs the service without storage; data routes answer 503.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub bind_addr: String,
    pub max_attendees: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "debug".into());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let max_attendees = match env::var("MAX_ATTENDEES") {
            Ok(value) => parse_max_attendees(&value)?,
            Err(_) => DEFAULT_MAX_ATTENDEES,
        };

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            max_attendees,
        })
    }
}

fn parse_max_attendees(value: &str) -> anyhow::Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) => anyhow::bail!("MAX_ATTENDEES must be a positive integer, got 0"),
        Ok(max) => Ok(max),
        Err(e) => anyhow::bail!("MAX_ATTENDEES must be a positive integer: {e}"),
    }
}
