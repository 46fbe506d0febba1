use std::env;
use std::time::Duration;

const DEFAULT_CATALOG_URL: &str = "https://www.consumerfinance.gov/data.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub catalog_url: String,
    pub database_path: String,
    pub template_dir: String,
    pub fetch_timeout: Duration,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid port number (1-65535)");

        let catalog_url =
            env::var("CATALOG_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());

        let database_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "catalog.db".to_string());

        let template_dir = env::var("TEMPLATE_DIR").unwrap_or_else(|_| "static".to_string());

        Self {
            port,
            catalog_url,
            database_path,
            template_dir,
            fetch_timeout: duration_secs("FETCH_TIMEOUT_SECS", 10),
            request_timeout: duration_secs("REQUEST_TIMEOUT_SECS", 30),
            // upper bound on draining in-flight requests at shutdown
            shutdown_grace: duration_secs("SHUTDOWN_GRACE_SECS", 30 * 60),
        }
    }
}

fn duration_secs(var: &str, default: u64) -> Duration {
    let secs = env::var(var)
        .map(|raw| {
            raw.parse::<u64>()
                .unwrap_or_else(|_| panic!("{var} must be a whole number of seconds"))
        })
        .unwrap_or(default);

    Duration::from_secs(secs)
}
