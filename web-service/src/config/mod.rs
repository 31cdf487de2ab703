use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::readiness::{ProbeConfig, ProbeTarget};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variables as read at startup.
pub type Vars = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub app: AppIdentity,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub static_path: String,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub rate_limit: RateLimitConfig,
    pub readiness: ReadinessConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Prod,
    Uat,
    Dev,
    Local,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Uat => "uat",
            Environment::Dev => "dev",
            Environment::Local => "local",
        }
    }

    /// Anything but a developer environment is reachable by the public.
    pub fn is_public(&self) -> bool {
        !matches!(self, Environment::Dev | Environment::Local)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Prod),
            "uat" | "staging" | "qa" | "test" => Ok(Environment::Uat),
            "dev" | "develop" | "development" => Ok(Environment::Dev),
            "local" | "developer" => Ok(Environment::Local),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Name, version and tag reported by `/health` and `X-Powered-By`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
    pub tag: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}", self.host)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub probe: ProbeConfig,
    pub extra_targets: Vec<ProbeTarget>,
}

impl WebConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        Self::from_vars(common, &env::vars().collect())
    }

    pub fn from_vars(common: core_config::Config, vars: &Vars) -> Result<Self, AppError> {
        let environment = match vars.get("ENVIRONMENT") {
            Some(value) => value
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            None => Environment::Prod,
        };
        let is_prod = environment == Environment::Prod;

        let name = get_env(vars, "APP_NAME", Some(env!("CARGO_PKG_NAME")), false)?;
        let version = get_env(vars, "APP_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?;
        let tag = match vars.get("APP_TAG") {
            Some(tag) => tag.clone(),
            None => format!("{}-v{}-{}", name, version, environment).to_lowercase(),
        };
        let url = match vars.get("APP_URL") {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}", common.port),
        };

        let mongo_host = get_env(vars, "MONGO_HOST", Some("localhost:27017"), is_prod)?;
        let database = get_env(vars, "MONGO_DATABASE", Some("test"), false)?;
        let uri = match vars.get("MONGO_URI") {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}/{}", mongo_host, database),
        };
        let redis_host = get_env(vars, "REDIS_HOST", Some("localhost:6379"), is_prod)?;

        let defaults = ProbeConfig::default();
        let probe = ProbeConfig {
            initial_delay: get_millis(vars, "READINESS_INITIAL_DELAY_MS", defaults.initial_delay)?,
            poll_interval: get_millis(vars, "READINESS_POLL_INTERVAL_MS", defaults.poll_interval)?,
            timeout: get_millis(vars, "READINESS_TIMEOUT_MS", defaults.timeout)?,
            tcp_timeout: get_millis(vars, "READINESS_TCP_TIMEOUT_MS", defaults.tcp_timeout)?,
            stabilization_window: get_millis(
                vars,
                "READINESS_WINDOW_MS",
                defaults.stabilization_window,
            )?,
            check_timeout: get_millis(vars, "READINESS_CHECK_TIMEOUT_MS", defaults.check_timeout)?,
        };
        let extra_targets = vars
            .get("READINESS_EXTRA_TARGETS")
            .map(|list| parse_targets(list))
            .transpose()?
            .unwrap_or_default();

        Ok(WebConfig {
            environment,
            app: AppIdentity {
                name,
                version,
                tag,
                url,
            },
            log_level: get_env(vars, "LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: vars.get("OTLP_ENDPOINT").filter(|e| !e.is_empty()).cloned(),
            static_path: get_env(vars, "STATIC_PATH", Some("public"), false)?,
            mongodb: MongoConfig {
                host: mongo_host,
                uri: Secret::new(uri),
                database,
            },
            redis: RedisConfig { host: redis_host },
            rate_limit: RateLimitConfig {
                max_requests: get_parsed(vars, "RATE_LIMIT_MAX", 30)?,
                window_seconds: get_parsed(vars, "RATE_LIMIT_WINDOW_SECONDS", 120)?,
            },
            readiness: ReadinessConfig {
                probe,
                extra_targets,
            },
            common,
        })
    }

    /// Database and cache endpoints first, then any extra resources.
    pub fn readiness_targets(&self) -> Vec<ProbeTarget> {
        let mut targets = vec![
            ProbeTarget::database(self.mongodb.host.clone()),
            ProbeTarget::cache(self.redis.host.clone()),
        ];
        targets.extend(self.readiness.extra_targets.iter().cloned());
        targets
    }
}

fn parse_targets(list: &str) -> Result<Vec<ProbeTarget>, AppError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ProbeTarget>()
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))
        })
        .collect()
}

fn get_env(vars: &Vars, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match vars.get(key) {
        Some(val) => Ok(val.clone()),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(vars: &Vars, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} is not valid ({}): {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

fn get_millis(vars: &Vars, key: &str, default: Duration) -> Result<Duration, AppError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    get_parsed(vars, key, default_ms).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> Vars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<WebConfig, AppError> {
        WebConfig::from_vars(core_config::Config::default(), &vars(pairs))
    }

    #[test]
    fn environment_aliases_collapse_to_four_classes() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("QA".parse::<Environment>(), Ok(Environment::Uat));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Uat));
        assert_eq!("develop".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!("developer".parse::<Environment>(), Ok(Environment::Local));
        assert!("sandbox".parse::<Environment>().is_err());

        assert!(Environment::Uat.is_public());
        assert!(!Environment::Local.is_public());
    }

    #[test]
    fn developer_defaults() {
        let config = load(&[("ENVIRONMENT", "dev")]).unwrap();

        assert_eq!(config.readiness.probe, ProbeConfig::default());
        assert_eq!(config.mongodb.host, "localhost:27017");
        assert_eq!(config.mongodb.uri.expose_secret(), "mongodb://localhost:27017/test");
        assert_eq!(config.redis.url(), "redis://localhost:6379");
        assert_eq!(config.static_path, "public");
        assert_eq!(config.app.url, "http://localhost:3000");
        assert_eq!(
            config.rate_limit,
            RateLimitConfig {
                max_requests: 30,
                window_seconds: 120
            }
        );
        assert_eq!(
            config.app.tag,
            format!("web-service-v{}-dev", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn app_tag_is_lower_cased() {
        let config = load(&[
            ("ENVIRONMENT", "Local"),
            ("APP_NAME", "Storefront"),
            ("APP_VERSION", "2.1.0-RC1"),
        ])
        .unwrap();
        assert_eq!(config.app.tag, "storefront-v2.1.0-rc1-local");
    }

    #[test]
    fn production_requires_dependency_hosts() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("MONGO_HOST"));

        let config = load(&[
            ("MONGO_HOST", "mongo:27017"),
            ("REDIS_HOST", "redis:6379"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.mongodb.uri.expose_secret(), "mongodb://mongo:27017/test");
    }

    #[test]
    fn mongo_uri_overrides_host() {
        let config = load(&[
            ("ENVIRONMENT", "dev"),
            ("MONGO_HOST", "mongo:27017"),
            ("MONGO_URI", "mongodb://user:pw@replica-1,replica-2/app"),
        ])
        .unwrap();

        assert_eq!(config.mongodb.host, "mongo:27017");
        assert_eq!(
            config.mongodb.uri.expose_secret(),
            "mongodb://user:pw@replica-1,replica-2/app"
        );
        assert!(!format!("{:?}", config.mongodb).contains("pw@"));
    }

    #[test]
    fn readiness_settings_come_from_env() {
        let config = load(&[
            ("ENVIRONMENT", "dev"),
            ("READINESS_INITIAL_DELAY_MS", "0"),
            ("READINESS_POLL_INTERVAL_MS", "250"),
            ("READINESS_TIMEOUT_MS", "5000"),
            ("READINESS_WINDOW_MS", "750"),
            ("READINESS_EXTRA_TARGETS", "tcp:search:9200, queue:5672"),
        ])
        .unwrap();

        assert_eq!(config.readiness.probe.initial_delay, Duration::ZERO);
        assert_eq!(config.readiness.probe.poll_interval, Duration::from_millis(250));
        assert_eq!(config.readiness.probe.timeout, Duration::from_secs(5));
        assert_eq!(config.readiness.probe.stabilization_window, Duration::from_millis(750));

        let targets: Vec<String> = config
            .readiness_targets()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            targets,
            vec![
                "database:localhost:27017",
                "cache:localhost:6379",
                "tcp:search:9200",
                "tcp:queue:5672",
            ]
        );
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = load(&[("ENVIRONMENT", "dev"), ("READINESS_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("READINESS_TIMEOUT_MS"));

        let err = load(&[("ENVIRONMENT", "dev"), ("READINESS_EXTRA_TARGETS", "nohost")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
