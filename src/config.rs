use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Supabase project credentials (auth endpoint and service-role key)
#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
    pub anon_key: String,
}

/// Facebook app credentials and Graph API location
#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub app_id: String,
    pub app_secret: String,
    pub graph_url: String,
    pub graph_version: String,
}

/// ECPay merchant settings
#[derive(Debug, Clone)]
pub struct EcpayConfig {
    pub merchant_id: String,
    pub hash_key: String,
    pub hash_iv: String,
    pub env: String,
    pub return_url: String,
    pub order_result_url: String,
    pub pay_site_url: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub supabase: SupabaseConfig,
    pub facebook: FacebookConfig,
    pub ecpay: EcpayConfig,
    pub log_level: String,
    pub http_port: u16,
    pub environment: String,
    pub public_functions_url: String,
    pub auto_grouping_interval_secs: Option<u64>,
}

fn var_or_default(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let acquire_timeout_secs = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_secs = env::var("DATABASE_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600); // 10 minutes

        let max_lifetime_secs = env::var("DATABASE_MAX_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1800); // 30 minutes

        let test_before_acquire = env::var("DATABASE_TEST_BEFORE_ACQUIRE")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/campus_nerds".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl SupabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: var_or_default("SUPABASE_URL").trim_end_matches('/').to_string(),
            service_role_key: var_or_default("SUPABASE_SERVICE_ROLE_KEY"),
            anon_key: var_or_default("SUPABASE_ANON_KEY"),
        }
    }
}

impl FacebookConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_id: var_or_default("FB_APP_ID"),
            app_secret: var_or_default("FB_APP_SECRET"),
            graph_url: env::var("FB_GRAPH_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.graph_url),
            graph_version: env::var("FB_GRAPH_VERSION").unwrap_or(defaults.graph_version),
        }
    }
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            graph_url: "https://graph.facebook.com".to_string(),
            graph_version: "v18.0".to_string(),
        }
    }
}

impl EcpayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            merchant_id: var_or_default("ECPAY_MERCHANT_ID"),
            hash_key: var_or_default("ECPAY_HASH_KEY"),
            hash_iv: var_or_default("ECPAY_HASH_IV"),
            env: env::var("ECPAY_ENV")
                .map(|e| e.to_lowercase())
                .unwrap_or(defaults.env),
            return_url: var_or_default("ECPAY_RETURN_URL"),
            order_result_url: var_or_default("ECPAY_ORDER_RESULT_URL"),
            pay_site_url: env::var("PAY_SITE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.pay_site_url),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == "prod"
    }
}

impl Default for EcpayConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            hash_key: String::new(),
            hash_iv: String::new(),
            env: "prod".to_string(),
            return_url: String::new(),
            order_result_url: String::new(),
            pay_site_url: "https://pay.campusnerds.app".to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;
        let supabase = SupabaseConfig::from_env();
        let facebook = FacebookConfig::from_env();
        let ecpay = EcpayConfig::from_env();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let http_port = env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let public_functions_url = env::var("PUBLIC_FUNCTIONS_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("{}/functions/v1", supabase.url));

        let auto_grouping_interval_secs = env::var("AUTO_GROUPING_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0);

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let config = Self {
            database,
            supabase,
            facebook,
            ecpay,
            log_level: log_level.to_lowercase(),
            http_port,
            environment: environment.to_lowercase(),
            public_functions_url,
            auto_grouping_interval_secs,
        };

        if config.is_production() {
            config.require_secrets()?;
        }

        Ok(config)
    }

    /// Vendor credentials that must be present before serving production traffic
    pub fn require_secrets(&self) -> Result<(), String> {
        let required = [
            ("SUPABASE_URL", &self.supabase.url),
            ("SUPABASE_SERVICE_ROLE_KEY", &self.supabase.service_role_key),
            ("FB_APP_SECRET", &self.facebook.app_secret),
            ("ECPAY_MERCHANT_ID", &self.ecpay.merchant_id),
            ("ECPAY_HASH_KEY", &self.ecpay.hash_key),
            ("ECPAY_HASH_IV", &self.ecpay.hash_iv),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required settings: {}", missing.join(", ")))
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            supabase: SupabaseConfig::default(),
            facebook: FacebookConfig::default(),
            ecpay: EcpayConfig::default(),
            log_level: "info".to_string(),
            http_port: 8080,
            environment: "development".to_string(),
            public_functions_url: "/functions/v1".to_string(),
            auto_grouping_interval_secs: None,
        }
    }
}
