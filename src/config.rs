use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::interaction::InteractionConfig;
use crate::optimizer::PackingConfig;
use crate::staging::StagingLayout;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "LOAD_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "LOAD_PLANNER_API_PORT";

    fn from_env() -> Self {
        let (bind_ip, display_host) = parse_host(env_string(Self::HOST_VAR));
        let port = parse_port(env_string(Self::PORT_VAR));
        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

fn parse_host(raw: Option<String>) -> (IpAddr, String) {
    let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    let Some(host_value) = raw else {
        return (default_ip, ApiConfig::DEFAULT_HOST.to_string());
    };
    match host_value.parse::<IpAddr>() {
        Ok(ip) => (ip, host_value),
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                ApiConfig::HOST_VAR,
                host_value,
                err,
                ApiConfig::DEFAULT_HOST
            );
            (default_ip, ApiConfig::DEFAULT_HOST.to_string())
        }
    }
}

fn parse_port(raw: Option<String>) -> u16 {
    match raw {
        Some(raw) => match raw.parse::<u16>() {
            Ok(value) if value != 0 => value,
            Ok(_) => {
                eprintln!(
                    "⚠️ {} must not be 0. Using {}.",
                    ApiConfig::PORT_VAR,
                    ApiConfig::DEFAULT_PORT
                );
                ApiConfig::DEFAULT_PORT
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    ApiConfig::PORT_VAR,
                    raw,
                    err,
                    ApiConfig::DEFAULT_PORT
                );
                ApiConfig::DEFAULT_PORT
            }
        },
        None => ApiConfig::DEFAULT_PORT,
    }
}

/// Configuration of the packer and the interactive tools.
#[derive(Clone, Debug, Default)]
pub struct OptimizerConfig {
    packing: PackingConfig,
    interaction: InteractionConfig,
}

impl OptimizerConfig {
    const MIN_FREE_SPACE_VAR: &'static str = "LOAD_PLANNER_MIN_FREE_SPACE";
    const GENERAL_EPSILON_VAR: &'static str = "LOAD_PLANNER_GENERAL_EPSILON";
    const PARALLEL_TRIALS_VAR: &'static str = "LOAD_PLANNER_PARALLEL_TRIALS";
    const STAGING_OFFSET_VAR: &'static str = "LOAD_PLANNER_STAGING_OFFSET";
    const STAGING_SPACING_VAR: &'static str = "LOAD_PLANNER_STAGING_SPACING";
    const STAGING_ROW_WIDTH_VAR: &'static str = "LOAD_PLANNER_STAGING_ROW_WIDTH";
    const COLLISION_EPSILON_VAR: &'static str = "LOAD_PLANNER_COLLISION_EPSILON";
    const SNAP_THRESHOLD_VAR: &'static str = "LOAD_PLANNER_SNAP_THRESHOLD";

    fn from_env() -> Self {
        let min_free_space = load_f64_with_warning(
            Self::MIN_FREE_SPACE_VAR,
            PackingConfig::DEFAULT_MIN_FREE_SPACE,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted minimum free-space size changes how many gaps are tracked",
        );

        let general_epsilon = load_f64_with_warning(
            Self::GENERAL_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted tolerances may cause numerical instabilities",
        );

        let parallel_trials = env_string(Self::PARALLEL_TRIALS_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_TRIALS_VAR))
            .unwrap_or(PackingConfig::DEFAULT_PARALLEL_TRIALS);

        let staging_offset = load_f64_with_warning(
            Self::STAGING_OFFSET_VAR,
            StagingLayout::DEFAULT_OFFSET,
            |value| value >= 0.0,
            "must not be negative",
            "Note: Staging area offset changed",
        );

        let staging_spacing = load_f64_with_warning(
            Self::STAGING_SPACING_VAR,
            StagingLayout::DEFAULT_SPACING,
            |value| value >= 0.0,
            "must not be negative",
            "Note: Staging area spacing changed",
        );

        let staging_row_width = load_f64_with_warning(
            Self::STAGING_ROW_WIDTH_VAR,
            StagingLayout::DEFAULT_ROW_WIDTH,
            |value| value > 0.0,
            "must be greater than 0",
            "Note: Staging area row width changed",
        );

        let collision_epsilon = load_f64_with_warning(
            Self::COLLISION_EPSILON_VAR,
            InteractionConfig::DEFAULT_COLLISION_EPSILON,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted collision tolerance may let items overlap visibly",
        );

        let snap_threshold = load_f64_with_warning(
            Self::SNAP_THRESHOLD_VAR,
            InteractionConfig::DEFAULT_SNAP_THRESHOLD,
            |value| value >= 0.0,
            "must not be negative",
            "Note: Snap distance changed",
        );

        let packing = PackingConfig::builder()
            .min_free_space(min_free_space)
            .general_epsilon(general_epsilon)
            .parallel_trials(parallel_trials)
            .staging_offset(staging_offset)
            .staging_spacing(staging_spacing)
            .staging_row_width(staging_row_width)
            .build();

        Self {
            packing,
            interaction: InteractionConfig {
                collision_epsilon,
                snap_threshold,
            },
        }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }

    /// Returns the configured InteractionConfig.
    pub fn interaction_config(&self) -> InteractionConfig {
        self.interaction
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            eprintln!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_f64_value(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                println!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            eprintln!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_value(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}
