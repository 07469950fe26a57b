//! Command-line and config-file handling.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, an optional TOML file named by `--config`, and built-in
//! defaults (one-second period, Fahrenheit, console transport, thermistor
//! on the default ADC channel, no audit log).

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thermo_core::{
    DeviceSettings, DomainError, Period, TemperatureUnit, DEFAULT_ADC_PATH,
};
use thiserror::Error;

/// thermod - periodic temperature reporting with remote control
#[derive(Parser, Debug, Default)]
#[command(name = "thermod", version, about)]
pub struct Args {
    /// Temperature scale for readings (C or F)
    #[arg(long)]
    pub scale: Option<TemperatureUnit>,

    /// Seconds between readings
    #[arg(long)]
    pub period: Option<u64>,

    /// Append readings and accepted commands to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Connect to this host over TLS instead of using stdin/stdout
    #[arg(long)]
    pub host: Option<String>,

    /// Device identifier announced on the TLS channel
    #[arg(long)]
    pub id: Option<u64>,

    /// TLS port (requires --host)
    pub port: Option<u16>,

    /// sysfs GPIO directory of the shutdown button (e.g. /sys/class/gpio/gpio73)
    #[arg(long)]
    pub button: Option<PathBuf>,

    /// Raw ADC file for the thermistor
    #[arg(long, conflicts_with = "simulate")]
    pub adc: Option<PathBuf>,

    /// Report a constant temperature (Celsius) instead of reading hardware
    #[arg(long, value_name = "CELSIUS", allow_negative_numbers = true)]
    pub simulate: Option<f64>,

    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub scale: Option<TemperatureUnit>,
    pub period: Option<u64>,
    pub log: Option<PathBuf>,
    pub host: Option<String>,
    pub id: Option<u64>,
    pub port: Option<u16>,
    pub button: Option<PathBuf>,
    pub adc: Option<PathBuf>,
    pub simulate: Option<f64>,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Where the control channel lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// stdin for control, stdout for readings
    Console,
    /// Encrypted TCP connection to a remote observer
    Tls { host: String, port: u16, id: u64 },
}

/// Where temperatures come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorConfig {
    Thermistor { adc_path: PathBuf },
    Fixed { celsius: f64 },
}

/// Resolved, validated daemon configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub settings: DeviceSettings,
    pub log_path: Option<PathBuf>,
    pub transport: TransportConfig,
    pub button: Option<PathBuf>,
    pub sensor: SensorConfig,
}

impl DaemonConfig {
    /// Merges `args` over the config file they name, then validates.
    pub fn resolve(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Merges `args` over `file` and validates the result.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let unit = args.scale.or(file.scale).unwrap_or_default();
        let period = match args.period.or(file.period) {
            Some(secs) => Period::new(secs).map_err(ConfigError::InvalidPeriod)?,
            None => Period::DEFAULT,
        };

        let transport = transport_config(
            args.host.or(file.host),
            args.id.or(file.id),
            args.port.or(file.port),
        )?;

        // A sensor chosen on the command line wins over either choice in the file.
        let sensor = match (args.simulate, args.adc) {
            (Some(celsius), _) => SensorConfig::Fixed { celsius },
            (None, Some(adc_path)) => SensorConfig::Thermistor { adc_path },
            (None, None) => match (file.simulate, file.adc) {
                (Some(_), Some(_)) => return Err(ConfigError::ConflictingSensors),
                (Some(celsius), None) => SensorConfig::Fixed { celsius },
                (None, adc) => SensorConfig::Thermistor {
                    adc_path: adc.unwrap_or_else(|| PathBuf::from(DEFAULT_ADC_PATH)),
                },
            },
        };

        Ok(Self {
            settings: DeviceSettings { period, unit },
            log_path: args.log.or(file.log),
            transport,
            button: args.button.or(file.button),
            sensor,
        })
    }
}

fn transport_config(
    host: Option<String>,
    id: Option<u64>,
    port: Option<u16>,
) -> Result<TransportConfig, ConfigError> {
    match (host, id, port) {
        (None, None, None) => Ok(TransportConfig::Console),
        (None, Some(_), _) => Err(ConfigError::TlsFieldWithoutHost { field: "id" }),
        (None, None, Some(_)) => Err(ConfigError::TlsFieldWithoutHost { field: "port" }),
        (Some(_), None, _) => Err(ConfigError::MissingTlsField { field: "id" }),
        (Some(_), Some(_), None) => Err(ConfigError::MissingTlsField { field: "port" }),
        (Some(host), Some(id), Some(port)) => {
            if host.trim().is_empty() {
                return Err(ConfigError::MissingTlsField { field: "host" });
            }
            Ok(TransportConfig::Tls { host, port, id })
        }
    }
}

/// Configuration faults. All of them exit with status 1.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[source] DomainError),

    #[error("TLS mode requires --{field}")]
    MissingTlsField { field: &'static str },

    #[error("--{field} is only valid together with --host")]
    TlsFieldWithoutHost { field: &'static str },

    #[error("Config file sets both adc and simulate")]
    ConflictingSensors,

    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
