use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use rings_chord::config::RingConfig;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::logging::LogLevel;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

pub const DEFAULT_CONFIG_LOCATION: &str = "~/.rings/chord.yaml";
pub const DEFAULT_INSPECT_INTERVAL_MS: u64 = 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// When there is no `ring` section in the YAML file,
    /// its deserialization is equivalent to `RingConfig::default()`.
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Interval of topology dumps, in ms.
    #[serde(default = "default_inspect_interval_ms")]
    pub inspect_interval_ms: u64,
}

fn default_inspect_interval_ms() -> u64 {
    DEFAULT_INSPECT_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            log_level: LogLevel::default(),
            inspect_interval_ms: DEFAULT_INSPECT_INTERVAL_MS,
        }
    }
}

impl Config {
    pub fn new(hostname: &str) -> Self {
        Self {
            ring: RingConfig::new(hostname),
            ..Default::default()
        }
    }

    /// Check the ring config and the daemon intervals.
    pub fn validate(&self) -> Result<()> {
        self.ring.validate()?;
        if self.inspect_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "inspect_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inspect_interval(&self) -> Duration {
        Duration::from_millis(self.inspect_interval_ms)
    }

    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f = fs::File::create(path.as_path()).map_err(Error::CreateFileError)?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self).map_err(Error::EncodeError)?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(Error::OpenFileError)?;
        let f_rdr = io::BufReader::new(f);
        let config: Config = serde_yaml::from_reader(f_rdr).map_err(Error::DecodeError)?;
        config.validate()?;
        Ok(config)
    }
}
