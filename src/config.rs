// ABOUTME: Loads server_options.properties, falling back to defaults on any invalid value (§6)
// ABOUTME: Synchronous and run once at startup; never touched on a per-connection path

use std::path::Path;
use std::time::Duration;

use tracing::warn;

/// Runtime configuration read from `server_options.properties`.
///
/// Every field has a documented default; a malformed line never fails startup, it just
/// falls back to that default and logs a warning (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub keep_alive: bool,
    pub keep_alive_timeout: Duration,
    pub buffer_pools: usize,
    pub threads_number: usize,
    pub server_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            keep_alive: true,
            keep_alive_timeout: Duration::from_secs(30),
            buffer_pools: 128,
            threads_number: 8,
            server_name: "fast-socket-api".to_string(),
        }
    }
}

impl Config {
    /// Reads `path` line by line as `key=value` pairs, applying only the keys this crate
    /// recognizes. Missing file, missing keys, or unparsable values all resolve to the
    /// corresponding default rather than an error.
    pub fn load_from(path: impl AsRef<Path>) -> Config {
        let mut config = Config::default();
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                warn!(path = %path.display(), "config file missing, using defaults");
                return config;
            }
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "keepAlive" => match value.parse::<bool>() {
                    Ok(v) => config.keep_alive = v,
                    Err(_) => warn!(key, value, "invalid bool, keeping default"),
                },
                "keepAliveTimeoutSeconds" => match value.parse::<u64>() {
                    Ok(v) if v > 0 => config.keep_alive_timeout = Duration::from_secs(v),
                    _ => warn!(key, value, "invalid positive int, keeping default"),
                },
                "bufferPools" => match value.parse::<usize>() {
                    Ok(v) if v > 0 => config.buffer_pools = v,
                    _ => warn!(key, value, "invalid positive int, keeping default"),
                },
                "threadsNumber" => match value.parse::<usize>() {
                    Ok(v) if v > 0 => config.threads_number = v,
                    _ => warn!(key, value, "invalid positive int, keeping default"),
                },
                "server_name" => config.server_name = value.to_string(),
                _ => {}
            }
        }
        config
    }

    /// Loads from `server_options.properties` in the current working directory.
    pub fn load() -> Config {
        Config::load_from("server_options.properties")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from("/nonexistent/server_options.properties");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn recognized_keys_override_defaults() {
        let file = write_temp(
            "keepAlive=false\nkeepAliveTimeoutSeconds=5\nbufferPools=16\nthreadsNumber=2\nserver_name=custom\n",
        );
        let config = Config::load_from(file.path());
        assert_eq!(config.keep_alive, false);
        assert_eq!(config.keep_alive_timeout, Duration::from_secs(5));
        assert_eq!(config.buffer_pools, 16);
        assert_eq!(config.threads_number, 2);
        assert_eq!(config.server_name, "custom");
    }

    #[test]
    fn invalid_numeric_values_fall_back_to_defaults() {
        let file = write_temp("keepAliveTimeoutSeconds=-5\nbufferPools=notanumber\nthreadsNumber=0\n");
        let config = Config::load_from(file.path());
        assert_eq!(config.keep_alive_timeout, Duration::from_secs(30));
        assert_eq!(config.buffer_pools, 128);
        assert_eq!(config.threads_number, 8);
    }

    #[test]
    fn blank_lines_and_comments_are_ignored() {
        let file = write_temp("# comment\n\nserver_name=quiet\n");
        let config = Config::load_from(file.path());
        assert_eq!(config.server_name, "quiet");
    }
}
