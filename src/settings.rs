use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Http {
    pub listen: String,
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    pub dir: String,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub uploads: Uploads,
}

impl Settings {
    /// Loads defaults, then `path` if it exists, then `REFERRALS__*` variables
    /// (e.g. `REFERRALS__HTTP__LISTEN`).
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::load(path, Environment::with_prefix("REFERRALS"))
    }

    fn load(path: &str, environment: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("http.listen", "0.0.0.0:3000")?
            .set_default("http.channel_capacity", 512_i64)?
            .set_default("uploads.dir", "public/uploads")?
            .set_default("uploads.max_file_size_mb", 10_i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(environment.separator("__").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.uploads.max_file_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let settings = Settings::new(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.http.channel_capacity, 512);
        assert_eq!(settings.uploads.dir, "public/uploads");
        assert_eq!(settings.max_upload_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("referrals.toml");
        std::fs::write(
            &path,
            "[http]\nlisten = \"127.0.0.1:8088\"\n\n[uploads]\nmax_file_size_mb = 2\n",
        )
        .unwrap();

        let settings = Settings::new(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.http.listen, "127.0.0.1:8088");
        assert_eq!(settings.http.channel_capacity, 512);
        assert_eq!(settings.max_upload_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("referrals.toml");
        std::fs::write(&path, "[http]\nlisten = \"127.0.0.1:8088\"\n").unwrap();
        let variables: config::Map<String, String> = [
            ("REFERRALS__HTTP__LISTEN", "127.0.0.1:9099"),
            ("REFERRALS__HTTP__CHANNEL_CAPACITY", "64"),
            ("OTHER__HTTP__LISTEN", "0.0.0.0:1"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let settings = Settings::load(
            path.to_str().unwrap(),
            Environment::with_prefix("REFERRALS").source(Some(variables)),
        )
        .unwrap();

        assert_eq!(settings.http.listen, "127.0.0.1:9099");
        assert_eq!(settings.http.channel_capacity, 64);
    }
}
