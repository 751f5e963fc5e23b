use super::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let covenant_dir = home.join(".covenant");
        let config_path = covenant_dir.join("config.toml");

        if !covenant_dir.exists() {
            fs::create_dir_all(&covenant_dir).context("Failed to create .covenant directory")?;
            fs::create_dir_all(covenant_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        let mut config = if config_path.exists() {
            let mut config = Self::read_file(&config_path)?;
            config.workspace_dir = covenant_dir.join("workspace");
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                workspace_dir: covenant_dir.join("workspace"),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without env overrides or validation.
    pub fn read_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::Io)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_writes_readable_toml() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            config_path: dir.path().join("config.toml"),
            workspace_dir: dir.path().join("workspace"),
            app_url: "https://saved.example.com".into(),
            ..Config::default()
        };

        config.save().unwrap();

        let contents = fs::read_to_string(dir.path().join("config.toml")).unwrap();
        let decoded: Config = toml::from_str(&contents).unwrap();
        assert_eq!(decoded.app_url, "https://saved.example.com");
        assert!(contents.contains("[gateway]"));
        assert!(contents.contains("[docusign]"));
    }

    #[test]
    fn read_file_reports_malformed_toml_as_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "app_url = [unterminated").unwrap();

        let err = Config::read_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Load(_))
        ));
    }

    #[test]
    fn read_file_reports_missing_file_as_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::read_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io(_))
        ));
    }

    #[test]
    fn read_file_keeps_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "app_url = \"https://read.example.com\"\n").unwrap();

        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.app_url, "https://read.example.com");
        assert_eq!(config.config_path, path);
    }
}
