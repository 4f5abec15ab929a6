use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use trans_overlay_engine::render::{
    DEFAULT_ACCENT_COLOR, DEFAULT_MAX_INPUT_LEN, EmojiOptions, RenderOptions,
};

pub const DEFAULT_TEMPLATE: &str = "<p>翻译自日语</p>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read template file at {template_path}: {source}")]
    TemplateReadError {
        template_path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    pub base: String,
    pub folder: String,
    pub ext: String,
    pub class_name: String,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        let options = EmojiOptions::default();
        Self {
            base: options.base,
            folder: options.folder,
            ext: options.ext,
            class_name: options.class_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template used when the caller supplies none.
    pub default_template: String,
    /// File holding the default template; takes precedence over
    /// `default_template` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    pub accent_color: String,
    pub max_input_len: usize,
    pub emoji: EmojiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_template: DEFAULT_TEMPLATE.to_string(),
            template_path: None,
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            emoji: EmojiConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the template path
        config.template_path = config
            .template_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/trans-overlay");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The template to fall back on: the template file's contents if one is
    /// configured, otherwise `default_template`.
    pub fn resolve_default_template(&self) -> Result<String, ConfigError> {
        let Some(template_path) = &self.template_path else {
            return Ok(self.default_template.clone());
        };
        std::fs::read_to_string(template_path)
            .map(|template| template.trim().to_string())
            .map_err(|source| ConfigError::TemplateReadError {
                template_path: template_path.clone(),
                source,
            })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            accent_color: self.accent_color.clone(),
            max_input_len: self.max_input_len,
            emoji: EmojiOptions {
                base: self.emoji.base.clone(),
                folder: self.emoji.folder.clone(),
                ext: self.emoji.ext.clone(),
                class_name: self.emoji.class_name.clone(),
            },
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/trans-overlay/config.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            accent_color: "#FF0000".to_string(),
            template_path: Some(PathBuf::from("/tmp/template.html")),
            ..Config::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str(
            r#"
accent_color = "green"

[emoji]
folder = "72x72"
ext = ".png"
"#,
        )
        .unwrap();

        assert_eq!(config.accent_color, "green");
        assert_eq!(config.default_template, DEFAULT_TEMPLATE);
        assert_eq!(config.max_input_len, DEFAULT_MAX_INPUT_LEN);
        assert_eq!(config.emoji.folder, "72x72");
        assert_eq!(config.emoji.class_name, "emoji");
    }

    #[test]
    fn test_render_options_mapping() {
        let mut config = Config::default();
        config.emoji.ext = ".png".to_string();
        config.max_input_len = 10;

        let options = config.render_options();

        assert_eq!(options.max_input_len, 10);
        assert_eq!(options.emoji.ext, ".png");
        assert_eq!(options.accent_color, DEFAULT_ACCENT_COLOR);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("TRANS_OVERLAY_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$TRANS_OVERLAY_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("TRANS_OVERLAY_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "max_input_len = \"lots\"").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            default_template: "<p>翻译自英语</p>".to_string(),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_template_file_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let template_file = temp_dir.path().join("template.html");
        std::fs::write(&template_file, "<p>from file</p>\n").unwrap();
        let config = Config {
            template_path: Some(template_file),
            ..Config::default()
        };

        assert_eq!(config.resolve_default_template().unwrap(), "<p>from file</p>");
        assert_eq!(
            Config::default().resolve_default_template().unwrap(),
            DEFAULT_TEMPLATE
        );
    }

    #[test]
    fn test_missing_template_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            template_path: Some(temp_dir.path().join("missing.html")),
            ..Config::default()
        };

        let err = config.resolve_default_template().unwrap_err();

        assert!(matches!(err, ConfigError::TemplateReadError { .. }));
    }
}
