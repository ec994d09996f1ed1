//! Application configuration loaded from a TOML file.
//!
//! The default configuration matches the values shown in `config/default.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::tree::state::ViewFilter;

/// Top-level application configuration.
///
/// All fields have defaults so mdview works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// The tree filter the explorer starts with.
    pub fn view_filter(&self) -> ViewFilter {
        ViewFilter {
            show_hidden: self.general.show_hidden,
            markdown_only: self.general.markdown_only,
        }
    }
}

/// General explorer preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub show_hidden: bool,
    #[serde(default)]
    pub markdown_only: bool,
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            markdown_only: false,
            confirm_delete: true,
        }
    }
}

/// Tree pane behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Window in which a second click counts as a double click.
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
    /// Columns of indentation per tree level.
    #[serde(default = "default_indent")]
    pub indent: u16,
}

impl ExplorerConfig {
    pub fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            double_click_ms: default_double_click_ms(),
            indent: default_indent(),
        }
    }
}

/// Live refresh on external file-system changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Preview pane configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Render markdown files instead of showing their source.
    #[serde(default = "default_true")]
    pub render_markdown: bool,
    /// syntect theme for source files and fenced code blocks.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            render_markdown: true,
            syntax_theme: default_syntax_theme(),
        }
    }
}

/// Log output of the terminal front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_double_click_ms() -> u64 {
    250
}

fn default_indent() -> u16 {
    2
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/mdview.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();

        assert!(!config.general.show_hidden);
        assert!(!config.general.markdown_only);
        assert!(config.general.confirm_delete);
        assert_eq!(config.explorer.double_click(), Duration::from_millis(250));
        assert_eq!(config.explorer.indent, 2);
        assert!(config.watch.enabled);
        assert_eq!(config.watch.debounce(), Duration::from_millis(200));
        assert!(config.preview.enabled);
        assert!(config.preview.render_markdown);
        assert_eq!(config.preview.syntax_theme, "base16-ocean.dark");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, PathBuf::from("/tmp/mdview.log"));
    }

    #[test]
    fn load_full_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[general]
show_hidden = true
markdown_only = true
confirm_delete = false

[explorer]
double_click_ms = 400
indent = 4

[watch]
enabled = false
debounce_ms = 50

[preview]
enabled = false
render_markdown = false
syntax_theme = "InspiredGitHub"

[log]
level = "info"
file = "/var/log/mdview.log"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert!(config.general.show_hidden);
        assert!(config.general.markdown_only);
        assert!(!config.general.confirm_delete);
        assert_eq!(config.explorer.double_click_ms, 400);
        assert_eq!(config.explorer.indent, 4);
        assert!(!config.watch.enabled);
        assert_eq!(config.watch.debounce_ms, 50);
        assert!(!config.preview.enabled);
        assert!(!config.preview.render_markdown);
        assert_eq!(config.preview.syntax_theme, "InspiredGitHub");
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.file, PathBuf::from("/var/log/mdview.log"));

        let filter = config.view_filter();
        assert!(filter.show_hidden && filter.markdown_only);
    }

    #[test]
    fn load_partial_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[explorer]
double_click_ms = 300
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.explorer.double_click_ms, 300);
        assert_eq!(config.explorer.indent, 2);
        assert!(config.general.confirm_delete);
        assert!(config.watch.enabled);
    }

    #[test]
    fn load_empty_toml_uses_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        let default = Config::default();

        assert_eq!(config.general.show_hidden, default.general.show_hidden);
        assert_eq!(config.watch.debounce_ms, default.watch.debounce_ms);
        assert_eq!(config.log.level, default.log.level);
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nonexistent.toml"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid [[[toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), CoreError::ConfigParse(_)));
    }

    #[test]
    fn wrong_type_is_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[explorer]\ndouble_click_ms = \"fast\"\n").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CoreError::ConfigParse(_)
        ));
    }
}
