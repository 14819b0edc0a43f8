//! Layered configuration.
//!
//! Sources, later ones winning:
//! 1. built-in defaults (platform data/cache directories),
//! 2. `config.toml` then `config.yaml` in the platform config directory, or
//!    a single explicitly given file instead,
//! 3. `PAGEKEEP_` environment variables, `__` separating sections
//!    (`PAGEKEEP_DATABASE__PATH=/tmp/catalog.sqlite`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PAGEKEEP_";
const APPLICATION: &str = "pagekeep";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub database: DatabaseConfig,
    pub thumbnails: ThumbnailConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directories scanned by "scan all".
    pub roots: Vec<PathBuf>,
    /// File extensions (without the dot) considered documents; matched
    /// case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self { roots: Vec::new(), extensions: vec!["pdf".to_string()] }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: data_dir().join("catalog.sqlite") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { dir: cache_dir().join("thumbnails"), width: 200, height: 300 }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

// Without a home directory, fall back to a dot-directory next to the process.
fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".pagekeep"))
}

fn cache_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".pagekeep/cache"))
}

impl Config {
    /// Load configuration from all sources and validate it.
    ///
    /// With `file`, only that file is read (and it must exist); otherwise the
    /// platform config directory is searched and missing files are ignored.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(file)?.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Defaults plus file sources, without the environment.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
                match extension.as_deref() {
                    Some("toml") => Ok(figment.merge(Toml::file(path))),
                    Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
                    Some("json") => Ok(figment.merge(Json::file(path))),
                    _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
                }
            },
            None => {
                let Some(dirs) = project_dirs() else {
                    return Ok(figment);
                };
                let dir = dirs.config_dir();
                tracing::debug!(dir = %dir.display(), "Searching for configuration files");
                Ok(figment.merge(Toml::file(dir.join("config.toml"))).merge(Yaml::file(dir.join("config.yaml"))))
            },
        }
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.library.extensions.iter().all(|e| e.trim().trim_start_matches('.').is_empty()) {
            exn::bail!(ErrorKind::Invalid("library.extensions must name at least one extension"));
        }
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            exn::bail!(ErrorKind::Invalid("thumbnail dimensions must be greater than zero"));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path must not be empty"));
        }
        Ok(())
    }

    /// Extensions normalised to lowercase without a leading dot.
    pub fn extensions(&self) -> Vec<String> {
        self.library
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.extensions(), vec!["pdf"]);
        assert_eq!((config.thumbnails.width, config.thumbnails.height), (200, 300));
    }

    #[rstest]
    #[case(".toml", "[library]\nroots = [\"/books\"]\nextensions = [\"PDF\", \".epub\"]\n[thumbnails]\nwidth = 120\n")]
    #[case(".yaml", "library:\n  roots: [/books]\n  extensions: [PDF, .epub]\nthumbnails:\n  width: 120\n")]
    #[case(".json", r#"{"library": {"roots": ["/books"], "extensions": ["PDF", ".epub"]}, "thumbnails": {"width": 120}}"#)]
    fn test_file_formats(#[case] suffix: &str, #[case] contents: &str) {
        let file = write(suffix, contents);
        let config = Config::from_figment(Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.library.roots, vec![PathBuf::from("/books")]);
        assert_eq!(config.extensions(), vec!["pdf", "epub"]);
        assert_eq!(config.thumbnails.width, 120);
        // Unspecified values keep their defaults.
        assert_eq!(config.thumbnails.height, 300);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let err = Config::figment(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = write(".ini", "[library]\n");
        let err = Config::figment(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[rstest]
    #[case("[library]\nextensions = []\n")]
    #[case("[library]\nextensions = [\" \", \".\"]\n")]
    #[case("[thumbnails]\nheight = 0\n")]
    fn test_validation_failures(#[case] contents: &str) {
        let file = write(".toml", contents);
        let err = Config::from_figment(Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_type_mismatch_is_load_error() {
        let file = write(".toml", "[thumbnails]\nwidth = \"wide\"\n");
        let err = Config::from_figment(Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Load);
    }
}
