//! On-disk locations of the config files

use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "FRAMEWORK_CONFIG_DIR";

/// Config directory used when [`CONFIG_DIR_ENV`] is unset, relative to the
/// host's working directory
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Primary, backup and temp file paths for one app id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    dir: PathBuf,
    app_id: String,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>, app_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            app_id: app_id.into(),
        }
    }

    /// Resolve the directory from [`CONFIG_DIR_ENV`], falling back to
    /// [`DEFAULT_CONFIG_DIR`]
    pub fn from_env(app_id: impl Into<String>) -> Self {
        let dir = std::env::var_os(CONFIG_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self::new(dir, app_id)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// `<dir>/<app-id>.json`
    pub fn primary(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.app_id))
    }

    /// `<dir>/<app-id>.unreadable.json`
    pub fn backup(&self) -> PathBuf {
        self.dir.join(format!("{}.unreadable.json", self.app_id))
    }

    /// `<dir>/<app-id>.json.tmp`
    pub fn temp(&self) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", self.app_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let paths = ConfigPaths::new("/etc/host/config", "framework");
        assert_eq!(paths.primary(), PathBuf::from("/etc/host/config/framework.json"));
        assert_eq!(
            paths.backup(),
            PathBuf::from("/etc/host/config/framework.unreadable.json")
        );
        assert_eq!(paths.temp(), PathBuf::from("/etc/host/config/framework.json.tmp"));
    }

    #[test]
    fn test_siblings_share_directory() {
        let paths = ConfigPaths::new("config", "demo");
        assert_eq!(paths.primary().parent(), Some(paths.dir()));
        assert_eq!(paths.backup().parent(), Some(paths.dir()));
        assert_eq!(paths.temp().parent(), Some(paths.dir()));
        assert_eq!(paths.app_id(), "demo");
    }
}
