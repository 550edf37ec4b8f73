use crate::metadata::split_labels;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Settings read from the optional YAML config file.
///
/// ```yaml
/// blog_id: "1234567890123456789"
/// labels: [rust, blogging]   # or "rust, blogging"
/// credentials: ~/.config/gblog/credentials.json
/// token: ~/.config/gblog/token.json
/// draft: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub blog_url: Option<String>,
    #[serde(default)]
    pub blog_id: Option<Scalar>,
    #[serde(default)]
    pub labels: Option<LabelList>,
    #[serde(default)]
    pub credentials: Option<PathBuf>,
    #[serde(default)]
    pub token: Option<PathBuf>,
    #[serde(default)]
    pub draft: Option<bool>,
}

/// A YAML scalar read as text; blog IDs are often written unquoted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Unsigned(n) => write!(f, "{}", n),
            Scalar::Signed(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LabelList {
    List(Vec<Scalar>),
    Text(String),
}

impl LabelList {
    /// Same comma-separated form `--labels` takes
    pub fn to_csv(&self) -> String {
        match self {
            LabelList::List(items) => items
                .iter()
                .map(Scalar::to_string)
                .collect::<Vec<_>>()
                .join(","),
            LabelList::Text(text) => text.clone(),
        }
    }
}

/// Values given explicitly on the command line. `None` means the flag was not
/// passed, so a config value may fill it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub blog_url: Option<String>,
    pub blog_id: Option<String>,
    pub labels: Option<String>,
    pub credentials: Option<PathBuf>,
    pub token: Option<PathBuf>,
    pub draft: Option<bool>,
}

/// Which blog to post to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogTarget {
    Id(String),
    Url(String),
    /// Pick among the user's blogs
    Choose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub blog_id: Option<String>,
    pub blog_url: Option<String>,
    /// `Some(vec![])` means labels were explicitly cleared and file markers
    /// must not fill them in.
    pub labels: Option<Vec<String>>,
    pub draft: bool,
    pub credentials: PathBuf,
    pub token: PathBuf,
}

impl EffectiveSettings {
    /// A blog ID takes precedence over a blog URL.
    pub fn target(&self) -> BlogTarget {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);
        if let Some(id) = non_empty(&self.blog_id) {
            BlogTarget::Id(id)
        } else if let Some(url) = non_empty(&self.blog_url) {
            BlogTarget::Url(url)
        } else {
            BlogTarget::Choose
        }
    }
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        resolve(FileConfig::default(), CliOverrides::default())
    }
}

/// Merge config file values under command line values, field by field.
pub fn resolve(file: FileConfig, cli: CliOverrides) -> EffectiveSettings {
    fn pick<T: fmt::Debug>(name: &str, cli: Option<T>, file: Option<T>) -> Option<T> {
        match (cli, file) {
            (Some(v), _) => Some(v),
            (None, Some(v)) => {
                tracing::debug!("Using {} from config: {:?}", name, v);
                Some(v)
            }
            (None, None) => None,
        }
    }

    // An explicit `--labels ""` clears labels; an empty config value is just absent.
    let labels = pick(
        "labels",
        cli.labels.map(|raw| split_labels(&raw).unwrap_or_default()),
        file.labels.as_ref().and_then(|l| split_labels(&l.to_csv())),
    );

    EffectiveSettings {
        blog_url: pick("blog_url", cli.blog_url, file.blog_url),
        blog_id: pick(
            "blog_id",
            cli.blog_id,
            file.blog_id.as_ref().map(Scalar::to_string),
        ),
        labels,
        draft: pick("draft", cli.draft, file.draft).unwrap_or(false),
        credentials: pick("credentials", cli.credentials, file.credentials)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE)),
        token: pick("token", cli.token, file.token)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
    }
}

/// Load the YAML config file. Any failure is logged and yields an empty
/// config so the run continues on command line values and defaults.
pub fn load_config_file(path: &Path) -> FileConfig {
    if !path.exists() {
        tracing::warn!("Config file '{}' not found, ignoring it", path.display());
        return FileConfig::default();
    }

    tracing::debug!("Loading config file: {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Error reading config file '{}': {}", path.display(), e);
            return FileConfig::default();
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&content) {
        Ok(config) => {
            let config = config.unwrap_or_default();
            tracing::debug!("Loaded config: {:?}", config);
            config
        }
        Err(e) if content.trim().is_empty() => {
            tracing::debug!("Config file is empty: {}", e);
            FileConfig::default()
        }
        Err(e) => {
            tracing::warn!("Error parsing YAML config file '{}': {}", path.display(), e);
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gblog.yaml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn config_value_fills_missing_cli_value() {
        let file = FileConfig {
            blog_id: Some(Scalar::Text("X".to_string())),
            ..Default::default()
        };
        let settings = resolve(file, CliOverrides::default());
        assert_eq!(settings.blog_id.as_deref(), Some("X"));
        assert_eq!(settings.target(), BlogTarget::Id("X".to_string()));
    }

    #[test]
    fn cli_value_beats_config_value() {
        let file = FileConfig {
            blog_id: Some(Scalar::Text("X".to_string())),
            ..Default::default()
        };
        let cli = CliOverrides {
            blog_id: Some("Y".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(file, cli).blog_id.as_deref(), Some("Y"));
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let settings = EffectiveSettings::default();
        assert_eq!(settings.credentials, PathBuf::from("credentials.json"));
        assert_eq!(settings.token, PathBuf::from("token.json"));
        assert!(!settings.draft);
        assert_eq!(settings.labels, None);
        assert_eq!(settings.target(), BlogTarget::Choose);
    }

    #[test]
    fn explicit_cli_default_overrides_config() {
        let file = FileConfig {
            draft: Some(true),
            credentials: Some(PathBuf::from("other.json")),
            ..Default::default()
        };
        let cli = CliOverrides {
            draft: Some(false),
            credentials: Some(PathBuf::from(DEFAULT_CREDENTIALS_FILE)),
            ..Default::default()
        };
        let settings = resolve(file, cli);
        assert!(!settings.draft);
        assert_eq!(settings.credentials, PathBuf::from(DEFAULT_CREDENTIALS_FILE));
    }

    #[test]
    fn config_label_list_is_joined_then_split() {
        let file = FileConfig {
            labels: Some(LabelList::List(vec![
                Scalar::Text("rust".to_string()),
                Scalar::Text(" blogging ".to_string()),
                Scalar::Unsigned(2024),
            ])),
            ..Default::default()
        };
        let settings = resolve(file, CliOverrides::default());
        assert_eq!(
            settings.labels,
            Some(vec![
                "rust".to_string(),
                "blogging".to_string(),
                "2024".to_string()
            ])
        );
    }

    #[test]
    fn empty_cli_labels_clear_config_labels() {
        let file = FileConfig {
            labels: Some(LabelList::Text("a,b".to_string())),
            ..Default::default()
        };
        let cli = CliOverrides {
            labels: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(resolve(file, cli).labels, Some(vec![]));
    }

    #[test]
    fn empty_config_labels_count_as_not_given() {
        for labels in [LabelList::List(vec![]), LabelList::Text(" , ".to_string())] {
            let file = FileConfig {
                labels: Some(labels),
                ..Default::default()
            };
            assert_eq!(resolve(file, CliOverrides::default()).labels, None);
        }
    }

    #[test]
    fn blog_id_wins_over_blog_url() {
        let settings = EffectiveSettings {
            blog_id: Some("42".to_string()),
            blog_url: Some("https://example.blogspot.com".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.target(), BlogTarget::Id("42".to_string()));

        let settings = EffectiveSettings {
            blog_id: Some("  ".to_string()),
            blog_url: Some("https://example.blogspot.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.target(),
            BlogTarget::Url("https://example.blogspot.com".to_string())
        );
    }

    #[test]
    fn loads_all_recognized_keys() {
        let (_dir, path) = write_config(
            "blog_url: https://example.blogspot.com\n\
             blog_id: 1234567890123456789\n\
             labels: rust, blogging\n\
             credentials: creds.json\n\
             token: tok.js\n\
             draft: true\n",
        );
        let config = load_config_file(&path);
        assert_eq!(config.blog_url.as_deref(), Some("https://example.blogspot.com"));
        assert_eq!(
            config.blog_id.map(|id| id.to_string()).as_deref(),
            Some("1234567890123456789")
        );
        assert_eq!(
            config.labels,
            Some(LabelList::Text("rust, blogging".to_string()))
        );
        assert_eq!(config.credentials, Some(PathBuf::from("creds.json")));
        assert_eq!(config.token, Some(PathBuf::from("tok.js")));
        assert_eq!(config.draft, Some(true));
    }

    #[test]
    fn malformed_config_degrades_to_empty() {
        let (_dir, path) = write_config("blog_id: [unterminated\n  - :");
        assert_eq!(load_config_file(&path), FileConfig::default());

        let (_dir, path) = write_config("draft: definitely\n");
        assert_eq!(load_config_file(&path), FileConfig::default());
    }

    #[test]
    fn missing_or_empty_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config_file(&dir.path().join("absent.yaml")),
            FileConfig::default()
        );

        let (_dir, path) = write_config("");
        assert_eq!(load_config_file(&path), FileConfig::default());
    }
}
