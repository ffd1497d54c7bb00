use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};

/// When an existing artifact is rebuilt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForcePolicy {
    /// Rebuild on every request.
    Always,
    /// Serve whatever exists; build only when the artifact is missing.
    Never,
    /// Rebuild when a qualifying source is newer than the artifact.
    #[default]
    IfNewer,
}

impl FromStr for ForcePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "if-newer" | "ifnewer" => Ok(Self::IfNewer),
            other => Err(format!(
                "unknown force policy '{other}' (expected always, never or if-newer)"
            )),
        }
    }
}

impl fmt::Display for ForcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::IfNewer => "if-newer",
        })
    }
}

/// Declarative settings for one asset middleware.
///
/// Resolver functions and custom stages cannot be expressed here; set them
/// on [`AssetMiddleware::builder`](crate::AssetMiddleware::builder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Files and directories concatenated into each artifact, in order.
    pub source: Vec<PathBuf>,
    /// Directory every static destination must stay inside.
    pub output_root: PathBuf,
    /// Fixed artifact path (relative to `output_root`). When unset the
    /// request path picks the artifact.
    pub destination: Option<PathBuf>,
    /// Only request paths under this prefix are handled.
    pub url_prefix: String,
    pub text_encoding: String,
    pub serve_after_build: bool,
    pub force: ForcePolicy,
    /// Prefilter allow-list, e.g. `["js"]`.
    pub extensions: Option<Vec<String>>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            source: vec![PathBuf::from("./public")],
            output_root: PathBuf::from("./out"),
            destination: None,
            url_prefix: "/".into(),
            text_encoding: "utf8".into(),
            serve_after_build: true,
            force: ForcePolicy::IfNewer,
            extensions: None,
        }
    }
}

/// Settings for the standalone server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub assets: AssetsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            assets: AssetsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> AssetResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::io(path, source))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> AssetResult<Self> {
        toml::from_str(text).map_err(|e| AssetError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.assets.source, vec![PathBuf::from("./public")]);
        assert_eq!(c.assets.output_root, PathBuf::from("./out"));
        assert_eq!(c.assets.url_prefix, "/");
        assert_eq!(c.assets.force, ForcePolicy::IfNewer);
        assert!(c.assets.serve_after_build);
        assert!(c.assets.destination.is_none());
    }

    #[test]
    fn parse_toml() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:8080"

            [assets]
            source = ["app/assets/javascript"]
            destination = "scripts.js"
            url_prefix = "/static"
            force = "always"
            extensions = ["js"]
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.assets.destination, Some(PathBuf::from("scripts.js")));
        assert_eq!(c.assets.force, ForcePolicy::Always);
        assert_eq!(c.assets.extensions, Some(vec!["js".to_string()]));
        // Unset fields keep their defaults.
        assert_eq!(c.assets.text_encoding, "utf8");
        assert!(c.assets.serve_after_build);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ServerConfig::from_toml("[assets]\nforce = \"sometimes\"").unwrap_err();
        assert!(matches!(err, AssetError::Config(_)));
    }

    #[test]
    fn force_policy_names() {
        assert_eq!("if-newer".parse::<ForcePolicy>().unwrap(), ForcePolicy::IfNewer);
        assert_eq!("never".parse::<ForcePolicy>().unwrap(), ForcePolicy::Never);
        assert!("sometimes".parse::<ForcePolicy>().is_err());
        assert_eq!(ForcePolicy::IfNewer.to_string(), "if-newer");
    }
}
