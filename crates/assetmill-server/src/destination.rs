use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmill_walk::path::{absolute, clean};

use crate::error::{AssetError, AssetResult};

/// Maps a request path (with the URL prefix already stripped) to an
/// artifact path.
pub type DestinationFn = dyn Fn(&str) -> PathBuf + Send + Sync;

/// How the artifact path for a request is chosen.
#[derive(Clone, Default)]
pub enum DestinationSpec {
    /// Join the request path onto the output root.
    #[default]
    UnderRoot,
    /// Always the same artifact, relative to the output root.
    Fixed(PathBuf),
    /// Computed per request. The result is not confined to the output root.
    Resolver(Arc<DestinationFn>),
}

impl DestinationSpec {
    /// Wrap a closure as a per-request destination.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&str) -> PathBuf + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }
}

impl fmt::Debug for DestinationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderRoot => f.write_str("UnderRoot"),
            Self::Fixed(path) => f.debug_tuple("Fixed").field(path).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Resolves request paths to absolute artifact paths.
#[derive(Clone, Debug)]
pub struct DestinationResolver {
    root: PathBuf,
    prefix: String,
    spec: DestinationSpec,
}

impl DestinationResolver {
    /// Create a resolver. A fixed destination is checked against the
    /// output root here, so a bad one fails at startup.
    pub fn new(
        output_root: &Path,
        url_prefix: &str,
        spec: DestinationSpec,
    ) -> AssetResult<Self> {
        let root = absolute(output_root).map_err(|source| AssetError::io(output_root, source))?;
        let prefix = url_prefix.trim_end_matches('/').to_string();
        let mut resolver = Self { root, prefix, spec };
        if let DestinationSpec::Fixed(path) = &resolver.spec {
            let fixed = resolver.sandboxed(path)?;
            resolver.spec = DestinationSpec::Fixed(fixed);
        }
        Ok(resolver)
    }

    /// Absolute output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The part of `request_path` after the URL prefix, or `None` when the
    /// request is outside the prefix.
    pub fn strip_prefix<'a>(&self, request_path: &'a str) -> Option<&'a str> {
        let rest = request_path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Artifact path for a request.
    ///
    /// Returns `Ok(None)` when the request is not ours: outside the prefix,
    /// or naming the output root itself.
    pub fn resolve(&self, request_path: &str) -> AssetResult<Option<PathBuf>> {
        let Some(rest) = self.strip_prefix(request_path) else {
            return Ok(None);
        };

        match &self.spec {
            DestinationSpec::UnderRoot => {
                let relative = rest.trim_start_matches('/');
                if relative.is_empty() {
                    return Ok(None);
                }
                let destination = self.sandboxed(Path::new(relative))?;
                if destination == self.root {
                    return Ok(None);
                }
                Ok(Some(destination))
            }
            DestinationSpec::Fixed(path) => Ok(Some(path.clone())),
            DestinationSpec::Resolver(f) => {
                let path = f(rest);
                absolute(&path)
                    .map(Some)
                    .map_err(|source| AssetError::io(&path, source))
            }
        }
    }

    fn sandboxed(&self, path: &Path) -> AssetResult<PathBuf> {
        let destination = clean(&self.root.join(path));
        if destination.starts_with(&self.root) {
            Ok(destination)
        } else {
            Err(AssetError::SandboxViolation {
                destination,
                root: self.root.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(prefix: &str, spec: DestinationSpec) -> DestinationResolver {
        DestinationResolver::new(Path::new("/srv/out"), prefix, spec).unwrap()
    }

    #[test]
    fn request_path_under_root() {
        let r = resolver("/", DestinationSpec::UnderRoot);
        assert_eq!(
            r.resolve("/js/app.js").unwrap(),
            Some(PathBuf::from("/srv/out/js/app.js"))
        );
    }

    #[test]
    fn bare_root_is_not_an_artifact() {
        let r = resolver("/", DestinationSpec::UnderRoot);
        assert_eq!(r.resolve("/").unwrap(), None);
        assert_eq!(r.resolve("/js/..").unwrap(), None);
    }

    #[test]
    fn prefix_is_stripped() {
        let r = resolver("/assets", DestinationSpec::UnderRoot);
        assert_eq!(
            r.resolve("/assets/app.js").unwrap(),
            Some(PathBuf::from("/srv/out/app.js"))
        );
        assert_eq!(r.resolve("/other/app.js").unwrap(), None);
        assert_eq!(r.resolve("/assetsx/app.js").unwrap(), None);
    }

    #[test]
    fn traversal_is_rejected() {
        let r = resolver("/", DestinationSpec::UnderRoot);
        let err = r.resolve("/../secret.js").unwrap_err();
        match err {
            AssetError::SandboxViolation { destination, root } => {
                assert_eq!(destination, PathBuf::from("/srv/secret.js"));
                assert_eq!(root, PathBuf::from("/srv/out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fixed_destination() {
        let r = resolver("/", DestinationSpec::Fixed("bundle.js".into()));
        assert_eq!(
            r.resolve("/anything").unwrap(),
            Some(PathBuf::from("/srv/out/bundle.js"))
        );

        let inside = resolver("/", DestinationSpec::Fixed("/srv/out/js/../all.js".into()));
        assert_eq!(
            inside.resolve("/x").unwrap(),
            Some(PathBuf::from("/srv/out/all.js"))
        );
    }

    #[test]
    fn escaping_fixed_destination_fails_at_construction() {
        for fixed in ["../bundle.js", "/etc/bundle.js"] {
            let err = DestinationResolver::new(
                Path::new("/srv/out"),
                "/",
                DestinationSpec::Fixed(fixed.into()),
            )
            .unwrap_err();
            assert!(matches!(err, AssetError::SandboxViolation { .. }), "{fixed}: {err}");
        }
    }

    #[test]
    fn resolver_is_unchecked() {
        let r = resolver(
            "/",
            DestinationSpec::resolver(|rest| {
                PathBuf::from("/tmp/cache").join(rest.trim_start_matches('/'))
            }),
        );
        assert_eq!(
            r.resolve("/a.js").unwrap(),
            Some(PathBuf::from("/tmp/cache/a.js"))
        );
    }
}
