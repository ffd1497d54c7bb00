use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmill_walk::path::absolute;
use async_trait::async_trait;
use tracing::warn;

use crate::error::{AssetError, AssetResult};

/// Computes the source list for a destination at request time.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, destination: &Path) -> AssetResult<Vec<PathBuf>>;
}

#[async_trait]
impl<F> SourceResolver for F
where
    F: Fn(&Path) -> AssetResult<Vec<PathBuf>> + Send + Sync,
{
    async fn resolve(&self, destination: &Path) -> AssetResult<Vec<PathBuf>> {
        self(destination)
    }
}

/// Where the files for an artifact come from.
#[derive(Clone)]
pub enum SourceSpec {
    Paths(Vec<PathBuf>),
    Resolver(Arc<dyn SourceResolver>),
}

impl SourceSpec {
    pub fn resolver(resolver: impl SourceResolver + 'static) -> Self {
        Self::Resolver(Arc::new(resolver))
    }

    /// Absolute source paths for `destination`, in order.
    ///
    /// A source equal to the destination is dropped with a warning; the
    /// artifact must never be folded into itself.
    pub async fn resolve(&self, destination: &Path) -> AssetResult<Vec<PathBuf>> {
        let raw = match self {
            Self::Paths(paths) => paths.clone(),
            Self::Resolver(resolver) => resolver.resolve(destination).await?,
        };

        let mut resolved = Vec::with_capacity(raw.len());
        for path in raw {
            let path = absolute(&path).map_err(|source| AssetError::io(&path, source))?;
            if path == destination {
                warn!(path = %path.display(), "destination listed as a source; removed");
                continue;
            }
            resolved.push(path);
        }
        Ok(resolved)
    }
}

impl fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn paths_become_absolute() {
        let spec = SourceSpec::Paths(vec![PathBuf::from("public/./js")]);
        let sources = spec.resolve(Path::new("/srv/out/app.js")).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].is_absolute());
        assert!(sources[0].ends_with("public/js"));
    }

    #[tokio::test]
    async fn destination_is_removed() {
        let spec = SourceSpec::Paths(vec![
            PathBuf::from("/srv/src/a.js"),
            PathBuf::from("/srv/out/app.js"),
            PathBuf::from("/srv/src/b.js"),
        ]);
        let sources = spec.resolve(Path::new("/srv/out/app.js")).await.unwrap();
        assert_eq!(
            sources,
            vec![PathBuf::from("/srv/src/a.js"), PathBuf::from("/srv/src/b.js")]
        );
    }

    #[tokio::test]
    async fn resolver_sees_destination() {
        let spec = SourceSpec::resolver(|destination: &Path| -> AssetResult<Vec<PathBuf>> {
            let stem = destination.file_stem().unwrap_or_default();
            Ok(vec![Path::new("/srv/src").join(stem)])
        });
        let sources = spec.resolve(Path::new("/srv/out/vendor.js")).await.unwrap();
        assert_eq!(sources, vec![PathBuf::from("/srv/src/vendor")]);
    }

    #[tokio::test]
    async fn resolver_error_propagates() {
        let spec = SourceSpec::resolver(|_: &Path| -> AssetResult<Vec<PathBuf>> {
            Err(AssetError::Source("no bundle".into()))
        });
        let err = spec.resolve(Path::new("/srv/out/x.js")).await.unwrap_err();
        assert!(matches!(err, AssetError::Source(_)));
    }
}
