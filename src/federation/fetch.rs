//! Locator resolution and retrieval: cache, local file, or HTTP.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ManifestError, ManifestResult};

/// Retrieves remote documents. Injected so tests can stand in for the network.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> ManifestResult<String>;
}

/// Blocking HTTP fetcher on a shared `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> ManifestResult<String> {
        let response = self
            .agent
            .get(url)
            .set("Accept", "text/turtle, application/n-triples;q=0.9, */*;q=0.1")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => ManifestError::Fetch {
                    locator: url.to_string(),
                    message: format!("HTTP {code}"),
                },
                ureq::Error::Transport(t) => ManifestError::Fetch {
                    locator: url.to_string(),
                    message: t.to_string(),
                },
            })?;
        response.into_string().map_err(|e| ManifestError::Fetch {
            locator: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Where a locator points once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote(String),
}

impl Location {
    /// Interpret a top-level locator (manifest or fallback) with no base.
    pub fn parse(locator: &str) -> Self {
        if is_remote(locator) {
            Self::Remote(locator.to_string())
        } else if let Some(path) = locator.strip_prefix("file://") {
            Self::Local(PathBuf::from(path))
        } else {
            Self::Local(PathBuf::from(locator))
        }
    }

    /// Resolve `locator` relative to this location (the manifest's).
    pub fn join(&self, locator: &str) -> Self {
        if is_remote(locator) || locator.starts_with("file://") || Path::new(locator).is_absolute() {
            return Self::parse(locator);
        }
        match self {
            Self::Remote(url) => {
                let dir = match url.rfind('/') {
                    Some(idx) if idx > url.find("://").map_or(0, |i| i + 2) => &url[..=idx],
                    _ => url.as_str(),
                };
                let sep = if dir.ends_with('/') { "" } else { "/" };
                Self::Remote(format!("{dir}{sep}{}", locator.trim_start_matches("./")))
            }
            Self::Local(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                Self::Local(dir.join(locator))
            }
        }
    }

    /// Base IRI for parsing documents read from here.
    pub fn base_iri(&self) -> Option<String> {
        match self {
            Self::Remote(url) => Some(url.clone()),
            Self::Local(path) => std::path::absolute(path)
                .ok()
                .map(|abs| format!("file://{}", abs.display()))
                .filter(|iri| !iri.contains(' ')),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// The final path segment of a locator, used as the cache key.
pub fn file_name(locator: &str) -> Option<&str> {
    let trimmed = locator.split(['?', '#']).next().unwrap_or(locator);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

/// Reads documents: cache directory first, then the resolved location.
pub struct Reader<'a> {
    pub cache_dir: Option<&'a Path>,
    pub fetcher: &'a dyn Fetch,
}

impl Reader<'_> {
    /// Read `location`, preferring a cached copy with the same file name.
    ///
    /// A cached copy stands in for `location`: it is parsed against the
    /// original base IRI, never against the cache path.
    pub fn read(&self, location: &Location) -> ManifestResult<String> {
        let name = match location {
            Location::Local(path) => path.file_name().and_then(|n| n.to_str()),
            Location::Remote(url) => file_name(url),
        };
        if let (Some(dir), Some(name)) = (self.cache_dir, name) {
            let cached = dir.join(name);
            if cached.is_file() {
                tracing::debug!(path = %cached.display(), locator = %location, "using cached partition");
                return read_local(&cached);
            }
        }

        match location {
            Location::Local(path) => read_local(path),
            Location::Remote(url) => self.fetcher.fetch(url),
        }
    }
}

fn read_local(path: &Path) -> ManifestResult<String> {
    std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
        locator: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_locators_join_remote_base() {
        let base = Location::parse("https://raw.example.org/repo/main/manifest.ttl");
        assert_eq!(
            base.join("parts/roles.ttl"),
            Location::Remote("https://raw.example.org/repo/main/parts/roles.ttl".into())
        );
        assert_eq!(
            base.join("https://cdn.example.org/x.ttl"),
            Location::Remote("https://cdn.example.org/x.ttl".into())
        );
    }

    #[test]
    fn relative_locators_join_local_base() {
        let base = Location::parse("/srv/ontology/manifest.ttl");
        assert_eq!(
            base.join("roles.ttl"),
            Location::Local(PathBuf::from("/srv/ontology/roles.ttl"))
        );
        assert_eq!(
            base.join("file:///tmp/a.ttl"),
            Location::Local(PathBuf::from("/tmp/a.ttl"))
        );
    }

    #[test]
    fn file_name_ignores_query() {
        assert_eq!(file_name("https://ex.org/a/b.ttl?raw=1"), Some("b.ttl"));
        assert_eq!(file_name("https://ex.org/a/"), None);
    }

    struct Unreachable;

    impl Fetch for Unreachable {
        fn fetch(&self, url: &str) -> ManifestResult<String> {
            Err(ManifestError::Fetch {
                locator: url.into(),
                message: "offline".into(),
            })
        }
    }

    #[test]
    fn cache_wins_over_remote() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("roles.ttl"), "# cached").unwrap();
        let reader = Reader {
            cache_dir: Some(dir.path()),
            fetcher: &Unreachable,
        };
        let text = reader
            .read(&Location::Remote("https://ex.org/roles.ttl".into()))
            .unwrap();
        assert_eq!(text, "# cached");

        let err = reader
            .read(&Location::Remote("https://ex.org/other.ttl".into()))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Fetch { .. }));
    }
}
