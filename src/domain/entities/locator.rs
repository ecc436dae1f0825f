//! Image locators and the cache keys derived from them.

use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::domain::errors::LocatorError;

/// Host directory used for locators that carry no host.
pub const LOCAL_HOST: &str = "localhost";

/// Transport family of a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Fetched over the network (`http`, `https`).
    Network,
    /// Everything else (`file`, bundled resources).
    Local,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Identifier of an image resource.
///
/// A locator always has a final file name component, so the
/// `<host>/<file name>` cache key is defined for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageLocator {
    url: Url,
    file_name: String,
}

impl ImageLocator {
    /// Parses a locator from a URL string.
    ///
    /// # Errors
    /// Returns error if the input is not an absolute URL or names no file.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let url = Url::parse(input.trim()).map_err(|e| LocatorError::invalid(input, e))?;
        Self::from_url(url)
    }

    /// Builds a locator from an already parsed URL.
    ///
    /// # Errors
    /// Returns error if the URL path has no file name component.
    pub fn from_url(url: Url) -> Result<Self, LocatorError> {
        let path = url.path();
        if path.ends_with('/') {
            return Err(LocatorError::missing_file_name(url.as_str()));
        }

        let file_name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| LocatorError::missing_file_name(url.as_str()))?
            .to_string();

        Ok(Self { url, file_name })
    }

    /// Returns the transport family.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        match self.url.scheme() {
            "http" | "https" => Scheme::Network,
            _ => Scheme::Local,
        }
    }

    /// Returns true if the locator is fetched over the network.
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.scheme() == Scheme::Network
    }

    /// Host name, or [`LOCAL_HOST`] when the locator has none.
    #[must_use]
    pub fn host_dir(&self) -> &str {
        match self.url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => LOCAL_HOST,
        }
    }

    /// Final component of the locator path.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Cache key relative to the cache root: `<host>/<file name>`.
    #[must_use]
    pub fn cache_key(&self) -> PathBuf {
        Path::new(self.host_dir()).join(&self.file_name)
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl std::str::FromStr for ImageLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://img.example/a/b.png", "img.example", "b.png" ; "network_nested_path")]
    #[test_case("https://IMG.Example/b.png", "img.example", "b.png" ; "https_lowercases_host")]
    #[test_case("file:///usr/share/slides/intro.jpg", "localhost", "intro.jpg" ; "file_without_host")]
    #[test_case("file://server/share/c.webp", "server", "c.webp" ; "file_with_host")]
    #[test_case("http://img.example/a/../b.png", "img.example", "b.png" ; "dot_segments_normalized")]
    fn test_cache_key(input: &str, host: &str, file: &str) {
        let locator = ImageLocator::parse(input).unwrap();
        assert_eq!(locator.host_dir(), host);
        assert_eq!(locator.file_name(), file);
        assert_eq!(locator.cache_key(), Path::new(host).join(file));
    }

    #[test_case("http://img.example/a.png", Scheme::Network ; "http")]
    #[test_case("https://img.example/a.png", Scheme::Network ; "https")]
    #[test_case("file:///tmp/a.png", Scheme::Local ; "file")]
    fn test_scheme(input: &str, expected: Scheme) {
        assert_eq!(ImageLocator::parse(input).unwrap().scheme(), expected);
    }

    #[test_case("not a url" ; "relative")]
    #[test_case("http://img.example/" ; "root_path")]
    #[test_case("http://img.example/dir/" ; "directory_path")]
    fn test_rejected(input: &str) {
        assert!(ImageLocator::parse(input).is_err());
    }

    #[test]
    fn test_same_key_for_same_host_and_name() {
        let a = ImageLocator::parse("http://img.example/x/b.png").unwrap();
        let b = ImageLocator::parse("http://img.example/y/b.png").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
