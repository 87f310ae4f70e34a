use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the resolver gets raw document bytes from. Implementations decide
/// how a path or URL maps to content; the resolver treats every failure the
/// same way and abandons that branch of the include graph.
pub trait ContentSource {
    fn fetch(&self, path: &str) -> CoreResult<Vec<u8>>;
}

/// True for strings that name a remote resource (`http://` or `https://`,
/// case-insensitive). Everything else is a local path.
pub fn is_remote(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Local files relative to a root directory, with a one-level parent
/// directory fallback when the file is not found directly.
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSource { root: root.into() }
    }

    /// The on-disk location a path resolves to, honoring the parent
    /// directory fallback.
    pub fn locate(&self, path: &str) -> PathBuf {
        let direct = self.root.join(path);
        if direct.exists() {
            return direct;
        }
        self.root.join("..").join(path)
    }
}

impl ContentSource for FileSource {
    fn fetch(&self, path: &str) -> CoreResult<Vec<u8>> {
        let location = self.locate(path);
        std::fs::read(&location)
            .map_err(|e| CoreError::Fetch(format!("opening {} failed: {e}", location.display())))
    }
}

/// Remote documents over HTTP(S), with a request timeout so a stalled
/// repository cannot stall the whole walk.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> CoreResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Fetch(format!("building http client failed: {e}")))?;
        Ok(HttpSource { client })
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self, url: &str) -> CoreResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CoreError::Fetch(format!("downloading {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Fetch(format!(
                "downloading {url} failed: HTTP {status}"
            )));
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| CoreError::Fetch(format!("downloading {url} failed: {e}")))
    }
}

/// Dispatches to `HttpSource` for remote paths and `FileSource` otherwise.
pub struct DefaultSource {
    file: FileSource,
    http: HttpSource,
}

impl DefaultSource {
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        Ok(DefaultSource {
            file: FileSource::new(root),
            http: HttpSource::new()?,
        })
    }

    pub fn exists_locally(&self, path: &str) -> bool {
        self.file.locate(path).exists()
    }
}

impl ContentSource for DefaultSource {
    fn fetch(&self, path: &str) -> CoreResult<Vec<u8>> {
        if is_remote(path) {
            self.http.fetch(path)
        } else {
            self.file.fetch(path)
        }
    }
}

/// Joins a relative include against the path or URL of the document that
/// declared it.
pub fn join_include(base: &str, include: &str) -> String {
    if is_remote(include) {
        return include.to_string();
    }
    if is_remote(base) {
        match url::Url::parse(base).and_then(|url| url.join(include)) {
            Ok(joined) => joined.to_string(),
            Err(_) => include.to_string(),
        }
    } else {
        let parent = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
        normalize(&parent.join(include))
    }
}

fn normalize(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/repository.json"));
        assert!(is_remote("HTTP://example.com/repository.json"));
        assert!(!is_remote("repository.json"));
        assert!(!is_remote("./repository/a.json"));
        assert!(!is_remote("httpdocs/a.json"));
    }

    #[test]
    fn test_join_include_remote_base() {
        assert_eq!(
            join_include("https://example.com/sub/repository.json", "./inc/a.json"),
            "https://example.com/sub/inc/a.json"
        );
        assert_eq!(
            join_include("https://example.com/repository.json", "../a.json"),
            "https://example.com/a.json"
        );
    }

    #[test]
    fn test_join_include_local_base() {
        assert_eq!(
            join_include("repository.json", "./repository/0-9.json"),
            "repository/0-9.json"
        );
        assert_eq!(
            join_include("sub/repository.json", "a.json"),
            "sub/a.json"
        );
    }

    #[test]
    fn test_join_include_absolute_include() {
        assert_eq!(
            join_include("repository.json", "https://example.com/a.json"),
            "https://example.com/a.json"
        );
    }

    #[test]
    fn test_file_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("repository.json"), b"{}").expect("write");

        let source = FileSource::new(dir.path());
        assert_eq!(source.fetch("repository.json").expect("fetch"), b"{}");
        assert!(source.fetch("missing.json").is_err());
    }

    #[test]
    fn test_file_source_parent_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        fs::write(dir.path().join("shared.json"), b"{}").expect("write");

        let source = FileSource::new(&nested);
        assert_eq!(source.fetch("shared.json").expect("fetch"), b"{}");
    }
}
