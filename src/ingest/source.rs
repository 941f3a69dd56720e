use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the source files are read from.
///
/// Relative paths produced by [`SourceLayout`](crate::SourceLayout) are appended to the
/// base URL or joined onto the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Files served over HTTP(S), e.g. by the static file server of the map application.
    Http { base_url: String },
    /// A local copy of the data directory.
    Directory(PathBuf),
}

impl DataSource {
    pub fn http(base_url: impl Into<String>) -> Self {
        DataSource::Http {
            base_url: base_url.into(),
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        DataSource::Directory(path.into())
    }

    /// The URL or file path a relative source path resolves to.
    ///
    /// ```
    /// use velostat::DataSource;
    ///
    /// let source = DataSource::http("https://example.org/data/");
    /// assert_eq!(
    ///     source.locate("Unfallorte2019_LinRef.csv"),
    ///     "https://example.org/data/Unfallorte2019_LinRef.csv"
    /// );
    /// ```
    pub fn locate(&self, relative: &str) -> String {
        match self {
            DataSource::Http { base_url } => format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                relative.trim_start_matches('/')
            ),
            DataSource::Directory(root) => root.join(relative).display().to_string(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Http { base_url } => write!(f, "{base_url}"),
            DataSource::Directory(root) => write!(f, "{}", root.display()),
        }
    }
}
