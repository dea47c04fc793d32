use std::time::Duration;

/// The public catalog host.
pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

pub const DEFAULT_SUBJECT: &str = "Fantasy";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for [`crate::CatalogClient`] and the CLI.
///
/// There is no environment or file layer: the embedding host (or the CLI flags) fills this in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Catalog root. `query.json` is resolved against it.
    pub base_url: String,
    /// The subject the list starts on.
    pub subject: String,
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            subject: DEFAULT_SUBJECT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_owned(),
        }
    }
}

impl CatalogConfig {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
