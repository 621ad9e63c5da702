use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_CHAT_API_URL};

use super::api_client::Backend;

/// Base URLs of the two backends the pages talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_base_url: String,
    chat_base_url: String,
}

impl Default for ApiConfig {
    /// Local development backends.  Used by tests and as the fallback when
    /// neither a build-time nor a runtime URL was supplied.
    fn default() -> Self {
        Self::from_urls(DEFAULT_API_BASE_URL, DEFAULT_CHAT_API_URL)
    }
}

impl ApiConfig {
    /// Read `API_BASE_URL` / `CHAT_API_URL` injected at build time, falling
    /// back to the local defaults for whichever one is missing.
    pub fn from_env() -> Self {
        Self::from_urls(
            option_env!("API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL),
            option_env!("CHAT_API_URL").unwrap_or(DEFAULT_CHAT_API_URL),
        )
    }

    /// Create a config from explicit URLs (runtime override from the host
    /// template).  Trailing slashes are dropped.
    pub fn from_urls(api_url: &str, chat_url: &str) -> Self {
        Self {
            api_base_url: api_url.trim().trim_end_matches('/').to_string(),
            chat_base_url: chat_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self, backend: Backend) -> &str {
        match backend {
            Backend::General => &self.api_base_url,
            Backend::Chat => &self.chat_base_url,
        }
    }

    /// Full URL for `path` on the given backend.
    pub fn url(&self, backend: Backend, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(backend), path)
        } else {
            format!("{}/{}", self.base_url(backend), path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let cfg = ApiConfig::from_urls("https://api.example.org/", "https://chat.example.org//");
        assert_eq!(cfg.base_url(Backend::General), "https://api.example.org");
        assert_eq!(cfg.base_url(Backend::Chat), "https://chat.example.org");
    }

    #[test]
    fn url_joins_with_single_slash() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.url(Backend::General, "/proyectos"), "http://localhost:5001/proyectos");
        assert_eq!(cfg.url(Backend::Chat, "chat/mensajes"), "http://localhost:5002/chat/mensajes");
    }
}
