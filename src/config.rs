use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";

/// Server configuration, read from the environment (and `.env` in development).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_dir: PathBuf,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// token → user name
    pub access_tokens: HashMap<String, String>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(p) => p.parse().with_context(|| format!("PORT is not a valid port: {p}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let tokens = std::env::var("ACCESS_TOKENS")
            .context("ACCESS_TOKENS must be set (comma separated user:token pairs)")?;

        Ok(Self {
            port,
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR)),
            ollama_base_url: std::env::var("OLLAMA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: std::env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            access_tokens: parse_access_tokens(&tokens)?,
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
        })
    }
}

/// Parses `alice:token1,bob:token2` into a token → user map.
pub fn parse_access_tokens(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((user, token)) = entry.split_once(':') else {
            bail!("Malformed ACCESS_TOKENS entry '{entry}', expected user:token");
        };
        let (user, token) = (user.trim(), token.trim());
        if user.is_empty() || token.is_empty() {
            bail!("Malformed ACCESS_TOKENS entry '{entry}', expected user:token");
        }
        if tokens.insert(token.to_string(), user.to_string()).is_some() {
            bail!("Duplicate token in ACCESS_TOKENS for user '{user}'");
        }
    }
    if tokens.is_empty() {
        bail!("ACCESS_TOKENS contains no entries");
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_token_pairs() {
        let tokens = parse_access_tokens("alice:s3cret, bob:hunter2").unwrap();
        assert_eq!(tokens.get("s3cret").map(String::as_str), Some("alice"));
        assert_eq!(tokens.get("hunter2").map(String::as_str), Some("bob"));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(parse_access_tokens("alice").is_err());
        assert!(parse_access_tokens("alice:").is_err());
        assert!(parse_access_tokens("").is_err());
        assert!(parse_access_tokens("alice:x,bob:x").is_err());
    }
}
