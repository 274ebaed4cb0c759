//! Plugin Configuration
//!
//! The host hands the plugin an opaque configuration buffer. Plugins usually
//! ship it as JSON (Envoy style) or TOML (veil style); [`parse`] accepts
//! either, chosen by the first non-whitespace byte.

use anyhow::{bail, Context as _};
use serde::de::DeserializeOwned;

/// Configuration encoding detected from the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

/// Guess the encoding of a configuration payload.
///
/// A payload opening with `{` or `[` is JSON, anything else TOML.
pub fn detect_format(raw: &[u8]) -> Option<ConfigFormat> {
    let first = raw.iter().find(|b| !b.is_ascii_whitespace())?;
    match first {
        b'{' | b'[' => Some(ConfigFormat::Json),
        _ => Some(ConfigFormat::Toml),
    }
}

/// Deserialize a configuration payload
pub fn parse<T: DeserializeOwned>(raw: &[u8]) -> anyhow::Result<T> {
    match detect_format(raw) {
        None => bail!("configuration is empty"),
        Some(ConfigFormat::Json) => {
            serde_json::from_slice(raw).context("failed to parse JSON configuration")
        }
        Some(ConfigFormat::Toml) => {
            let text = std::str::from_utf8(raw).context("TOML configuration is not UTF-8")?;
            toml::from_str(text).context("failed to parse TOML configuration")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn default_upstream() -> String {
        "httpbin".to_string()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TagConfig {
        header: String,
        #[serde(default = "default_upstream")]
        upstream: String,
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"  {\"a\":1}"), Some(ConfigFormat::Json));
        assert_eq!(detect_format(b"[1]"), Some(ConfigFormat::Json));
        assert_eq!(detect_format(b"a = 1"), Some(ConfigFormat::Toml));
        assert_eq!(detect_format(b" \n\t"), None);
    }

    #[test]
    fn test_parse_json() {
        let cfg: TagConfig = parse(br#"{"header":"x-tag","upstream":"cache"}"#).unwrap();
        assert_eq!(
            cfg,
            TagConfig {
                header: "x-tag".to_string(),
                upstream: "cache".to_string()
            }
        );
    }

    #[test]
    fn test_parse_toml_with_default() {
        let cfg: TagConfig = parse(b"header = \"x-tag\"\n").unwrap();
        assert_eq!(cfg.upstream, "httpbin");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse::<TagConfig>(b"").is_err());
        let err = parse::<TagConfig>(b"{\"header\":").unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }
}
