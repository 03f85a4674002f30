//! Public URL templates.
//!
//! A template may reference `{bucket}`, `{region}` and `{key}`. Bucket and region
//! are resolved once; the key is substituted per file, or appended when the
//! template has no `{key}` placeholder. Each `/`-separated key segment is
//! percent-encoded.

use crate::traits::{StorageError, StorageResult};

const KEY_PLACEHOLDER: &str = "{key}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlTemplate {
    resolved: String,
}

impl PublicUrlTemplate {
    /// Resolve `template` against the bucket and region it will serve.
    pub fn parse(template: &str, bucket: Option<&str>, region: Option<&str>) -> StorageResult<Self> {
        let mut resolved = template.trim().to_string();
        if resolved.is_empty() {
            return Err(StorageError::ConfigError(
                "Public URL template must not be empty".to_string(),
            ));
        }

        for (placeholder, value, name) in [
            ("{bucket}", bucket, "bucket"),
            ("{region}", region, "region"),
        ] {
            if resolved.contains(placeholder) {
                let value = value.ok_or_else(|| {
                    StorageError::ConfigError(format!(
                        "Public URL template references {} but no {} is configured",
                        placeholder, name
                    ))
                })?;
                resolved = resolved.replace(placeholder, value);
            }
        }

        if resolved.matches(KEY_PLACEHOLDER).count() > 1 {
            return Err(StorageError::ConfigError(
                "Public URL template may contain {key} at most once".to_string(),
            ));
        }

        Ok(Self { resolved })
    }

    /// Default S3 layout: virtual-hosted AWS URLs, or path-style for custom endpoints.
    pub fn s3_default(bucket: &str, region: &str, endpoint: Option<&str>) -> Self {
        let resolved = match endpoint {
            Some(endpoint) => format!("{}/{}/{{key}}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com/{{key}}", bucket, region),
        };
        Self { resolved }
    }

    /// Build the public URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        let key = encode_key(key.trim_start_matches('/'));
        let key = key.as_str();
        if self.resolved.contains(KEY_PLACEHOLDER) {
            self.resolved.replace(KEY_PLACEHOLDER, key)
        } else {
            format!("{}/{}", self.resolved.trim_end_matches('/'), key)
        }
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
