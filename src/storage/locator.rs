//! Mapping between object URLs and object keys
//!
//! S3 serves the same object under two addressing styles:
//! ```text
//! path-style      https://s3.ap-southeast-1.amazonaws.com/{bucket}/profile_images/3.png
//! virtual-hosted  https://{bucket}.s3.ap-southeast-1.amazonaws.com/profile_images/3.png
//! ```
//! Keys are recovered by stripping the scheme and host (and, for path-style,
//! the bucket segment) from the front of the URL.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::{Position, Url};

use super::error::{StorageError, StorageResult};
use crate::config::S3Settings;

static HOST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[^/]*//[^/]*/").expect("valid host prefix pattern"));

static HOST_AND_BUCKET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[^/]*//[^/]*/[^/]*/").expect("valid bucket prefix pattern"));

// `{bucket}.s3.{region}.amazonaws.com`, `{bucket}.s3-{region}.amazonaws.com`
static VIRTUAL_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\.s3[.-]").expect("valid virtual host pattern"));

/// Where the bucket name appears in an object URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressingStyle {
    /// Bucket is the first path segment
    PathStyle,
    /// Bucket is the leading host label(s)
    VirtualHosted { bucket: String },
}

impl AddressingStyle {
    fn prefix_pattern(&self) -> &'static Regex {
        match self {
            AddressingStyle::PathStyle => &*HOST_AND_BUCKET_PREFIX,
            AddressingStyle::VirtualHosted { .. } => &*HOST_PREFIX,
        }
    }
}

/// Knows the bucket layout: turns URLs into keys and keys into URLs
#[derive(Debug, Clone)]
pub struct ObjectLocator {
    bucket: String,
    region: String,
    endpoint: Url,
    custom_endpoint: bool,
}

impl ObjectLocator {
    /// Build a locator from storage settings
    pub fn new(settings: &S3Settings) -> StorageResult<Self> {
        let (endpoint, custom_endpoint) = match settings.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => (endpoint.to_string(), true),
            _ => (default_endpoint(&settings.region), false),
        };

        let endpoint = Url::parse(&endpoint)
            .map_err(|e| StorageError::InvalidConfig(format!("endpoint {}: {}", endpoint, e)))?;

        Ok(Self {
            bucket: settings.bucket_name.clone(),
            region: settings.region.clone(),
            endpoint,
            custom_endpoint,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a custom endpoint replaced the regional AWS one
    pub fn is_custom_endpoint(&self) -> bool {
        self.custom_endpoint
    }

    fn endpoint_host(&self) -> Option<String> {
        if !self.custom_endpoint {
            return None;
        }
        self.endpoint.host_str().map(|host| host.to_ascii_lowercase())
    }

    /// Detect how `url` addresses its bucket
    ///
    /// URLs on the custom endpoint's own host are always path-style, since the
    /// client is forced into path-style addressing there.
    pub fn addressing(&self, url: &Url) -> AddressingStyle {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        if let Some(endpoint_host) = self.endpoint_host() {
            if host == endpoint_host {
                return AddressingStyle::PathStyle;
            }
            if let Some(bucket) = host.strip_suffix(&format!(".{}", endpoint_host)) {
                return AddressingStyle::VirtualHosted { bucket: bucket.to_string() };
            }
        }

        match VIRTUAL_HOST.captures(&host) {
            Some(caps) => AddressingStyle::VirtualHosted { bucket: caps[1].to_string() },
            None => AddressingStyle::PathStyle,
        }
    }

    /// Extract the object key from a full object URL
    ///
    /// The URL must name the configured bucket, either as its leading host
    /// label or as its first path segment.
    pub fn key_from_url(&self, raw: &str) -> StorageResult<String> {
        let url = Url::parse(raw.trim())
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(StorageError::InvalidUrl(format!("{}: no host", raw)));
        }

        let style = self.addressing(&url);
        let named_bucket = match &style {
            AddressingStyle::VirtualHosted { bucket } => bucket.clone(),
            AddressingStyle::PathStyle => url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .unwrap_or_default(),
        };
        if !named_bucket.eq_ignore_ascii_case(&self.bucket) {
            return Err(StorageError::InvalidUrl(format!(
                "{}: addresses bucket '{}', expected '{}'",
                raw, named_bucket, self.bucket
            )));
        }

        let without_query = &url[..Position::AfterPath];

        let stripped = style.prefix_pattern().replace(without_query, "");
        if stripped.len() == without_query.len() {
            return Err(StorageError::InvalidUrl(format!("{}: no object key", raw)));
        }

        let key = percent_decode_str(&stripped)
            .decode_utf8()
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", raw, e)))?
            .into_owned();

        if key.is_empty() {
            return Err(StorageError::InvalidUrl(format!("{}: no object key", raw)));
        }

        Ok(key)
    }

    /// Whether `raw` points into this storage provider
    ///
    /// Regional AWS hosts (`*.{region}.amazonaws.com`) always match; with a
    /// custom endpoint its host must match as well.
    pub fn is_s3_url(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw.trim()) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        let regional_suffix = format!("{}.amazonaws.com", self.region.to_ascii_lowercase());
        if host.ends_with(&regional_suffix) {
            return true;
        }

        if self.custom_endpoint {
            if let Some(endpoint_host) = self.endpoint.host_str() {
                let endpoint_host = endpoint_host.to_ascii_lowercase();
                return host == endpoint_host || host.ends_with(&format!(".{}", endpoint_host));
            }
        }

        false
    }

    /// Public-style URL of an object: endpoint + bucket + key
    pub fn object_url(&self, key: &str) -> StorageResult<Url> {
        if self.bucket.is_empty() {
            return Err(StorageError::ResultUrl("bucket name is empty".to_string()));
        }
        if key.is_empty() {
            return Err(StorageError::ResultUrl("object key is empty".to_string()));
        }

        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StorageError::ResultUrl(format!("endpoint {} cannot carry a path", self.endpoint))
            })?;
            segments.pop_if_empty().push(&self.bucket);
            segments.extend(key.split('/'));
        }

        Ok(url)
    }
}

/// Regional endpoint used when no custom endpoint is configured
pub fn default_endpoint(region: &str) -> String {
    format!("https://s3.{}.amazonaws.com", region)
}

/// Key under which an uploaded image is stored
pub fn upload_key(prefix: &str, image_name: &str) -> StorageResult<String> {
    let name = image_name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(StorageError::InvalidImageName(image_name.to_string()));
    }

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(name.to_string())
    } else {
        Ok(format!("{}/{}", prefix, name))
    }
}
