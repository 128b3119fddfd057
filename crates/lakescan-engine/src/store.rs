//! Object-store resolution from a file location plus passthrough options.
//!
//! The engine receives object-store configuration as opaque (key, value)
//! pairs; this module dispatches on the URL scheme, reports a build-time
//! feature gap with an actionable message, and otherwise hands the pairs to
//! `object_store` untouched.

use std::sync::Arc;

use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use url::Url;

use crate::error::EngineError;

pub fn parse_location(location: &str) -> Result<Url, EngineError> {
    Url::parse(location).map_err(|source| EngineError::InvalidUrl {
        url: location.to_string(),
        source,
    })
}

/// Resolve a URL and option pairs into a live store and the path within it.
pub fn resolve_store(
    url: &Url,
    options: &[(String, String)],
) -> Result<(Arc<dyn ObjectStore>, ObjectPath), EngineError> {
    match url.scheme() {
        "file" => {}
        "s3" => {
            #[cfg(not(feature = "s3"))]
            return Err(EngineError::MissingFeature {
                scheme: "s3",
                feature: "s3",
            });
        }
        "gs" | "gcs" => {
            #[cfg(not(feature = "gcs"))]
            return Err(EngineError::MissingFeature {
                scheme: "gs",
                feature: "gcs",
            });
        }
        "azure" | "azblob" => {
            #[cfg(not(feature = "azure"))]
            return Err(EngineError::MissingFeature {
                scheme: "azure",
                feature: "azure",
            });
        }
        other => return Err(EngineError::UnsupportedScheme(other.to_string())),
    }

    let (store, path) =
        object_store::parse_url_opts(url, options.iter().map(|(k, v)| (k.as_str(), v.clone())))?;
    Ok((Arc::from(store), path))
}
