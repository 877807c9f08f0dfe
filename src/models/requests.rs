//! Request DTOs for the media cache API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::cache::{MAX_LOCATOR_LENGTH, MAX_PRELOAD_BATCH};

/// Query string carrying a single locator (`?url=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct LocatorQuery {
    /// The remote media locator
    pub url: String,
}

impl LocatorQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_locator(&self.url)
    }
}

/// Request body for the preload operation (POST /preload)
///
/// # Fields
/// - `urls`: Locators to warm, in the order results should be reported
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    /// Locators to warm
    pub urls: Vec<String>,
}

impl PreloadRequest {
    /// Validates the request data
    ///
    /// Only the batch size is checked here: individual bad locators are
    /// reported per item in the response.
    pub fn validate(&self) -> Option<String> {
        if self.urls.len() > MAX_PRELOAD_BATCH {
            return Some(format!(
                "Preload batch exceeds maximum of {} locators",
                MAX_PRELOAD_BATCH
            ));
        }
        None
    }
}

fn validate_locator(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return Some("Locator cannot be empty".to_string());
    }
    if url.len() > MAX_LOCATOR_LENGTH {
        return Some(format!(
            "Locator exceeds maximum length of {} bytes",
            MAX_LOCATOR_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_request_deserialize() {
        let json = r#"{"urls": ["https://cdn.example.com/a.mp4", "https://cdn.example.com/b.mp3"]}"#;
        let req: PreloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.urls.len(), 2);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_preload_request_too_large() {
        let req = PreloadRequest {
            urls: vec!["https://cdn.example.com/a.mp4".to_string(); MAX_PRELOAD_BATCH + 1],
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_preload_request_empty_is_valid() {
        let req = PreloadRequest { urls: Vec::new() };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_locator() {
        let query = LocatorQuery {
            url: "  ".to_string(),
        };
        assert!(query.validate().is_some());
    }

    #[test]
    fn test_validate_valid_locator() {
        let query = LocatorQuery {
            url: "https://cdn.example.com/a.mp4".to_string(),
        };
        assert!(query.validate().is_none());
    }
}
