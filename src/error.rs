//! Error types for the diff toggler.
//!
//! None of these ever reach the host page. `DiffToggler` logs and swallows
//! them; they exist so the adapters can report what went wrong at the
//! platform boundary.

use thiserror::Error;

/// Result alias used by the page and storage adapters.
pub type Result<T> = std::result::Result<T, TogglerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TogglerError {
    /// Local storage is disabled or blocked (private mode, sandboxed frame).
    #[error("Preference storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A read or write against an available store failed.
    #[error("Preference storage error: {0}")]
    Storage(String),

    /// A DOM call threw.
    #[error("DOM error: {0}")]
    Dom(String),

    /// The element the toolbar is inserted into is not on the page.
    #[error("Toolbar anchor not found: {0}")]
    MissingAnchor(String),

    /// Config failed to parse or validate.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl TogglerError {
    /// Storage failures are expected on some pages and only degrade to
    /// "no stored preference".
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            TogglerError::StorageUnavailable(_) | TogglerError::Storage(_)
        )
    }
}

impl From<serde_json::Error> for TogglerError {
    fn from(err: serde_json::Error) -> Self {
        TogglerError::InvalidConfig(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for TogglerError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        TogglerError::Dom(format!("{:?}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_classified() {
        assert!(TogglerError::StorageUnavailable("blocked".into()).is_storage());
        assert!(TogglerError::Storage("quota".into()).is_storage());
        assert!(!TogglerError::Dom("boom".into()).is_storage());
        assert!(!TogglerError::MissingAnchor(".pr-review-tools".into()).is_storage());
    }

    #[test]
    fn json_errors_become_invalid_config() {
        let err: TogglerError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TogglerError::InvalidConfig(_)));
    }
}
