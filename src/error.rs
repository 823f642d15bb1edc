//! Custom error types for mku.

use thiserror::Error;

/// Errors that can occur during MKS upgrade operations.
#[derive(Error, Debug)]
pub enum MkuError {
    #[error("kube version {version} is invalid: {reason}")]
    InvalidKubeVersion { version: String, reason: String },

    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("no MKS endpoint for region: {0}")]
    UnknownRegion(String),

    #[error("MKS API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl MkuError {
    /// Create an invalid-version error carrying the offending string.
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKubeVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_kube_version() {
        let err = MkuError::invalid_version("1.x.3", "minor part is not an integer number");
        assert_eq!(
            err.to_string(),
            "kube version 1.x.3 is invalid: minor part is not an integer number"
        );
    }

    #[test]
    fn test_error_display_cluster_not_found() {
        let err = MkuError::ClusterNotFound("2cf30a74".to_string());
        assert_eq!(err.to_string(), "cluster not found: 2cf30a74");
    }

    #[test]
    fn test_error_display_unknown_region() {
        let err = MkuError::UnknownRegion("us-1".to_string());
        assert_eq!(err.to_string(), "no MKS endpoint for region: us-1");
    }

    #[test]
    fn test_error_display_api() {
        let err = MkuError::Api {
            status: 409,
            message: "cluster is not in ACTIVE status".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "MKS API error (HTTP 409): cluster is not in ACTIVE status"
        );
    }
}
