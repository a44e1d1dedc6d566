//! Cluster-level endpoints

use serde::{Deserialize, Serialize};

use crate::decoder::DiscardBody;
use crate::envelope::GenericError;
use crate::error::ClientResult;
use crate::request::PendingRequest;
use crate::EsClient;

/// Response of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub version: VersionInfo,
    #[serde(default)]
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub number: String,
    #[serde(default)]
    pub build_flavor: Option<String>,
    #[serde(default)]
    pub build_type: Option<String>,
    #[serde(default)]
    pub build_hash: Option<String>,
    #[serde(default)]
    pub build_date: Option<String>,
    #[serde(default)]
    pub build_snapshot: bool,
    #[serde(default)]
    pub lucene_version: Option<String>,
    #[serde(default)]
    pub minimum_wire_compatibility_version: Option<String>,
    #[serde(default)]
    pub minimum_index_compatibility_version: Option<String>,
}

impl VersionInfo {
    /// Major version number, if the version string starts with one
    pub fn major(&self) -> Option<u32> {
        self.number.split('.').next()?.parse().ok()
    }
}

/// Response of `GET /_license`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseResponse {
    pub license: LicenseInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub status: String,
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub issue_date_in_millis: Option<i64>,
    #[serde(default)]
    pub expiry_date_in_millis: Option<i64>,
    #[serde(default)]
    pub max_nodes: Option<u64>,
    #[serde(default)]
    pub max_resource_units: Option<u64>,
    #[serde(default)]
    pub issued_to: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub start_date_in_millis: Option<i64>,
}

impl EsClient {
    /// Checks that the cluster answers `HEAD /` with a 2xx status
    pub async fn ping(&self) -> ClientResult<(), GenericError> {
        self.send(PendingRequest::head(Vec::<String>::new()), DiscardBody)
            .await
    }

    /// Basic information about the cluster and its version
    pub async fn info(&self) -> ClientResult<ClusterInfo, GenericError> {
        self.send_json(PendingRequest::get(Vec::<String>::new()))
            .await
    }

    pub async fn license(&self) -> ClientResult<LicenseInfo, GenericError> {
        let response = self
            .send_json::<LicenseResponse, GenericError>(PendingRequest::get(["_license"]))
            .await?;
        Ok(response.license)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_major_version() {
        let version: VersionInfo = serde_json::from_str(r#"{"number": "8.13.4"}"#).unwrap();
        assert_eq!(version.major(), Some(8));
    }
}
