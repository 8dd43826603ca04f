//! `manifest.json`: one entry per generated mock module

use serde::{Deserialize, Serialize};

use crate::generate::{EndpointMocks, MockRun};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const API_DIR_NAME: &str = "api";

/// Mock module file name of an endpoint, e.g. `get-users-{id}.js`
pub fn mock_file_name(method: &str, path: &str) -> String {
    let kebab = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let kebab = if kebab.is_empty() { "root".to_string() } else { kebab };

    format!("{}-{}.js", method.to_lowercase(), kebab)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Uppercase HTTP method
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub operation_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mock_file: String,
    #[serde(default)]
    pub nullable_paths: Vec<String>,
}

impl ManifestEntry {
    pub fn from_mocks(mocks: &EndpointMocks) -> Self {
        let endpoint = &mocks.endpoint;
        Self {
            method: endpoint.method.as_str().to_string(),
            path: endpoint.path.clone(),
            operation_id: endpoint.operation_id.clone(),
            summary: endpoint.summary.clone(),
            description: endpoint.description.clone(),
            mock_file: mock_file_name(endpoint.method.as_lower(), &endpoint.path),
            nullable_paths: mocks.nullable_paths(),
        }
    }

    fn key(&self) -> (String, &str) {
        (self.method.to_uppercase(), self.path.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_run(run: &MockRun) -> Self {
        Self {
            manifest: run.endpoints.iter().map(ManifestEntry::from_mocks).collect(),
        }
    }

    /// Keep the entries of `existing` that this manifest does not regenerate.
    ///
    /// Kept entries come first, in their previous order.
    pub fn merge_existing(self, existing: Manifest) -> Manifest {
        let mut merged: Vec<ManifestEntry> = existing
            .manifest
            .into_iter()
            .filter(|old| !old.path.is_empty() && !old.method.is_empty())
            .filter(|old| !self.manifest.iter().any(|new| new.key() == old.key()))
            .collect();

        merged.extend(self.manifest);
        Manifest { manifest: merged }
    }

    pub fn get(&self, method: &str, path: &str) -> Option<&ManifestEntry> {
        let method = method.to_uppercase();
        self.manifest
            .iter()
            .find(|entry| entry.method.eq_ignore_ascii_case(&method) && entry.path == path)
    }
}
