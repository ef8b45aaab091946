use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Application";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArgoApp {
    pub api_version: String,
    pub kind: String,
    pub metadata: AppMetadata,
    pub spec: AppSpec,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppMetadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    pub project: String,
    pub sources: Vec<AppSource>,
    pub destination: AppDestination,
    pub sync_policy: SyncPolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppDestination {
    /// Cluster name as registered with the controller.
    pub name: String,
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub target_revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<AppHelmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<AppPluginConfig>,
}

impl AppSource {
    pub fn new(repo_url: impl Into<String>, target_revision: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            target_revision: target_revision.into(),
            path: None,
            chart: None,
            helm: None,
            plugin: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppHelmConfig {
    /// Always serialized, an empty list included.
    #[serde(default)]
    pub value_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    /// Inline values as a JSON document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppPluginConfig {
    pub name: String,
    #[serde(default)]
    pub env: Vec<PluginEnv>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PluginEnv {
    pub name: String,
    pub value: String,
}

impl PluginEnv {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    pub automated: AutomatedSync,
    pub sync_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSync {
    pub prune: bool,
    pub self_heal: bool,
}
