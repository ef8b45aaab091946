use anyhow::{anyhow, Result};
use clap::ValueEnum;
use derive_builder::Builder;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use url::Url;

pub(crate) const DEFAULT_REPO_URL: &str = "https://github.com/max06/deployments";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OperationMode {
    /// Emit the Application descriptor only
    #[default]
    Meta,
    /// Emit the descriptor; workload rendering is left to the plugin
    Full,
}

impl OperationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Meta => "meta",
            OperationMode::Full => "full",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about the run before any file is read. Built once in
/// `main` and only ever borrowed afterwards.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub(crate) struct Context {
    pub cluster_name: String,
    #[builder(default, setter(into, strip_option))]
    cluster_group: Option<String>,
    pub instance_name: String,
    /// Instance directory as given, relative to `repo_root` unless absolute.
    pub instance_path: PathBuf,
    #[builder(default = "DEFAULT_REPO_URL.to_owned()")]
    pub repo_url: String,
    #[builder(default)]
    pub operation_mode: OperationMode,
    #[builder(default = "PathBuf::from(\".\")")]
    pub repo_root: PathBuf,
}

impl Context {
    /// Cluster group, with an empty string treated as unset.
    pub fn cluster_group(&self) -> Option<&str> {
        self.cluster_group.as_deref().filter(|group| !group.is_empty())
    }

    /// Destination cluster, `<group>/<name>` when a group is set.
    pub fn cluster(&self) -> String {
        match self.cluster_group() {
            Some(group) => format!("{group}/{}", self.cluster_name),
            None => self.cluster_name.to_owned(),
        }
    }

    /// Where the instance directory lives on disk.
    pub fn instance_dir(&self) -> PathBuf {
        self.repo_root.join(&self.instance_path)
    }

    /// The instance path the way it is written into sources.
    pub fn instance_path_str(&self) -> String {
        self.instance_path
            .to_string_lossy()
            .trim_end_matches('/')
            .to_owned()
    }

    /// Repository-relative reference to a file inside the instance directory.
    pub fn instance_ref(&self, file: &str) -> String {
        format!("{}/{file}", self.instance_path_str())
    }

    pub fn base_app_dir(&self, base_app: &str) -> PathBuf {
        self.repo_root.join("apps").join(base_app)
    }

    pub fn chart_dir(&self, base_app: &str) -> PathBuf {
        self.repo_root.join("charts").join(base_app)
    }

    pub fn has_instance_file(&self, file: impl AsRef<Path>) -> bool {
        self.instance_dir().join(file).exists()
    }
}

/// Only https URLs with a host are accepted as the default repository.
pub(crate) fn parse_repo_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| anyhow!("invalid repository url {raw}: {e}"))?;
    if url.scheme() != "https" || url.host_str().is_none() {
        return Err(anyhow!("repository url {raw} must be https with a host"));
    }
    Ok(raw.to_owned())
}
