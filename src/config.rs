//! Instance configuration.
//!
//! An instance directory may hold up to three files that say something about
//! how the instance is deployed. They are probed in a fixed order:
//!
//! 1. `.cdk8s.yaml`, the renderer config and the only source of settings
//! 2. `values.yaml`, chart values that may name the base app
//! 3. `kustomization.yaml`, whose `resources`/`bases` may point into `apps/`
//!
//! `values.yaml` and `kustomization.yaml` only ever name the base app. Keys
//! in chart values such as `env` or `values` belong to the chart and never
//! become instance settings, even when the file also names the base app.
//!
//! A file that cannot be read or parsed is logged and treated as absent.

use crate::{
    argocd::PluginEnv,
    context::Context,
    error::{ConfigError, Recovery},
};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};
use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

pub(crate) const RENDERER_CONFIG: &str = ".cdk8s.yaml";
pub(crate) const CHART_VALUES: &str = "values.yaml";
pub(crate) const KUSTOMIZATION: &str = "kustomization.yaml";

/// Keys that may name the base app, highest precedence first.
const BASE_APP_KEYS: [&str; 3] = ["baseApp", "app", "chart"];

/// Settings read from the renderer config of an instance.
///
/// Every recognized key has a typed field. Anything else is kept in `extra`
/// untouched. String settings accept any scalar, so `chartVersion: 18.1`
/// reads as `"18.1"`.
///
/// `appType`/`type` and `helmRepo`/`chartRepo` are separate keys. Use
/// [`InstanceConfig::declared_app_type`] and [`InstanceConfig::chart_repo`]
/// to read them.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceConfig {
    #[serde(default, deserialize_with = "scalar")]
    pub base_app: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub app: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub chart: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub app_type: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "scalar")]
    pub type_: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub chart_path: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub helm_repo: Option<String>,
    #[serde(default, rename = "chartRepo", deserialize_with = "scalar")]
    pub chart_repo_url: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub chart_name: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub chart_version: Option<String>,
    #[serde(default)]
    pub value_files: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<JsonValue>,
    pub values: Option<JsonValue>,
    #[serde(default, deserialize_with = "scalar")]
    pub release_name: Option<String>,

    #[serde(default)]
    pub env: Vec<JsonValue>,

    pub prune: Option<bool>,
    pub self_heal: Option<bool>,
    pub retry: Option<JsonValue>,
    #[serde(default)]
    pub sync_options: Vec<String>,

    #[serde(default, deserialize_with = "scalar")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub project: Option<String>,
    #[serde(default, rename = "repoURL", deserialize_with = "scalar")]
    pub repo_url: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub target_revision: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, YamlValue>,
}

impl InstanceConfig {
    /// First of `baseApp`, `app`, `chart` that is set and non-empty.
    pub fn base_app_hint(&self) -> Option<&str> {
        first_set([&self.base_app, &self.app, &self.chart])
    }

    /// `appType`, else `type`.
    pub fn declared_app_type(&self) -> Option<&str> {
        first_set([&self.app_type, &self.type_])
    }

    /// `helmRepo`, else `chartRepo`.
    pub fn chart_repo(&self) -> Option<&str> {
        first_set([&self.helm_repo, &self.chart_repo_url])
    }

    /// Extra plugin env entries in declaration order. Entries without a
    /// string `name` and a scalar `value` are dropped.
    pub fn extra_env(&self) -> Vec<PluginEnv> {
        self.env
            .iter()
            .filter_map(|entry| {
                let parsed = entry
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .zip(entry.get("value").and_then(scalar_to_string))
                    .map(|(name, value)| PluginEnv::new(name, value));
                if parsed.is_none() {
                    warn!("Ignoring malformed env entry {entry}");
                }
                parsed
            })
            .collect()
    }
}

fn first_set<const N: usize>(fields: [&Option<String>; N]) -> Option<&str> {
    fields
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.to_owned()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Any scalar as a string. Sequences and mappings are ignored.
fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    let scalar = value.as_ref().and_then(scalar_to_string);
    if let (None, Some(value)) = (&scalar, &value) {
        if !value.is_null() {
            warn!("Ignoring non-scalar setting {value}");
        }
    }
    Ok(scalar)
}

#[derive(Debug, Default, Deserialize)]
struct Kustomization {
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    bases: Vec<String>,
}

impl Kustomization {
    /// The path component right after the first `apps` component found in
    /// `resources`, then `bases`.
    fn base_app(&self) -> Option<String> {
        self.resources
            .iter()
            .chain(self.bases.iter())
            .find_map(|reference| {
                reference
                    .split('/')
                    .tuple_windows()
                    .find(|(dir, name)| *dir == "apps" && !name.is_empty())
                    .map(|(_, name)| name.to_owned())
            })
    }
}

/// Which probe the base app name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseAppSource {
    RendererConfig,
    ChartValues,
    Kustomization,
    InstanceName,
}

impl BaseAppSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseAppSource::RendererConfig => RENDERER_CONFIG,
            BaseAppSource::ChartValues => CHART_VALUES,
            BaseAppSource::Kustomization => KUSTOMIZATION,
            BaseAppSource::InstanceName => "instance name",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedInstance {
    pub base_app: String,
    pub base_app_source: BaseAppSource,
    pub config: InstanceConfig,
}

/// Read the instance directory and work out the base app.
///
/// Only an error whose policy is [`Recovery::Abort`] is returned; everything
/// else is logged and the candidate skipped.
pub(crate) fn resolve(ctx: &Context) -> Result<ResolvedInstance, ConfigError> {
    let dir = ctx.instance_dir();

    let config: InstanceConfig =
        recover(read_candidate(&dir.join(RENDERER_CONFIG)))?.unwrap_or_default();

    let resolved = |base_app: String, base_app_source: BaseAppSource| {
        info!(
            "Base app for {} is {base_app} (from {})",
            ctx.instance_name,
            base_app_source.as_str()
        );
        ResolvedInstance {
            base_app,
            base_app_source,
            config: config.clone(),
        }
    };

    if let Some(name) = config.base_app_hint() {
        return Ok(resolved(name.to_owned(), BaseAppSource::RendererConfig));
    }

    let values: Option<Mapping> = recover(read_candidate(&dir.join(CHART_VALUES)))?;
    if let Some(name) = values.as_ref().and_then(base_app_from_mapping) {
        return Ok(resolved(name, BaseAppSource::ChartValues));
    }

    let kustomization: Option<Kustomization> =
        recover(read_candidate(&dir.join(KUSTOMIZATION)))?;
    if let Some(name) = kustomization.as_ref().and_then(Kustomization::base_app) {
        return Ok(resolved(name, BaseAppSource::Kustomization));
    }

    warn!(
        "No base app configured for {}, using the instance name",
        ctx.instance_name
    );
    Ok(resolved(
        ctx.instance_name.to_owned(),
        BaseAppSource::InstanceName,
    ))
}

fn base_app_from_mapping(mapping: &Mapping) -> Option<String> {
    BASE_APP_KEYS
        .iter()
        .filter_map(|key| mapping.get(*key).and_then(YamlValue::as_str))
        .find(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Load one candidate file. A missing file or an empty document is `None`.
fn read_candidate<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not present", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            })
        }
    };

    let parse_error = |source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    };

    if content.trim().is_empty() {
        return Ok(None);
    }
    let document: YamlValue = serde_yaml::from_str(&content).map_err(parse_error)?;
    if document.is_null() {
        return Ok(None);
    }
    serde_yaml::from_value(document)
        .map(Some)
        .map_err(parse_error)
}

fn recover<T>(result: Result<Option<T>, ConfigError>) -> Result<Option<T>, ConfigError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => match err.recovery() {
            Recovery::Continue => {
                warn!("{err}, skipping");
                Ok(None)
            }
            Recovery::Abort => Err(err),
        },
    }
}
