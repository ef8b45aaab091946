use crate::{
    config::{ResolvedInstance, RENDERER_CONFIG},
    context::Context,
    error::SynthesisError,
};
use log::{debug, info, warn};
use std::{fmt, path::PathBuf, str::FromStr};

/// Chart descriptor inside a base app directory.
pub(crate) const CHART_DESCRIPTOR: &str = "Chart.yaml";
/// Renderer descriptor inside a base app directory.
pub(crate) const RENDERER_DESCRIPTOR: &str = "cdk8s.yaml";

/// How an instance is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppType {
    /// Plain manifests from `apps/<base>`, optionally overlaid.
    Plain,
    /// Chart in the deployment repository.
    LocalHelm,
    /// Chart pulled from a chart repository.
    RemoteHelm,
    /// Manifests rendered by the cdk8s plugin.
    LocalCdk8s,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Plain => "plain",
            AppType::LocalHelm => "local-helm",
            AppType::RemoteHelm => "remote-helm",
            AppType::LocalCdk8s => "local-cdk8s",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the canonical tags only. Config aliases go through [`classify`].
impl FromStr for AppType {
    type Err = SynthesisError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "plain" => Ok(AppType::Plain),
            "local-helm" => Ok(AppType::LocalHelm),
            "remote-helm" => Ok(AppType::RemoteHelm),
            "local-cdk8s" => Ok(AppType::LocalCdk8s),
            other => Err(SynthesisError::UnknownAppType(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Helm,
    Cdk8s,
    Plain,
}

const ALIASES: [(&str, Family); 8] = [
    ("helm", Family::Helm),
    ("helm-chart", Family::Helm),
    ("helmchart", Family::Helm),
    ("cdk8s", Family::Cdk8s),
    ("cdk", Family::Cdk8s),
    ("plain", Family::Plain),
    ("kubernetes", Family::Plain),
    ("k8s", Family::Plain),
];

fn family(declared: &str) -> Option<Family> {
    let declared = declared.to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == declared)
        .map(|(_, family)| *family)
}

/// Pick the deployment strategy for an instance. Always succeeds.
///
/// An explicit `appType` in the config wins. Otherwise the base app layout
/// decides, then a renderer config in the instance directory, and plain
/// manifests are the default.
pub(crate) fn classify(ctx: &Context, instance: &ResolvedInstance) -> AppType {
    let app_type = declared(instance).unwrap_or_else(|| probe(ctx, &instance.base_app));
    info!("App type for {} is {app_type}", ctx.instance_name);
    app_type
}

fn declared(instance: &ResolvedInstance) -> Option<AppType> {
    let config = &instance.config;
    let declared = config.declared_app_type()?;

    match family(declared) {
        Some(Family::Helm) if config.chart_repo().is_some() => Some(AppType::RemoteHelm),
        Some(Family::Helm) => Some(AppType::LocalHelm),
        Some(Family::Cdk8s) => Some(AppType::LocalCdk8s),
        Some(Family::Plain) => Some(AppType::Plain),
        None => {
            warn!("Unrecognized appType `{declared}`, inspecting the base app instead");
            None
        }
    }
}

fn probe(ctx: &Context, base_app: &str) -> AppType {
    let app_dir = ctx.base_app_dir(base_app);
    let probes: [(PathBuf, AppType); 4] = [
        (app_dir.join(CHART_DESCRIPTOR), AppType::LocalHelm),
        (app_dir.join(RENDERER_DESCRIPTOR), AppType::LocalCdk8s),
        (ctx.chart_dir(base_app), AppType::LocalHelm),
        (ctx.instance_dir().join(RENDERER_CONFIG), AppType::LocalCdk8s),
    ];

    for (path, app_type) in probes {
        if path.exists() {
            debug!("Found {}, treating as {app_type}", path.display());
            return app_type;
        }
        debug!("No {}", path.display());
    }

    AppType::Plain
}
