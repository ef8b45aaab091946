use crate::{
    app_type::{self, AppType},
    argocd::{
        AppDestination, AppMetadata, AppSource, AppSpec, ArgoApp, SyncPolicy, API_VERSION, KIND,
    },
    config::{self, ResolvedInstance},
    context::Context,
    sources, sync_policy,
};
use anyhow::{Context as anyhowContext, Result};
use log::info;

pub(crate) const DEFAULT_PROJECT: &str = "default";
pub(crate) const DEFAULT_ARGO_NAMESPACE: &str = "argocd";

/// Knobs a caller can turn on top of what the instance directory says.
#[derive(Debug, Clone)]
pub(crate) struct Options {
    /// Skip classification and use this app type.
    pub app_type: Option<AppType>,
    /// Treat a missing remote chart repository as fatal.
    pub strict: bool,
    /// Namespace the Application object itself lives in.
    pub argo_namespace: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            app_type: None,
            strict: false,
            argo_namespace: DEFAULT_ARGO_NAMESPACE.to_owned(),
        }
    }
}

/// Run the whole pipeline for the instance described by `ctx`.
pub(crate) fn generate(ctx: &Context, options: &Options) -> Result<ArgoApp> {
    info!(
        "Processing app {} in {} ({} mode)",
        ctx.instance_name,
        ctx.cluster(),
        ctx.operation_mode
    );

    let instance = config::resolve(ctx).context("resolving instance configuration")?;
    let app_type = match options.app_type {
        Some(app_type) => {
            info!("App type forced to {app_type}");
            app_type
        }
        None => app_type::classify(ctx, &instance),
    };
    let sources = sources::synthesize(ctx, &instance, app_type, options.strict)
        .context(format!("synthesizing sources for {}", ctx.instance_name))?;
    let sync_policy = sync_policy::build(&instance.config);

    Ok(assemble(
        ctx,
        &instance,
        sources,
        sync_policy,
        &options.argo_namespace,
    ))
}

/// Put the final Application together.
pub(crate) fn assemble(
    ctx: &Context,
    instance: &ResolvedInstance,
    sources: Vec<AppSource>,
    sync_policy: SyncPolicy,
    argo_namespace: &str,
) -> ArgoApp {
    let config = &instance.config;

    ArgoApp {
        api_version: API_VERSION.to_owned(),
        kind: KIND.to_owned(),
        metadata: AppMetadata {
            name: format!(
                "{}-{}",
                ctx.cluster_name,
                config.name.as_deref().unwrap_or(&ctx.instance_name)
            ),
            namespace: argo_namespace.to_owned(),
        },
        spec: AppSpec {
            project: config
                .project
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_owned()),
            sources,
            destination: AppDestination {
                name: ctx.cluster(),
                namespace: config
                    .namespace
                    .clone()
                    .unwrap_or_else(|| ctx.instance_name.to_owned()),
            },
            sync_policy,
        },
    }
}
