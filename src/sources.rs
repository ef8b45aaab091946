//! Source list synthesis.
//!
//! Every app type maps to exactly one source, except plain apps with an
//! instance overlay which get the base first and the overlay second.

use crate::{
    app_type::AppType,
    argocd::{AppHelmConfig, AppPluginConfig, AppSource, PluginEnv},
    config::{InstanceConfig, ResolvedInstance, CHART_VALUES, KUSTOMIZATION, RENDERER_CONFIG},
    context::{Context, OperationMode},
    error::{Recovery, SynthesisError},
};
use itertools::Itertools;
use log::{info, warn};
use serde_json::Value;

pub(crate) const PLUGIN_NAME: &str = "cdk8s";
/// Stand-in repository for a remote chart without a configured repo.
pub(crate) const CHART_REPO_PLACEHOLDER: &str = "https://charts.example.com";
const OVERLAY_DIR: &str = "overlays";
const DEFAULT_REVISION: &str = "HEAD";

pub(crate) fn synthesize(
    ctx: &Context,
    instance: &ResolvedInstance,
    app_type: AppType,
    strict: bool,
) -> Result<Vec<AppSource>, SynthesisError> {
    let sources = match app_type {
        AppType::Plain => plain(ctx, instance),
        AppType::LocalHelm => vec![local_helm(ctx, instance)],
        AppType::RemoteHelm => vec![remote_helm(ctx, instance, strict)?],
        AppType::LocalCdk8s => vec![local_cdk8s(ctx, instance)],
    };
    info!("Synthesized {} source(s) for {app_type}", sources.len());
    Ok(sources)
}

fn base_source(ctx: &Context, config: &InstanceConfig) -> AppSource {
    AppSource::new(
        config.repo_url.as_deref().unwrap_or(&ctx.repo_url),
        config.target_revision.as_deref().unwrap_or(DEFAULT_REVISION),
    )
}

fn plain(ctx: &Context, instance: &ResolvedInstance) -> Vec<AppSource> {
    let base = base_source(ctx, &instance.config).with_path(format!("apps/{}", instance.base_app));

    if ctx.has_instance_file(OVERLAY_DIR) || ctx.has_instance_file(KUSTOMIZATION) {
        let overlay = base.clone().with_path(ctx.instance_path_str());
        return vec![base, overlay];
    }
    vec![base]
}

fn local_helm(ctx: &Context, instance: &ResolvedInstance) -> AppSource {
    let config = &instance.config;
    let path = config
        .chart_path
        .clone()
        .unwrap_or_else(|| format!("charts/{}", instance.base_app));

    AppSource {
        helm: Some(helm_config(ctx, config)),
        ..base_source(ctx, config).with_path(path)
    }
}

fn remote_helm(
    ctx: &Context,
    instance: &ResolvedInstance,
    strict: bool,
) -> Result<AppSource, SynthesisError> {
    let config = &instance.config;

    let repo_url = match config.chart_repo() {
        Some(repo) => repo.to_owned(),
        None => {
            let err = SynthesisError::MissingChartRepo {
                instance: ctx.instance_name.to_owned(),
            };
            match err.recovery(strict) {
                Recovery::Abort => return Err(err),
                Recovery::Continue => {
                    warn!("{err}, using {CHART_REPO_PLACEHOLDER}");
                    CHART_REPO_PLACEHOLDER.to_owned()
                }
            }
        }
    };

    let base = base_source(ctx, config);
    Ok(AppSource {
        repo_url,
        target_revision: config
            .chart_version
            .clone()
            .unwrap_or(base.target_revision),
        chart: Some(
            config
                .chart_name
                .clone()
                .unwrap_or_else(|| instance.base_app.to_owned()),
        ),
        helm: Some(helm_config(ctx, config)),
        path: None,
        plugin: None,
    })
}

fn helm_config(ctx: &Context, config: &InstanceConfig) -> AppHelmConfig {
    let instance_values = ctx
        .has_instance_file(CHART_VALUES)
        .then(|| ctx.instance_ref(CHART_VALUES));

    AppHelmConfig {
        value_files: instance_values
            .into_iter()
            .chain(config.value_files.iter().cloned())
            .unique()
            .collect(),
        parameters: config.parameters.clone(),
        values: config
            .values
            .as_ref()
            .filter(|values| !is_empty_value(values))
            .map(Value::to_string),
        release_name: config
            .release_name
            .clone()
            .filter(|name| !name.is_empty()),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn local_cdk8s(ctx: &Context, instance: &ResolvedInstance) -> AppSource {
    AppSource {
        plugin: Some(AppPluginConfig {
            name: PLUGIN_NAME.to_owned(),
            env: plugin_env(ctx, &instance.config),
        }),
        ..base_source(ctx, &instance.config).with_path(format!("apps/{}", instance.base_app))
    }
}

/// Plugin env in a fixed order. Config entries come last and may repeat
/// earlier names.
fn plugin_env(ctx: &Context, config: &InstanceConfig) -> Vec<PluginEnv> {
    let mut env = vec![PluginEnv::new("OPERATION_MODE", OperationMode::Full.as_str())];

    if ctx.has_instance_file(RENDERER_CONFIG) {
        env.push(PluginEnv::new("CONFIG_PATH", ctx.instance_ref(RENDERER_CONFIG)));
    }

    env.extend([
        PluginEnv::new("CLUSTER_NAME", &ctx.cluster_name),
        PluginEnv::new("CLUSTER_GROUP", ctx.cluster_group().unwrap_or_default()),
        PluginEnv::new("INSTANCE_NAME", &ctx.instance_name),
        PluginEnv::new("INSTANCE_PATH", ctx.instance_path_str()),
    ]);

    env.extend(config.extra_env());
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app_type,
        config::{self, tests::Fixture},
        context::DEFAULT_REPO_URL,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn run(fixture: &Fixture) -> (AppType, Vec<AppSource>) {
        let ctx = fixture.context();
        let instance = config::resolve(&ctx).unwrap();
        let app_type = app_type::classify(&ctx, &instance);
        (app_type, synthesize(&ctx, &instance, app_type, false).unwrap())
    }

    fn env_names(source: &AppSource) -> Vec<&str> {
        source
            .plugin
            .as_ref()
            .unwrap()
            .env
            .iter()
            .map(|e| e.name.as_str())
            .collect()
    }

    #[test]
    fn empty_instance_is_a_plain_app() {
        let (app_type, sources) = run(&Fixture::new());

        assert_eq!(app_type, AppType::Plain);
        assert_eq!(
            sources,
            vec![AppSource::new(DEFAULT_REPO_URL, "HEAD").with_path("apps/web")]
        );
    }

    #[test]
    fn plain_overlay_comes_after_base() {
        for marker in [OVERLAY_DIR, KUSTOMIZATION] {
            let fixture = Fixture::new();
            if marker == OVERLAY_DIR {
                fixture.repo_dir("clusters/prod-1/web/overlays");
            } else {
                fixture.instance_file(KUSTOMIZATION, "resources: [deployment.yaml]\n");
            }

            let (_, sources) = run(&fixture);
            let paths: Vec<_> = sources.iter().map(|s| s.path.as_deref()).collect();
            assert_eq!(paths, vec![Some("apps/web"), Some("clusters/prod-1/web")]);
        }
    }

    #[test]
    fn repo_and_revision_overrides_apply_to_plain_sources() {
        let fixture = Fixture::new();
        fixture.instance_file(
            RENDERER_CONFIG,
            indoc! {"
                appType: plain
                repoURL: https://git.example.com/fork
                targetRevision: release-1
            "},
        );

        let (_, sources) = run(&fixture);
        assert_eq!(
            sources,
            vec![AppSource::new("https://git.example.com/fork", "release-1").with_path("apps/web")]
        );
    }

    #[test]
    fn local_helm_merges_value_files() {
        let fixture = Fixture::new();
        fixture
            .repo_dir("charts/web")
            .instance_file(CHART_VALUES, "replicaCount: 2\n")
            .instance_file(
                RENDERER_CONFIG,
                indoc! {"
                    valueFiles:
                      - shared.yaml
                      - clusters/prod-1/web/values.yaml
                      - shared.yaml
                      - secrets.yaml
                    parameters:
                      - {name: image.tag, value: v2}
                    values:
                      ingress:
                        enabled: true
                    releaseName: web-prod
                "},
            );

        let (app_type, sources) = run(&fixture);
        assert_eq!(app_type, AppType::LocalHelm);
        assert_eq!(sources.len(), 1);

        let source = &sources[0];
        assert_eq!(source.path.as_deref(), Some("charts/web"));
        assert_eq!(
            source.helm,
            Some(AppHelmConfig {
                value_files: vec![
                    "clusters/prod-1/web/values.yaml".to_owned(),
                    "shared.yaml".to_owned(),
                    "secrets.yaml".to_owned(),
                ],
                parameters: vec![serde_json::json!({"name": "image.tag", "value": "v2"})],
                values: Some(r#"{"ingress":{"enabled":true}}"#.to_owned()),
                release_name: Some("web-prod".to_owned()),
            })
        );
    }

    #[test]
    fn local_helm_chart_path_override() {
        let fixture = Fixture::new();
        fixture.instance_file(
            RENDERER_CONFIG,
            "appType: helm\nchartPath: vendor/charts/web\nvalues: {}\n",
        );

        let (_, sources) = run(&fixture);
        assert_eq!(sources[0].path.as_deref(), Some("vendor/charts/web"));
        assert_eq!(sources[0].helm, Some(AppHelmConfig::default()));
    }

    #[test]
    fn remote_helm_uses_chart_repo() {
        let fixture = Fixture::new();
        fixture.instance_file(
            RENDERER_CONFIG,
            indoc! {"
                appType: helm
                chartRepo: https://charts.example.com
                chartName: redis
            "},
        );

        let (app_type, sources) = run(&fixture);
        assert_eq!(app_type, AppType::RemoteHelm);
        assert_eq!(
            sources,
            vec![AppSource {
                chart: Some("redis".to_owned()),
                helm: Some(AppHelmConfig::default()),
                ..AppSource::new("https://charts.example.com", "HEAD")
            }]
        );
    }

    #[test]
    fn remote_helm_chart_defaults() {
        let fixture = Fixture::new();
        fixture
            .instance_file(CHART_VALUES, "replicaCount: 1\n")
            .instance_file(
                RENDERER_CONFIG,
                "appType: helm\nhelmRepo: https://charts.bitnami.com\nchartVersion: 1.2.3\n",
            );

        let (_, sources) = run(&fixture);
        let source = &sources[0];
        assert_eq!(source.chart.as_deref(), Some("web"));
        assert_eq!(source.target_revision, "1.2.3");
        assert_eq!(source.path, None);
        assert_eq!(
            source.helm.as_ref().unwrap().value_files,
            vec!["clusters/prod-1/web/values.yaml".to_owned()]
        );
    }

    #[test]
    fn remote_helm_without_repo_uses_placeholder_unless_strict() {
        let fixture = Fixture::new();
        let ctx = fixture.context();
        let instance = config::resolve(&ctx).unwrap();

        let sources = synthesize(&ctx, &instance, AppType::RemoteHelm, false).unwrap();
        assert_eq!(sources[0].repo_url, CHART_REPO_PLACEHOLDER);

        assert_eq!(
            synthesize(&ctx, &instance, AppType::RemoteHelm, true),
            Err(SynthesisError::MissingChartRepo {
                instance: "web".to_owned()
            })
        );
    }

    #[test]
    fn cdk8s_env_order_with_config_entries_last() {
        let fixture = Fixture::new();
        fixture.instance_file(
            RENDERER_CONFIG,
            indoc! {"
                baseApp: api
                env:
                  - {name: X, value: '1'}
            "},
        );

        let (app_type, sources) = run(&fixture);
        assert_eq!(app_type, AppType::LocalCdk8s);
        assert_eq!(sources.len(), 1);

        let plugin = sources[0].plugin.as_ref().unwrap();
        assert_eq!(sources[0].path.as_deref(), Some("apps/api"));
        assert_eq!(plugin.name, PLUGIN_NAME);
        assert_eq!(
            plugin.env,
            vec![
                PluginEnv::new("OPERATION_MODE", "full"),
                PluginEnv::new("CONFIG_PATH", "clusters/prod-1/web/.cdk8s.yaml"),
                PluginEnv::new("CLUSTER_NAME", "prod-1"),
                PluginEnv::new("CLUSTER_GROUP", ""),
                PluginEnv::new("INSTANCE_NAME", "web"),
                PluginEnv::new("INSTANCE_PATH", "clusters/prod-1/web"),
                PluginEnv::new("X", "1"),
            ]
        );
    }

    #[test]
    fn cdk8s_env_without_renderer_config_keeps_duplicates() {
        let fixture = Fixture::new();
        fixture.repo_file("apps/web/cdk8s.yaml", "language: python\n");

        let (app_type, sources) = run(&fixture);
        assert_eq!(app_type, AppType::LocalCdk8s);
        assert_eq!(
            env_names(&sources[0]),
            vec![
                "OPERATION_MODE",
                "CLUSTER_NAME",
                "CLUSTER_GROUP",
                "INSTANCE_NAME",
                "INSTANCE_PATH"
            ]
        );

        let fixture = Fixture::new();
        fixture.instance_file(
            RENDERER_CONFIG,
            "env:\n  - {name: CLUSTER_NAME, value: override}\n",
        );
        let (_, sources) = run(&fixture);
        let env = &sources[0].plugin.as_ref().unwrap().env;
        assert_eq!(env.last(), Some(&PluginEnv::new("CLUSTER_NAME", "override")));
        assert_eq!(
            env_names(&sources[0])
                .iter()
                .filter(|name| **name == "CLUSTER_NAME")
                .count(),
            2
        );
    }
}
