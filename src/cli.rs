use crate::{
    app_type::AppType,
    application::DEFAULT_ARGO_NAMESPACE,
    context::{parse_repo_url, Context, ContextBuilder, OperationMode, DEFAULT_REPO_URL},
};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Synthesize Argo CD Applications for app instances
#[derive(Debug, Parser)]
#[clap(name = "argo-appgen", version)]
pub(crate) struct App {
    #[clap(flatten)]
    pub global_opts: GlobalOpts,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct GlobalOpts {
    /// Name of the cluster the instance is deployed to
    #[arg(long, env = "CLUSTER_NAME")]
    pub cluster_name: String,

    /// Group the cluster belongs to, prefixed to the destination name
    #[arg(long, env = "CLUSTER_GROUP")]
    pub cluster_group: Option<String>,

    /// Name of the app instance
    #[arg(long, env = "APP_INSTANCE_NAME")]
    pub instance_name: String,

    /// Directory holding the instance configuration
    #[arg(long, env = "APP_INSTANCE_PATH")]
    pub instance_path: PathBuf,

    /// Operation mode passed on to the renderer
    #[arg(long, env = "OPERATION_MODE", value_enum, default_value_t = OperationMode::Meta)]
    pub operation_mode: OperationMode,

    /// Repository the apps and charts are pulled from
    #[arg(long, env = "REPO_URL", default_value = DEFAULT_REPO_URL, value_parser = parse_repo_url)]
    pub repo_url: String,

    /// Root of the deployment repository checkout
    #[arg(long, env = "REPO_ROOT", default_value = ".")]
    pub repo_root: PathBuf,
}

impl GlobalOpts {
    pub fn context(&self) -> Result<Context> {
        let mut builder = ContextBuilder::default();
        builder
            .cluster_name(self.cluster_name.as_str())
            .instance_name(self.instance_name.as_str())
            .instance_path(self.instance_path.as_path())
            .repo_url(self.repo_url.as_str())
            .operation_mode(self.operation_mode)
            .repo_root(self.repo_root.as_path());
        if let Some(group) = &self.cluster_group {
            builder.cluster_group(group.as_str());
        }
        let ctx = builder.build()?;

        if !ctx.instance_dir().is_dir() {
            bail!(
                "instance path {} is not a directory",
                ctx.instance_dir().display()
            );
        }
        Ok(ctx)
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Generate the Application manifest for the instance
    Generate(GenerateArgs),
    /// Print the resolved base app and app type
    Classify {},
}

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    /// File to write the manifest to, stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Flag to actually write the output file, otherwise only the diff is shown
    #[arg(short, long, default_value_t = false)]
    pub write: bool,

    /// Skip classification: plain, local-helm, remote-helm or local-cdk8s
    #[arg(long)]
    pub app_type: Option<String>,

    /// Fail instead of substituting a placeholder for a missing chart repository
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Namespace of the Application object
    #[arg(long, default_value = DEFAULT_ARGO_NAMESPACE)]
    pub argo_namespace: String,
}

impl GenerateArgs {
    pub fn app_type(&self) -> Result<Option<AppType>> {
        Ok(self.app_type.as_deref().map(str::parse::<AppType>).transpose()?)
    }
}
