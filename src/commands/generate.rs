use crate::{
    application::{self, Options},
    cli::GenerateArgs,
    context::{Context, OperationMode},
    output::{self, Output},
};
use anyhow::{Context as anyhowContext, Result};
use log::info;

pub(crate) fn generate_application(ctx: &Context, args: &GenerateArgs) -> Result<()> {
    let options = Options {
        app_type: args.app_type()?,
        strict: args.strict,
        argo_namespace: args.argo_namespace.to_owned(),
    };

    let app = application::generate(ctx, &options)?;
    let manifest = output::render(&app)?;

    if ctx.operation_mode == OperationMode::Full {
        info!("Full mode: workload manifests are rendered by the plugin, emitting the Application only");
    }

    let result = output::emit(&manifest, args.output.as_deref(), args.write)
        .context(format!("emitting {}", app.metadata.name))?;

    if let (Output::Written, Some(path)) = (&result, &args.output) {
        println!("Wrote: {}", path.display());
    }

    Ok(())
}
