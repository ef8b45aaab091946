use crate::{app_type, config, context::Context};
use anyhow::{Context as anyhowContext, Result};

pub(crate) fn classify_instance(ctx: &Context) -> Result<()> {
    let instance = config::resolve(ctx).context("resolving instance configuration")?;
    let app_type = app_type::classify(ctx, &instance);

    println!("instance: {}", ctx.instance_name);
    println!(
        "baseApp: {} (from {})",
        instance.base_app,
        instance.base_app_source.as_str()
    );
    println!("appType: {app_type}");

    Ok(())
}
