use std::path::Path;

use stowage_build::ConcourseConfig;

use super::Context;

/// Print or write the Concourse build job for one config.
pub fn concourse(ctx: &Context, name: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let configs = ctx.load_configs(&[name.to_owned()])?;
    let Some(config) = configs.first() else {
        anyhow::bail!("config '{name}' could not be loaded");
    };

    let job = ConcourseConfig::generate(
        config,
        &ctx.secrets(),
        &ctx.config.compose.pups_args,
        &ctx.config.build.base_image,
    )?;
    let yaml = job.to_yaml()?;

    match output {
        Some(path) => {
            std::fs::write(path, &yaml).map_err(|e| {
                anyhow::anyhow!("error writing concourse job config {}: {e}", path.display())
            })?;
            println!("Wrote concourse job for '{name}' to {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
