use std::path::PathBuf;

use stowage_build::{ArtifactWriter, Bundle, ServiceBuilder, aggregate};

use super::Context;

/// Write the compose bundle for `names` into `{output_dir}/{names[0]}/`.
pub fn compose(
    ctx: &Context,
    names: &[String],
    output_dir: Option<PathBuf>,
    bake_env: bool,
) -> anyhow::Result<()> {
    if names.is_empty() {
        anyhow::bail!("no configs given; usage: stowage compose <config>...");
    }

    // Load everything before touching the output directory
    let configs = ctx.load_configs(names)?;

    let settings = &ctx.config.compose;
    let secrets = ctx.secrets();
    let builder = ServiceBuilder::from_config(settings, secrets.clone());
    let aggregate = aggregate(&configs, &builder)?;

    let output_root = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let dir = output_root.join(&configs[0].name);

    let bundle = Bundle {
        configs: &configs,
        aggregate: &aggregate,
        secrets: &secrets,
        pups_args: &settings.pups_args,
        default_base_image: &ctx.config.build.base_image,
        bake_env,
    };
    let written = ArtifactWriter::new().write_bundle(&dir, &bundle)?;

    println!(
        "Wrote {} files for {} service(s) to {}",
        written.len(),
        aggregate.services.len(),
        dir.display()
    );
    println!();
    println!("Start with:");
    println!("  cd {} && source .envrc && docker compose up", dir.display());
    Ok(())
}
