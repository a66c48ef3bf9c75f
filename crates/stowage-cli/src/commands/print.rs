use clap::ValueEnum;
use stowage_build::DockerfileGenerator;
use stowage_build::envrc::merged_environment;

use super::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintKind {
    /// The Dockerfile for the first config
    Dockerfile,
    /// The rendered pups config for the first config
    Config,
    /// Merged non-secret environment of every config, as YAML
    Env,
}

pub fn print(ctx: &Context, kind: PrintKind, names: &[String]) -> anyhow::Result<()> {
    let configs = ctx.load_configs(names)?;
    let Some(first) = configs.first() else {
        anyhow::bail!("no configs given");
    };
    if kind != PrintKind::Env && configs.len() > 1 {
        tracing::warn!(
            printed = %first.name,
            ignored = configs.len() - 1,
            "only the first config is printed"
        );
    }

    match kind {
        PrintKind::Dockerfile => {
            let secrets = ctx.secrets();
            let config_file = format!("{}.yaml", first.name);
            let dockerfile = DockerfileGenerator::new(first, &secrets)
                .pups_args(&ctx.config.compose.pups_args)
                .config_file(&config_file)
                .default_base_image(&ctx.config.build.base_image)
                .render();
            print!("{dockerfile}");
        }
        PrintKind::Config => println!("{}", first.yaml()),
        PrintKind::Env => {
            let secrets = ctx.secrets();
            let mut env = merged_environment(&configs);
            env.retain(|key, _| !secrets.is_secret(key));
            print!("{}", serde_yaml::to_string(&env)?);
        }
    }
    Ok(())
}
