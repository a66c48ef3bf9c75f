use std::collections::HashMap;

use serde_yaml::Value;
use stowage_build::writer::ENVRC_FILE_NAME;
use stowage_build::{
    ArtifactWriter, Bundle, DockerfileGenerator, SecretFilter, ServiceBuilder, aggregate,
};
use stowage_core::{Configuration, DEFAULT_PUPS_ARGS, Link, Volume};
use tempfile::TempDir;

const BASE: &str = "discourse/base:2.0.20240825-0027";

fn secrets() -> SecretFilter {
    SecretFilter::new(["DB_PASSWORD"])
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn web() -> Configuration {
    let mut config = Configuration::new("web");
    config.env = env(&[
        ("RAILS_ENV", "production"),
        ("DISCOURSE_HOSTNAME", "forum.example.com"),
    ]);
    config.expose = vec!["443".to_owned(), "80".to_owned()];
    config.documents = vec!["env:\n  RAILS_ENV: production\n".to_owned()];
    config
}

fn data() -> Configuration {
    let mut config = Configuration::new("data");
    config.env = env(&[("CREATE_DB_ON_BOOT", "1"), ("DB_PASSWORD", "hunter2")]);
    config.volumes = vec![Volume {
        host: "pgdata".to_owned(),
        guest: "/var/lib/postgresql".to_owned(),
    }];
    config.documents = vec!["env:\n  DB_PASSWORD: hunter2\n".to_owned()];
    config
}

fn write(dir: &std::path::Path, configs: &[Configuration], bake_env: bool) -> Vec<std::path::PathBuf> {
    let secrets = secrets();
    let builder = ServiceBuilder::new(secrets.clone());
    let aggregate = aggregate(configs, &builder).unwrap();
    let bundle = Bundle {
        configs,
        aggregate: &aggregate,
        secrets: &secrets,
        pups_args: DEFAULT_PUPS_ARGS,
        default_base_image: BASE,
        bake_env,
    };
    ArtifactWriter::new().write_bundle(dir, &bundle).unwrap()
}

// ── Dockerfile Generation Tests ──

#[test]
fn dockerfile_runs_pups_over_config() {
    let config = web();
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets)
        .config_file("web.yaml")
        .render();

    assert!(output.starts_with(&format!("ARG dockerfile_from_image={BASE}\n")));
    assert!(output.contains("FROM ${dockerfile_from_image}\n"));
    assert!(output.contains("COPY web.yaml /temp-config.yaml\n"));
    assert!(output.contains(
        "RUN cat /temp-config.yaml | /usr/local/bin/pups --skip-tags=precompile,migrate,db --stdin && rm /temp-config.yaml\n"
    ));
    assert!(output.ends_with("CMD [\"/sbin/boot\"]\n"));
}

#[test]
fn dockerfile_args_are_sorted_and_skip_secrets() {
    let mut config = web();
    config.env.insert("DB_PASSWORD".to_owned(), "x".to_owned());
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets).render();

    let args = output.find("ARG DISCOURSE_HOSTNAME\n").unwrap();
    let rails = output.find("ARG RAILS_ENV\n").unwrap();
    assert!(args < rails);
    assert!(!output.contains("DB_PASSWORD"));
    assert!(!output.contains("ENV "));
}

#[test]
fn dockerfile_bake_env_adds_env_lines() {
    let config = web();
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets)
        .bake_env(true)
        .render();

    assert!(output.contains("ENV DISCOURSE_HOSTNAME=${DISCOURSE_HOSTNAME}\n"));
    assert!(output.contains("ENV RAILS_ENV=${RAILS_ENV}\n"));
}

#[test]
fn dockerfile_exposes_container_ports() {
    let mut config = web();
    config.expose = vec!["8080:80".to_owned(), "2222:22".to_owned()];
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets).render();

    assert!(output.contains("EXPOSE 80\nEXPOSE 22\n"));
}

#[test]
fn dockerfile_uses_configured_images() {
    let mut config = web();
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets)
        .default_base_image("acme/base:1")
        .render();
    assert!(output.contains("ARG dockerfile_from_image=acme/base:1\n"));

    config.base_image = Some("acme/base:2".to_owned());
    let output = DockerfileGenerator::new(&config, &secrets)
        .default_base_image("acme/base:1")
        .render();
    assert!(output.contains("ARG dockerfile_from_image=acme/base:2\n"));
}

#[test]
fn dockerfile_update_pups_and_no_boot_command() {
    let mut config = web();
    config.update_pups = true;
    config.no_boot_command = true;
    let secrets = secrets();
    let output = DockerfileGenerator::new(&config, &secrets)
        .pups_args("--tags=web")
        .render();

    assert!(output.contains("RUN cd /pups && git pull && cat /temp-config.yaml | /usr/local/bin/pups --tags=web --stdin"));
    assert!(!output.contains("CMD"));
}

// ── Bundle Tests ──

#[test]
fn bundle_writes_expected_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");

    let written = write(&dir, &[web(), data()], false);

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            ".envrc",
            "web.yaml",
            "web.dockerfile",
            "data.yaml",
            "data.dockerfile",
            "docker-compose.yaml",
        ]
    );
    for path in &written {
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[test]
fn bundle_creates_nested_output_dir() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("subfolder/sub-subfolder/web");

    write(&dir, &[web()], false);

    assert!(dir.join("docker-compose.yaml").exists());
}

#[test]
fn bundle_overwrites_previous_output() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("web.yaml"), "stale content that is much longer than the new one").unwrap();

    write(&dir, &[web()], false);

    let content = std::fs::read_to_string(dir.join("web.yaml")).unwrap();
    assert_eq!(content, "env:\n  RAILS_ENV: production\n");
}

#[test]
fn dockerfile_references_its_rendered_config() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");

    write(&dir, &[web(), data()], false);

    let dockerfile = std::fs::read_to_string(dir.join("data.dockerfile")).unwrap();
    assert!(dockerfile.contains("COPY data.yaml /temp-config.yaml"));
    assert!(dockerfile.contains("RUN cat /temp-config.yaml"));
    assert!(!dockerfile.contains("DB_PASSWORD"));
}

#[test]
fn envrc_is_written_once_with_primary_last() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");
    let mut second = data();
    second
        .env
        .insert("RAILS_ENV".to_owned(), "development".to_owned());

    write(&dir, &[web(), second], false);

    let envrc = std::fs::read_to_string(dir.join(ENVRC_FILE_NAME)).unwrap();
    let dev = envrc.find("export RAILS_ENV=\"development\"").unwrap();
    let prod = envrc.find("export RAILS_ENV=\"production\"").unwrap();
    assert!(dev < prod, "primary config must be exported last:\n{envrc}");
    // Runtime env keeps secrets
    assert!(envrc.contains("export DB_PASSWORD=\"hunter2\""));
}

// ── End-to-end compose document ──

#[test]
fn compose_document_for_web_and_data() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");

    write(&dir, &[web(), data()], false);

    let text = std::fs::read_to_string(dir.join("docker-compose.yaml")).unwrap();
    assert!(text.contains("dockerfile: ./data.dockerfile"));
    assert!(text.contains("image: local_discourse/web"));

    let doc: Value = serde_yaml::from_str(&text).unwrap();
    let web = &doc["services"]["web"];
    assert_eq!(web["links"], Value::Sequence(vec![]));
    assert_eq!(
        web["ports"],
        Value::Sequence(vec![Value::from("443"), Value::from("80")])
    );
    assert_eq!(web["environment"]["RAILS_ENV"], Value::from("production"));
    assert_eq!(web["environment"]["PRECOMPILE_ON_BOOT"], Value::from("1"));

    let data = &doc["services"]["data"];
    assert_eq!(data["build"]["dockerfile"], Value::from("./data.dockerfile"));
    assert_eq!(
        data["build"]["args"],
        Value::Sequence(vec![Value::from("CREATE_DB_ON_BOOT")])
    );
    assert_eq!(data["environment"]["DB_PASSWORD"], Value::from("hunter2"));
    assert_eq!(
        data["volumes"],
        Value::Sequence(vec![Value::from("pgdata:/var/lib/postgresql")])
    );

    let volumes = doc["volumes"].as_mapping().unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes.get("pgdata"), Some(&Value::Null));
}

#[test]
fn compose_links_are_rendered_name_alias() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("web");
    let mut config = web();
    config.links = vec![Link {
        name: "data".to_owned(),
        alias: "postgres".to_owned(),
    }];

    write(&dir, &[config, data()], false);

    let doc: Value =
        serde_yaml::from_str(&std::fs::read_to_string(dir.join("docker-compose.yaml")).unwrap())
            .unwrap();
    assert_eq!(
        doc["services"]["web"]["links"],
        Value::Sequence(vec![Value::from("data:postgres")])
    );
}

#[test]
fn bundle_output_is_byte_identical_across_runs() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");

    write(&first, &[web(), data()], true);
    write(&second, &[web(), data()], true);

    for name in [".envrc", "web.dockerfile", "data.dockerfile", "docker-compose.yaml"] {
        assert_eq!(
            std::fs::read(first.join(name)).unwrap(),
            std::fs::read(second.join(name)).unwrap(),
            "{name} differs"
        );
    }
}
