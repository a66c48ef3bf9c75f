//! Concourse job input for building one config's image in CI.
//!
//! The generated document is consumed by a static Concourse resource:
//! `dockerfile` and `config` become files in the build context, and
//! `concourse_task` is an `oci-build-task` definition whose params
//! forward each non-secret env value as a `BUILD_ARG_*`.

use std::collections::BTreeMap;

use serde::Serialize;
use stowage_core::Configuration;

use crate::dockerfile::DockerfileGenerator;
use crate::secrets::SecretFilter;

const BUILD_TASK_IMAGE: &str = "concourse/oci-build-task";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcourseConfig {
    pub from_namespace: String,
    pub from_tag: String,
    pub dockerfile: String,
    /// The task definition, as its own YAML text
    pub concourse_task: String,
    pub config: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcourseTask {
    pub params: BTreeMap<String, String>,
    pub platform: String,
    pub image_resource: ImageResource,
    pub inputs: Vec<TaskIo>,
    pub outputs: Vec<TaskIo>,
    pub run: TaskRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskIo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRun {
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConcourseError {
    #[error("failed to serialize concourse {what}")]
    Serialize {
        what: &'static str,
        source: serde_yaml::Error,
    },
}

impl ConcourseTask {
    /// An `oci-build-task` that passes the non-secret env of `config` as
    /// build args.
    pub fn for_config(config: &Configuration, secrets: &SecretFilter) -> Self {
        let params = config
            .env
            .iter()
            .filter(|(key, _)| !secrets.is_secret(key))
            .map(|(key, value)| (format!("BUILD_ARG_{key}"), value.clone()))
            .collect();

        Self {
            params,
            platform: "linux".to_owned(),
            image_resource: ImageResource {
                kind: "registry-image".to_owned(),
                source: ImageSource {
                    repository: BUILD_TASK_IMAGE.to_owned(),
                },
            },
            inputs: vec![io("docker-config"), io("docker-from-image")],
            outputs: vec![io("image")],
            run: TaskRun {
                path: "build".to_owned(),
            },
        }
    }
}

impl ConcourseConfig {
    pub fn generate(
        config: &Configuration,
        secrets: &SecretFilter,
        pups_args: &str,
        default_base_image: &str,
    ) -> Result<Self, ConcourseError> {
        let base_image = config.base_image.as_deref().unwrap_or(default_base_image);
        let (namespace, tag) = split_image(base_image);

        let task = ConcourseTask::for_config(config, secrets);
        let concourse_task = serde_yaml::to_string(&task).map_err(|e| ConcourseError::Serialize {
            what: "task",
            source: e,
        })?;

        let dockerfile = DockerfileGenerator::new(config, secrets)
            .pups_args(pups_args)
            .default_base_image(default_base_image)
            .render();

        Ok(Self {
            from_namespace: namespace.to_owned(),
            from_tag: tag.to_owned(),
            dockerfile,
            concourse_task,
            config: config.yaml(),
        })
    }

    pub fn to_yaml(&self) -> Result<String, ConcourseError> {
        serde_yaml::to_string(self).map_err(|e| ConcourseError::Serialize {
            what: "config",
            source: e,
        })
    }
}

fn io(name: &str) -> TaskIo {
    TaskIo {
        name: name.to_owned(),
    }
}

/// Split `repo:tag`; a missing tag is `latest`. A `:` inside the registry
/// host (`host:5000/repo`) is not a tag separator.
fn split_image(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, tag),
        _ => (image, "latest"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn config() -> Configuration {
        let mut config = Configuration::new("web");
        config
            .env
            .insert("DISCOURSE_HOSTNAME".to_owned(), "forum.example.com".to_owned());
        config
            .env
            .insert("DB_PASSWORD".to_owned(), "hunter2".to_owned());
        config.documents = vec!["env:\n  DISCOURSE_HOSTNAME: forum.example.com\n".to_owned()];
        config
    }

    #[test]
    fn split_image_variants() {
        assert_eq!(
            split_image("discourse/base:2.0.20240825-0027"),
            ("discourse/base", "2.0.20240825-0027")
        );
        assert_eq!(split_image("discourse/base"), ("discourse/base", "latest"));
        assert_eq!(
            split_image("registry:5000/discourse/base"),
            ("registry:5000/discourse/base", "latest")
        );
        assert_eq!(
            split_image("registry:5000/discourse/base:beta"),
            ("registry:5000/discourse/base", "beta")
        );
    }

    #[test]
    fn task_params_forward_non_secret_env() {
        let task = ConcourseTask::for_config(&config(), &SecretFilter::new(["DB_PASSWORD"]));

        assert_eq!(task.params.len(), 1);
        assert_eq!(
            task.params["BUILD_ARG_DISCOURSE_HOSTNAME"],
            "forum.example.com"
        );
        assert_eq!(task.platform, "linux");
        assert_eq!(task.image_resource.source.repository, BUILD_TASK_IMAGE);
    }

    #[test]
    fn generated_config_round_trips_as_yaml() {
        let generated = ConcourseConfig::generate(
            &config(),
            &SecretFilter::new(["DB_PASSWORD"]),
            "--skip-tags=precompile,migrate,db",
            "discourse/base:2.0.20240825-0027",
        )
        .unwrap();
        let doc: Value = serde_yaml::from_str(&generated.to_yaml().unwrap()).unwrap();

        assert_eq!(doc["from_namespace"], Value::from("discourse/base"));
        assert_eq!(doc["from_tag"], Value::from("2.0.20240825-0027"));
        let dockerfile = doc["dockerfile"].as_str().unwrap();
        assert!(dockerfile.contains("COPY config.yaml /temp-config.yaml"));
        assert!(!dockerfile.contains("DB_PASSWORD"));

        let task: Value = serde_yaml::from_str(doc["concourse_task"].as_str().unwrap()).unwrap();
        assert_eq!(task["image_resource"]["type"], Value::from("registry-image"));
        assert_eq!(task["run"]["path"], Value::from("build"));
        assert_eq!(task["inputs"][1]["name"], Value::from("docker-from-image"));
        assert!(task["params"].get("BUILD_ARG_DB_PASSWORD").is_none());

        assert!(doc["config"].as_str().unwrap().contains("forum.example.com"));
    }

    #[test]
    fn config_base_image_overrides_default() {
        let mut config = config();
        config.base_image = Some("acme/base:7".to_owned());
        let generated =
            ConcourseConfig::generate(&config, &SecretFilter::default(), "", "unused:1").unwrap();

        assert_eq!(generated.from_namespace, "acme/base");
        assert_eq!(generated.from_tag, "7");
    }
}
