//! # Resource Synthesis
//!
//! Renders a component's template directory into concrete cluster objects and
//! decides, per object, whether it is applied or deleted this pass.
//!
//! ## Flow
//!
//! 1. Walk `<template_root>/<component>` for `*.yaml` files in sorted order
//! 2. Render each against the component config (blank renders are skipped)
//! 3. Decode the rendered text as a single object
//! 4. Stamp product/component labels and the operator owner reference
//! 5. Delete when the component is disabled or the object opts out via
//!    `wavefront.com/conditionally-provision: "false"`, otherwise patch and apply
//!
//! Any walk, read, render or decode failure fails the whole build.

mod render;

use crate::constants::{
    CONDITIONALLY_PROVISION_ANNOTATION, LABEL_COMPONENT, LABEL_NAME, PRODUCT_NAME,
};
use crate::patch::Patch;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to walk template directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render template {path}: {source:#}")]
    Render {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
    #[error("failed to decode rendered template {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("rendered template {path} is missing {field}")]
    Incomplete { path: PathBuf, field: &'static str },
}

/// Objects to create/update and objects to remove
#[derive(Debug, Default, Clone)]
pub struct Synthesized {
    pub to_apply: Vec<DynamicObject>,
    pub to_delete: Vec<DynamicObject>,
}

impl Synthesized {
    pub fn extend(&mut self, other: Synthesized) {
        self.to_apply.extend(other.to_apply);
        self.to_delete.extend(other.to_delete);
    }

    /// Move every apply-bound object to the delete list
    #[must_use]
    pub fn all_deleted(mut self) -> Self {
        self.to_delete.append(&mut self.to_apply);
        self
    }
}

/// Template root and owner shared by every component in one pass
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    template_root: PathBuf,
    owner: OwnerReference,
}

impl ResourceBuilder {
    pub fn new(template_root: impl Into<PathBuf>, owner: OwnerReference) -> Self {
        Self {
            template_root: template_root.into(),
            owner,
        }
    }

    /// Owner reference pointing at the operator's own Deployment
    pub fn operator_owner(deployment_name: &str, uid: &str) -> OwnerReference {
        OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: deployment_name.to_string(),
            uid: uid.to_string(),
            ..Default::default()
        }
    }

    pub fn build(
        &self,
        component: &str,
        enabled: bool,
        config: &impl Serialize,
        patch: &dyn Patch,
    ) -> Result<Synthesized, SynthesisError> {
        build(&self.template_root, component, enabled, &self.owner, config, patch)
    }
}

/// Synthesize one component's objects
pub fn build(
    template_root: &Path,
    component: &str,
    enabled: bool,
    owner: &OwnerReference,
    config: &impl Serialize,
    patch: &dyn Patch,
) -> Result<Synthesized, SynthesisError> {
    let dir = template_root.join(component);
    let env = render::environment();
    let context = minijinja::Value::from_serialize(config);
    let mut synthesized = Synthesized::default();

    for path in template_files(&dir)? {
        let source = std::fs::read_to_string(&path).map_err(|source| SynthesisError::Read {
            path: path.clone(),
            source,
        })?;
        let name = path.to_string_lossy();
        let rendered = env
            .render_named_str(&name, &source, &context)
            .map_err(|source| SynthesisError::Render {
                path: path.clone(),
                source,
            })?;
        if rendered.trim().is_empty() {
            debug!(template = %name, "template rendered blank, skipping");
            continue;
        }

        let mut obj = decode(&path, &rendered)?;
        stamp(&mut obj, component, owner);

        if !enabled || opts_out(&obj) {
            synthesized.to_delete.push(obj);
        } else {
            patch.apply(&mut obj);
            synthesized.to_apply.push(obj);
        }
    }

    debug!(
        component,
        enabled,
        apply = synthesized.to_apply.len(),
        delete = synthesized.to_delete.len(),
        "synthesized component resources"
    );
    Ok(synthesized)
}

fn template_files(dir: &Path) -> Result<Vec<PathBuf>, SynthesisError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| SynthesisError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn decode(path: &Path, rendered: &str) -> Result<DynamicObject, SynthesisError> {
    let obj: DynamicObject =
        serde_yaml::from_str(rendered).map_err(|source| SynthesisError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    if obj.types.is_none() {
        return Err(SynthesisError::Incomplete {
            path: path.to_path_buf(),
            field: "apiVersion/kind",
        });
    }
    if obj.metadata.name.is_none() {
        return Err(SynthesisError::Incomplete {
            path: path.to_path_buf(),
            field: "metadata.name",
        });
    }
    Ok(obj)
}

fn stamp(obj: &mut DynamicObject, component: &str, owner: &OwnerReference) {
    let labels = obj.metadata.labels.get_or_insert_with(Default::default);
    labels.insert(LABEL_NAME.to_string(), PRODUCT_NAME.to_string());
    labels
        .entry(LABEL_COMPONENT.to_string())
        .or_insert_with(|| component.to_string());
    obj.metadata.owner_references = Some(vec![owner.clone()]);
}

fn opts_out(obj: &DynamicObject) -> bool {
    obj.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(CONDITIONALLY_PROVISION_ANNOTATION))
        .is_some_and(|value| value == "false")
}
