//! # Reconcile
//!
//! One reconciliation pass over the `Wavefront` resource.
//!
//! The pass fetches fresh copies of the desired state and the override set,
//! preprocesses and validates them, synthesizes every component, applies then
//! deletes, computes health, writes status and reports telemetry. Validation
//! errors do not fail the pass: every component is synthesized disabled and the
//! errors become the status message. Cluster and template failures abort the
//! pass and are retried by the error policy.

use crate::cluster::{get_typed, ClusterClient, ClusterError, ResourceKey};
use crate::components::{
    build_components, disabled_components, known_workloads, validate_components, Component,
};
use crate::constants::RESOURCE_OVERRIDES_NAME;
use crate::controller::apply::{apply_all, delete_all};
use crate::controller::status::{
    override_set_status, validation_failed_status, with_warnings, write_status_if_changed,
};
use crate::controller::types::{PassOutcome, Reconciler, ReconcilerError};
use crate::crd::{ResourceOverrideSet, Wavefront, WavefrontSpec, WavefrontStatus};
use crate::health::generate_status;
use crate::observability::metrics;
use crate::preprocess::{preprocess, PreprocessError};
use crate::synthesis::{ResourceBuilder, Synthesized};
use crate::telemetry::ClusterIdentity;
use crate::validation::{
    validate_legacy_installs, validate_override_set, validate_workload_resources,
    ValidationResult,
};
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

pub fn wavefront_key(namespace: &str, name: &str) -> ResourceKey {
    ResourceKey::namespaced(
        &Wavefront::api_version(&()),
        &Wavefront::kind(&()),
        namespace,
        name,
    )
}

pub fn override_set_key(namespace: &str) -> ResourceKey {
    ResourceKey::namespaced(
        &ResourceOverrideSet::api_version(&()),
        &ResourceOverrideSet::kind(&()),
        namespace,
        RESOURCE_OVERRIDES_NAME,
    )
}

/// Entry point for `kube-runtime`
pub async fn reconcile(
    wavefront: Arc<Wavefront>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = wavefront.name_any();
    let namespace = wavefront
        .namespace()
        .unwrap_or_else(|| ctx.config.namespace.clone());

    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = wavefront.metadata.generation.unwrap_or(0),
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let outcome = ctx.run_pass(&namespace, &name, Utc::now()).await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let outcome = outcome?;
        ctx.reset_backoff(&format!("{namespace}/{name}"));

        match &outcome {
            PassOutcome::Reconciled {
                status,
                applied,
                deleted,
            } => info!(
                status = %status.status,
                applied,
                deleted,
                "✅ Reconciled {}/{}: {}",
                namespace,
                name,
                status.message
            ),
            PassOutcome::TornDown { deleted } => {
                info!(deleted, "🧹 Tore down components for {}/{}", namespace, name)
            }
        }

        metrics::increment_requeues_total("timer-based");
        Ok(Action::requeue(ctx.config.reconcile_interval()))
    }
    .instrument(span)
    .await
}

impl Reconciler {
    /// Run one pass for the resource `namespace/name` as of `now`
    pub async fn run_pass(
        &self,
        namespace: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<PassOutcome, ReconcilerError> {
        let client = self.client.as_ref();
        let builder = ResourceBuilder::new(
            &self.config.template_dir,
            ResourceBuilder::operator_owner(&self.config.deployment_name, &self.operator_uid().await?),
        );

        let key = wavefront_key(namespace, name);
        let Some(mut wavefront) = get_typed::<Wavefront>(client, &key).await? else {
            return self.teardown(name, &builder).await;
        };
        let override_key = override_set_key(namespace);
        let overrides = get_typed::<ResourceOverrideSet>(client, &override_key).await?;

        let mut validation = ValidationResult::new();
        let mut override_validation = ValidationResult::new();
        let preprocessed = match preprocess(client, &mut wavefront, &self.config).await {
            Ok(()) => true,
            Err(PreprocessError::Invalid(invalid)) => {
                validation.add_error(invalid.to_string());
                false
            }
            Err(PreprocessError::Cluster(e)) => return Err(e.into()),
        };

        let components = build_components(&wavefront, overrides.as_ref());
        if preprocessed {
            let known = known_workloads(&components);
            validation.merge(validate_components(&components));
            validation.merge(validate_workload_resources(
                &wavefront.spec.workload_resources,
                &known,
            ));
            if let Some(overrides) = &overrides {
                override_validation = validate_override_set(overrides, &known);
                validation.merge(override_validation.clone());
            }
            validation.merge(
                validate_legacy_installs(client, wavefront.spec.allow_legacy_install).await?,
            );
        }

        let active = if validation.is_error() {
            warn!(errors = %validation.message(), "validation failed, removing components");
            metrics::increment_validation_failures();
            disabled_components(&wavefront)
        } else {
            components
        };

        let bundle = synthesize(&active, &builder)?;
        let applied = apply_all(client, &bundle.to_apply).await?;
        let deleted = delete_all(client, &bundle.to_delete).await?;

        let status = if validation.is_error() {
            validation_failed_status(&validation)
        } else {
            with_warnings(
                generate_status(client, &wavefront, &active, now).await,
                &validation,
            )
        };

        write_status_if_changed(client, &key, wavefront.status.as_ref(), &status).await;
        if let Some(overrides) = &overrides {
            let desired = override_set_status(&override_validation);
            write_status_if_changed(client, &override_key, overrides.status.as_ref(), &desired)
                .await;
        }

        record_component_health(&status);
        self.report_telemetry(&wavefront, &status, validation.is_error())
            .await;

        Ok(PassOutcome::Reconciled {
            status,
            applied,
            deleted,
        })
    }

    /// UID of the operator's own Deployment, owner of everything synthesized
    async fn operator_uid(&self) -> Result<String, ClusterError> {
        let key = ResourceKey::namespaced(
            "apps/v1",
            "Deployment",
            &self.config.namespace,
            &self.config.deployment_name,
        );
        let deployment = get_typed::<Deployment>(self.client.as_ref(), &key)
            .await?
            .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
        deployment
            .metadata
            .uid
            .ok_or(ClusterError::Incomplete("metadata.uid"))
    }

    /// Synthesize every component disabled and delete the result
    async fn teardown(
        &self,
        name: &str,
        builder: &ResourceBuilder,
    ) -> Result<PassOutcome, ReconcilerError> {
        info!("Wavefront {} is gone, removing all components", name);
        let mut wavefront = Wavefront::new(name, WavefrontSpec::default());
        wavefront.spec.derived.namespace = self.config.namespace.clone();
        wavefront.spec.derived.operator_version = self.config.version.clone();
        wavefront.spec.derived.image_registry = self.config.image_registry.clone();

        let bundle = synthesize(&disabled_components(&wavefront), builder)?;
        let deleted = delete_all(self.client.as_ref(), &bundle.to_delete).await?;

        self.telemetry.lock().await.close();
        metrics::reset_component_health();
        Ok(PassOutcome::TornDown { deleted })
    }

    async fn report_telemetry(
        &self,
        wavefront: &Wavefront,
        status: &WavefrontStatus,
        validation_failed: bool,
    ) {
        let mut telemetry = self.telemetry.lock().await;
        let address = &wavefront.spec.derived.proxy_address;
        if self.config.enable_telemetry && !validation_failed && !address.is_empty() {
            if let Err(e) = telemetry.connect(address) {
                warn!(address = %address, error = %e, "failed to connect telemetry");
            }
        }

        let identity = ClusterIdentity {
            cluster_name: wavefront.spec.cluster_name.clone(),
            cluster_uuid: wavefront.spec.derived.cluster_uuid.clone(),
            operator_version: wavefront.spec.derived.operator_version.clone(),
        };
        if let Err(e) = telemetry.report(&identity, status).await {
            warn!(error = %e, "failed to report status telemetry");
        }
    }
}

/// Synthesize components one after another into one bundle
pub fn synthesize(
    components: &[Box<dyn Component>],
    builder: &ResourceBuilder,
) -> Result<Synthesized, ReconcilerError> {
    let mut bundle = Synthesized::default();
    for component in components {
        let synthesized = component.resources(builder)?;
        debug!(
            component = component.name(),
            enabled = component.enabled(),
            apply = synthesized.to_apply.len(),
            delete = synthesized.to_delete.len(),
            "synthesized component"
        );
        bundle.extend(synthesized);
    }
    Ok(bundle)
}

fn record_component_health(status: &WavefrontStatus) {
    metrics::reset_component_health();
    for resource in &status.resource_statuses {
        metrics::set_component_healthy(&resource.name, resource.healthy);
    }
}
