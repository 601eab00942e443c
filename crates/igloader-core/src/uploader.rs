//! Sequential upload of the resources in an IG pack.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};
use url::Url;

use crate::archive::{IgPack, PackEntry};
use crate::client::{Accepted, FailureKind, FhirClient};
use crate::error::Result;
use crate::options::UploadOptions;
use crate::resource::{ResourceRoute, UploadMethod, is_conformance_type};
use crate::summary::{UploadFailure, UploadSummary};

/// Why an entry is not uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not JSON, or JSON without a `resourceType`.
    NotAResource,
    /// A resource whose type was excluded by the options.
    ExcludedType(String),
}

/// A resource entry waiting to be sent.
#[derive(Debug, Clone)]
pub struct PlannedUpload {
    pub entry: String,
    pub route: ResourceRoute,
    pub data: Vec<u8>,
}

/// Pack entries sorted into uploads and skips, archive order preserved.
#[derive(Debug, Clone, Default)]
pub struct UploadPlan {
    pub entries: usize,
    pub uploads: Vec<PlannedUpload>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl UploadPlan {
    pub fn from_pack(pack: IgPack, options: &UploadOptions) -> Self {
        Self::from_entries(pack, options)
    }

    pub fn from_entries<I>(entries: I, options: &UploadOptions) -> Self
    where
        I: IntoIterator<Item = PackEntry>,
    {
        let mut plan = Self::default();

        for entry in entries {
            plan.entries += 1;
            let Some(route) = ResourceRoute::classify(&entry.data) else {
                debug!(entry = %entry.path, "not a FHIR resource, skipping");
                plan.skipped.push((entry.path, SkipReason::NotAResource));
                continue;
            };

            if options.skips(&route.resource_type) {
                debug!(
                    entry = %entry.path,
                    resource_type = %route.resource_type,
                    "resource type excluded, skipping"
                );
                let reason = SkipReason::ExcludedType(route.resource_type);
                plan.skipped.push((entry.path, reason));
                continue;
            }

            plan.uploads.push(PlannedUpload {
                entry: entry.path,
                route,
                data: entry.data,
            });
        }

        plan
    }

    /// Types among the planned uploads that are not conformance resources.
    pub fn unsupported_types(&self) -> Vec<String> {
        self.uploads
            .iter()
            .map(|u| u.route.resource_type.as_str())
            .filter(|t| !is_conformance_type(t))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn excluded(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, reason)| matches!(reason, SkipReason::ExcludedType(_)))
            .count()
    }
}

/// Outcome of one resource, handed to [`UploadProgress`].
#[derive(Debug)]
pub struct ResourceReport<'a> {
    /// 1-based position among the planned uploads.
    pub position: usize,
    pub total: usize,
    pub entry: &'a str,
    pub route: &'a ResourceRoute,
    pub method: UploadMethod,
    pub url: &'a Url,
    pub result: &'a std::result::Result<Accepted, FailureKind>,
}

/// Hook for live progress output; every method defaults to doing nothing.
pub trait UploadProgress {
    fn plan_ready(&mut self, _plan: &UploadPlan) {}

    fn resource_started(&mut self, _position: usize, _total: usize, _upload: &PlannedUpload) {}

    fn resource_finished(&mut self, _report: &ResourceReport<'_>) {}
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl UploadProgress for NoProgress {}

/// Sends planned resources one at a time to a FHIR server.
pub struct Uploader {
    client: FhirClient,
    options: UploadOptions,
}

impl Uploader {
    pub fn new(target: &str, options: UploadOptions) -> Result<Self> {
        let client = FhirClient::new(target, &options)?;
        Ok(Self { client, options })
    }

    pub fn client(&self) -> &FhirClient {
        &self.client
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Read the pack at `path` and upload its resources.
    pub async fn upload_pack<P>(
        &self,
        path: impl AsRef<Path>,
        progress: &mut P,
    ) -> Result<UploadSummary>
    where
        P: UploadProgress + ?Sized,
    {
        let pack = IgPack::open(path)?;
        let plan = UploadPlan::from_pack(pack, &self.options);
        Ok(self.run(plan, progress).await)
    }

    /// Upload every planned resource in order. Per-resource failures are
    /// recorded and do not stop the run unless fail-fast is enabled.
    pub async fn run<P>(&self, plan: UploadPlan, progress: &mut P) -> UploadSummary
    where
        P: UploadProgress + ?Sized,
    {
        progress.plan_ready(&plan);

        let mut summary = UploadSummary {
            entries: plan.entries,
            skipped: plan.skipped.len() - plan.excluded(),
            excluded: plan.excluded(),
            unsupported_types: plan.unsupported_types(),
            ..UploadSummary::default()
        };

        if !summary.unsupported_types.is_empty() {
            warn!(
                types = ?summary.unsupported_types,
                "unsupported resource type(s) detected"
            );
        }
        if plan.uploads.is_empty() {
            warn!(entries = plan.entries, "no FHIR resources found in IG pack");
        }

        let total = plan.uploads.len();
        info!(
            base_url = %self.client.base_url(),
            resources = total,
            skipped = summary.skipped,
            excluded = summary.excluded,
            "uploading IG pack resources"
        );

        for (index, upload) in plan.uploads.into_iter().enumerate() {
            let position = index + 1;
            progress.resource_started(position, total, &upload);

            let PlannedUpload { entry, route, data } = upload;
            let method = route.method();
            let url = self.client.endpoint(&route);

            let result = self.client.upload(&route, data).await;
            progress.resource_finished(&ResourceReport {
                position,
                total,
                entry: &entry,
                route: &route,
                method,
                url: &url,
                result: &result,
            });

            match result {
                Ok(accepted) => {
                    info!(
                        entry = %entry,
                        resource = %route.reference(),
                        %method,
                        status = accepted.status,
                        "uploaded"
                    );
                    summary.record_success();
                }
                Err(error) => {
                    warn!(
                        entry = %entry,
                        resource = %route.reference(),
                        %method,
                        url = %url,
                        error = %error,
                        "upload failed"
                    );
                    let stop = self.options.fail_fast && !error.is_unprocessable();
                    summary.record_failure(UploadFailure {
                        entry,
                        route,
                        method,
                        url: url.to_string(),
                        error,
                    });
                    if stop {
                        summary.not_attempted = total - position;
                        warn!(
                            remaining = summary.not_attempted,
                            "fail-fast enabled, stopping after failed upload"
                        );
                        break;
                    }
                }
            }
        }

        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "upload finished"
        );

        summary
    }
}
