//! Orchestration: walks organizations → projects → pipelines and builds the reports.
//!
//! Every walk is strictly sequential; one request is in flight at a time. Progress is
//! surfaced through a caller-supplied callback so the binary can print per-item lines
//! while the walk runs.
//!
//! # Error Handling
//! Only an empty or unavailable organization listing (or a missing execution config) is
//! fatal. Project and pipeline lookups that fail are recorded in the report instead of
//! being counted as zero.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::appid;
use crate::client::HarnessClient;
use crate::contract::{HttpMethod, HttpTransport, Listing, Organization, Pipeline, Project};
use crate::diff::{compare_configs, ConfigComparison};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("no organizations found")]
    NoOrganizations,

    #[error("organization listing failed")]
    OrganizationsUnavailable,

    #[error("failed to fetch {0} execution config")]
    ConfigUnavailable(ConfigKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Default,
    Customer,
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigKind::Default => f.write_str("default"),
            ConfigKind::Customer => f.write_str("customer"),
        }
    }
}

/// Events emitted while walking the hierarchy.
#[derive(Debug, Clone, Copy)]
pub enum AuditProgress<'a> {
    OrganizationsFound(usize),
    OrganizationStarted(&'a Organization),
    ProjectsListed {
        org: &'a Organization,
        count: usize,
        unavailable: bool,
    },
    ProjectSkipped {
        org: &'a Organization,
    },
    ProjectStarted(&'a Project),
    PipelinesListed {
        project: &'a Project,
        count: usize,
        unavailable: bool,
    },
    OrganizationFinished {
        org: &'a Organization,
        pipelines: usize,
    },
    PipelineAppIds {
        pipeline: &'a Pipeline,
        app_ids: &'a BTreeSet<String>,
    },
    PipelineYamlMissing(&'a Pipeline),
}

pub type ProgressFn<'f> = &'f dyn Fn(AuditProgress<'_>);

/// A project whose pipelines could not be listed by any strategy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnavailableProject {
    pub org_name: String,
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgPipelineCount {
    pub org: Organization,
    pub projects: usize,
    pub pipelines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineCountReport {
    pub orgs: Vec<OrgPipelineCount>,
    /// Organizations whose projects could not be listed, by name.
    pub unlisted_orgs: Vec<String>,
    pub unavailable_projects: Vec<UnavailableProject>,
}

impl PipelineCountReport {
    pub fn total(&self) -> usize {
        self.orgs.iter().map(|o| o.pipelines).sum()
    }

    pub fn total_projects(&self) -> usize {
        self.orgs.iter().map(|o| o.projects).sum()
    }

    pub fn average_per_org(&self) -> Option<f64> {
        if self.orgs.is_empty() {
            None
        } else {
            Some(self.total() as f64 / self.orgs.len() as f64)
        }
    }

    /// Organizations by pipeline count, highest first; ties keep listing order.
    pub fn ranked(&self) -> Vec<&OrgPipelineCount> {
        let mut ranked: Vec<&OrgPipelineCount> = self.orgs.iter().collect();
        ranked.sort_by(|a, b| b.pipelines.cmp(&a.pipelines));
        ranked
    }

    pub fn busiest(&self) -> Option<&OrgPipelineCount> {
        self.ranked().into_iter().next()
    }
}

/// Where a pipeline lives, by display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PipelineRef {
    pub org_name: String,
    pub project_name: String,
    pub pipeline_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppIdReport {
    pub total_pipelines: usize,
    pub processed_pipelines: usize,
    pub pipelines_with_app_ids: usize,
    pub usages: BTreeMap<String, Vec<PipelineRef>>,
    pub unlisted_orgs: Vec<String>,
    pub unavailable_projects: Vec<UnavailableProject>,
}

impl AppIdReport {
    pub fn unique_app_ids(&self) -> usize {
        self.usages.len()
    }

    /// `(appID, pipeline count)` by count, highest first; ties in appID order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .usages
            .iter()
            .map(|(id, refs)| (id.as_str(), refs.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn most_used(&self) -> Option<(&str, usize)> {
        self.ranked().into_iter().next()
    }

    pub fn coverage(&self) -> Option<f64> {
        if self.total_pipelines == 0 {
            None
        } else {
            Some(self.pipelines_with_app_ids as f64 / self.total_pipelines as f64 * 100.0)
        }
    }
}

async fn required_organizations<T: HttpTransport>(
    client: &HarnessClient<'_, T>,
) -> Result<Vec<Organization>, AuditError> {
    match client.organizations().await {
        Listing::Items(orgs) => Ok(orgs),
        Listing::Empty => {
            error!("Account has no organizations");
            Err(AuditError::NoOrganizations)
        }
        Listing::Unavailable => {
            error!("Organization listing failed");
            Err(AuditError::OrganizationsUnavailable)
        }
    }
}

fn unavailable(org: &Organization, project: &Project) -> UnavailableProject {
    UnavailableProject {
        org_name: org.name.clone(),
        project_name: project.name.clone(),
    }
}

/// Counts pipelines per organization.
pub async fn count_pipelines<T: HttpTransport>(
    client: &HarnessClient<'_, T>,
    on_progress: ProgressFn<'_>,
) -> Result<PipelineCountReport, AuditError> {
    let orgs = required_organizations(client).await?;
    on_progress(AuditProgress::OrganizationsFound(orgs.len()));

    let mut report = PipelineCountReport::default();
    for org in orgs {
        on_progress(AuditProgress::OrganizationStarted(&org));
        let projects = client.projects(&org).await;
        on_progress(AuditProgress::ProjectsListed {
            org: &org,
            count: projects.len(),
            unavailable: projects.is_unavailable(),
        });
        if projects.is_unavailable() {
            report.unlisted_orgs.push(org.name.clone());
        }

        let mut org_pipelines = 0;
        let mut project_count = 0;
        for project in projects.items() {
            if !project.is_known() {
                warn!(org = %org.identifier, "Skipping project with unknown identifier");
                on_progress(AuditProgress::ProjectSkipped { org: &org });
                continue;
            }
            project_count += 1;
            let pipelines = client.pipelines(project).await;
            if pipelines.is_unavailable() {
                report.unavailable_projects.push(unavailable(&org, project));
            }
            on_progress(AuditProgress::PipelinesListed {
                project,
                count: pipelines.len(),
                unavailable: pipelines.is_unavailable(),
            });
            org_pipelines += pipelines.len();
        }

        on_progress(AuditProgress::OrganizationFinished {
            org: &org,
            pipelines: org_pipelines,
        });
        report.orgs.push(OrgPipelineCount {
            org,
            projects: project_count,
            pipelines: org_pipelines,
        });
    }

    info!(
        orgs = report.orgs.len(),
        total = report.total(),
        unlisted_orgs = report.unlisted_orgs.len(),
        unavailable_projects = report.unavailable_projects.len(),
        "Pipeline count complete"
    );
    Ok(report)
}

/// Fetches every pipeline's YAML and groups pipelines by the appIDs found in it.
pub async fn collect_app_ids<T: HttpTransport>(
    client: &HarnessClient<'_, T>,
    on_progress: ProgressFn<'_>,
) -> Result<AppIdReport, AuditError> {
    let orgs = required_organizations(client).await?;
    on_progress(AuditProgress::OrganizationsFound(orgs.len()));

    let mut report = AppIdReport::default();
    for org in &orgs {
        on_progress(AuditProgress::OrganizationStarted(org));
        let projects = client.projects(org).await;
        on_progress(AuditProgress::ProjectsListed {
            org,
            count: projects.len(),
            unavailable: projects.is_unavailable(),
        });
        if projects.is_unavailable() {
            report.unlisted_orgs.push(org.name.clone());
        }

        for project in projects.items().iter().filter(|p| p.is_known()) {
            on_progress(AuditProgress::ProjectStarted(project));
            let pipelines = client.pipelines(project).await;
            if pipelines.is_unavailable() {
                report.unavailable_projects.push(unavailable(org, project));
            }
            report.total_pipelines += pipelines.len();

            for pipeline in pipelines.items().iter().filter(|p| p.is_known()) {
                let yaml = client.pipeline_yaml(pipeline).await;
                report.processed_pipelines += 1;

                let Some(yaml) = yaml.filter(|y| !y.trim().is_empty()) else {
                    on_progress(AuditProgress::PipelineYamlMissing(pipeline));
                    continue;
                };
                let app_ids = appid::extract(&yaml);
                on_progress(AuditProgress::PipelineAppIds {
                    pipeline,
                    app_ids: &app_ids,
                });
                if app_ids.is_empty() {
                    continue;
                }
                report.pipelines_with_app_ids += 1;
                for app_id in app_ids {
                    report.usages.entry(app_id).or_default().push(PipelineRef {
                        org_name: org.name.clone(),
                        project_name: project.name.clone(),
                        pipeline_name: pipeline.name.clone(),
                    });
                }
            }
        }
    }

    info!(
        total = report.total_pipelines,
        processed = report.processed_pipelines,
        with_app_ids = report.pipelines_with_app_ids,
        unique = report.unique_app_ids(),
        "AppID collection complete"
    );
    Ok(report)
}

impl<T: HttpTransport> HarnessClient<'_, T> {
    /// Fetches the default or customer CI execution config for the configured infra.
    pub async fn execution_config(&self, kind: ConfigKind) -> Option<Value> {
        let (path, overrides_only) = match kind {
            ConfigKind::Default => ("/gateway/ci/execution-config/get-default-config", false),
            ConfigKind::Customer => ("/gateway/ci/execution-config/get-customer-config", true),
        };
        let mut query = self.account_query();
        query.push(("infra".to_string(), self.config().infra.clone()));
        if overrides_only {
            query.push(("overridesOnly".to_string(), "true".to_string()));
        }
        self.request(HttpMethod::Get, path, query, None).await
    }
}

fn is_usable(document: &Value) -> bool {
    !matches!(document, Value::Object(map) if map.is_empty())
}

pub async fn customer_execution_config<T: HttpTransport>(
    client: &HarnessClient<'_, T>,
) -> Result<Value, AuditError> {
    client
        .execution_config(ConfigKind::Customer)
        .await
        .filter(is_usable)
        .ok_or(AuditError::ConfigUnavailable(ConfigKind::Customer))
}

/// Fetches both execution configs and compares them.
pub async fn compare_execution_configs<T: HttpTransport>(
    client: &HarnessClient<'_, T>,
) -> Result<ConfigComparison, AuditError> {
    let default_config = client
        .execution_config(ConfigKind::Default)
        .await
        .filter(is_usable)
        .ok_or(AuditError::ConfigUnavailable(ConfigKind::Default))?;
    let customer_config = customer_execution_config(client).await?;
    Ok(compare_configs(&default_config, &customer_config))
}
