mod common;

use std::cell::RefCell;

use common::{page, test_config, ScriptedTransport};
use harness_audit_core::audit::{
    collect_app_ids, compare_execution_configs, count_pipelines, customer_execution_config,
    AuditError, ConfigKind, PipelineRef, UnavailableProject,
};
use harness_audit_core::client::HarnessClient;
use harness_audit_core::contract::HttpMethod;
use harness_audit_core::diff::ConfigComparison;
use harness_audit_core::report::{render_app_id_report, render_pipeline_counts, render_progress};
use serde_json::json;

const DEFAULT_CONFIG: &str = "/gateway/ci/execution-config/get-default-config";
const CUSTOMER_CONFIG: &str = "/gateway/ci/execution-config/get-customer-config";

/// Engineering has `web` (deploy, test) and `api` (unlistable); Ops has `infra` (provision).
fn script_hierarchy(transport: &ScriptedTransport) {
    transport.ok(
        HttpMethod::Get,
        "/ng/api/organizations",
        page(
            json!([
                {"organization": {"identifier": "eng", "name": "Engineering"}},
                {"organization": {"identifier": "ops", "name": "Ops"}}
            ]),
            true,
        ),
    );
    transport
        .ok(
            HttpMethod::Get,
            "/ng/api/projects",
            page(
                json!([
                    {"project": {"identifier": "web", "name": "Web"}},
                    {"project": {"identifier": "api", "name": "Api"}}
                ]),
                true,
            ),
        )
        .ok(
            HttpMethod::Get,
            "/ng/api/projects",
            page(json!([{"project": {"identifier": "infra", "name": "Infra"}}]), true),
        );
    transport
        .ok(
            HttpMethod::Post,
            "/pipeline/api/pipelines/list",
            json!({"data": {"content": [
                {"identifier": "deploy", "name": "Deploy"},
                {"identifier": "test", "name": "Test"}
            ]}}),
        )
        .status(HttpMethod::Post, "/pipeline/api/pipelines/list", 500)
        .ok(
            HttpMethod::Post,
            "/pipeline/api/pipelines/list",
            json!({"data": {"content": [{"identifier": "provision", "name": "Provision"}]}}),
        );
}

#[tokio::test]
async fn pipeline_counts_per_organization() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    script_hierarchy(&transport);
    let client = HarnessClient::new(&config, &transport);
    let lines = RefCell::new(Vec::<String>::new());

    let report = count_pipelines(&client, &|event| {
        lines.borrow_mut().extend(render_progress(&event))
    })
    .await
    .expect("organizations are listed");

    let counts: Vec<(&str, usize)> = report
        .orgs
        .iter()
        .map(|o| (o.org.name.as_str(), o.pipelines))
        .collect();
    assert_eq!(counts, [("Engineering", 2), ("Ops", 1)]);
    assert_eq!(report.total(), 3);
    assert_eq!(
        report.unavailable_projects,
        [UnavailableProject {
            org_name: "Engineering".into(),
            project_name: "Api".into(),
        }]
    );

    let lines = lines.into_inner();
    assert!(lines.contains(&"\n📁 Processing organization: Engineering (eng)".to_string()));
    assert!(lines.contains(&"   📋 Found 2 projects".to_string()));
    assert!(lines.contains(&"      🔧 Web: 2 pipelines".to_string()));
    assert!(lines.contains(&"   📊 Organization total: 2 pipelines".to_string()));

    let text = render_pipeline_counts(&report);
    assert!(text.contains("🏆 Organization with most pipelines: Engineering (2 pipelines)"));
    assert!(text.contains("📁 Engineering → 📋 Api"));
}

#[tokio::test]
async fn app_ids_are_grouped_by_pipeline() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    script_hierarchy(&transport);
    transport
        .ok(
            HttpMethod::Get,
            "/ng/api/pipelines/deploy",
            json!({"data": {"yamlPipeline": "pipeline:\n  name: Deploy\n  tags:\n    appId: svc-1\n"}}),
        )
        .ok(
            HttpMethod::Get,
            "/pipeline/api/pipelines/test",
            json!({"data": {"yaml": "pipeline:\n  name: Test\n"}}),
        );
    let client = HarnessClient::new(&config, &transport);
    let lines = RefCell::new(Vec::<String>::new());

    let report = collect_app_ids(&client, &|event| {
        lines.borrow_mut().extend(render_progress(&event))
    })
    .await
    .expect("organizations are listed");

    assert_eq!(report.total_pipelines, 3);
    assert_eq!(report.processed_pipelines, 3);
    assert_eq!(report.pipelines_with_app_ids, 1);
    assert_eq!(
        report.usages.get("svc-1"),
        Some(&vec![PipelineRef {
            org_name: "Engineering".into(),
            project_name: "Web".into(),
            pipeline_name: "Deploy".into(),
        }])
    );
    assert_eq!(report.unavailable_projects.len(), 1);

    let lines = lines.into_inner();
    assert!(lines.contains(&"         📌 Deploy: svc-1".to_string()));
    assert!(lines.contains(&"         ⚪ Test: No appID found".to_string()));
    assert!(lines.contains(&"         ❌ Provision: Failed to get YAML".to_string()));

    let yaml_requests = transport.requests_to("/ng/api/pipelines/deploy");
    assert_eq!(yaml_requests[0].query_value("orgIdentifier"), Some("eng"));
    assert_eq!(yaml_requests[0].query_value("projectIdentifier"), Some("web"));

    let text = render_app_id_report(&report);
    assert!(text.contains("📊 AppID coverage: 33.3%"));
}

/// One organization with a project lacking an identifier and a pipeline item with neither
/// identifier nor name.
fn script_unknown_identifiers(transport: &ScriptedTransport) {
    transport
        .ok(
            HttpMethod::Get,
            "/ng/api/organizations",
            page(json!([{"identifier": "eng", "name": "Engineering"}]), true),
        )
        .ok(
            HttpMethod::Get,
            "/ng/api/projects",
            page(
                json!([
                    {"project": {"name": "Ghost"}},
                    {"project": {"identifier": "web", "name": "Web"}}
                ]),
                true,
            ),
        )
        .ok(
            HttpMethod::Post,
            "/pipeline/api/pipelines/list",
            json!({"data": {"content": [{"identifier": "deploy", "name": "Deploy"}, {}]}}),
        );
}

#[tokio::test]
async fn unknown_projects_are_skipped_when_counting() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    script_unknown_identifiers(&transport);
    let client = HarnessClient::new(&config, &transport);
    let lines = RefCell::new(Vec::<String>::new());

    let report = count_pipelines(&client, &|event| {
        lines.borrow_mut().extend(render_progress(&event))
    })
    .await
    .expect("organizations are listed");

    assert_eq!(report.orgs[0].projects, 1);
    assert_eq!(report.orgs[0].pipelines, 2);
    assert_eq!(transport.requests_to("/pipeline/api/pipelines/list").len(), 1);
    assert!(lines
        .into_inner()
        .contains(&"      ⚠️  Skipping project with unknown identifier".to_string()));
}

#[tokio::test]
async fn unknown_pipelines_are_counted_but_not_fetched() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    script_unknown_identifiers(&transport);
    let client = HarnessClient::new(&config, &transport);

    let report = collect_app_ids(&client, &|_| {})
        .await
        .expect("organizations are listed");

    assert_eq!(report.total_pipelines, 2);
    assert_eq!(report.processed_pipelines, 1);
    assert!(report.total_pipelines > report.processed_pipelines);
    assert_eq!(transport.requests_to("/ng/api/pipelines/deploy").len(), 1);
    assert!(transport.requests_to("/ng/api/pipelines/unknown").is_empty());
    assert!(transport
        .requests_to("/pipeline/api/pipelines/unknown")
        .is_empty());
}

#[tokio::test]
async fn missing_organizations_are_fatal() {
    let config = test_config();

    let transport = ScriptedTransport::new();
    transport.ok(HttpMethod::Get, "/ng/api/organizations", page(json!([]), true));
    let client = HarnessClient::new(&config, &transport);
    assert_eq!(
        count_pipelines(&client, &|_| {}).await,
        Err(AuditError::NoOrganizations)
    );

    let transport = ScriptedTransport::new();
    transport.timeout(HttpMethod::Get, "/ng/api/organizations");
    let client = HarnessClient::new(&config, &transport);
    assert_eq!(
        collect_app_ids(&client, &|_| {}).await,
        Err(AuditError::OrganizationsUnavailable)
    );
}

#[tokio::test]
async fn execution_configs_are_compared_after_flattening() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    transport
        .ok(
            HttpMethod::Get,
            DEFAULT_CONFIG,
            json!({"data": {"addon": {"image": "addon:1"}, "lite": {"image": "lite:1"}}}),
        )
        .ok(
            HttpMethod::Get,
            CUSTOMER_CONFIG,
            json!({"data": {"addon": {"image": "addon:2"}, "lite": {"image": "lite:1"}, "extra": "x"}}),
        );
    let client = HarnessClient::new(&config, &transport);

    let ConfigComparison::Overrides(result) = compare_execution_configs(&client).await.unwrap()
    else {
        panic!("expected overrides");
    };
    assert_eq!(result.changed_count(), 1);
    assert_eq!(result.changed[0].key, "addon.image");
    assert_eq!(result.only_b, [("extra".to_string(), json!("x"))]);
    assert_eq!(result.only_a_count(), 0);
    assert_eq!(result.unchanged_count(), 1);

    let default_request = &transport.requests_to(DEFAULT_CONFIG)[0];
    assert_eq!(default_request.query_value("infra"), Some("K8"));
    assert_eq!(default_request.query_value("overridesOnly"), None);
    let customer_request = &transport.requests_to(CUSTOMER_CONFIG)[0];
    assert_eq!(customer_request.query_value("overridesOnly"), Some("true"));
}

#[tokio::test]
async fn customer_without_overrides_uses_defaults() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    transport
        .ok(HttpMethod::Get, DEFAULT_CONFIG, json!({"data": {"cpu": "100m"}}))
        .ok(HttpMethod::Get, CUSTOMER_CONFIG, json!({"status": "SUCCESS", "data": null}));
    let client = HarnessClient::new(&config, &transport);

    assert_eq!(
        compare_execution_configs(&client).await,
        Ok(ConfigComparison::UsingDefaults {
            defaults: json!({"cpu": "100m"})
        })
    );
}

#[tokio::test]
async fn unavailable_execution_config_is_an_error() {
    let config = test_config();

    let transport = ScriptedTransport::new();
    transport.ok(HttpMethod::Get, DEFAULT_CONFIG, json!({}));
    let client = HarnessClient::new(&config, &transport);
    assert_eq!(
        compare_execution_configs(&client).await,
        Err(AuditError::ConfigUnavailable(ConfigKind::Default))
    );
    assert!(transport.requests_to(CUSTOMER_CONFIG).is_empty());

    let transport = ScriptedTransport::new();
    transport.status(HttpMethod::Get, CUSTOMER_CONFIG, 403);
    let client = HarnessClient::new(&config, &transport);
    assert_eq!(
        customer_execution_config(&client).await,
        Err(AuditError::ConfigUnavailable(ConfigKind::Customer))
    );
}
