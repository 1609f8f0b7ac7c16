mod common;

use rmaudit_core::model::{CONTENT_MODEL_URI, PROP_USERNAME, datatype};
use rmaudit_core::{MlText, NodeRef, PropertyMap, PropertyValue, QName};
use rmaudit_repo::PropertyDefinition;
use rmaudit_trail::{
    AuditTrailConfig, RecordsManagementAuditQueryParameters, ReportFormat, TrailError,
};

use common::{fixture, fixture_with, titled};

fn alice_only() -> RecordsManagementAuditQueryParameters {
    RecordsManagementAuditQueryParameters::new().with_user("alice")
}

#[tokio::test]
async fn json_and_html_reports_list_the_same_entries() {
    let fx = fixture();
    let doc = fx.add_document("report.pdf");
    fx.record("alice", &doc, "Declare Record", PropertyMap::new(), PropertyMap::new())
        .await;
    fx.record("alice", &doc, "Update Metadata", titled("Draft"), titled("Final"))
        .await;

    let json = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Json, Vec::new())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&json).unwrap();
    let data = &report["data"];
    assert_eq!(data["enabled"], true);
    let entries = data["entries"].as_array().unwrap();
    let events: Vec<&str> = entries
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(events, ["Declare Record", "Update Metadata"]);
    assert_eq!(entries[1]["nodeName"], "report.pdf");
    assert_eq!(entries[1]["nodeType"], "Folder");
    assert_eq!(entries[1]["changedValues"][0]["name"], "title");
    assert_eq!(entries[1]["changedValues"][0]["previous"], "Draft");
    assert_eq!(entries[1]["changedValues"][0]["new"], "Final");

    let html = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Html, Vec::new())
        .await
        .unwrap();
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("Records Management Audit Report"));
    assert!(html.contains("Declare Record"));
    assert!(html.contains("Update Metadata"));
    assert!(html.contains("Draft"));
    assert!(html.ends_with("</body></html>"));
}

#[tokio::test]
async fn typed_values_render_in_their_display_form() {
    let fx = fixture();
    let doc = fx.add_document("report.pdf");
    let cm = |local: &str| QName::new(CONTENT_MODEL_URI, local);
    fx.repo.define_property(
        PropertyDefinition::text(cm("description"))
            .with_title("Description")
            .with_data_type(datatype::MLTEXT),
    );
    let target = NodeRef::in_spaces_store("abc");

    let before = PropertyMap::from([
        (
            cm("description"),
            PropertyValue::MlText(MlText::new().with("fr", "bonjour").with("en", "hello")),
        ),
        (cm("count"), PropertyValue::Integer(1)),
    ]);
    let after = PropertyMap::from([
        (
            cm("description"),
            PropertyValue::MlText(MlText::new().with("fr", "salut").with("en_GB", "hi")),
        ),
        (cm("count"), PropertyValue::Integer(2)),
        (cm("flag"), PropertyValue::Boolean(true)),
        (cm("target"), PropertyValue::NodeRef(target)),
    ]);
    fx.record("alice", &doc, "Update Metadata", before, after)
        .await;

    let json = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Json, Vec::new())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&json).unwrap();
    let changes = report["data"]["entries"][0]["changedValues"]
        .as_array()
        .unwrap()
        .clone();
    let change = |name: &str| {
        changes
            .iter()
            .find(|c| c["name"] == name)
            .map(|c| (c["previous"].clone(), c["new"].clone()))
            .unwrap()
    };
    assert_eq!(changes.len(), 4);
    assert_eq!(change("Description"), ("hello".into(), "hi".into()));
    assert_eq!(change("count"), ("1".into(), "2".into()));
    assert_eq!(change("flag"), ("".into(), "true".into()));
    assert_eq!(
        change("target"),
        ("".into(), "workspace://SpacesStore/abc".into())
    );

    let html = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Html, Vec::new())
        .await
        .unwrap();
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("<td>Description</td><td>hello</td><td>hi</td>"));
    assert!(html.contains("<td>count</td><td>1</td><td>2</td>"));
    assert!(html.contains("<td>flag</td><td>&lt;none&gt;</td><td>true</td>"));
    assert!(!html.contains("bonjour"));
}

#[tokio::test]
async fn empty_json_report_is_well_formed() {
    let fx = fixture();
    let json = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Json, Vec::new())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert!(report["data"]["entries"].as_array().unwrap().is_empty());
    assert!(report["data"]["started"].is_string());
}

#[tokio::test]
async fn created_people_are_named_by_user_name() {
    let fx = fixture();
    let person = fx.repo.add_folder(None, "person-node");
    let after = PropertyMap::from([(PROP_USERNAME, PropertyValue::text("erin"))]);
    fx.record("alice", &person, "Create Person", PropertyMap::new(), after)
        .await;

    let json = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Json, Vec::new())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&json).unwrap();
    let entry = &report["data"]["entries"][0];
    assert_eq!(entry["nodeName"], "erin");
    assert_eq!(entry["createPerson"], true);
    assert!(entry.get("noAvailableLink").is_none());
}

#[tokio::test]
async fn trail_files_are_created_in_the_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuditTrailConfig {
        trail_file_dir: Some(dir.path().to_path_buf()),
        ..AuditTrailConfig::default()
    };
    let fx = fixture_with(config);
    let doc = fx.add_document("report.pdf");
    fx.record("alice", &doc, "Declare Record", PropertyMap::new(), PropertyMap::new())
        .await;

    let path = fx
        .service
        .get_audit_trail_file(&fx.admin, &alice_only(), ReportFormat::Json)
        .await
        .unwrap();
    assert_eq!(path.parent(), Some(dir.path()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("audit_"));
    assert!(name.ends_with(".json"));

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(report["data"]["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn filed_reports_become_content_and_the_file_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuditTrailConfig {
        trail_file_dir: Some(dir.path().to_path_buf()),
        ..AuditTrailConfig::default()
    };
    let fx = fixture_with(config);
    let doc = fx.add_document("report.pdf");
    fx.record("alice", &doc, "Declare Record", PropertyMap::new(), PropertyMap::new())
        .await;

    let record = fx
        .service
        .file_audit_trail_as_record(&fx.admin, &alice_only(), &fx.file_plan, ReportFormat::Html)
        .await
        .unwrap();

    let content = fx.repo.content(&record).unwrap();
    assert_eq!(content.mimetype, "text/html");
    let html = String::from_utf8(content.bytes).unwrap();
    assert!(html.contains("Declare Record"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn audit_log_can_be_stopped_started_and_cleared() {
    let fx = fixture();
    assert!(fx.service.is_enabled().await.unwrap());

    fx.service.stop(&fx.admin).await.unwrap();
    assert!(!fx.service.is_enabled().await.unwrap());
    assert_eq!(fx.audit.len(), 1);

    fx.service.start(&fx.admin).await.unwrap();
    assert!(fx.service.is_enabled().await.unwrap());
    assert_eq!(fx.events_named("audit.stop").await.len(), 1);
    assert_eq!(fx.events_named("audit.start").await.len(), 1);

    fx.service.clear(&fx.admin).await.unwrap();
    assert_eq!(fx.audit.len(), 1);
    let cleared = fx.events_named("audit.clear").await;
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared[0].node.as_ref(), Some(&fx.file_plan));
}

#[tokio::test]
async fn log_control_needs_a_default_file_plan() {
    let config = AuditTrailConfig {
        default_site_id: "archive".to_owned(),
        ..AuditTrailConfig::default()
    };
    let fx = fixture_with(config);

    let err = fx.service.start(&fx.admin).await.unwrap_err();
    assert!(matches!(err, TrailError::DefaultFilePlanMissing(ref site) if site == "archive"));

    let json = fx
        .service
        .write_audit_trail(&fx.admin, &alice_only(), ReportFormat::Json, Vec::new())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(report["data"]["enabled"], false);
}

#[tokio::test]
async fn audit_events_are_sorted_by_label() {
    let fx = fixture();
    fx.service.register_audit_event("file", "File Record");
    fx.service.register_audit_event("declare", "Declare Record");

    let labels: Vec<String> = fx
        .service
        .audit_events()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(
        labels,
        [
            "Audit Clear",
            "Audit Start",
            "Audit Stop",
            "Audit View",
            "Declare Record",
            "File Record"
        ]
    );
}
