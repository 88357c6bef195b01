use super::*;
use crate::client::fake::{Call, FakeClient};
use crate::config::{AccountConfig, DEFAULT_SOURCE_PROFILE, DEFAULT_TARGET_PROFILE};
use tempfile::TempDir;

const SRC: &str = DEFAULT_SOURCE_PROFILE;
const DST: &str = DEFAULT_TARGET_PROFILE;

fn config() -> RunConfig {
    RunConfig {
        source: AccountConfig {
            profile: None,
            app_id: Some("SRC".to_string()),
            api_key: Some("src-key".to_string()),
        },
        target: AccountConfig {
            profile: None,
            app_id: Some("DST".to_string()),
            api_key: Some("dst-key".to_string()),
        },
        progress: false,
        ..RunConfig::default()
    }
}

fn descriptor(name: &str) -> IndexDescriptor {
    IndexDescriptor {
        data_size: 100,
        entries: 5,
        ..IndexDescriptor::new(name)
    }
}

fn artifacts(dir: &TempDir) -> RunArtifacts {
    RunArtifacts::create_at(dir.path().join("run")).unwrap()
}

#[test]
fn test_first_difference_line() {
    assert_eq!(first_difference_line(b"a\nb\n", b"a\nb\n"), None);
    assert_eq!(first_difference_line(b"", b""), None);
    assert_eq!(first_difference_line(b"a\nb\n", b"a\nc\n"), Some(2));
    assert_eq!(first_difference_line(b"a\n", b"a\nb\n"), Some(2));
    assert_eq!(first_difference_line(b"", b"x"), Some(1));
    // A missing final newline is reported on the line after the last one.
    assert_eq!(first_difference_line(b"a\nb", b"a\nb\n"), Some(3));
    assert_eq!(first_difference_line(b"a\nb\n", b"a\nb"), Some(3));
}

#[tokio::test]
async fn test_target_missing_does_not_stop_other_indices() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts(&dir);
    let client = FakeClient::new()
        .with_listing(
            SRC,
            vec![descriptor("hub1.a"), descriptor("hub1.b"), descriptor("hub2.c")],
        )
        .with_listing(DST, vec![descriptor("hub1.b"), descriptor("hub2.c")]);
    let config = config();

    let report = Validator::new(&config, &client).run(&artifacts).await.unwrap();

    assert!(report.failure.is_none());
    assert_eq!(
        report.findings,
        vec![Finding::TargetMissing {
            index: "hub1.a".to_string()
        }]
    );
    assert!(!report.is_clean());

    assert_eq!(report.results.len(), 3);
    assert!(!report.results[0].target_found);
    assert_eq!(report.results[0].metadata_match, None);
    assert_eq!(report.results[0].rules_match, None);
    for result in &report.results[1..] {
        assert!(result.target_found);
        assert_eq!(result.metadata_match, Some(true));
        assert_eq!(result.rules_match, Some(true));
        assert_eq!(result.synonyms_match, Some(true));
        assert_eq!(result.settings_match, Some(true));
    }

    let exports = client.transfer_calls();
    assert_eq!(exports.len(), 12);
    assert!(!exports
        .iter()
        .any(|call| matches!(call, Call::Export { index, .. } if index == "hub1.a")));
    assert!(!exports
        .iter()
        .any(|call| matches!(call, Call::Export { category: Category::Objects, .. })));

    assert!(client.live_profiles().is_empty());
    assert!(artifacts.path(SOURCE_LISTING).is_file());
    assert!(artifacts.path(TARGET_LISTING).is_file());
}

#[tokio::test]
async fn test_metadata_mismatch_still_compares_content() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts(&dir);
    let client = FakeClient::new()
        .with_listing(SRC, vec![descriptor("h.a")])
        .with_listing(
            DST,
            vec![IndexDescriptor {
                entries: 4,
                file_size: 9,
                ..descriptor("h.a")
            }],
        );
    let config = config();

    let report = Validator::new(&config, &client).run(&artifacts).await.unwrap();

    assert_eq!(
        report.findings,
        vec![Finding::MetadataMismatch {
            index: "h.a".to_string(),
            fields: vec![MetadataField::Entries],
        }]
    );
    assert_eq!(report.results[0].metadata_match, Some(false));
    assert_eq!(report.results[0].settings_match, Some(true));
}

#[tokio::test]
async fn test_content_mismatch_reports_first_differing_line() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts(&dir);
    let client = FakeClient::new()
        .with_listing(SRC, vec![descriptor("h.a")])
        .with_listing(DST, vec![descriptor("h.a")])
        .with_content(
            SRC,
            "h.a",
            Category::Rules,
            "{\"objectID\":\"r1\"}\n{\"objectID\":\"r2\"}\n",
        )
        .with_content(
            DST,
            "h.a",
            Category::Rules,
            "{\"objectID\":\"r1\"}\n{\"objectID\":\"rX\"}\n",
        )
        .with_content(SRC, "h.a", Category::Settings, "{\"hitsPerPage\":20}")
        .with_content(DST, "h.a", Category::Settings, "{\"hitsPerPage\":20}");
    let config = config();

    let report = Validator::new(&config, &client).run(&artifacts).await.unwrap();

    assert_eq!(
        report.findings,
        vec![Finding::ContentMismatch {
            index: "h.a".to_string(),
            category: Category::Rules,
            first_difference_line: 2,
        }]
    );
    let result = &report.results[0];
    assert_eq!(result.rules_match, Some(false));
    assert_eq!(result.synonyms_match, Some(true));
    assert_eq!(result.settings_match, Some(true));

    let source_export = artifacts.dir().join("source").join("h.a_rules_export.ndjson");
    let target_export = artifacts.dir().join("target").join("h.a_rules_export.ndjson");
    assert!(source_export.is_file());
    assert!(target_export.is_file());

    let findings: serde_json::Value =
        serde_json::from_slice(&std::fs::read(artifacts.path(FINDINGS)).unwrap()).unwrap();
    assert_eq!(findings[0]["kind"], "content_mismatch");
    assert_eq!(findings[0]["category"], "rules");
    assert_eq!(findings[0]["first_difference_line"], 2);
}

#[tokio::test]
async fn test_export_failure_aborts_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts(&dir);
    let client = FakeClient::new()
        .with_listing(SRC, vec![descriptor("h.a"), descriptor("h.b")])
        .with_listing(DST, vec![descriptor("h.a"), descriptor("h.b")])
        .failing_on(Call::export(Category::Synonyms, "h.a", DST));
    let config = config();

    let report = Validator::new(&config, &client).run(&artifacts).await.unwrap();

    assert!(matches!(
        report.failure,
        Some(Error::Stage {
            phase: Phase::Validation,
            category: Some(Category::Synonyms),
            ..
        })
    ));
    assert!(report.results.is_empty());
    assert!(!client
        .transfer_calls()
        .iter()
        .any(|call| matches!(call, Call::Export { index, .. } if index == "h.b")));
    assert!(client.live_profiles().is_empty());
    assert!(artifacts.path(FINDINGS).is_file());
}

#[tokio::test]
async fn test_missing_credentials_stop_before_profiles() {
    let dir = TempDir::new().unwrap();
    let artifacts = artifacts(&dir);
    let client = FakeClient::new();
    let config = RunConfig::default();

    let err = Validator::new(&config, &client)
        .run(&artifacts)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConfigMissing(_)));
    assert_eq!(client.calls(), vec![Call::CheckAvailable]);
}
