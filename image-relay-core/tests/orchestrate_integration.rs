use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use image_relay_core::contract::{MediaHost, MockMediaHost, ResourceType, TransferError, UploadOptions};
use image_relay_core::model::{FileEntry, UploadRequest, UploadResult};
use image_relay_core::orchestrator::{OrchestrateError, UploadOrchestrator};

fn request(names: &[(&str, &str)]) -> UploadRequest {
    UploadRequest::new(
        names
            .iter()
            .map(|(name, mime)| FileEntry::new(*name, *mime, name.as_bytes().to_vec()))
            .collect(),
    )
}

fn descriptor_for(file: &FileEntry, id: usize) -> UploadResult {
    UploadResult::from(json!({
        "public_id": format!("relay/{id}"),
        "secure_url": format!("https://res.example.com/relay/{id}"),
        "original_filename": file.display_name(),
        "bytes": file.data.len(),
    }))
}

#[tokio::test]
async fn test_three_files_all_succeed() {
    let mut host = MockMediaHost::new();
    host.expect_upload()
        .times(3)
        .returning(|file, opts| {
            assert_eq!(opts.resource_type, ResourceType::Auto);
            Ok(descriptor_for(file, file.data.len()))
        });

    let orchestrator = UploadOrchestrator::new(Arc::new(host));
    let results = orchestrator
        .upload_all(request(&[("a.png", "image/png"), ("b.jpg", "image/jpeg"), ("c.gif", "image/gif")]))
        .await
        .expect("all uploads should succeed");

    assert_eq!(results.len(), 3, "one result per input file");
    let mut names: Vec<_> = results
        .iter()
        .map(|r| r.0["original_filename"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.gif"]);
}

#[tokio::test]
async fn test_configured_resource_type_reaches_every_transfer() {
    let mut host = MockMediaHost::new();
    host.expect_upload()
        .withf(|_, opts| opts.resource_type == ResourceType::Image)
        .times(2)
        .returning(|file, _| Ok(descriptor_for(file, 1)));

    let orchestrator = UploadOrchestrator::with_options(
        Arc::new(host),
        UploadOptions {
            resource_type: ResourceType::Image,
        },
    );
    let results = orchestrator
        .upload_all(request(&[("a.png", "image/png"), ("b.png", "image/png")]))
        .await
        .expect("both uploads should succeed");

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_empty_request_dispatches_nothing() {
    let mut host = MockMediaHost::new();
    host.expect_upload().times(0);

    let orchestrator = UploadOrchestrator::new(Arc::new(host));
    let err = orchestrator
        .upload_all(UploadRequest::default())
        .await
        .expect_err("empty request must fail");

    assert!(matches!(err, OrchestrateError::NoFiles));
    assert_eq!(err.to_string(), "No files uploaded");
}

#[tokio::test]
async fn test_second_file_network_error_fails_whole_request() {
    let mut host = MockMediaHost::new();
    // Both transfers are dispatched even though one of them fails.
    host.expect_upload().times(2).returning(|file, _| {
        if file.display_name() == "b.jpg" {
            Err(TransferError::Network {
                message: "connection reset by peer".into(),
            })
        } else {
            Ok(descriptor_for(file, 1))
        }
    });

    let orchestrator = UploadOrchestrator::new(Arc::new(host));
    let err = orchestrator
        .upload_all(request(&[("a.png", "image/png"), ("b.jpg", "image/jpeg")]))
        .await
        .expect_err("a failed transfer fails the request");

    assert_eq!(err.to_string(), "One or more files failed to upload");
    match err {
        OrchestrateError::Transfer(failure) => {
            assert_eq!(failure.file.original_name.as_deref(), Some("b.jpg"));
            assert_eq!(failure.file.mime_type.as_deref(), Some("image/jpeg"));
            assert_eq!(
                failure.error,
                TransferError::Network {
                    message: "connection reset by peer".into()
                }
            );
        }
        other => panic!("expected transfer failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resubmission_creates_independent_results() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let mut host = MockMediaHost::new();
    host.expect_upload().times(4).returning(move |file, _| {
        let id = seen.fetch_add(1, Ordering::SeqCst);
        Ok(descriptor_for(file, id))
    });

    let orchestrator = UploadOrchestrator::new(Arc::new(host));
    let files = [("a.png", "image/png"), ("b.jpg", "image/jpeg")];
    let first = orchestrator.upload_all(request(&files)).await.unwrap();
    let second = orchestrator.upload_all(request(&files)).await.unwrap();

    // No dedup: the same payload stored twice yields distinct remote resources.
    let mut ids: Vec<_> = first
        .iter()
        .chain(second.iter())
        .map(|r| r.public_id().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

/// Host that answers after a per-file delay, optionally failing.
struct DelayedHost {
    delays_ms: HashMap<&'static str, u64>,
    failing: Vec<&'static str>,
    calls: AtomicUsize,
}

impl DelayedHost {
    fn new(delays_ms: &[(&'static str, u64)], failing: &[&'static str]) -> Self {
        Self {
            delays_ms: delays_ms.iter().copied().collect(),
            failing: failing.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaHost for DelayedHost {
    async fn upload(&self, file: &FileEntry, _options: &UploadOptions) -> Result<UploadResult, TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = file.display_name();
        let delay = self.delays_ms.get(name).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if self.failing.contains(&name) {
            return Err(TransferError::Rejected {
                http_code: 400,
                message: format!("{name} rejected"),
            });
        }
        Ok(descriptor_for(file, delay as usize))
    }
}

#[tokio::test]
async fn test_results_follow_completion_order() {
    let host = DelayedHost::new(&[("a.png", 120), ("b.jpg", 10), ("c.gif", 60)], &[]);
    let orchestrator = UploadOrchestrator::new(Arc::new(host));

    let results = orchestrator
        .upload_all(request(&[("a.png", "image/png"), ("b.jpg", "image/jpeg"), ("c.gif", "image/gif")]))
        .await
        .unwrap();

    let order: Vec<_> = results
        .iter()
        .map(|r| r.0["original_filename"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["b.jpg", "c.gif", "a.png"]);
}

#[tokio::test]
async fn test_first_completed_failure_is_reported_and_all_transfers_settle() {
    let host = Arc::new(DelayedHost::new(
        &[("a.png", 5), ("b.jpg", 100), ("c.gif", 20)],
        &["b.jpg", "c.gif"],
    ));
    let orchestrator = UploadOrchestrator::new(host.clone());

    let err = orchestrator
        .upload_all(request(&[("a.png", "image/png"), ("b.jpg", "image/jpeg"), ("c.gif", "image/gif")]))
        .await
        .unwrap_err();

    match err {
        OrchestrateError::Transfer(failure) => {
            assert_eq!(failure.file.original_name.as_deref(), Some("c.gif"));
        }
        other => panic!("expected transfer failure, got {other:?}"),
    }
    assert_eq!(host.calls.load(Ordering::SeqCst), 3, "every file must be dispatched");
}
