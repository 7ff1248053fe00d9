/*!
 * Batch Lifecycle Tests
 * Pending counter, event pairing and settlement order
 */

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use emloader::core::ModuleRoot;
use emloader::loader::{AssetFetcher, EventBus, LoaderEvent, MountResolver, MountSpec};
use emloader::vfs::{BackingStore, StoreFactory, VfsComposer, VfsRegistry};
use emloader::LoaderError;

use super::support::{count, drain, zip_of, MockTransport, Reply};

fn setup(transport: MockTransport, storage: &Path) -> (MountResolver, AssetFetcher, VfsComposer, EventBus) {
    let composer = VfsComposer::new(ModuleRoot::generate(), &VfsRegistry::new());
    let events = EventBus::default();
    let fetcher = AssetFetcher::new(Arc::new(transport), events.clone());
    let resolver = MountResolver::new(
        StoreFactory::new(storage, "test.example.org"),
        composer.clone(),
        None,
    );
    (resolver, fetcher, composer, events)
}

#[tokio::test(start_paused = true)]
async fn test_batch_completes_once_after_all_settle() {
    // Later entries settle first
    let transport = MockTransport::new()
        .with("a", Reply::ok("1").after(30))
        .with("b", Reply::ok("2").after(20))
        .with("c", Reply::ok("3").after(10));
    let temp = TempDir::new().unwrap();
    let (mut resolver, mut fetcher, composer, events) = setup(transport, temp.path());
    let mut rx = events.subscribe();

    let spec = MountSpec::from_json(
        r#"{"/a": ["file", "a"], "/b": ["file", "b"], "/c": ["file", "c"]}"#,
    )
    .unwrap();
    resolver.resolve(&spec, &mut fetcher).unwrap();
    assert_eq!(fetcher.pending(), 3);

    let report = fetcher.run_batch().await;
    assert_eq!(report.settled(), 3);
    assert_eq!(fetcher.pending(), 0);
    assert!(resolver.is_settled());

    let events = drain(&mut rx);
    assert_eq!(count(&events, |e| matches!(e, LoaderEvent::BatchBegin)), 1);
    assert_eq!(count(&events, |e| matches!(e, LoaderEvent::BatchComplete)), 1);
    assert_eq!(events.last(), Some(&LoaderEvent::BatchComplete));
    assert_eq!(count(&events, |e| matches!(e, LoaderEvent::FileComplete { .. })), 3);

    let completions: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            LoaderEvent::FileComplete { url } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(completions, vec!["c", "b", "a"]);

    for (path, data) in [("/a", b"1"), ("/b", b"2"), ("/c", b"3")] {
        assert_eq!(composer.tree().read(Path::new(path)).unwrap(), data);
    }
}

#[tokio::test]
async fn test_local_only_spec_closes_synchronously() {
    let temp = TempDir::new().unwrap();
    let (mut resolver, mut fetcher, composer, events) = setup(MockTransport::new(), temp.path());
    let mut rx = events.subscribe();

    let spec = MountSpec::from_json(r#"{"/drivea": ["persistent-local"]}"#).unwrap();
    resolver.resolve(&spec, &mut fetcher).unwrap();

    // Nothing awaited yet: the batch already opened and closed
    assert_eq!(fetcher.pending(), 0);
    assert_eq!(
        drain(&mut rx),
        vec![LoaderEvent::BatchBegin, LoaderEvent::BatchComplete]
    );

    composer
        .tree()
        .write(Path::new("/drivea/SAVE.DAT"), b"saved")
        .unwrap();
    assert!(temp
        .path()
        .join("test.example.org/drivea/SAVE.DAT")
        .exists());
}

#[tokio::test]
async fn test_failed_fetch_is_skipped() {
    let transport = MockTransport::new()
        .with("good", Reply::ok("hello"))
        .with("missing", Reply::status(404));
    let temp = TempDir::new().unwrap();
    let (mut resolver, mut fetcher, composer, events) = setup(transport, temp.path());
    let mut rx = events.subscribe();

    let spec = MountSpec::from_json(
        r#"{"/good.txt": ["file", "good"], "/missing.txt": ["file", "missing"]}"#,
    )
    .unwrap();
    resolver.resolve(&spec, &mut fetcher).unwrap();
    let report = fetcher.run_batch().await;

    assert_eq!(report.succeeded, vec!["good".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, "missing");
    assert!(matches!(report.failed[0].error, LoaderError::Network { .. }));

    let events = drain(&mut rx);
    assert_eq!(count(&events, |e| matches!(e, LoaderEvent::BatchComplete)), 1);
    assert_eq!(count(&events, |e| matches!(e, LoaderEvent::FileError { .. })), 1);

    assert_eq!(composer.tree().read(Path::new("/good.txt")).unwrap(), b"hello");
    assert!(!composer.tree().exists(Path::new("/missing.txt")));
}

#[tokio::test]
async fn test_bad_archive_fails_only_its_entry() {
    let transport = MockTransport::new()
        .with("broken.zip", Reply::ok("definitely not a zip"))
        .with("good.zip", Reply::ok(zip_of(&[("GAME.EXE", "MZ")])));
    let temp = TempDir::new().unwrap();
    let (mut resolver, mut fetcher, composer, events) = setup(transport, temp.path());
    let mut rx = events.subscribe();

    let spec = MountSpec::from_json(
        r#"{"/broken": ["archive", "broken.zip"], "/good": ["archive", "good.zip"]}"#,
    )
    .unwrap();
    resolver.resolve(&spec, &mut fetcher).unwrap();
    let report = fetcher.run_batch().await;

    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].error,
        LoaderError::ArchiveParse { .. }
    ));
    assert_eq!(composer.tree().read(Path::new("/good/GAME.EXE")).unwrap(), b"MZ");
    assert!(!composer.tree().exists(Path::new("/broken")));

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        LoaderEvent::FileError { url, .. } if url == "broken.zip"
    )));
    assert_eq!(events.last(), Some(&LoaderEvent::BatchComplete));
}

#[tokio::test(start_paused = true)]
async fn test_nested_mounts_keep_spec_order() {
    // The parent archive arrives after the nested one
    let transport = MockTransport::new()
        .with(
            "c.zip",
            Reply::ok(zip_of(&[("apps/OLD.COM", "old"), ("ROOT.TXT", "root")])).after(50),
        )
        .with("apps.zip", Reply::ok(zip_of(&[("NEW.COM", "new")])).after(5));
    let temp = TempDir::new().unwrap();
    let (mut resolver, mut fetcher, composer, _events) = setup(transport, temp.path());

    let spec = MountSpec::from_json(
        r#"{"/drivec/apps": ["archive", "apps.zip"], "/drivec": ["archive", "c.zip"]}"#,
    )
    .unwrap();
    resolver.resolve(&spec, &mut fetcher).unwrap();
    fetcher.run_batch().await;

    let tree = composer.tree();
    assert_eq!(tree.read(Path::new("/drivec/ROOT.TXT")).unwrap(), b"root");
    assert_eq!(tree.read(Path::new("/drivec/apps/NEW.COM")).unwrap(), b"new");
    assert!(!tree.exists(Path::new("/drivec/apps/OLD.COM")));
}

#[tokio::test]
async fn test_bad_locator_opens_no_batch() {
    let temp = TempDir::new().unwrap();
    let composer = VfsComposer::new(ModuleRoot::generate(), &VfsRegistry::new());
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let mut fetcher = AssetFetcher::new(
        Arc::new(MockTransport::new().with("http://example.org/a", Reply::ok("1"))),
        events.clone(),
    );
    let mut resolver = MountResolver::new(
        StoreFactory::new(temp.path(), "example.org"),
        composer.clone(),
        Some(reqwest::Url::parse("http://example.org/").unwrap()),
    );

    let spec = MountSpec::from_json(
        r#"{"/a": ["file", "a"], "/b": ["file", "http://[bad"], "/c": ["persistent-local"]}"#,
    )
    .unwrap();
    let result = resolver.resolve(&spec, &mut fetcher);

    assert!(matches!(result, Err(LoaderError::InvalidSpec(_))));
    assert_eq!(fetcher.pending(), 0);
    assert!(drain(&mut rx).is_empty());
    assert!(!composer.tree().exists(Path::new("/c")));
}
