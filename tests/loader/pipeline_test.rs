/*!
 * Pipeline Tests
 * End-to-end runs against the staging host
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use emloader::core::limits::{KEYBOARD_ELEMENT_SELECTOR, KEYBOARD_ELEMENT_VAR};
use emloader::loader::{Loader, LoaderConfig, LoaderEvent, LoaderState, MountSpec};
use emloader::runtime::{
    HostCapabilities, HostFilesystem, HostRuntime, RuntimeModule, StagingHost,
};
use emloader::vfs::{BackingStore, VfsRegistry};
use emloader::LoaderResult;

use super::support::{drain, zip_of, MockTransport, Reply};

fn config_with(spec: &str, storage: &Path) -> LoaderConfig {
    LoaderConfig {
        mount_spec: Some(MountSpec::from_json(spec).unwrap()),
        storage_root: Some(storage.to_path_buf()),
        executable: Some("dosbox".into()),
        executable_args: vec!["-c".into(), "mount c /drivec".into()],
        ..LoaderConfig::default()
    }
}

fn loader(config: LoaderConfig, transport: MockTransport) -> Loader {
    Loader::with_transport(config, Arc::new(transport), &VfsRegistry::new())
}

/// Host that snapshots the event stream at launch time
struct OrderCheckingHost {
    inner: StagingHost,
    rx: broadcast::Receiver<LoaderEvent>,
    seen_before_launch: Vec<LoaderEvent>,
}

impl HostRuntime for OrderCheckingHost {
    fn filesystem(&mut self) -> &mut dyn HostFilesystem {
        self.inner.filesystem()
    }

    fn environment(&mut self) -> Option<&mut BTreeMap<String, String>> {
        self.inner.environment()
    }

    fn capabilities(&self) -> HostCapabilities {
        self.inner.capabilities()
    }

    fn launch(&mut self, module: RuntimeModule) -> LoaderResult<()> {
        self.seen_before_launch = drain(&mut self.rx);
        self.inner.launch(module)
    }
}

#[tokio::test]
async fn test_file_mount_visible_after_finalize() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new().with("http://example.org/cfg", Reply::ok("hello"));
    let config = config_with(
        r#"{"/config.txt": ["file", "http://example.org/cfg"]}"#,
        temp.path(),
    );
    let mut loader = loader(config, transport);
    let mut host = StagingHost::new();

    let report = loader.start(&mut host).await.unwrap();
    assert!(report.failed.is_empty());
    assert_eq!(loader.state(), LoaderState::Running);

    let root = loader.composer().unwrap().module_root().clone();
    let workdir = PathBuf::from("/mnt").join(root.as_path().strip_prefix("/").unwrap());
    assert_eq!(host.cwd(), Some(workdir.as_path()));
    assert_eq!(host.read(&workdir.join("config.txt")).unwrap(), b"hello");

    let launch = host.launched().unwrap();
    assert_eq!(launch.executable.as_deref(), Some("dosbox"));
    assert_eq!(launch.hooks_run, vec!["init_environment", "finalize"]);
    assert_eq!(
        host.env_var(KEYBOARD_ELEMENT_VAR),
        Some(KEYBOARD_ELEMENT_SELECTOR)
    );
}

#[tokio::test(start_paused = true)]
async fn test_finalize_waits_for_batch() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new()
        .with("slow.zip", Reply::ok(zip_of(&[("GAME.EXE", "MZ")])).after(100))
        .with("fast.txt", Reply::ok("cfg").after(1));
    let config = config_with(
        r#"{"/drivec": ["archive", "slow.zip"], "/drivec/game.cfg": ["file", "fast.txt"]}"#,
        temp.path(),
    );
    let mut loader = loader(config, transport);
    let mut host = OrderCheckingHost {
        inner: StagingHost::new(),
        rx: loader.subscribe(),
        seen_before_launch: Vec::new(),
    };

    loader.start(&mut host).await.unwrap();

    // Every transfer had settled and the batch had closed before launch
    let seen = &host.seen_before_launch;
    assert_eq!(seen.last(), Some(&LoaderEvent::BatchComplete));
    assert_eq!(
        seen.iter()
            .filter(|e| matches!(e, LoaderEvent::FileComplete { .. }))
            .count(),
        2
    );

    let cwd = host.inner.cwd().unwrap().to_path_buf();
    assert_eq!(host.inner.read(&cwd.join("drivec/GAME.EXE")).unwrap(), b"MZ");
    assert_eq!(host.inner.read(&cwd.join("drivec/game.cfg")).unwrap(), b"cfg");
}

#[tokio::test]
async fn test_failed_entry_does_not_block_start() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new()
        .with("ok.txt", Reply::ok("fine"))
        .with("gone.txt", Reply::status(500));
    let config = config_with(
        r#"{"/ok.txt": ["file", "ok.txt"], "/gone.txt": ["file", "gone.txt"]}"#,
        temp.path(),
    );
    let mut loader = loader(config, transport);
    let mut rx = loader.subscribe();
    let mut host = StagingHost::new();

    let report = loader.start(&mut host).await.unwrap();
    assert_eq!(report.succeeded, vec!["ok.txt".to_string()]);
    assert_eq!(report.failed.len(), 1);

    let tree = loader.composer().unwrap().tree();
    assert!(tree.exists(Path::new("/ok.txt")));
    assert!(!tree.exists(Path::new("/gone.txt")));

    let events = drain(&mut rx);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, LoaderEvent::BatchComplete))
            .count(),
        1
    );
    assert!(host.launched().is_some());
}

#[tokio::test]
async fn test_no_mount_spec_starts_directly() {
    let config = LoaderConfig {
        executable_args: vec!["game".into()],
        ..LoaderConfig::default()
    };
    let mut loader = loader(config, MockTransport::new());
    let mut rx = loader.subscribe();
    let mut host = StagingHost::new();

    loader.start(&mut host).await.unwrap();

    assert_eq!(loader.state(), LoaderState::Running);
    assert!(loader.composer().is_none());
    assert!(host.cwd().is_none());
    assert!(drain(&mut rx).is_empty());
    assert_eq!(host.launched().unwrap().hooks_run, vec!["init_environment"]);
}

#[tokio::test]
async fn test_capabilities_limit_flags() {
    let config = LoaderConfig {
        use_worker: true,
        use_webgl: true,
        ..LoaderConfig::default()
    };
    let mut loader = loader(config, MockTransport::new());
    let mut host = StagingHost::with_capabilities(HostCapabilities {
        worker: false,
        webgl: true,
        sound: false,
    })
    .without_environment();

    loader.start(&mut host).await.unwrap();

    let flags = host.launched().unwrap().flags;
    assert!(!flags.worker);
    assert!(flags.webgl);
    assert!(!flags.sound);
    assert_eq!(host.env_var(KEYBOARD_ELEMENT_VAR), None);
}

#[tokio::test]
async fn test_persistent_mount_survives_loaders() {
    let temp = TempDir::new().unwrap();
    let spec = r#"{"/drivea": ["persistent-local"]}"#;

    let mut first = loader(config_with(spec, temp.path()), MockTransport::new());
    first.start(&mut StagingHost::new()).await.unwrap();
    first
        .composer()
        .unwrap()
        .tree()
        .write(Path::new("/drivea/SAVE.DAT"), b"level 3")
        .unwrap();

    let mut second = loader(config_with(spec, temp.path()), MockTransport::new());
    let mut host = StagingHost::new();
    second.start(&mut host).await.unwrap();

    let cwd = host.cwd().unwrap().to_path_buf();
    assert_eq!(host.read(&cwd.join("drivea/SAVE.DAT")).unwrap(), b"level 3");
}
