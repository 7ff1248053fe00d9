/*!
 * Registry Tests
 * Module isolation inside the process-wide registry
 */

use serial_test::serial;
use std::path::Path;
use std::sync::Arc;

use emloader::core::ModuleRoot;
use emloader::vfs::{BackingStore, FileStore, VfsComposer, VfsRegistry};

#[test]
#[serial]
fn test_global_registry_namespaces_loaders() {
    let registry = VfsRegistry::global();

    let first = VfsComposer::new(ModuleRoot::generate(), registry);
    let second = VfsComposer::new(ModuleRoot::generate(), registry);
    first.mount(Path::new("/a.txt"), Arc::new(FileStore::new(b"one".to_vec())));
    second.mount(Path::new("/a.txt"), Arc::new(FileStore::new(b"two".to_vec())));

    assert_ne!(first.module_root(), second.module_root());
    assert!(registry.is_registered(first.module_root()));

    let store = registry.as_store();
    let read = |composer: &VfsComposer| {
        store
            .read(&composer.module_root().join(Path::new("/a.txt")))
            .unwrap()
    };
    assert_eq!(read(&first), b"one");
    assert_eq!(read(&second), b"two");
}

#[test]
#[serial]
fn test_mounts_after_registration_are_visible() {
    let registry = VfsRegistry::global();
    let composer = VfsComposer::new(ModuleRoot::generate(), registry);
    let path = composer.module_root().join(Path::new("/late.txt"));

    assert!(registry.read(&path).is_err());
    composer.mount(Path::new("/late.txt"), Arc::new(FileStore::new(b"late".to_vec())));
    assert_eq!(registry.read(&path).unwrap(), b"late");
}
