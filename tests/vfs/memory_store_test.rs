/*!
 * Memory Store Tests
 * Overlay store semantics through the public trait
 */

use std::path::Path;

use emloader::vfs::{BackingStore, MemoryStore, VfsError};

#[test]
fn test_memory_store_basic() {
    let store = MemoryStore::new();

    store.write(Path::new("/test.txt"), b"hello").unwrap();
    assert_eq!(store.read(Path::new("/test.txt")).unwrap(), b"hello");

    assert!(store.exists(Path::new("/test.txt")));
    assert!(!store.exists(Path::new("/missing.txt")));
    assert!(!store.readonly());
}

#[test]
fn test_memory_store_directories() {
    let store = MemoryStore::new();

    store.create_dir(Path::new("/testdir/nested")).unwrap();
    assert!(store.metadata(Path::new("/testdir")).unwrap().is_dir());

    store.write(Path::new("/testdir/file.txt"), b"content").unwrap();
    let entries = store.list_dir(Path::new("/testdir")).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["file.txt", "nested"]);
}

#[test]
fn test_overwrite_keeps_last_write() {
    let store = MemoryStore::new();
    store.write(Path::new("/a"), b"first").unwrap();
    store.write(Path::new("/a"), b"second").unwrap();

    assert_eq!(store.read(Path::new("/a")).unwrap(), b"second");
    assert_eq!(store.metadata(Path::new("/a")).unwrap().size, 6);
}

#[test]
fn test_write_needs_parent() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.write(Path::new("/missing/file.txt"), b"x"),
        Err(VfsError::NotFound(_))
    ));
}

#[test]
fn test_clone_shares_contents() {
    let store = MemoryStore::new();
    let view = store.clone();
    store.insert("/deep/path/file.bin", &[1, 2, 3]).unwrap();

    assert_eq!(view.read(Path::new("/deep/path/file.bin")).unwrap(), vec![1, 2, 3]);
    assert_eq!(view.node_count(), 4);
}
