/*!
 * Composer Tests
 * Archive expansion into writable overlays and host finalization
 */

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use emloader::core::ModuleRoot;
use emloader::runtime::{HostRuntime, StagingHost};
use emloader::vfs::paths::is_scratch_path;
use emloader::vfs::{
    dump_tree, BackingStore, FileStore, MountKind, StoreFactory, VfsComposer, VfsRegistry,
};
use emloader::LoaderError;
use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn composer() -> VfsComposer {
    VfsComposer::new(ModuleRoot::generate(), &VfsRegistry::new())
}

#[test]
fn test_archive_round_trip() {
    let composer = composer();
    let factory = StoreFactory::new("/unused", "test");
    let bytes = zip_of(&[("GAME.EXE", "MZ-game"), ("DOCS/readme.txt", "read me")]);

    let built = factory
        .create(MountKind::Archive, Path::new("/drivec"), Some(&bytes))
        .unwrap();
    composer.apply(Path::new("/drivec"), built).unwrap();

    let tree = composer.tree();
    assert_eq!(tree.read(Path::new("/drivec/GAME.EXE")).unwrap(), b"MZ-game");
    assert_eq!(
        tree.read(Path::new("/drivec/DOCS/readme.txt")).unwrap(),
        b"read me"
    );

    // Overlay accepts writes, including new files in expanded directories
    tree.write(Path::new("/drivec/DOCS/notes.txt"), b"mine").unwrap();
    tree.write(Path::new("/drivec/GAME.EXE"), b"patched").unwrap();
    assert_eq!(tree.read(Path::new("/drivec/GAME.EXE")).unwrap(), b"patched");

    // Only the overlay remains mounted
    let mounts = tree.list_mounts();
    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts[0].0, Path::new("/drivec"));
    assert_eq!(mounts[0].1, "memory");
    assert!(!mounts.iter().any(|(p, _)| is_scratch_path(p)));
}

#[test]
fn test_expansions_do_not_collide() {
    let composer = composer();
    let first = zip_of(&[("A.TXT", "a")]);
    let second = zip_of(&[("B.TXT", "b")]);

    let factory = StoreFactory::new("/unused", "test");
    for (target, bytes) in [("/drivec", &first), ("/drived", &second)] {
        let built = factory
            .create(MountKind::Archive, Path::new(target), Some(bytes))
            .unwrap();
        composer.apply(Path::new(target), built).unwrap();
    }

    let dump = dump_tree(composer.tree(), Path::new("/")).unwrap();
    assert_eq!(dump, "drivec/\n\tA.TXT\ndrived/\n\tB.TXT\n");
}

#[test]
fn test_empty_archive_expands_to_empty_overlay() {
    let composer = composer();
    let factory = StoreFactory::new("/unused", "test");
    let built = factory
        .create(MountKind::Archive, Path::new("/empty"), Some(&zip_of(&[])))
        .unwrap();
    composer.apply(Path::new("/empty"), built).unwrap();

    assert!(composer.tree().list_dir(Path::new("/empty")).unwrap().is_empty());
    composer
        .tree()
        .write(Path::new("/empty/new.txt"), b"x")
        .unwrap();
}

#[test]
fn test_finalize_exposes_tree_under_mnt() {
    let registry = VfsRegistry::new();
    let root = ModuleRoot::new("/module-a").unwrap();
    let composer = VfsComposer::new(root, &registry);
    composer.mount(
        Path::new("/config.txt"),
        Arc::new(FileStore::new(b"hello".to_vec())),
    );

    let mut host = StagingHost::new();
    assert_eq!(
        composer.finalize(host.filesystem(), 1),
        Err(LoaderError::BatchOpen(1))
    );
    assert!(!host.tree().exists(Path::new("/mnt")));

    composer.finalize(host.filesystem(), 0).unwrap();
    assert_eq!(host.cwd(), Some(Path::new("/mnt/module-a")));
    assert_eq!(
        host.read(Path::new("/mnt/module-a/config.txt")).unwrap(),
        b"hello"
    );
}
