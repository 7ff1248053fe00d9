/*!
 * Tree Dump
 * Human-readable listing of a store, one line per node
 */

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::traits::BackingStore;
use super::types::VfsResult;

/// Render everything beneath `dir`
///
/// Each level is indented by one tab and directory names carry a trailing
/// `/`. Entries appear in listing order, depth-first.
pub fn dump_tree(store: &dyn BackingStore, dir: &Path) -> VfsResult<String> {
    let mut out = String::new();
    let mut stack: Vec<(PathBuf, usize)> = Vec::new();
    push_children(store, dir, 0, &mut stack)?;

    while let Some((path, depth)) = stack.pop() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let indent = "\t".repeat(depth);

        if store.metadata(&path)?.is_dir() {
            let _ = writeln!(out, "{indent}{name}/");
            push_children(store, &path, depth + 1, &mut stack)?;
        } else {
            let _ = writeln!(out, "{indent}{name}");
        }
    }
    Ok(out)
}

fn push_children(
    store: &dyn BackingStore,
    dir: &Path,
    depth: usize,
    stack: &mut Vec<(PathBuf, usize)>,
) -> VfsResult<()> {
    let entries = store.list_dir(dir)?;
    stack.extend(entries.into_iter().rev().map(|e| (dir.join(e.name), depth)));
    Ok(())
}
