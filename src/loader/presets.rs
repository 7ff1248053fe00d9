/*!
 * Loader Presets
 * Ready-made configurations for known emulator builds
 */

use std::collections::BTreeMap;

use super::config::LoaderConfig;
use super::mount_spec::MountSpec;
use crate::core::errors::{LoaderError, LoaderResult};
use crate::core::id::ModuleRoot;
use crate::core::limits::HOST_MOUNT_POINT;

/// Fixed JSMESS arguments following `<game> -rompath <dir>`
const JSMESS_ARGS: &[&str] = &[
    "-window",
    "-resolution",
    "292x240",
    "-nokeepaspect",
    "-autoframeskip",
    "-sound",
    "js",
];

/// Configuration for a JSMESS system running a single ROM
///
/// The ROM is mounted as a file at `/<romname>` under a fresh module root,
/// and the emulator is pointed at that root through `-rompath`.
pub fn jsmess(rom_url: &str) -> LoaderResult<LoaderConfig> {
    let filename = rom_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| LoaderError::InvalidConfig(format!("no file name in ROM url {rom_url:?}")))?;
    let game = filename.strip_suffix(".zip").unwrap_or(filename);

    let mount_spec = MountSpec::from_map(BTreeMap::from([(
        format!("/{filename}"),
        vec!["file".to_string(), rom_url.to_string()],
    )]))?;

    let root = ModuleRoot::generate();
    let rompath = format!("{HOST_MOUNT_POINT}{root}");

    let mut executable_args = vec![game.to_string(), "-rompath".to_string(), rompath];
    executable_args.extend(JSMESS_ARGS.iter().map(|a| a.to_string()));

    Ok(LoaderConfig {
        module_path: Some(root.to_string()),
        mount_spec: Some(mount_spec),
        executable_args,
        ..LoaderConfig::default()
    })
}
