/*!
 * Emulator Loader - CLI Entry Point
 *
 * Runs the staging pipeline against the in-process host:
 * - Loads a loader config (JSON) from the first argument
 * - Fetches and composes every mount
 * - Prints the finalized tree as the runtime would see it
 */

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use emloader::loader::presets;
use emloader::{dump_tree, init_tracing, Loader, LoaderConfig, StagingHost};

const USAGE: &str = "usage: emloader <config.json> | emloader --jsmess <rom-url>";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [flag, rom] if flag == "--jsmess" => {
            presets::jsmess(rom).context("building JSMESS config")?.with_env_overrides()
        }
        [path] => LoaderConfig::from_file(&PathBuf::from(path))
            .with_context(|| format!("loading config {path}"))?,
        _ => bail!(USAGE),
    };

    info!("Emulator loader starting...");
    let mut host = StagingHost::new();
    let mut loader = Loader::new(config).context("creating loader")?;

    let report = loader
        .start(&mut host)
        .await
        .context("running staging pipeline")?;

    for failure in &report.failed {
        warn!(url = %failure.url, error = %failure.error, "Mount skipped");
    }

    let cwd = host.cwd().unwrap_or(Path::new("/")).to_path_buf();
    let tree = dump_tree(host.tree(), &cwd).with_context(|| format!("listing {}", cwd.display()))?;

    println!("{}:", cwd.display());
    print!("{tree}");
    if let Some(launch) = host.launched() {
        println!("launch: {:?} {}", launch.executable, launch.arguments.join(" "));
    }
    Ok(())
}
