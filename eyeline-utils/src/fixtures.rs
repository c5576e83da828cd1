//! Access to the shared `fixtures/` tree used by the test suites.

use std::{
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Overrides the fixture root when set.
pub const FIXTURE_ROOT_ENV: &str = "EYELINE_FIXTURE_ROOT";

/// The fixture root: `$EYELINE_FIXTURE_ROOT` when set, otherwise the nearest
/// `fixtures/` directory above this crate.
pub fn fixtures_dir() -> Result<PathBuf> {
    if let Some(root) = env::var_os(FIXTURE_ROOT_ENV) {
        return Ok(PathBuf::from(root));
    }
    let crate_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .ancestors()
        .map(|dir| dir.join("fixtures"))
        .find(|dir| dir.is_dir())
        .with_context(|| format!("no fixtures/ directory above {}", crate_dir.display()))
}

/// Deserialize `fixtures/<relative>` as JSON.
pub fn load_fixture_json<T: DeserializeOwned>(relative: impl AsRef<Path>) -> Result<T> {
    let path = fixtures_dir()?.join(relative);
    let file =
        File::open(&path).with_context(|| format!("missing fixture {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("malformed fixture {}", path.display()))
}
