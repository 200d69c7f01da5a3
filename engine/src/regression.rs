//! Replay regression helpers.
//!
//! States are fingerprinted by hashing their canonical JSON with SHA-256. A
//! scenario is run live, its `TimeMachine` saved to disk, reloaded, and the
//! per-frame fingerprints of both histories are compared. Fingerprint lists can
//! also be pinned as golden files next to a crate's tests.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner, TimeMachine};

/// Environment flag helper: accepts `1/true/yes/on` (case-insensitive).
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// If set, regression tests may update golden files in-place.
pub fn update_goldens_enabled() -> bool {
    env_flag("BLOOM_UPDATE_GOLDENS")
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[macro_export]
macro_rules! regression_golden_path {
    ($name:expr) => {{
        let base = $crate::regression::sanitize_filename($name);
        ::std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("goldens")
            .join(format!("{base}.json"))
    }};
}

pub fn bytes_sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of the state's compact JSON encoding.
pub fn state_sha256_hex<S: Serialize>(state: &S) -> io::Result<String> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(bytes_sha256_hex(&bytes))
}

pub fn history_sha256_hexes<S: Serialize>(history: &[S]) -> io::Result<Vec<String>> {
    history.iter().map(state_sha256_hex).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateHashGolden {
    pub version: u32,
    pub name: String,
    pub hash_alg: String,
    /// One hash per recorded state, frame 0 first.
    pub hashes: Vec<String>,
}

impl StateHashGolden {
    pub fn new(name: impl Into<String>, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<StateHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &StateHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

/// Compares `golden` against the file at `path`, writing it when the file is
/// missing or `update` is set.
pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &StateHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    let exists = path.exists();

    if update || !exists {
        save_golden_json(path, golden)?;
        if !exists {
            eprintln!("wrote golden: {}", path.display());
        } else {
            eprintln!("updated golden: {}", path.display());
        }
        return Ok(());
    }

    let expected = load_golden_json(path)?;
    if expected.version != golden.version || expected.hash_alg != golden.hash_alg {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "golden metadata mismatch at {}:\nexpected: v{} alg={}\nactual:   v{} alg={}\n(hint: set BLOOM_UPDATE_GOLDENS=1 to rewrite)",
                path.display(),
                expected.version,
                expected.hash_alg,
                golden.version,
                golden.hash_alg,
            ),
        ));
    }

    compare_hashes(&expected.hashes, &golden.hashes).map_err(|msg| {
        io::Error::other(format!(
            "golden mismatch at {}: {msg}\n(hint: set BLOOM_UPDATE_GOLDENS=1 to rewrite)",
            path.display()
        ))
    })
}

fn compare_hashes(expected: &[String], actual: &[String]) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "expected {} hashes, got {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, (a, b)) in expected.iter().zip(actual.iter()).enumerate() {
        if a != b {
            return Err(format!("frame {i}:\nexpected: {a}\nactual:   {b}"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RecordReplayArtifacts {
    pub state_json: PathBuf,
    pub hashes: Vec<String>,
}

/// Runs `inputs` live, saves the history to `out_dir`, reloads it, and checks
/// that the reloaded history and a fresh re-simulation from the same inputs
/// both hash identically to the live run, frame by frame.
pub fn record_then_replay_and_compare_state_hashes<G, I>(
    name: &str,
    out_dir: impl AsRef<Path>,
    game: G,
    inputs: I,
) -> io::Result<RecordReplayArtifacts>
where
    G: GameLogic + Clone,
    G::State: Serialize + DeserializeOwned,
    I: IntoIterator<Item = G::Input>,
    G::Input: Clone,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let state_json = out_dir.join(format!("{}.json", sanitize_filename(name)));

    let inputs: Vec<G::Input> = inputs.into_iter().collect();

    let mut live = HeadlessRunner::new(game.clone());
    live.run(inputs.iter().cloned());
    let live_hashes = history_sha256_hexes(live.history())?;
    live.timemachine().save_json_file(&state_json)?;

    let loaded = TimeMachine::<G::State>::load_json_file(&state_json)?;
    let loaded_hashes = history_sha256_hexes(loaded.history())?;
    compare_hashes(&live_hashes, &loaded_hashes)
        .map_err(|msg| io::Error::other(format!("saved history diverged: {msg}")))?;

    let mut resimulated = HeadlessRunner::new(game);
    resimulated.run(inputs);
    let resim_hashes = history_sha256_hexes(resimulated.history())?;
    compare_hashes(&live_hashes, &resim_hashes)
        .map_err(|msg| io::Error::other(format!("re-simulation diverged: {msg}")))?;

    Ok(RecordReplayArtifacts {
        state_json,
        hashes: live_hashes,
    })
}
