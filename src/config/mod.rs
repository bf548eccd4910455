use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::info;

/// Keys whose values are never returned in plaintext by `masked_view`.
pub const SECRET_KEYS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "ELEVENLABS_API_KEY",
    "SERPAPI_KEY",
    "YOUTUBE_DATA_API_KEY",
    "RUNWAY_API_KEY",
    "META_ACCESS_TOKEN",
    "TIKTOK_CLIENT_SECRET",
    "TWITTER_API_SECRET",
    "TWITTER_ACCESS_SECRET",
    "AWS_SECRET_ACCESS_KEY",
    "GATEWAY_AUTH_TOKEN",
    "N8N_API_KEY",
    "TELEGRAM_BOT_TOKEN",
];

/// Substring that marks a value as already-masked client echo.
const MASK_MARKER: &str = "***";

/// Values shorter than this are fully redacted instead of partially shown.
/// Display policy only; masking is not a security boundary.
const PARTIAL_MASK_MIN_LEN: usize = 8;

pub type SharedConfig = std::sync::Arc<ConfigStore>;

/// Flat key=value settings store mirrored to an env-style file on disk.
///
/// The in-memory map is the live view consulted by every request; each
/// successful write refreshes it so new values apply without a restart.
/// Writes hold the lock across read-merge-persist so concurrent saves
/// cannot lose updates. Comments and ordering in the file are discarded
/// on rewrite; round-tripping formatting is out of scope.
pub struct ConfigStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_document(&path);
        if !values.is_empty() {
            info!("Loaded {} settings from {}", values.len(), path.display());
        }
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    /// `$OPSDECK_ENV_FILE` if set, else `~/.opsdeck/opsdeck.env`.
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var("OPSDECK_ENV_FILE") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .map(|home| home.join(".opsdeck").join("opsdeck.env"))
            .unwrap_or_else(|| PathBuf::from("opsdeck.env"))
    }

    /// Stored value, falling back to the process environment.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.values.read().await.get(key) {
            return Some(v.clone());
        }
        std::env::var(key).ok()
    }

    /// Stored value or the documented per-key default. Empty strings count
    /// as unset so a blanked-out field falls back rather than breaking URLs.
    pub async fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key).await {
            Some(v) if !v.is_empty() => v,
            _ => default.to_string(),
        }
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.values.read().await.clone()
    }

    /// Merge `updates` into the on-disk document and refresh the live view.
    /// New keys are added, existing keys overwritten, untouched keys kept.
    pub async fn write(&self, updates: HashMap<String, String>) -> Result<usize> {
        let mut values = self.values.write().await;
        let mut merged = read_document(&self.path);
        let count = updates.len();
        merged.extend(updates);
        persist(&self.path, &merged)?;
        *values = merged;
        Ok(count)
    }

    /// Full document with every `SECRET_KEYS` value replaced by its mask.
    pub async fn masked_view(&self) -> HashMap<String, String> {
        self.values
            .read()
            .await
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_key(k) { mask(v) } else { v.clone() };
                (k.clone(), shown)
            })
            .collect()
    }
}

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

/// first6 + `***` + last4 for long values, `***` for short non-empty ones.
pub fn mask(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < PARTIAL_MASK_MIN_LEN {
        return MASK_MARKER.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK_MARKER}{tail}")
}

/// Drop submitted values that are empty or still carry the mask marker, so
/// a client echoing a masked read back at us never clobbers the real secret.
pub fn sanitize_updates(submitted: HashMap<String, String>) -> HashMap<String, String> {
    submitted
        .into_iter()
        .filter(|(_, v)| !v.is_empty() && !v.contains(MASK_MARKER))
        .collect()
}

/// Line-oriented env parse: blank and `#` lines skipped, split on the first
/// `=`, both sides trimmed, lines without `=` skipped. Missing or unreadable
/// file yields an empty document.
fn parse_document(text: &str) -> HashMap<String, String> {
    let mut doc = HashMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(idx) = trimmed.find('=') else {
            continue;
        };
        let key = trimmed[..idx].trim();
        let value = trimmed[idx + 1..].trim();
        if key.is_empty() {
            continue;
        }
        doc.insert(key.to_string(), value.to_string());
    }
    doc
}

fn read_document(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_document(&text),
        Err(_) => HashMap::new(),
    }
}

/// Atomic rewrite: serialize the whole document to a sibling temp file and
/// rename it over the target so a crash never leaves a half-written store.
fn persist(path: &Path, doc: &HashMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let mut keys: Vec<&String> = doc.keys().collect();
    keys.sort();
    let mut body = String::new();
    for key in keys {
        body.push_str(key);
        body.push('=');
        body.push_str(&doc[key]);
        body.push('\n');
    }
    let tmp = path.with_extension("env.tmp");
    std::fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join("opsdeck.env"))
    }

    #[test]
    fn parse_skips_comments_blanks_and_malformed_lines() {
        let doc = parse_document(
            "# header comment\n\nN8N_BASE_URL = http://localhost:5678 \nnot-a-pair\nEMPTY=\n",
        );
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["N8N_BASE_URL"], "http://localhost:5678");
        assert_eq!(doc["EMPTY"], "");
    }

    #[test]
    fn parse_splits_on_first_equals_only() {
        let doc = parse_document("TOKEN=abc=def==\n");
        assert_eq!(doc["TOKEN"], "abc=def==");
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn sequential_writes_merge_instead_of_replacing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .write(HashMap::from([("A".to_string(), "1".to_string())]))
            .await
            .unwrap();
        store
            .write(HashMap::from([("B".to_string(), "2".to_string())]))
            .await
            .unwrap();

        let doc = store.snapshot().await;
        assert_eq!(doc["A"], "1");
        assert_eq!(doc["B"], "2");

        // Reopening from disk sees the same merged document.
        let reopened = store_in(&dir);
        let doc = reopened.snapshot().await;
        assert_eq!(doc["A"], "1");
        assert_eq!(doc["B"], "2");
    }

    #[tokio::test]
    async fn write_refreshes_live_view_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(
            store.get_or("OLLAMA_BASE_URL", "http://localhost:11434").await,
            "http://localhost:11434"
        );
        store
            .write(HashMap::from([(
                "OLLAMA_BASE_URL".to_string(),
                "http://10.0.0.5:11434".to_string(),
            )]))
            .await
            .unwrap();
        assert_eq!(
            store.get_or("OLLAMA_BASE_URL", "http://localhost:11434").await,
            "http://10.0.0.5:11434"
        );
    }

    #[test]
    fn mask_projects_long_values_and_redacts_short_ones() {
        assert_eq!(mask("sk-abc1234567890xyzw"), "sk-abc***xyzw");
        assert_eq!(mask("short"), "***");
        assert_eq!(mask(""), "");
        // Exactly at the threshold: partial projection applies.
        assert_eq!(mask("12345678"), "123456***5678");
    }

    #[tokio::test]
    async fn masked_view_only_touches_secret_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .write(HashMap::from([
                ("ANTHROPIC_API_KEY".to_string(), "sk-ant-0123456789".to_string()),
                ("OLLAMA_BASE_URL".to_string(), "http://localhost:11434".to_string()),
            ]))
            .await
            .unwrap();

        let view = store.masked_view().await;
        assert_eq!(view["ANTHROPIC_API_KEY"], "sk-ant***6789");
        assert_eq!(view["OLLAMA_BASE_URL"], "http://localhost:11434");
    }

    #[test]
    fn sanitize_drops_empty_and_masked_values() {
        let submitted = HashMap::from([
            ("A".to_string(), "abc***def".to_string()),
            ("B".to_string(), String::new()),
            ("C".to_string(), "keep-me".to_string()),
        ]);
        let filtered = sanitize_updates(submitted);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["C"], "keep-me");
    }

    #[tokio::test]
    async fn masked_round_trip_does_not_destroy_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .write(HashMap::from([(
                "N8N_API_KEY".to_string(),
                "n8n_api_0123456789abcdef".to_string(),
            )]))
            .await
            .unwrap();

        // Client submits the masked read back unchanged.
        let echoed = store.masked_view().await;
        let filtered = sanitize_updates(echoed);
        store.write(filtered).await.unwrap();

        assert_eq!(
            store.get("N8N_API_KEY").await.unwrap(),
            "n8n_api_0123456789abcdef"
        );
    }
}
