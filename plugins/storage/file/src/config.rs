use sha2::{Digest, Sha256};

// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStoreConfig {
    /// Directory holding one `<id>.json` document per record.
    pub data_dir: String,
}

impl FileStoreConfig {
    /// Parse `file:<dir>` or `file://<dir>`.
    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("file:")?;
        let dir = rest.strip_prefix("//").unwrap_or(rest);
        if dir.is_empty() {
            return None;
        }
        Some(Self {
            data_dir: dir.to_string(),
        })
    }
}

// ════════════════════════════════════════════════════════════════
//  On-disk naming
// ════════════════════════════════════════════════════════════════

/// Longest escaped stem used as is. Leaves room for `.json.tmp` under
/// the usual 255-byte file name limit.
const MAX_STEM_LEN: usize = 200;

/// File stem for a correlation id.
///
/// Ids are caller-supplied, so everything outside `[A-Za-z0-9_-]` is
/// written as `%XX` per UTF-8 byte: no separators, no `..`, and
/// distinct ids never share a file. Stems longer than `MAX_STEM_LEN`
/// become `~<sha256 hex>`; `~` never appears in an escaped stem.
pub(crate) fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            stem.push(b as char);
        } else {
            stem.push_str(&format!("%{b:02X}"));
        }
    }
    if stem.len() > MAX_STEM_LEN {
        let mut hasher = Sha256::new();
        hasher.update(id.as_bytes());
        return format!("~{:x}", hasher.finalize());
    }
    stem
}
