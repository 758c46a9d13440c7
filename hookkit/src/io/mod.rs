//! Side-effecting helpers: configuration files, persisted state, subprocesses.

pub mod config;
pub mod git;
pub mod jsonl;
pub mod process;
pub mod rate_state;

/// Filesystem-safe stem for a host session id.
///
/// ASCII letters, digits and `-` are kept; every other byte (including `_`)
/// becomes `_XX` with the byte in upper-case hex. The encoding is injective,
/// so distinct session ids never share state, and the stem can never name a
/// path outside its parent directory. The empty id maps to `_`.
pub fn session_file_stem(session_id: &str) -> String {
    if session_id.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}
