//! File identity manager (C2, §4.7 step 1).
//!
//! Every synced file carries an 8-character `mnmd_file_id` in its YAML
//! front matter. The ID is the basis of the orphan sweep's `mnmd-file-<id>`
//! tag (§4.7).

use crate::error::ValidationErrorKind;
use crate::model::FileId;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::path::{Path, PathBuf};

const ID_KEY: &str = "mnmd_file_id";

/// Splits `content` into `(front_matter_yaml, body)` if it begins with a
/// `---`-delimited block, else `None`.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let after = &rest[end + "\n---".len()..];
    let after = after.strip_prefix('\n').unwrap_or(after);
    Some((yaml, after))
}

fn random_file_id() -> FileId {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    FileId(token)
}

/// Reads `mnmd_file_id` from `content`'s front matter, if present, without
/// mutating anything.
pub fn read_file_id(content: &str) -> Result<Option<FileId>, ValidationErrorKind> {
    let Some((yaml, _body)) = split_front_matter(content) else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| ValidationErrorKind::MalformedFrontMatter {
            description: e.to_string(),
            src: content.to_string(),
            at: (0, yaml.len()).into(),
        })?;
    Ok(value
        .get(ID_KEY)
        .and_then(serde_yaml::Value::as_str)
        .map(|s| FileId(s.to_string())))
}

/// Ensures `content` carries a `mnmd_file_id`, generating one and
/// inserting it into an existing front-matter block (or creating a new
/// one) if absent. Returns the ID together with the content to write back;
/// `content` is echoed unchanged when it already carried a valid ID.
pub fn ensure_file_id(content: &str) -> Result<(FileId, String), ValidationErrorKind> {
    if let Some(id) = read_file_id(content)? {
        return Ok((id, content.to_string()));
    }

    let id = random_file_id();
    let rewritten = match split_front_matter(content) {
        Some((yaml, body)) => {
            let mut value: serde_yaml::Value = if yaml.trim().is_empty() {
                serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
            } else {
                serde_yaml::from_str(yaml).map_err(|e| ValidationErrorKind::MalformedFrontMatter {
                    description: e.to_string(),
                    src: content.to_string(),
                    at: (0, yaml.len()).into(),
                })?
            };
            if let serde_yaml::Value::Mapping(map) = &mut value {
                map.insert(
                    serde_yaml::Value::String(ID_KEY.to_string()),
                    serde_yaml::Value::String(id.0.clone()),
                );
            }
            let new_yaml = serde_yaml::to_string(&value).unwrap_or_default();
            format!("---\n{new_yaml}---\n{body}")
        }
        None => format!("---\n{ID_KEY}: {id}\n---\n{content}"),
    };
    Ok((id, rewritten))
}

/// Atomically writes `content` to `path`: write to `<path>.tmp`, then
/// rename onto `path`, removing the temp file if either step fails
/// (§4.8 step 5).
pub fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp_os = path.as_os_str().to_os_string();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);

    if let Err(e) = std::fs::write(&tmp_path, content) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_file_id_absent_without_front_matter() {
        assert_eq!(read_file_id("# Just a document").unwrap(), None);
    }

    #[test]
    fn test_read_file_id_present() {
        let doc = "---\nmnmd_file_id: abc12345\n---\nBody.";
        assert_eq!(
            read_file_id(doc).unwrap(),
            Some(FileId("abc12345".to_string()))
        );
    }

    #[test]
    fn test_ensure_file_id_creates_front_matter_when_absent() {
        let (id, rewritten) = ensure_file_id("Body text.").unwrap();
        assert_eq!(id.0.len(), 8);
        assert!(rewritten.starts_with("---\n"));
        assert!(rewritten.contains(&id.0));
        assert!(rewritten.ends_with("Body text."));
    }

    #[test]
    fn test_ensure_file_id_inserts_into_existing_front_matter() {
        let doc = "---\ntitle: Notes\n---\nBody.";
        let (id, rewritten) = ensure_file_id(doc).unwrap();
        assert!(rewritten.contains("title: Notes"));
        assert!(rewritten.contains(&format!("{ID_KEY}: {id}")));
    }

    #[test]
    fn test_ensure_file_id_is_noop_when_already_present() {
        let doc = "---\nmnmd_file_id: existing1\n---\nBody.";
        let (id, rewritten) = ensure_file_id(doc).unwrap();
        assert_eq!(id.0, "existing1");
        assert_eq!(rewritten, doc);
    }
}
