// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File attachment field: a list of `[filename, bytes]` pairs.

use std::path::{Path, PathBuf};

use lrecomm_core::{FIELD_FILE_ATTACHMENTS, FieldTable, FieldValue, LrecommError, PeerAddress, unix_now};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// One attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
}

/// Read each file and build the attachment field value.
pub async fn pack_attachments(paths: &[PathBuf]) -> Result<FieldValue, LrecommError> {
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| LrecommError::io("read attachment", path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        items.push(FieldValue::List(vec![FieldValue::Text(name), FieldValue::Bytes(data)]));
    }
    Ok(FieldValue::List(items))
}

/// Attach `paths` to `fields`.
pub async fn attach_files(fields: &mut FieldTable, paths: &[PathBuf]) -> Result<(), LrecommError> {
    let value = pack_attachments(paths).await?;
    fields.insert(FIELD_FILE_ATTACHMENTS, value);
    Ok(())
}

/// Attachments in `fields`. Malformed entries are skipped.
pub fn read_attachments(fields: &FieldTable) -> Vec<Attachment> {
    let Some(list) = fields.get(FIELD_FILE_ATTACHMENTS).and_then(FieldValue::as_list) else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| match entry.as_list() {
            Some([name, data, ..]) => Some(Attachment {
                name: name.as_text()?.to_string(),
                data: data.as_bytes()?.to_vec(),
            }),
            _ => {
                warn!("malformed attachment entry, skipping");
                None
            }
        })
        .collect()
}

/// File name safe to place in a flat directory.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}

/// Write every attachment to `dir` as `<unix_ts>_<sender>_<name>`.
pub async fn save_attachments(
    fields: &FieldTable,
    dir: &Path,
    sender: &PeerAddress,
) -> Result<Vec<PathBuf>, LrecommError> {
    let attachments = read_attachments(fields);
    if attachments.is_empty() {
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| LrecommError::io("create directory", dir, e))?;

    let stamp = unix_now();
    let mut saved = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let name = sanitize_file_name(&attachment.name);
        let (path, mut file) = create_unique(dir, &format!("{stamp}_{sender}"), &name).await?;
        file.write_all(&attachment.data)
            .await
            .map_err(|e| LrecommError::io("write attachment", &path, e))?;
        file.flush()
            .await
            .map_err(|e| LrecommError::io("write attachment", &path, e))?;
        info!(path = %path.display(), bytes = attachment.data.len(), "attachment saved");
        saved.push(path);
    }
    Ok(saved)
}

/// Create `<prefix>_<name>`, or `<prefix>_<n>_<name>` if that is taken.
async fn create_unique(
    dir: &Path,
    prefix: &str,
    name: &str,
) -> Result<(PathBuf, tokio::fs::File), LrecommError> {
    let mut n = 0u32;
    loop {
        let path = if n == 0 {
            dir.join(format!("{prefix}_{name}"))
        } else {
            dir.join(format!("{prefix}_{n}_{name}"))
        };
        match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && n < u32::MAX => n += 1,
            Err(e) => return Err(LrecommError::io("create attachment", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn names_are_flattened_and_cleaned() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_file_name(".."), "attachment");
        assert_eq!(sanitize_file_name(""), "attachment");
    }

    #[test]
    fn missing_field_has_no_attachments() {
        assert!(read_attachments(&FieldTable::new()).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let mut fields = FieldTable::new();
        fields.insert(
            FIELD_FILE_ATTACHMENTS,
            FieldValue::List(vec![
                FieldValue::Int(1),
                FieldValue::List(vec![FieldValue::Text("a.txt".into()), FieldValue::Bytes(b"A".to_vec())]),
                FieldValue::List(vec![FieldValue::Text("b.txt".into())]),
            ]),
        );
        let attachments = read_attachments(&fields);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "a.txt");
    }

    #[tokio::test]
    async fn attached_files_are_saved_with_sender_prefix() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = src.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let mut fields = FieldTable::new();
        attach_files(&mut fields, &[file]).await.unwrap();
        let sender: PeerAddress = SENDER.parse().unwrap();
        let saved = save_attachments(&fields, out.path(), &sender).await.unwrap();

        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(&format!("_{SENDER}_notes.txt")), "{name}");
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn attachments_with_the_same_name_are_both_kept() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir(src.path().join("a")).unwrap();
        std::fs::create_dir(src.path().join("b")).unwrap();
        let first = src.path().join("a/notes.txt");
        let second = src.path().join("b/notes.txt");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let mut fields = FieldTable::new();
        attach_files(&mut fields, &[first, second]).await.unwrap();
        let sender: PeerAddress = SENDER.parse().unwrap();
        let saved = save_attachments(&fields, out.path(), &sender).await.unwrap();

        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0], saved[1]);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"first");
        assert_eq!(std::fs::read(&saved[1]).unwrap(), b"second");
        let name = saved[1].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(&format!("_{SENDER}_1_notes.txt")), "{name}");
    }

    #[tokio::test]
    async fn nothing_saved_without_field() {
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("received");
        let sender: PeerAddress = SENDER.parse().unwrap();
        let saved = save_attachments(&FieldTable::new(), &target, &sender).await.unwrap();
        assert!(saved.is_empty());
        assert!(!target.exists());
    }
}
