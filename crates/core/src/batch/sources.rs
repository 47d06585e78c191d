//! Source expansion and output naming.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Expands directories into the video files directly inside them.
///
/// Files are kept as given, whatever their extension; unreadable ones are
/// dropped later by the prober. Directory entries are sorted by name.
pub async fn expand_sources(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if !tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            sources.push(path.clone());
            continue;
        }

        match list_videos(path, extensions).await {
            Ok(mut found) => {
                found.sort();
                sources.extend(found);
            }
            Err(e) => warn!("Cannot read directory {}: {}", path.display(), e),
        }
    }
    sources
}

async fn list_videos(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && has_extension(&path, extensions) {
            found.push(path);
        }
    }
    Ok(found)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Chooses the output path for one source: `<stem><suffix>.<container>`.
///
/// Paths in `taken` are never reused, so two sources with the same stem do
/// not overwrite each other. Unless `overwrite` is set, existing files are
/// also avoided by appending `_2`, `_3`, ... to the stem.
pub fn plan_output_path(
    output_dir: &Path,
    source: &Path,
    suffix: &str,
    container: &str,
    overwrite: bool,
    taken: &HashSet<PathBuf>,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    let is_free = |path: &Path| !taken.contains(path) && (overwrite || !path.exists());

    let first = output_dir.join(format!("{}{}.{}", stem, suffix, container));
    if is_free(&first) {
        return first;
    }
    (2u32..)
        .map(|n| output_dir.join(format!("{}{}_{}.{}", stem, suffix, n, container)))
        .find(|p| is_free(p))
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["mp4".to_string(), "mov".to_string()]
    }

    #[test]
    fn test_plan_output_path() {
        let path = plan_output_path(
            Path::new("/out"),
            Path::new("/clips/wave.mp4"),
            "_LOOPER",
            "mov",
            true,
            &HashSet::new(),
        );
        assert_eq!(path, PathBuf::from("/out/wave_LOOPER.mov"));
    }

    #[test]
    fn test_same_stem_in_one_batch() {
        let mut taken = HashSet::new();
        taken.insert(PathBuf::from("/out/wave_LOOPER.mp4"));
        let path = plan_output_path(
            Path::new("/out"),
            Path::new("/other/wave.mov"),
            "_LOOPER",
            "mp4",
            true,
            &taken,
        );
        assert_eq!(path, PathBuf::from("/out/wave_LOOPER_2.mp4"));
    }

    #[test]
    fn test_existing_output_kept_without_overwrite() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("wave_LOOPER.mov"), b"x").unwrap();

        let keep = plan_output_path(dir.path(), Path::new("wave.mp4"), "_LOOPER", "mov", false, &HashSet::new());
        assert_eq!(keep, dir.path().join("wave_LOOPER_2.mov"));

        let replace = plan_output_path(dir.path(), Path::new("wave.mp4"), "_LOOPER", "mov", true, &HashSet::new());
        assert_eq!(replace, dir.path().join("wave_LOOPER.mov"));
    }

    #[tokio::test]
    async fn test_expand_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.MOV"), b"x").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let single = PathBuf::from("/clips/given.avi");
        let sources = expand_sources(&[dir.path().to_path_buf(), single.clone()], &exts()).await;

        assert_eq!(
            sources,
            vec![dir.path().join("a.mp4"), dir.path().join("b.MOV"), single]
        );
    }
}
