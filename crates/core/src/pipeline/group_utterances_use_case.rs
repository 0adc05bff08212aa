use std::path::{Path, PathBuf};

use crate::pipeline::dataset_layout::list_entries;
use crate::pipeline::pipeline_logger::PipelineLogger;

/// Regroups a flat frame dump into per-utterance folders, in place.
///
/// `<root>/<actor>/<utterance>-<NNN>.<ext>` moves to
/// `<root>/<actor>/<utterance>/<NNN>.<ext>`. The utterance is everything
/// before the last `-` of the file stem. Subdirectories and names without
/// a `-` are left alone.
pub struct GroupUtterancesUseCase {
    logger: Box<dyn PipelineLogger>,
}

impl GroupUtterancesUseCase {
    pub fn new(logger: Box<dyn PipelineLogger>) -> Self {
        Self { logger }
    }

    /// Returns the number of files moved.
    pub fn execute(&mut self, root: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let actors: Vec<PathBuf> = list_entries(root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();

        let mut moved = 0;
        for (i, actor) in actors.iter().enumerate() {
            log::info!("Processing {}", actor.display());
            for file in list_entries(actor)? {
                if !file.is_file() {
                    continue;
                }
                let Some(target) = grouped_path(&file) else {
                    log::warn!("Skipping {}: no utterance suffix", file.display());
                    continue;
                };
                if target.exists() {
                    return Err(format!(
                        "Cannot move {}: {} already exists",
                        file.display(),
                        target.display()
                    )
                    .into());
                }
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::rename(&file, &target)?;
                moved += 1;
            }
            self.logger.progress(i + 1, actors.len());
        }

        self.logger.count("files_grouped", moved);
        self.logger.summary();
        Ok(moved)
    }
}

/// `A/01-02-003.jpg` gives `A/01-02/003.jpg`.
fn grouped_path(file: &Path) -> Option<PathBuf> {
    let stem = file.file_stem()?.to_str()?;
    let (utterance, frame) = stem.rsplit_once('-')?;
    if utterance.is_empty() || frame.is_empty() {
        return None;
    }
    let name = match file.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{frame}.{ext}"),
        None => frame.to_string(),
    };
    Some(file.parent()?.join(utterance).join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use rstest::rstest;
    use std::fs;

    fn touch(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn use_case() -> GroupUtterancesUseCase {
        GroupUtterancesUseCase::new(Box::new(NullPipelineLogger))
    }

    #[rstest]
    #[case("A/01-01-01-01-01-01-01-001.jpg", Some("A/01-01-01-01-01-01-01/001.jpg"))]
    #[case("A/utt-12.png", Some("A/utt/12.png"))]
    #[case("A/noframe.jpg", None)]
    #[case("A/-001.jpg", None)]
    #[case("A/utt-.jpg", None)]
    fn test_grouped_path(#[case] file: &str, #[case] expected: Option<&str>) {
        assert_eq!(grouped_path(Path::new(file)), expected.map(PathBuf::from));
    }

    #[test]
    fn test_moves_frames_into_utterance_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("Actor_01/01-01-001.jpg"), b"a");
        touch(&root.join("Actor_01/01-01-002.jpg"), b"b");
        touch(&root.join("Actor_01/01-02-001.jpg"), b"c");
        touch(&root.join("Actor_02/02-01-001.jpg"), b"d");
        touch(&root.join("Actor_01/.DS_Store"), b"");
        touch(&root.join(".DS_Store"), b"");

        let moved = use_case().execute(root).unwrap();

        assert_eq!(moved, 4);
        assert_eq!(fs::read(root.join("Actor_01/01-01/002.jpg")).unwrap(), b"b");
        assert_eq!(fs::read(root.join("Actor_01/01-02/001.jpg")).unwrap(), b"c");
        assert!(root.join("Actor_02/02-01/001.jpg").is_file());
        assert!(!root.join("Actor_01/01-01-001.jpg").exists());
        assert!(root.join("Actor_01/.DS_Store").is_file());
    }

    #[test]
    fn test_second_run_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A/u-001.jpg"), b"x");

        assert_eq!(use_case().execute(dir.path()).unwrap(), 1);
        assert_eq!(use_case().execute(dir.path()).unwrap(), 0);
        assert!(dir.path().join("A/u/001.jpg").is_file());
    }

    #[test]
    fn test_existing_target_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A/u-001.jpg"), b"new");
        touch(&dir.path().join("A/u/001.jpg"), b"old");

        assert!(use_case().execute(dir.path()).is_err());
        assert_eq!(fs::read(dir.path().join("A/u/001.jpg")).unwrap(), b"old");
        assert!(dir.path().join("A/u-001.jpg").is_file());
    }
}
