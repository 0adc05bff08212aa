//! Directory conventions of the datasets this crate reads.
//!
//! Videos live at `<root>/<actor>/<utterance>.<ext>`; frame and landmark
//! stores at `<root>/<actor>/<utterance>/<NNN>.<ext>`. Listings are sorted
//! so runs are deterministic, and entries such as `.DS_Store` are ignored.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::shared::constants::{IGNORED_ENTRIES, VIDEO_EXTENSIONS};

/// Where a job sits in the dataset, for progress messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobPosition {
    /// 1-based index of the utterance within its actor.
    pub utterance: usize,
    pub utterances: usize,
    /// 1-based index of the actor.
    pub actor: usize,
    pub actors: usize,
}

/// One utterance video to convert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtteranceJob {
    pub actor: String,
    pub utterance: String,
    pub video_path: PathBuf,
    pub position: JobPosition,
}

/// An existing `<root>/<actor>/<utterance>` directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtteranceDir {
    pub actor: String,
    pub utterance: String,
    pub path: PathBuf,
}

pub fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| IGNORED_ENTRIES.contains(&name))
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

/// Sorted entries of `dir`, without ignored names.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !is_ignored(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every `<root>/<actor>/<utterance>.<video ext>`. Actors without videos
/// are not counted.
pub fn discover_utterances(video_root: &Path) -> Result<Vec<UtteranceJob>, Box<dyn std::error::Error>> {
    let mut per_actor = Vec::new();
    for actor_dir in subdirectories(video_root)? {
        let videos: Vec<PathBuf> = list_entries(&actor_dir)?
            .into_iter()
            .filter(|p| p.is_file() && has_extension(p, VIDEO_EXTENSIONS))
            .collect();
        if videos.is_empty() {
            log::debug!("No videos in {}", actor_dir.display());
            continue;
        }
        per_actor.push((name_of(&actor_dir), videos));
    }

    let actors = per_actor.len();
    let mut jobs = Vec::new();
    for (actor_idx, (actor, videos)) in per_actor.into_iter().enumerate() {
        let utterances = videos.len();
        for (utt_idx, video_path) in videos.into_iter().enumerate() {
            let utterance = video_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            jobs.push(UtteranceJob {
                actor: actor.clone(),
                utterance,
                video_path,
                position: JobPosition {
                    utterance: utt_idx + 1,
                    utterances,
                    actor: actor_idx + 1,
                    actors,
                },
            });
        }
    }
    Ok(jobs)
}

/// Every `<root>/<actor>/<utterance>/` directory.
pub fn discover_utterance_dirs(root: &Path) -> Result<Vec<UtteranceDir>, Box<dyn std::error::Error>> {
    let mut dirs = Vec::new();
    for actor_dir in subdirectories(root)? {
        let actor = name_of(&actor_dir);
        for utt_dir in subdirectories(&actor_dir)? {
            dirs.push(UtteranceDir {
                actor: actor.clone(),
                utterance: name_of(&utt_dir),
                path: utt_dir,
            });
        }
    }
    Ok(dirs)
}

/// Files under `root` at any depth whose extension is in `extensions`.
/// Symlinks are not followed, so a link back to an ancestor cannot list
/// the same image twice.
pub fn discover_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e.path()));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Files directly inside `dir` with one of `extensions`.
pub fn files_in(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && has_extension(p, extensions))
        .collect())
}

/// Mirrors `path` from under `from` to under `to`, replacing its extension.
pub fn mirrored_path(
    path: &Path,
    from: &Path,
    to: &Path,
    extension: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let relative = path.strip_prefix(from)?;
    Ok(to.join(relative).with_extension(extension))
}
