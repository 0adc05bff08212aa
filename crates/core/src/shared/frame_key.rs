use std::path::{Path, PathBuf};

use crate::shared::constants::FRAME_INDEX_WIDTH;

/// Identity shared by every artifact derived from one video frame.
///
/// `index` is 1-based: the first decoded frame of an utterance is `001`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub actor: String,
    pub utterance: String,
    pub index: usize,
}

impl FrameKey {
    pub fn new(actor: impl Into<String>, utterance: impl Into<String>, index: usize) -> Self {
        Self {
            actor: actor.into(),
            utterance: utterance.into(),
            index,
        }
    }

    /// Zero-padded frame number, e.g. `007`. Indices wider than the padding
    /// are written in full.
    pub fn file_stem(&self) -> String {
        format!("{:0width$}", self.index, width = FRAME_INDEX_WIDTH)
    }

    /// `<root>/<actor>/<utterance>`
    pub fn utterance_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.actor).join(&self.utterance)
    }

    /// `<root>/<actor>/<utterance>/<NNN>.<extension>`
    pub fn path_in(&self, root: &Path, extension: &str) -> PathBuf {
        self.utterance_dir(root)
            .join(format!("{}.{extension}", self.file_stem()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "001")]
    #[case(42, "042")]
    #[case(999, "999")]
    #[case(1234, "1234")]
    fn test_file_stem_zero_padded(#[case] index: usize, #[case] expected: &str) {
        assert_eq!(FrameKey::new("Actor_01", "utt", index).file_stem(), expected);
    }

    #[test]
    fn test_path_in_layout() {
        let key = FrameKey::new("Actor_01", "01-01-03-01-01-01-01", 5);
        let path = key.path_in(Path::new("/data/Image256"), "jpg");
        assert_eq!(
            path,
            PathBuf::from("/data/Image256/Actor_01/01-01-03-01-01-01-01/005.jpg")
        );
    }

    #[test]
    fn test_same_key_maps_to_parallel_stores() {
        let key = FrameKey::new("Actor_02", "utt", 12);
        let img = key.path_in(Path::new("/img"), "jpg");
        let lm = key.path_in(Path::new("/lm"), "npy");
        assert_eq!(img.file_stem(), lm.file_stem());
        assert_eq!(
            img.parent().unwrap().strip_prefix("/img").unwrap(),
            lm.parent().unwrap().strip_prefix("/lm").unwrap()
        );
    }
}
