/// Per-utterance crop state: the side length frozen by the first frame
/// with a usable face.
///
/// Create one per utterance and drop it when the utterance's frames are
/// exhausted. Never share an instance between utterances or workers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtteranceSession {
    side: Option<i32>,
}

impl UtteranceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frozen side length, if a face has been located yet.
    pub fn side(&self) -> Option<i32> {
        self.side
    }

    pub fn is_seeded(&self) -> bool {
        self.side.is_some()
    }

    /// Returns the frozen side, computing and storing it on first use.
    pub(crate) fn side_or_seed_with(&mut self, seed: impl FnOnce() -> i32) -> i32 {
        *self.side.get_or_insert_with(seed)
    }
}
