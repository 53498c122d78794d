use covau_core::{SearchSource, SharedItem};
use std::fmt;

/// A running recommendation feed
pub struct AutoplayInfo {
    pub(crate) source: Box<dyn SearchSource>,
    pub(crate) seed: SharedItem,
    /// Fetched recommendations, consumed from `index`
    pub(crate) items: Vec<SharedItem>,
    pub(crate) index: usize,
}

impl AutoplayInfo {
    pub fn seed(&self) -> &SharedItem {
        &self.seed
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Items not consumed yet
    pub fn remaining(&self) -> &[SharedItem] {
        self.items.get(self.index..).unwrap_or_default()
    }

    pub(crate) fn peek(&self) -> Option<&SharedItem> {
        self.items.get(self.index)
    }
}

impl fmt::Debug for AutoplayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoplayInfo")
            .field("seed", &self.seed.key())
            .field("items", &self.items.len())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Autoplay lifecycle
#[derive(Debug)]
pub enum AutoplayState {
    /// Enabled, waiting for a seed
    Uninit,
    /// Off; keeps the last feed so enabling resumes it
    Disabled { info: Option<AutoplayInfo> },
    /// Off, with a seed to start from once enabled
    DisabledWithSeed { seed: SharedItem },
    /// Feeding recommendations; `index` points at a usable item
    Init(AutoplayInfo),
    /// The recommendation source ran dry
    Finished { items: Vec<SharedItem> },
}

impl AutoplayState {
    pub fn is_enabled(&self) -> bool {
        !matches!(
            self,
            AutoplayState::Disabled { .. } | AutoplayState::DisabledWithSeed { .. }
        )
    }
}
