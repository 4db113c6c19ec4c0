use serde::Deserialize;

use crate::vault::VaultReadable;

pub const DEFAULT_MAX_OCCURRENCES_PER_PASS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatchUpSettings {
    /// A catch-up pass stops after this many occurrences and reports that
    /// more are due. The next pass continues where it stopped.
    pub max_occurrences_per_pass: u32,
}

impl Default for CatchUpSettings {
    fn default() -> Self {
        CatchUpSettings {
            max_occurrences_per_pass: DEFAULT_MAX_OCCURRENCES_PER_PASS,
        }
    }
}

impl VaultReadable for CatchUpSettings {
    const KEY: &'static str = "catch_up";
}
