//! `strings.ron` schema: localized display strings

use herowars_core::Localized;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Contents of a hero's `strings.ron`
///
/// A skill behavior is only loaded when it has an entry under `skills`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroStrings {
    /// The hero's own strings; `name` is required
    pub strings: IndexMap<String, Localized>,
    /// Strings per skill behavior name
    #[serde(default)]
    pub skills: IndexMap<String, IndexMap<String, Localized>>,
}
