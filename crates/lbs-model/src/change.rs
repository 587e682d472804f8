use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Serialize;

use crate::Locale;

/// One revision-control change event, as delivered by the upstream
/// event source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub branch: String,
    /// Locale of a localization-branch change; unset for
    /// English/source-branch changes.
    pub locale: Option<Locale>,
    pub revision: Option<String>,
    /// Unix timestamp (seconds) of the change, if known.
    pub when: Option<i64>,
    /// Touched file paths, in the order the upstream reported them.
    pub files: Vec<Utf8PathBuf>,
    pub properties: FxHashMap<String, String>,
}

impl Change {
    /// The change's locale, falling back to the `locale` property.
    ///
    /// Some upstreams deliver the locale as a change property instead
    /// of filling the field; both spellings are treated the same.
    #[must_use]
    pub fn effective_locale(&self) -> Option<Locale> {
        if let Some(locale) = &self.locale {
            if !locale.is_empty() {
                return Some(locale.clone());
            }
        }
        self.properties
            .get("locale")
            .filter(|code| !code.is_empty())
            .map(|code| Locale::new(code.clone()))
    }
}
