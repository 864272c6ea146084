//! UI preference flags persisted in the key/value store.
//!
//! Preferences are loaded once and handed to consumers explicitly.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::types::{Experience, Theme};

pub const THEME_KEY: &str = "folio.ui.theme";
pub const EXPERIENCE_KEY: &str = "folio.ui.experience";

/// Theme and experience mode for the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub experience: Experience,
}

impl Preferences {
    /// Load preferences, falling back to defaults for missing or unknown values.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let mut prefs = Preferences::default();

        if let Some(raw) = store.get(THEME_KEY)? {
            match raw.parse() {
                Ok(theme) => prefs.theme = theme,
                Err(e) => warn!(error = %e, "Ignoring stored theme"),
            }
        }
        if let Some(raw) = store.get(EXPERIENCE_KEY)? {
            match raw.parse() {
                Ok(experience) => prefs.experience = experience,
                Err(e) => warn!(error = %e, "Ignoring stored experience mode"),
            }
        }

        Ok(prefs)
    }

    /// Write both flags, each under its own key.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(THEME_KEY, self.theme.as_str())?;
        store.set(EXPERIENCE_KEY, self.experience.as_str())?;
        info!(theme = %self.theme, experience = %self.experience, "Preferences saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_load_empty_store_gives_defaults() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let prefs = Preferences {
            theme: Theme::Dark,
            experience: Experience::Classic,
        };
        prefs.save(&store).unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get(EXPERIENCE_KEY).unwrap().as_deref(), Some("classic"));
        assert_eq!(Preferences::load(&store).unwrap(), prefs);
    }

    #[test]
    fn test_unknown_stored_value_falls_back() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "neon").unwrap();
        store.set(EXPERIENCE_KEY, "classic").unwrap();

        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.experience, Experience::Classic);
    }
}
