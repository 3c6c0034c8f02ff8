use chrono::Duration;

use gefen_core::model::{Catalog, ContentItem, GameMode, ItemId};

use crate::error::SessionError;
use crate::narration::Narrator;

/// Browse-and-listen tour over a catalog.
///
/// The first time an item is shown its name and fun fact are narrated and it
/// is recorded as viewed; the caller persists [`LearningTour::viewed`].
pub struct LearningTour {
    mode: GameMode,
    catalog: Catalog,
    visible: usize,
    index: usize,
    viewed: Vec<ItemId>,
    narrator: Narrator,
    first_view_pause: Duration,
}

impl LearningTour {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty catalog.
    pub fn new(
        mode: GameMode,
        catalog: Catalog,
        viewed: Vec<ItemId>,
        narrator: Narrator,
        first_view_pause: Duration,
    ) -> Result<Self, SessionError> {
        if catalog.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            mode,
            visible: catalog.len(),
            catalog,
            index: 0,
            viewed,
            narrator,
            first_view_pause,
        })
    }

    /// Only tour the first `count` items (at least one).
    #[must_use]
    pub fn with_visible(mut self, count: usize) -> Self {
        self.set_visible(count);
        self
    }

    /// Widen or narrow the toured window. The cursor stays inside it.
    pub fn set_visible(&mut self, count: usize) {
        self.visible = count.clamp(1, self.catalog.len());
        if self.index >= self.visible {
            self.index = 0;
        }
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visible
    }

    /// Size of the whole catalog, toured or not.
    #[must_use]
    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible == 0
    }

    #[must_use]
    pub fn current(&self) -> &ContentItem {
        &self.catalog.items()[self.index]
    }

    #[must_use]
    pub fn viewed(&self) -> &[ItemId] {
        &self.viewed
    }

    #[must_use]
    pub fn is_viewed(&self, id: &ItemId) -> bool {
        self.viewed.contains(id)
    }

    /// Present the current item. Returns true on its first view.
    pub fn show(&mut self) -> bool {
        let item = &self.catalog.items()[self.index];
        if self.viewed.contains(item.id()) {
            return false;
        }
        self.viewed.push(item.id().clone());

        let mut lines = vec![item.display_name().to_owned()];
        lines.extend(item.fun_fact().map(str::to_owned));
        self.narrator
            .speak_sequence(lines, Some(self.first_view_pause));
        true
    }

    /// Move forward, wrapping around. Returns true on a first view.
    pub fn next(&mut self) -> bool {
        self.narrator.stop();
        self.index = (self.index + 1) % self.visible;
        self.show()
    }

    /// Move back, wrapping around. Returns true on a first view.
    pub fn prev(&mut self) -> bool {
        self.narrator.stop();
        self.index = (self.index + self.visible - 1) % self.visible;
        self.show()
    }

    pub fn speak_current(&self) {
        self.narrator.speak(self.current().display_name());
    }

    pub fn speak_fact(&self) {
        if let Some(fact) = self.current().fun_fact() {
            self.narrator.speak(fact);
        }
    }

    pub fn speak_category(&self) {
        let category = self
            .current()
            .category()
            .and_then(|id| self.catalog.category(id));
        if let Some(category) = category {
            self.narrator.speak(&category.display_name);
        }
    }
}
