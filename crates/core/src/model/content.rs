use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::ids::{CategoryId, ItemId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("item id cannot be empty")]
    EmptyId,

    #[error("display name cannot be empty for item {0}")]
    EmptyName(ItemId),

    #[error("duplicate item id {0}")]
    DuplicateItem(ItemId),

    #[error("duplicate category id {0}")]
    DuplicateCategory(CategoryId),

    #[error("item {item} references unknown category {category}")]
    UnknownCategory { item: ItemId, category: CategoryId },
}

//
// ─── ITEMS ─────────────────────────────────────────────────────────────────────
//

/// One piece of teachable content: the thing a challenge is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    id: ItemId,
    display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fun_fact: Option<String>,
}

impl ContentItem {
    /// Creates an item with the given id and display name.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the id or name is blank.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Result<Self, ContentError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ContentError::EmptyId);
        }
        let id = ItemId::new(id);
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ContentError::EmptyName(id));
        }
        Ok(Self {
            id,
            display_name,
            audio_prompt: None,
            category: None,
            fun_fact: None,
        })
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<CategoryId>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_fun_fact(mut self, fact: impl Into<String>) -> Self {
        self.fun_fact = Some(fact.into()).filter(|f: &String| !f.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_audio_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.audio_prompt = Some(prompt.into()).filter(|p: &String| !p.trim().is_empty());
        self
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Text spoken when the item itself is the prompt. Falls back to the name.
    #[must_use]
    pub fn audio_prompt(&self) -> &str {
        self.audio_prompt.as_deref().unwrap_or(&self.display_name)
    }

    #[must_use]
    pub fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    #[must_use]
    pub fn fun_fact(&self) -> Option<&str> {
        self.fun_fact.as_deref()
    }
}

/// Display metadata for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub display_name: String,
    #[serde(default)]
    pub emoji: String,
}

impl Category {
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            emoji: String::new(),
        }
    }

    #[must_use]
    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Validated, ordered content table with its categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<ContentItem>,
    categories: Vec<Category>,
    category_index: HashMap<CategoryId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and dangling category references.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` describing the first inconsistency found.
    pub fn new(items: Vec<ContentItem>, categories: Vec<Category>) -> Result<Self, ContentError> {
        let mut category_index = HashMap::with_capacity(categories.len());
        for (idx, cat) in categories.iter().enumerate() {
            if category_index.insert(cat.id.clone(), idx).is_some() {
                return Err(ContentError::DuplicateCategory(cat.id.clone()));
            }
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id().clone()) {
                return Err(ContentError::DuplicateItem(item.id().clone()));
            }
            if let Some(cat) = item.category() {
                if !category_index.contains_key(cat) {
                    return Err(ContentError::UnknownCategory {
                        item: item.id().clone(),
                        category: cat.clone(),
                    });
                }
            }
        }

        Ok(Self {
            items,
            categories,
            category_index,
        })
    }

    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.category_index.get(id).map(|&idx| &self.categories[idx])
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Items belonging to `category`, in catalog order.
    pub fn items_in<'a>(&'a self, category: &'a CategoryId) -> impl Iterator<Item = &'a ContentItem> {
        self.items
            .iter()
            .filter(move |item| item.category() == Some(category))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
