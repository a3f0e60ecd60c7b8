use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("item name must not be empty")]
pub struct EmptyItemName;

/// An item's name doubles as its document key in the backing store.
/// Construction trims surrounding whitespace and rejects empty input;
/// the stored form is case-preserving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ItemName(String);

impl ItemName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyItemName> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptyItemName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match; an empty query matches every name.
    pub fn matches(&self, query: &str) -> bool {
        self.0.to_lowercase().contains(&query.to_lowercase())
    }
}

impl TryFrom<String> for ItemName {
    type Error = EmptyItemName;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted quantity. Always at least 1: a count of zero is modeled as
/// the item's absence, never as a stored value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    pub const ONE: Quantity = Quantity(NonZeroU32::MIN);

    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Per-item lifecycle: `Absent -> Present(1) -> Present(2) -> ...` via
/// increments, back down and finally out via decrements. There is no
/// "present with quantity 0" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Absent,
    Present(Quantity),
}

impl ItemState {
    /// Interprets a raw persisted count. Zero decodes to `Absent` so a
    /// misbehaving external writer cannot smuggle a zero quantity into
    /// memory.
    pub fn from_persisted(quantity: u32) -> ItemState {
        match Quantity::new(quantity) {
            Some(quantity) => ItemState::Present(quantity),
            None => ItemState::Absent,
        }
    }

    /// The quantity to persist after one add: creation lands at 1,
    /// otherwise the count grows by one (saturating at `u32::MAX`).
    pub fn incremented(self) -> Quantity {
        match self {
            ItemState::Absent => Quantity::ONE,
            ItemState::Present(quantity) => Quantity(quantity.0.saturating_add(1)),
        }
    }

    /// The state after one remove: a quantity of 1 drops to `Absent`
    /// (document deleted), larger counts shrink by one, and a decrement
    /// of an absent item stays absent.
    pub fn decremented(self) -> ItemState {
        match self {
            ItemState::Absent => ItemState::Absent,
            ItemState::Present(quantity) => Self::from_persisted(quantity.get() - 1),
        }
    }

    pub fn quantity(self) -> Option<Quantity> {
        match self {
            ItemState::Absent => None,
            ItemState::Present(quantity) => Some(quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: ItemName,
    pub quantity: Quantity,
}

impl InventoryItem {
    /// Name with its first character uppercased, as the listing renders it.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.as_str().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Full in-memory copy of the inventory, rebuilt wholesale on every
/// refresh. Order is whatever the store returned; no sort is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySnapshot {
    items: Vec<InventoryItem>,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state_of(&self, name: &ItemName) -> ItemState {
        self.items
            .iter()
            .find(|item| &item.name == name)
            .map(|item| ItemState::Present(item.quantity))
            .unwrap_or(ItemState::Absent)
    }

    /// Derived view: the subsequence whose names contain `query`
    /// case-insensitively, in snapshot order. Pure; no store access.
    pub fn filter(&self, query: &str) -> InventorySnapshot {
        InventorySnapshot {
            items: self
                .items
                .iter()
                .filter(|item| item.name.matches(query))
                .cloned()
                .collect(),
        }
    }
}

impl IntoIterator for InventorySnapshot {
    type Item = InventoryItem;
    type IntoIter = std::vec::IntoIter<InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
