use serde::{Deserialize, Serialize};

/// Fields of an inventory document. The item name travels as the document
/// key, never as a field; `quantity` is the only stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub key: String,
    pub fields: ItemFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentEntry>,
}
