use serde::{Deserialize, Serialize};

use crate::model::ids::CategoryId;

/// A trivia category as published by the provider.
///
/// Categories are immutable: the list is fetched once per application
/// lifetime and only ever read afterwards. The serde field names match the
/// provider's wire shape (`{"id": 9, "name": "General Knowledge"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    #[must_use]
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_deserializes_from_provider_shape() {
        let raw = r#"{"id": 9, "name": "General Knowledge"}"#;
        let category: Category = serde_json::from_str(raw).unwrap();
        assert_eq!(category.id, CategoryId::new(9));
        assert_eq!(category.name, "General Knowledge");
    }
}
