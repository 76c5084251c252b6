//! Tag listing and creation

use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::TagStore;
use crate::models::Tag;
use crate::Result;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 200))]
    pub description: Option<String>,
}

impl CreateTagRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

pub struct TagService {
    store: Arc<dyn TagStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// All tag names, sorted.
    pub async fn list_names(&self) -> Result<Vec<String>> {
        self.store.list_tag_names().await
    }

    /// Return the tag named `request.name`, creating it on first use.
    pub async fn find_or_create(&self, request: CreateTagRequest) -> Result<Tag> {
        let request = request.normalized();
        request.validate()?;

        let tag = self
            .store
            .find_or_create_tag(&request.name, request.description.as_deref())
            .await?;
        tracing::info!(tag_id = tag.id.0, name = %tag.name, "Tag resolved");
        Ok(tag)
    }
}
