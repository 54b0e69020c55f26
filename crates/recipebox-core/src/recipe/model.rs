//! Recipe domain models.

use super::normalize::{non_empty, parse_count, split_lines};
use super::store::StoredDocument;
use crate::error::{RecipeBoxError, Result};
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw recipe input as a person typed it.
///
/// Every field is free text; [`RecipeFields::normalize`] turns it into the
/// stored shape.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub description: String,
    /// One ingredient per line.
    pub ingredients: String,
    /// One step per line.
    pub instructions: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub category: String,
    pub image: Option<ImageAttachment>,
}

/// Image bytes attached to a recipe submission.
#[derive(Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The client-written part of a stored recipe.
///
/// Field names follow the stored record layout; `id` and `createdAt` belong to
/// the store envelope and never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub cook_time: u32,
    #[serde(default)]
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub author_id: String,
    #[serde(default, rename = "authorEmail", skip_serializing_if = "Option::is_none")]
    pub author_label: Option<String>,
}

impl RecipeFields {
    /// Normalizes raw input and attributes it to `author`.
    ///
    /// Attribution always comes from the session, never from the input.
    pub fn normalize(input: &NewRecipe, author: &Session, image_url: Option<String>) -> Self {
        Self {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            ingredients: split_lines(&input.ingredients),
            instructions: split_lines(&input.instructions),
            prep_time: parse_count(&input.prep_time),
            cook_time: parse_count(&input.cook_time),
            servings: parse_count(&input.servings),
            category: non_empty(&input.category),
            image_url,
            author_id: author.identity_id.clone(),
            author_label: author.display_label.clone(),
        }
    }

    pub fn into_document_fields(self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RecipeBoxError::internal(format!(
                "recipe serialized to non-object JSON: {}",
                other
            ))),
        }
    }
}

/// A persisted recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub servings: u32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub author_id: String,
    pub author_label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn from_parts(id: String, created_at: DateTime<Utc>, fields: RecipeFields) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            ingredients: fields.ingredients,
            instructions: fields.instructions,
            prep_time_minutes: fields.prep_time,
            cook_time_minutes: fields.cook_time,
            servings: fields.servings,
            category: fields.category,
            image_url: fields.image_url,
            author_id: fields.author_id,
            author_label: fields.author_label,
            created_at,
        }
    }
}

impl TryFrom<StoredDocument> for Recipe {
    type Error = RecipeBoxError;

    fn try_from(document: StoredDocument) -> Result<Self> {
        let fields: RecipeFields =
            serde_json::from_value(Value::Object(document.fields)).map_err(|e| {
                RecipeBoxError::persistence(format!(
                    "recipe document '{}' is malformed: {}",
                    document.id, e
                ))
            })?;
        Ok(Self::from_parts(document.id, document.created_at, fields))
    }
}
