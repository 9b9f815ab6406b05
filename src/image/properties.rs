//! Image properties: merging and validation.
//!
//! Properties documents are combined with a JSON merge patch (RFC 7396) in
//! layer order. The first layer that has a document provides the base; every
//! later document is applied as a patch on top of it. Objects merge key by
//! key, `null` deletes a key, anything else (arrays included) replaces.

use serde_json::{Map, Value};

use crate::defaults::MAX_PLACEHOLDER_PROPERTIES;
use crate::error::{Error, Result};

/// Key holding the image template object
pub const IMAGE_TEMPLATE_KEY: &str = "imageTemplate";

/// Key holding the placeholder property map
pub const PLACEHOLDER_PROPERTIES_KEY: &str = "placeholderProperties";

/// Apply `patch` to `target` following RFC 7396.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

/// Merge layer documents in order. Returns `None` when no layer has one.
pub fn merge_properties<'a>(documents: impl IntoIterator<Item = &'a Value>) -> Option<Value> {
    let mut merged: Option<Value> = None;
    for document in documents {
        match merged.as_mut() {
            Some(base) => merge_patch(base, document),
            None => merged = Some(document.clone()),
        }
    }
    merged
}

/// Check a merged properties document.
///
/// `imageTemplate` must be present and an object; `placeholderProperties`,
/// if present, must be an object with at most
/// [`MAX_PLACEHOLDER_PROPERTIES`] entries.
pub fn validate_properties(properties: &Value) -> Result<()> {
    let Some(document) = properties.as_object() else {
        return Err(validation("properties must be a JSON object"));
    };

    match document.get(IMAGE_TEMPLATE_KEY) {
        Some(Value::Object(_)) => {}
        Some(Value::Null) | None => {
            return Err(validation(format!("{} is required", IMAGE_TEMPLATE_KEY)))
        }
        Some(_) => {
            return Err(validation(format!(
                "{} must be an object",
                IMAGE_TEMPLATE_KEY
            )))
        }
    }

    match document.get(PLACEHOLDER_PROPERTIES_KEY) {
        None | Some(Value::Null) => {}
        Some(Value::Object(placeholders)) if placeholders.len() > MAX_PLACEHOLDER_PROPERTIES => {
            return Err(validation(format!(
                "{} has {} entries, at most {} are allowed",
                PLACEHOLDER_PROPERTIES_KEY,
                placeholders.len(),
                MAX_PLACEHOLDER_PROPERTIES
            )))
        }
        Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(validation(format!(
                "{} must be an object",
                PLACEHOLDER_PROPERTIES_KEY
            )))
        }
    }

    Ok(())
}

fn validation(message: impl Into<String>) -> Error {
    Error::Validation {
        message: message.into(),
    }
}
