use mongodb::bson::{doc, Bson, Document};

use crate::core::{AppError, Result};

fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}

/// Wrap a plain field document in `$set`; operator documents pass through.
pub fn normalize_update(update: Document) -> Result<Document> {
    if update.is_empty() {
        return Err(AppError::validation("update must not be empty"));
    }

    let operators = update.keys().filter(|k| is_operator(k)).count();
    if operators == 0 {
        return Ok(doc! { "$set": update });
    }
    if operators != update.len() {
        return Err(AppError::validation(
            "update mixes operators and plain fields",
        ));
    }
    Ok(update)
}

/// True for the version key itself or any dotted path below it
fn touches_key(path: &str, key: &str) -> bool {
    path.strip_prefix(key)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('.'))
}

/// Normalize `update` and add `$inc` of the version key.
///
/// Rejects updates that would write the version key themselves, including
/// dotted paths under it and `$rename` targets.
pub fn versioned_update(update: Document, version_key: &str) -> Result<Document> {
    let mut update = normalize_update(update)?;

    for (operator, fields) in update.iter() {
        let Bson::Document(fields) = fields else {
            continue;
        };
        let renamed_onto = |value: &Bson| {
            operator.as_str() == "$rename"
                && value.as_str().map_or(false, |t| touches_key(t, version_key))
        };
        if fields
            .iter()
            .any(|(path, value)| touches_key(path, version_key) || renamed_onto(value))
        {
            return Err(AppError::validation(format!(
                "{} cannot be changed through {}",
                version_key, operator
            )));
        }
    }

    match update.get_mut("$inc") {
        Some(Bson::Document(inc)) => {
            inc.insert(version_key, 1);
        }
        Some(_) => return Err(AppError::validation("$inc must be a document")),
        None => {
            update.insert("$inc", doc! { version_key: 1 });
        }
    }

    Ok(update)
}

/// Filter matching `id` at exactly `version`
pub fn version_filter(id: &Bson, version_key: &str, version: i64) -> Document {
    doc! { "_id": id.clone(), version_key: version }
}
