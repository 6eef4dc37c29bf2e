use serde_json::{Map, Value};

use crate::database::document::{format_timestamp, Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Convert a Document into the public wire format
/// { _id, ...fields, createdAt, updatedAt }
pub fn document_to_api_value(document: &Document) -> Value {
    let mut obj = Map::with_capacity(document.fields.len() + 3);
    obj.insert(ID_FIELD.into(), Value::String(document.id.to_string()));
    for (k, v) in &document.fields {
        obj.insert(k.clone(), v.clone());
    }
    obj.insert(CREATED_AT_FIELD.into(), Value::String(format_timestamp(&document.created_at)));
    obj.insert(UPDATED_AT_FIELD.into(), Value::String(format_timestamp(&document.updated_at)));
    Value::Object(obj)
}

/// Convert a list of documents to API values
pub fn documents_to_api_values(documents: &[Document]) -> Vec<Value> {
    documents.iter().map(document_to_api_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn reserved_fields_wrap_caller_fields() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut fields = Map::new();
        fields.insert("item".into(), json!("cake"));
        let doc = Document::new(Uuid::nil(), fields, ts, ts);

        let value = document_to_api_value(&doc);
        assert_eq!(
            value,
            json!({
                "_id": "00000000-0000-0000-0000-000000000000",
                "item": "cake",
                "createdAt": "2026-10-16T09:00:00.000000Z",
                "updatedAt": "2026-10-16T09:00:00.000000Z"
            })
        );
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["_id", "item", "createdAt", "updatedAt"]);
    }
}
