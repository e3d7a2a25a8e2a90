//! BSON to JSON rendering for HTTP responses
//!
//! Object ids become hex strings and datetimes become unix milliseconds, so
//! clients never see extended-JSON wrappers like `{"$oid": ...}`.

use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{error::DatabaseResult, query::Page};

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::from(dt.timestamp_millis()),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Value::from(f),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: Document) -> Value {
    let map: Map<String, Value> = doc
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

/// Serialize a model through BSON so its ids render as hex strings
pub fn to_json<T: Serialize>(value: &T) -> DatabaseResult<Value> {
    Ok(bson_to_json(bson::to_bson(value)?))
}

impl Page<Document> {
    pub fn into_json(self) -> Page<Value> {
        self.map(document_to_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;

    #[test]
    fn ids_and_dates_are_flattened() {
        let id = ObjectId::new();
        let at = bson::DateTime::from_millis(1_700_000_000_000);

        let value = document_to_json(doc! {
            "_id": id,
            "at": at,
            "tags": ["a", "b"],
            "image": Bson::Null,
            "nested": { "course_id": id, "order": 3 },
        });

        assert_eq!(
            value,
            json!({
                "_id": id.to_hex(),
                "at": 1_700_000_000_000_i64,
                "tags": ["a", "b"],
                "image": null,
                "nested": { "course_id": id.to_hex(), "order": 3 },
            })
        );
    }

    #[test]
    fn models_render_through_bson() {
        #[derive(Serialize)]
        struct Row {
            #[serde(rename = "_id")]
            id: ObjectId,
            price: f64,
        }

        let id = ObjectId::new();
        let value = to_json(&Row { id, price: 99.5 }).unwrap();
        assert_eq!(value, json!({ "_id": id.to_hex(), "price": 99.5 }));
    }
}
