use serde_json::{json, Map, Value};

use crate::domain::model::query::QuerySpec;

/// Build the body of the initial search: a bool query filtering on the time range.
pub fn build_scroll_query(query: &QuerySpec) -> Value {
    let range = query.range();

    let mut bounds = Map::new();
    bounds.insert(String::from("format"), json!(range.format));
    if let Some(gte) = &range.gte {
        bounds.insert(String::from("gte"), json!(gte));
    }
    if let Some(lte) = &range.lte {
        bounds.insert(String::from("lte"), json!(lte));
    }

    json!({
        "size": query.page_size(),
        "query": {
            "bool": {
                "must": [],
                "filter": [
                    {
                        "range": {
                            range.field.as_str(): bounds
                        }
                    }
                ],
                "should": [],
                "must_not": []
            }
        }
    })
}
