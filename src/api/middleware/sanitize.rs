use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;
use url::form_urlencoded;

use crate::api::errors::ApiError;
use crate::config::API_BODY_LIMIT;

/// Query keys that may legitimately repeat: the tour filter fields
pub const HPP_WHITELIST: &[&str] = &[
    "duration",
    "ratingsAverage",
    "ratingsQuantity",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// Input scrubbing for API routes
///
/// Runs three transformations before a request reaches its handler:
/// - collapses duplicate query keys to the last occurrence, except the
///   whitelisted filter fields
/// - enforces the API body cap (10 KiB) while buffering
/// - strips HTML/script markup from every string value in JSON bodies
///
/// Malformed JSON is passed through untouched; the `Json` extractor turns it
/// into a 400 with its own message.
pub async fn scrub_request(req: Request, next: Next) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();

    if let Some(query) = parts.uri.query() {
        let deduped = dedupe_query(query);
        if deduped != query {
            let path = parts.uri.path();
            let uri = if deduped.is_empty() {
                path.to_string()
            } else {
                format!("{}?{}", path, deduped)
            };
            parts.uri = uri
                .parse()
                .map_err(|_| ApiError::bad_request("Invalid query string"))?;
        }
    }

    let bytes = to_bytes(body, API_BODY_LIMIT)
        .await
        .map_err(|_| ApiError::payload_too_large("Request body exceeds the 10kb limit"))?;

    let bytes = if is_json(&parts) && !bytes.is_empty() {
        sanitize_json_body(bytes)?
    } else {
        bytes
    };

    parts.headers.insert(CONTENT_LENGTH, bytes.len().into());

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn is_json(parts: &axum::http::request::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

fn sanitize_json_body(bytes: Bytes) -> Result<Bytes, ApiError> {
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            strip_markup(&mut value);
            let cleaned = serde_json::to_vec(&value)
                .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
            Ok(Bytes::from(cleaned))
        }
        Err(_) => Ok(bytes),
    }
}

/// Collapses duplicate query keys to their last occurrence
///
/// Whitelisted keys keep every occurrence, preserving order.
pub fn dedupe_query(query: &str) -> String {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, (key, _)) in pairs.iter().enumerate() {
        last_index.insert(key.as_str(), i);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (i, (key, value)) in pairs.iter().enumerate() {
        if is_whitelisted(key) || last_index[key.as_str()] == i {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Whitelist matching happens on the base field name, so range keys like
/// `price[lte]` are covered by their field
fn is_whitelisted(key: &str) -> bool {
    let base = key.split('[').next().unwrap_or(key);
    HPP_WHITELIST.contains(&base)
}

/// Removes `<...>` markup from every string in a JSON document
pub fn strip_markup(value: &mut Value) {
    match value {
        Value::String(s) => *s = strip_tags(s),
        Value::Array(items) => items.iter_mut().for_each(strip_markup),
        Value::Object(map) => map.values_mut().for_each(strip_markup),
        _ => {}
    }
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_keys_collapse_to_last() {
        assert_eq!(dedupe_query("sort=price&sort=name"), "sort=name");
    }

    #[test]
    fn whitelisted_keys_keep_every_occurrence() {
        assert_eq!(
            dedupe_query("duration=5&duration=9"),
            "duration=5&duration=9"
        );
    }

    #[test]
    fn mixed_query_preserves_order() {
        assert_eq!(
            dedupe_query("page=1&difficulty=easy&page=2&difficulty=medium"),
            "difficulty=easy&page=2&difficulty=medium"
        );
    }

    #[test]
    fn clean_query_unchanged() {
        let q = "sort=price&page=2";
        assert_eq!(dedupe_query(q), q);
    }

    #[test]
    fn range_keys_match_whitelist_by_base_name() {
        assert_eq!(
            dedupe_query("price%5Bgte%5D=100&price%5Bgte%5D=200"),
            "price%5Bgte%5D=100&price%5Bgte%5D=200"
        );
    }

    #[test]
    fn script_tags_stripped_from_strings() {
        let mut value = json!({
            "name": "<script>alert('x')</script>Sea Explorer",
            "nested": {"summary": "plain text"},
            "ratings": [5, "<b>bold</b>"]
        });
        strip_markup(&mut value);
        assert_eq!(value["name"], "alert('x')Sea Explorer");
        assert_eq!(value["nested"]["summary"], "plain text");
        assert_eq!(value["ratings"][1], "bold");
    }

    #[test]
    fn unclosed_tag_drops_remainder() {
        assert_eq!(strip_tags("hello <img src=x"), "hello ");
    }

    #[test]
    fn numbers_and_bools_untouched() {
        let mut value = json!({"price": 497, "secret": false});
        let before = value.clone();
        strip_markup(&mut value);
        assert_eq!(value, before);
    }
}
