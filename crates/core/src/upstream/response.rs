//! Normalization of upstream payloads into canonical types.
//!
//! The listing endpoint has shipped several envelope shapes over time
//! (`{items}`, `{data: [...]}`, `{data: {items}}`, bare arrays). All of them
//! are resolved here, once, so nothing downstream probes JSON.

use serde_json::Value;
use tracing::debug;

use super::types::{CatalogPage, MovieDetail, MovieSummary};
use super::FetchError;

const TOTAL_PAGES_POINTERS: &[&str] = &[
    "/pagination/totalPages",
    "/pagination/total_pages",
    "/data/params/pagination/totalPages",
    "/data/params/pagination/total_pages",
    "/params/pagination/totalPages",
];

/// Normalize a listing response body into a [`CatalogPage`].
///
/// Items that fail to decode, or that have no title or key, are dropped.
/// Relative image paths are resolved against `image_base_url` when given.
pub fn parse_listing(
    page: u32,
    body: &Value,
    image_base_url: Option<&str>,
) -> Result<CatalogPage, FetchError> {
    let raw_items = find_items(body).ok_or_else(|| {
        FetchError::UnrecognizedResponseShape(format!(
            "no movie list in page {} response (keys: {})",
            page,
            top_level_keys(body)
        ))
    })?;

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        match serde_json::from_value::<MovieSummary>(raw.clone()) {
            Ok(movie) if movie.is_usable() => items.push(movie),
            Ok(_) => debug!(page, "Dropping listing item without title or key"),
            Err(e) => debug!(page, error = %e, "Dropping undecodable listing item"),
        }
    }

    if let Some(base) = image_base_url {
        for movie in &mut items {
            resolve_image(&mut movie.thumb_url, base);
            resolve_image(&mut movie.poster_url, base);
        }
    }

    Ok(CatalogPage {
        page,
        items,
        total_pages: find_total_pages(body),
        raw_len: raw_items.len(),
    })
}

/// Normalize a detail response body into a [`MovieDetail`].
///
/// The upstream answers unknown slugs with `200 {"status": false, ...}`, which
/// is reported as [`FetchError::NotFound`].
pub fn parse_detail(slug: &str, body: &Value) -> Result<MovieDetail, FetchError> {
    let has_movie = body.get("movie").is_some_and(Value::is_object);
    if !has_movie {
        if body.get("status").and_then(Value::as_bool) == Some(false) {
            return Err(FetchError::NotFound(format!("Movie {}", slug)));
        }
        return Err(FetchError::UnrecognizedResponseShape(format!(
            "no movie object in detail response for {}",
            slug
        )));
    }

    serde_json::from_value(body.clone()).map_err(|e| {
        FetchError::Parse(format!("Failed to parse detail for {}: {}", slug, e))
    })
}

fn find_items(body: &Value) -> Option<&Vec<Value>> {
    if let Some(items) = body.as_array() {
        return Some(items);
    }

    body.get("items")
        .and_then(Value::as_array)
        .or_else(|| body.get("data").and_then(Value::as_array))
        .or_else(|| body.pointer("/data/items").and_then(Value::as_array))
        .or_else(|| body.as_object()?.values().find_map(Value::as_array))
}

fn find_total_pages(body: &Value) -> Option<u32> {
    TOTAL_PAGES_POINTERS
        .iter()
        .filter_map(|p| body.pointer(p))
        .find_map(|v| match v {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

fn resolve_image(url: &mut Option<String>, base: &str) {
    if let Some(path) = url.as_mut() {
        if !path.starts_with("http://") && !path.starts_with("https://") {
            *path = format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            );
        }
    }
}

fn top_level_keys(body: &Value) -> String {
    match body.as_object() {
        Some(map) => map.keys().cloned().collect::<Vec<_>>().join(", "),
        None => "<not an object>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(slug: &str) -> Value {
        json!({"_id": slug, "name": format!("Movie {}", slug), "slug": slug})
    }

    #[test]
    fn test_items_envelope_with_pagination() {
        let body = json!({
            "status": true,
            "items": [item("a"), item("b")],
            "pagination": {"totalItems": 24498, "totalItemsPerPage": 10, "currentPage": 1, "totalPages": 2450}
        });

        let page = parse_listing(1, &body, None).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].slug, "b");
        assert_eq!(page.total_pages, Some(2450));
    }

    #[test]
    fn test_data_array_envelope() {
        let body = json!({"data": [item("a")], "pagination": {"total_pages": "7"}});
        let page = parse_listing(2, &body, None).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, Some(7));
    }

    #[test]
    fn test_nested_data_items_envelope() {
        let body = json!({
            "status": "success",
            "data": {
                "items": [item("a"), item("b"), item("c")],
                "params": {"pagination": {"totalPages": 12}}
            }
        });
        let page = parse_listing(1, &body, None).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, Some(12));
    }

    #[test]
    fn test_first_array_property_fallback() {
        let body = json!({"status": true, "movies": [item("a")]});
        let page = parse_listing(1, &body, None).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn test_bare_array_body() {
        let body = json!([item("a"), item("b")]);
        let page = parse_listing(1, &body, None).unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_unrecognized_shape() {
        let body = json!({"status": false, "msg": "error"});
        let result = parse_listing(1, &body, None);
        assert!(matches!(
            result,
            Err(FetchError::UnrecognizedResponseShape(_))
        ));
    }

    #[test]
    fn test_unusable_items_are_dropped() {
        let body = json!({"items": [item("a"), {"name": ""}, 42, {"slug": "no-title"}]});
        let page = parse_listing(1, &body, None).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].slug, "a");
        assert_eq!(page.raw_len, 4);
    }

    #[test]
    fn test_relative_images_are_resolved() {
        let body = json!({"items": [{
            "name": "A", "slug": "a",
            "thumb_url": "upload/vod/a-thumb.jpg",
            "poster_url": "https://cdn.example/a-poster.jpg"
        }]});
        let page = parse_listing(1, &body, Some("https://phimimg.com/")).unwrap();
        assert_eq!(
            page.items[0].thumb_url.as_deref(),
            Some("https://phimimg.com/upload/vod/a-thumb.jpg")
        );
        assert_eq!(
            page.items[0].poster_url.as_deref(),
            Some("https://cdn.example/a-poster.jpg")
        );
    }

    #[test]
    fn test_detail_not_found() {
        let body = json!({"status": false, "msg": "Movie not found", "movie": []});
        let result = parse_detail("missing", &body);
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[test]
    fn test_detail_ok() {
        let body = json!({
            "status": true,
            "movie": {"_id": "1", "name": "A", "slug": "a"},
            "episodes": []
        });
        let detail = parse_detail("a", &body).unwrap();
        assert_eq!(detail.movie.summary.title, "A");
        assert!(detail.episodes.is_empty());
    }
}
