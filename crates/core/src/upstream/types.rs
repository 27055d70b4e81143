//! Types for the upstream movie listing API.
//!
//! The upstream payloads are loosely typed: years arrive as strings or numbers,
//! tag lists are sometimes `null`, episode counters are free text. The
//! deserializers in [`lenient`] absorb those differences so the rest of the
//! crate only sees one canonical shape.

use serde::{Deserialize, Serialize};

// ============================================================================
// Listing Types
// ============================================================================

/// One page of the upstream "recently updated" listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    /// 1-based page number that was requested.
    pub page: u32,
    /// Movies on this page, in upstream order.
    pub items: Vec<MovieSummary>,
    /// Total number of pages, when the upstream reports it.
    pub total_pages: Option<u32>,
    /// Records the upstream sent for this page, unusable ones included.
    ///
    /// End-of-catalog checks use this count; `items` may be shorter once
    /// undecodable or untitled records are dropped.
    pub raw_len: usize,
}

impl CatalogPage {
    /// A page whose items are exactly what the upstream sent.
    pub fn new(page: u32, items: Vec<MovieSummary>, total_pages: Option<u32>) -> Self {
        Self {
            page,
            raw_len: items.len(),
            items,
            total_pages,
        }
    }

    /// Whether the upstream says there are no pages after this one.
    pub fn is_last(&self) -> bool {
        self.total_pages.is_some_and(|total| self.page >= total)
    }
}

/// A movie as it appears in listing pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    /// Upstream identifier.
    #[serde(alias = "_id", default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Display title (usually Vietnamese).
    #[serde(alias = "name")]
    pub title: String,
    /// Title in the original language.
    #[serde(
        alias = "origin_name",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_title: Option<String>,
    /// URL slug, also used to fetch the detail page.
    #[serde(default, deserialize_with = "lenient::string")]
    pub slug: String,
    /// Landscape thumbnail.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumb_url: Option<String>,
    /// Portrait poster.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub poster_url: Option<String>,
    /// Release year.
    #[serde(
        default,
        deserialize_with = "lenient::year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<u32>,
    /// Quality tag (e.g. "FHD", "HD", "CAM").
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality: Option<String>,
    /// Language tag (e.g. "Vietsub", "Thuyết Minh").
    #[serde(
        alias = "lang",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub language: Option<String>,
    /// Current episode text (e.g. "Tập 5", "Hoàn Tất (12/12)", "Full").
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_current: Option<String>,
    /// Total episodes text (e.g. "12 Tập", "1").
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_total: Option<String>,
    /// Category tags.
    #[serde(alias = "category", default, deserialize_with = "lenient::tags")]
    pub categories: Vec<Tag>,
    /// Country tags.
    #[serde(alias = "country", default, deserialize_with = "lenient::tags")]
    pub countries: Vec<Tag>,
    /// Rating block (TMDB mirror).
    #[serde(
        alias = "tmdb",
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Rating>,
    /// Last modification time as reported upstream.
    #[serde(
        default,
        deserialize_with = "lenient::modified",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<String>,
}

impl MovieSummary {
    /// Stable key for this movie: the slug, or the id when the slug is missing.
    pub fn key(&self) -> &str {
        if self.slug.is_empty() {
            &self.id
        } else {
            &self.slug
        }
    }

    /// Whether this record can be shown and addressed at all.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.key().is_empty()
    }

    /// Average vote, if the upstream carries one.
    pub fn vote_average(&self) -> Option<f32> {
        self.rating.as_ref().and_then(|r| r.vote_average)
    }
}

/// A `{name, slug}` tag attached to a movie (category or country).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// Rating information mirrored from TMDB.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    /// "movie" or "tv".
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
}

// ============================================================================
// Detail Types
// ============================================================================

/// Response of the detail endpoint: the movie plus its episode servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub movie: MovieInfo,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub episodes: Vec<EpisodeServer>,
}

/// Full movie record from the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieInfo {
    #[serde(flatten)]
    pub summary: MovieSummary,
    /// Synopsis (HTML fragment upstream).
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    /// "single", "series", "hoathinh", "tvshows".
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Runtime text (e.g. "120 phút").
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub trailer_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub actor: Vec<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub director: Vec<String>,
}

/// A streaming server and the episodes it hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeServer {
    #[serde(default, deserialize_with = "lenient::string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub server_data: Vec<Episode>,
}

/// A single playable episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub slug: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_embed: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_m3u8: Option<String>,
}

/// Deserializers tolerant of the upstream's inconsistent typing.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{Rating, Tag};

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_to_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_to_string(Value::deserialize(d)?))
    }

    pub fn year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let year = match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64().and_then(|y| u32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        // 0 is what the upstream sends for "unknown"
        Ok(year.filter(|y| *y > 0))
    }

    pub fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Tag>, D::Error> {
        let tags = match Value::deserialize(d)? {
            Value::Array(values) => values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(name) => Some(Tag {
                        name,
                        slug: String::new(),
                    }),
                    other => serde_json::from_value::<Tag>(other).ok(),
                })
                .filter(|t| !t.name.is_empty() || !t.slug.is_empty())
                .collect(),
            _ => Vec::new(),
        };
        Ok(tags)
    }

    pub fn rating<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Rating>, D::Error> {
        match Value::deserialize(d)? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
            _ => Ok(None),
        }
    }

    pub fn modified<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Object(mut map) => Ok(map.remove("time").and_then(value_to_string)),
            other => Ok(value_to_string(other)),
        }
    }

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_summary_from_upstream_item() {
        let item = json!({
            "_id": "abc123",
            "name": "Người Nhện",
            "origin_name": "Spider-Man",
            "slug": "nguoi-nhen",
            "thumb_url": "upload/vod/thumb.jpg",
            "poster_url": "upload/vod/poster.jpg",
            "year": "2002",
            "quality": "FHD",
            "lang": "Vietsub",
            "episode_current": "Full",
            "episode_total": 1,
            "category": [{"id": "1", "name": "Hành Động", "slug": "hanh-dong"}],
            "country": [{"id": "2", "name": "Âu Mỹ", "slug": "au-my"}],
            "tmdb": {"type": "movie", "id": 557, "vote_average": 7.3, "vote_count": 19000},
            "modified": {"time": "2024-05-01T10:00:00.000Z"}
        });

        let movie: MovieSummary = serde_json::from_value(item).unwrap();
        assert_eq!(movie.id, "abc123");
        assert_eq!(movie.title, "Người Nhện");
        assert_eq!(movie.original_title.as_deref(), Some("Spider-Man"));
        assert_eq!(movie.year, Some(2002));
        assert_eq!(movie.language.as_deref(), Some("Vietsub"));
        assert_eq!(movie.episode_total.as_deref(), Some("1"));
        assert_eq!(movie.categories, vec![Tag::new("Hành Động", "hanh-dong")]);
        assert_eq!(movie.countries[0].slug, "au-my");
        assert_eq!(movie.vote_average(), Some(7.3));
        assert_eq!(movie.rating.unwrap().id.as_deref(), Some("557"));
        assert_eq!(movie.modified.as_deref(), Some("2024-05-01T10:00:00.000Z"));
    }

    #[test]
    fn test_numeric_year_and_null_tags() {
        let item = json!({
            "_id": "x",
            "name": "Test",
            "slug": "test",
            "year": 2021,
            "category": null,
            "country": null,
            "tmdb": null
        });

        let movie: MovieSummary = serde_json::from_value(item).unwrap();
        assert_eq!(movie.year, Some(2021));
        assert!(movie.categories.is_empty());
        assert!(movie.countries.is_empty());
        assert!(movie.rating.is_none());
    }

    #[test]
    fn test_unknown_year_is_none() {
        for raw in [json!(0), json!(""), json!("n/a"), json!(null)] {
            let item = json!({"name": "Test", "slug": "test", "year": raw});
            let movie: MovieSummary = serde_json::from_value(item).unwrap();
            assert_eq!(movie.year, None);
        }
    }

    #[test]
    fn test_key_falls_back_to_id() {
        let item = json!({"_id": "only-id", "name": "No Slug"});
        let movie: MovieSummary = serde_json::from_value(item).unwrap();
        assert_eq!(movie.key(), "only-id");
        assert!(movie.is_usable());

        let item = json!({"name": "Nothing"});
        let movie: MovieSummary = serde_json::from_value(item).unwrap();
        assert!(!movie.is_usable());
    }

    #[test]
    fn test_catalog_page_is_last() {
        let page = CatalogPage::new(3, vec![], Some(3));
        assert!(page.is_last());

        let page = CatalogPage::new(2, vec![], None);
        assert!(!page.is_last());
    }

    #[test]
    fn test_movie_detail_deserialization() {
        let body = json!({
            "movie": {
                "_id": "m1",
                "name": "Phim Bộ",
                "slug": "phim-bo",
                "type": "series",
                "content": "<p>Nội dung</p>",
                "actor": ["A", "B"],
                "director": null,
                "episode_current": "Tập 3",
                "episode_total": "12 Tập"
            },
            "episodes": [{
                "server_name": "#Hà Nội (Vietsub)",
                "server_data": [
                    {"name": "Tập 01", "slug": "tap-01", "link_embed": "https://e/1", "link_m3u8": "https://m/1.m3u8"}
                ]
            }]
        });

        let detail: MovieDetail = serde_json::from_value(body).unwrap();
        assert_eq!(detail.movie.summary.slug, "phim-bo");
        assert_eq!(detail.movie.kind.as_deref(), Some("series"));
        assert_eq!(detail.movie.actor, vec!["A", "B"]);
        assert!(detail.movie.director.is_empty());
        assert_eq!(detail.episodes[0].server_data[0].slug, "tap-01");
    }
}
