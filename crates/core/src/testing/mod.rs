//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`CatalogSource`](crate::upstream::CatalogSource)
//! and fixtures for building movies, catalogs and detail records, so the
//! search engine and the HTTP surface can be tested without the upstream API.
//!
//! # Example
//!
//! ```rust,ignore
//! use phimbro_core::testing::{MockCatalogSource, fixtures};
//!
//! let source = MockCatalogSource::with_catalog(fixtures::catalog(100), 24);
//! source.fail_page(3, FetchError::Http { status: 500 }).await;
//!
//! // Use in a SearchEngine or MovieService...
//! ```

mod mock_catalog_source;

pub use mock_catalog_source::{MockCatalogSource, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::upstream::{
        Episode, EpisodeServer, MovieDetail, MovieInfo, MovieSummary, Rating, Tag,
    };

    /// Create a test movie with only a title and slug set.
    pub fn movie(title: &str, slug: &str) -> MovieSummary {
        MovieSummary {
            id: format!("id-{}", slug),
            title: title.to_string(),
            original_title: None,
            slug: slug.to_string(),
            thumb_url: Some(format!("https://img.example/{}-thumb.jpg", slug)),
            poster_url: Some(format!("https://img.example/{}-poster.jpg", slug)),
            year: None,
            quality: Some("FHD".to_string()),
            language: Some("Vietsub".to_string()),
            episode_current: None,
            episode_total: None,
            categories: Vec::new(),
            countries: Vec::new(),
            rating: None,
            modified: None,
        }
    }

    /// Create a test movie with a year and category/country tags.
    ///
    /// Tag slugs are derived from the names the way the upstream does it
    /// (`"Hành Động"` becomes `"hanh-dong"`).
    pub fn movie_with(
        title: &str,
        slug: &str,
        year: Option<u32>,
        categories: &[&str],
        countries: &[&str],
    ) -> MovieSummary {
        MovieSummary {
            year,
            categories: categories.iter().map(|name| tag(name)).collect(),
            countries: countries.iter().map(|name| tag(name)).collect(),
            ..movie(title, slug)
        }
    }

    /// Create a test movie with a TMDB rating.
    pub fn rated_movie(title: &str, slug: &str, vote_average: f32) -> MovieSummary {
        MovieSummary {
            rating: Some(Rating {
                kind: Some("movie".to_string()),
                id: None,
                vote_average: Some(vote_average),
                vote_count: Some(100),
            }),
            ..movie(title, slug)
        }
    }

    /// Create `n` distinct movies titled "Movie 1" ... "Movie n".
    pub fn catalog(n: usize) -> Vec<MovieSummary> {
        (1..=n)
            .map(|i| movie(&format!("Movie {}", i), &format!("movie-{}", i)))
            .collect()
    }

    /// Create a detail record with one server hosting `episodes` episodes.
    pub fn detail(title: &str, slug: &str, episodes: u32) -> MovieDetail {
        MovieDetail {
            movie: MovieInfo {
                summary: movie(title, slug),
                content: Some(format!("<p>{}</p>", title)),
                kind: Some(if episodes > 1 { "series" } else { "single" }.to_string()),
                status: Some("completed".to_string()),
                time: Some("45 phút/tập".to_string()),
                trailer_url: None,
                actor: vec!["Actor One".to_string()],
                director: vec!["Director One".to_string()],
            },
            episodes: vec![EpisodeServer {
                server_name: "#Hà Nội (Vietsub)".to_string(),
                server_data: (1..=episodes)
                    .map(|e| Episode {
                        name: format!("Tập {:02}", e),
                        slug: format!("tap-{:02}", e),
                        filename: None,
                        link_embed: Some(format!("https://player.example/{}/{}", slug, e)),
                        link_m3u8: Some(format!("https://stream.example/{}/{}.m3u8", slug, e)),
                    })
                    .collect(),
            }],
        }
    }

    /// Build an upstream listing body (`{status, items, pagination}`) for
    /// `movies`, as the listing endpoint returns it.
    pub fn listing_body(movies: &[MovieSummary], total_pages: u32) -> serde_json::Value {
        serde_json::json!({
            "status": true,
            "items": movies,
            "pagination": { "totalPages": total_pages },
        })
    }

    /// Create a tag, deriving its slug from the name.
    pub fn tag(name: &str) -> Tag {
        Tag::new(name, &slugify(name))
    }

    /// Lowercase, strip Vietnamese diacritics, join words with dashes.
    pub fn slugify(text: &str) -> String {
        text.to_lowercase()
            .chars()
            .map(strip_diacritic)
            .collect::<String>()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    fn strip_diacritic(c: char) -> char {
        match c {
            'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ'
            | 'ẩ' | 'ẫ' | 'ậ' => 'a',
            'đ' => 'd',
            'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' => 'e',
            'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
            'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ'
            | 'ở' | 'ỡ' | 'ợ' => 'o',
            'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
            'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
            other => other,
        }
    }

}
