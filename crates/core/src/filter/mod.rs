//! Client-side movie filters.
//!
//! Each dimension is a pure predicate over [`MovieSummary`]; a [`MovieFilter`]
//! combines whichever dimensions are set with logical AND. An empty filter
//! matches every movie.

mod episodes;

pub use episodes::EpisodeCount;

use serde::{Deserialize, Serialize};

use crate::upstream::{MovieSummary, Tag};

/// Broad movie type, derived from the episode counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieType {
    /// Feature film ("phim lẻ").
    Single,
    /// Multi-episode series ("phim bộ").
    Series,
}

impl MovieType {
    /// Classify a movie from its episode counters.
    ///
    /// A movie is `Single` when it has exactly one episode, when the current
    /// episode text says "Full", or when it carries no episode information at
    /// all. Everything else is a `Series`.
    pub fn of(movie: &MovieSummary) -> Self {
        let current = movie.episode_current.as_deref().unwrap_or("");
        let total = movie.episode_total.as_deref().map(EpisodeCount::parse);

        if current.to_lowercase().contains("full") {
            return MovieType::Single;
        }

        match total.and_then(|t| t.total.or(t.current)) {
            Some(1) => MovieType::Single,
            Some(_) => MovieType::Series,
            None => {
                let count = EpisodeCount::parse(current);
                match count.total.max(count.current) {
                    Some(n) if n > 1 => MovieType::Series,
                    _ => MovieType::Single,
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovieType::Single => "single",
            MovieType::Series => "series",
        }
    }
}

impl std::str::FromStr for MovieType {
    type Err = String;

    /// Accepts the API names and the upstream list slugs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "phim-le" => Ok(MovieType::Single),
            "series" | "phim-bo" => Ok(MovieType::Series),
            other => Err(format!("Unknown movie type: {}", other)),
        }
    }
}

/// Which quick-phase page ceiling a filter is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// A keyword is involved; matches are expected to be sparse.
    Keyword,
    /// Only tag/year/type filters.
    Filter,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanKind::Keyword => "keyword",
            ScanKind::Filter => "filter",
        }
    }
}

/// A conjunction of optional filter dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieFilter {
    /// Case-insensitive substring of the title or original title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Category name or slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Country name or slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_type: Option<MovieType>,
}

impl MovieFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank values are ignored.
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keyword = normalized(keyword);
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = normalized(category);
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = normalized(country);
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_type(mut self, movie_type: MovieType) -> Self {
        self.movie_type = Some(movie_type);
        self
    }

    /// Whether no dimension is set.
    pub fn is_empty(&self) -> bool {
        self.keyword.is_none()
            && self.category.is_none()
            && self.country.is_none()
            && self.year.is_none()
            && self.movie_type.is_none()
    }

    pub fn scan_kind(&self) -> ScanKind {
        if self.keyword.is_some() {
            ScanKind::Keyword
        } else {
            ScanKind::Filter
        }
    }

    /// Whether the movie passes every active dimension.
    pub fn matches(&self, movie: &MovieSummary) -> bool {
        self.keyword
            .as_deref()
            .is_none_or(|k| matches_keyword(movie, k))
            && self
                .category
                .as_deref()
                .is_none_or(|c| matches_category(movie, c))
            && self
                .country
                .as_deref()
                .is_none_or(|c| matches_country(movie, c))
            && self.year.is_none_or(|y| matches_year(movie, y))
            && self.movie_type.is_none_or(|t| matches_type(movie, t))
    }
}

fn normalized(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Case-insensitive substring match on the title or original title.
pub fn matches_keyword(movie: &MovieSummary, keyword: &str) -> bool {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    movie.title.to_lowercase().contains(&needle)
        || movie
            .original_title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
}

/// Case-insensitive exact match on any category tag name or slug.
pub fn matches_category(movie: &MovieSummary, category: &str) -> bool {
    matches_tag(&movie.categories, category)
}

/// Case-insensitive exact match on any country tag name or slug.
pub fn matches_country(movie: &MovieSummary, country: &str) -> bool {
    matches_tag(&movie.countries, country)
}

pub fn matches_year(movie: &MovieSummary, year: u32) -> bool {
    movie.year == Some(year)
}

pub fn matches_type(movie: &MovieSummary, movie_type: MovieType) -> bool {
    MovieType::of(movie) == movie_type
}

fn matches_tag(tags: &[Tag], wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    tags.iter()
        .any(|t| t.name.to_lowercase() == wanted || t.slug.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_keyword_matches_title_case_insensitive() {
        let movie = fixtures::movie("Người Nhện: Không Còn Nhà", "nguoi-nhen");
        assert!(matches_keyword(&movie, "người nhện"));
        assert!(matches_keyword(&movie, "NGƯỜI"));
        assert!(!matches_keyword(&movie, "batman"));
    }

    #[test]
    fn test_keyword_matches_original_title() {
        let mut movie = fixtures::movie("Người Nhện", "nguoi-nhen");
        movie.original_title = Some("Spider-Man: No Way Home".to_string());
        assert!(matches_keyword(&movie, "spider-man"));
    }

    #[test]
    fn test_category_matches_name_or_slug() {
        let movie = fixtures::movie_with(
            "Test",
            "test",
            Some(2020),
            &["Hành Động"],
            &["Hàn Quốc"],
        );
        assert!(matches_category(&movie, "hành động"));
        assert!(matches_category(&movie, "hanh-dong"));
        assert!(!matches_category(&movie, "hành"));
        assert!(matches_country(&movie, "Hàn Quốc"));
        assert!(matches_country(&movie, "han-quoc"));
        assert!(!matches_country(&movie, "trung-quoc"));
    }

    #[test]
    fn test_year_match() {
        let movie = fixtures::movie_with("Test", "test", Some(2024), &[], &[]);
        assert!(matches_year(&movie, 2024));
        assert!(!matches_year(&movie, 2023));

        let unknown = fixtures::movie("Unknown Year", "unknown");
        assert!(!matches_year(&unknown, 2024));
    }

    #[test]
    fn test_movie_type_heuristics() {
        let mut movie = fixtures::movie("A", "a");

        movie.episode_current = Some("Full".to_string());
        movie.episode_total = Some("1".to_string());
        assert_eq!(MovieType::of(&movie), MovieType::Single);

        movie.episode_current = Some("Hoàn Tất (12/12)".to_string());
        movie.episode_total = Some("12 Tập".to_string());
        assert_eq!(MovieType::of(&movie), MovieType::Series);

        movie.episode_current = Some("Tập 5".to_string());
        movie.episode_total = None;
        assert_eq!(MovieType::of(&movie), MovieType::Series);

        movie.episode_current = None;
        movie.episode_total = None;
        assert_eq!(MovieType::of(&movie), MovieType::Single);
    }

    #[test]
    fn test_filter_combines_with_and() {
        let movie = fixtures::movie_with(
            "Biệt Đội Đánh Thuê",
            "biet-doi",
            Some(2010),
            &["Hành Động"],
            &["Âu Mỹ"],
        );

        let filter = MovieFilter::new()
            .with_keyword("biệt đội")
            .with_category("Hành Động")
            .with_year(2010);
        assert!(filter.matches(&movie));

        let filter = filter.with_country("Hàn Quốc");
        assert!(!filter.matches(&movie));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = MovieFilter::new().with_keyword("   ").with_category("");
        assert!(filter.is_empty());
        assert!(filter.matches(&fixtures::movie("Anything", "anything")));
    }

    #[test]
    fn test_scan_kind() {
        assert_eq!(
            MovieFilter::new().with_keyword("x").scan_kind(),
            ScanKind::Keyword
        );
        assert_eq!(
            MovieFilter::new()
                .with_keyword("x")
                .with_category("y")
                .scan_kind(),
            ScanKind::Keyword
        );
        assert_eq!(
            MovieFilter::new().with_year(2020).scan_kind(),
            ScanKind::Filter
        );
    }

    #[test]
    fn test_movie_type_from_str() {
        assert_eq!("series".parse::<MovieType>(), Ok(MovieType::Series));
        assert_eq!("Phim-Le".parse::<MovieType>(), Ok(MovieType::Single));
        assert!("cartoon".parse::<MovieType>().is_err());
    }

    #[test]
    fn test_movie_type_serde() {
        assert_eq!(
            serde_json::to_string(&MovieType::Series).unwrap(),
            "\"series\""
        );
        let parsed: MovieType = serde_json::from_str("\"single\"").unwrap();
        assert_eq!(parsed, MovieType::Single);
    }
}
