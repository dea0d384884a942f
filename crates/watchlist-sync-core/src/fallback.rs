// Heuristic matching used only when two films share no comparable external id

use watchlist_sync_config::FallbackStrategy;
use watchlist_sync_models::FilmRecord;

/// Decides whether a Letterboxd film and a title/year pair from elsewhere
/// (a Plex entry or another Letterboxd film) are the same film.
///
/// Implementations must be conservative: a false negative only leaves a film
/// untouched, a false positive removes the wrong film from the watchlist.
pub trait FallbackMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, film: &FilmRecord, title: &str, year: Option<u32>) -> bool;
}

/// Exact match on normalized title plus release year
///
/// Both years must be known (either given explicitly or as a trailing
/// "(1999)" in the title) and equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleYearMatcher;

impl FallbackMatcher for TitleYearMatcher {
    fn name(&self) -> &'static str {
        "title_year"
    }

    fn matches(&self, film: &FilmRecord, title: &str, year: Option<u32>) -> bool {
        let (left_title, left_year) = split_title_year(&film.title);
        let (right_title, right_year) = split_title_year(title);

        let left_year = film.year.or(left_year);
        let right_year = year.or(right_year);

        match (left_year, right_year) {
            (Some(a), Some(b)) if a == b => {
                !left_title.is_empty() && normalize_title(left_title) == normalize_title(right_title)
            }
            _ => false,
        }
    }
}

/// Never matches; only external ids are trusted
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMatcher;

impl FallbackMatcher for DisabledMatcher {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn matches(&self, _film: &FilmRecord, _title: &str, _year: Option<u32>) -> bool {
        false
    }
}

pub fn matcher_for(strategy: FallbackStrategy) -> Box<dyn FallbackMatcher> {
    match strategy {
        FallbackStrategy::TitleYear => Box::new(TitleYearMatcher),
        FallbackStrategy::Disabled => Box::new(DisabledMatcher),
    }
}

/// Split "Movie A (2020)" into ("Movie A", Some(2020))
pub fn split_title_year(title: &str) -> (&str, Option<u32>) {
    let trimmed = title.trim();
    if let Some(stripped) = trimmed.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            let inner = &stripped[open + 1..];
            if inner.len() == 4 && inner.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(year) = inner.parse::<u32>() {
                    return (stripped[..open].trim_end(), Some(year));
                }
            }
        }
    }
    (trimmed, None)
}

/// Lowercase, spell out '&', drop punctuation and collapse whitespace
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase().replace('&', " and ");
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchlist_sync_models::ExternalIds;

    fn film(title: &str, year: Option<u32>) -> FilmRecord {
        FilmRecord::new(title, year, ExternalIds::new())
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Crouching Tiger, Hidden Dragon"), "crouching tiger hidden dragon");
        assert_eq!(normalize_title("Fast & Furious"), "fast and furious");
        assert_eq!(normalize_title("  Amélie  "), "amélie");
        assert_eq!(normalize_title("Se7en"), "se7en");
    }

    #[test]
    fn test_split_title_year() {
        assert_eq!(split_title_year("Movie A (2020)"), ("Movie A", Some(2020)));
        assert_eq!(split_title_year("Movie A"), ("Movie A", None));
        assert_eq!(split_title_year("Blade Runner (Final Cut)"), ("Blade Runner (Final Cut)", None));
        assert_eq!(split_title_year("(2020)"), ("", Some(2020)));
    }

    #[test]
    fn test_title_year_matcher() {
        let matcher = TitleYearMatcher;
        assert!(matcher.matches(&film("The Thing", Some(1982)), "The Thing", Some(1982)));
        assert!(matcher.matches(&film("Movie A (2020)", None), "movie a", Some(2020)));
        // Remakes share titles
        assert!(!matcher.matches(&film("The Thing", Some(1982)), "The Thing", Some(2011)));
        // An unknown year is never confident
        assert!(!matcher.matches(&film("The Thing", None), "The Thing", Some(1982)));
        assert!(!matcher.matches(&film("The Thing", Some(1982)), "The Thing", None));
        assert!(!matcher.matches(&film("(1982)", None), "", Some(1982)));
    }

    #[test]
    fn test_disabled_matcher() {
        assert!(!DisabledMatcher.matches(&film("The Thing", Some(1982)), "The Thing", Some(1982)));
        assert_eq!(matcher_for(FallbackStrategy::Disabled).name(), "disabled");
        assert_eq!(matcher_for(FallbackStrategy::TitleYear).name(), "title_year");
    }
}
