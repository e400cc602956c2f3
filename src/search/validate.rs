use super::types::SearchParameters;
use crate::error::{AppError, AppResult};

pub const MIN_KEYWORD_CHARS: usize = 2;
pub const MIN_CONCURRENCY: u32 = 1;
pub const MAX_CONCURRENCY: u32 = 20;

/// Checks run before any network call; failures become the store's `error`.
pub fn validate_search_params(params: &SearchParameters) -> AppResult<()> {
    let kw = params.keyword.trim();
    if kw.is_empty() {
        return Err(AppError::validation("keyword_empty", "search keyword must not be empty"));
    }
    if kw.chars().count() < MIN_KEYWORD_CHARS {
        return Err(AppError::validation("keyword_too_short", "search keyword needs at least 2 characters"));
    }
    if let Some(c) = params.concurrency {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&c) {
            return Err(AppError::validation("concurrency_out_of_range", "concurrency must be between 1 and 20"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_kw(kw: &str) -> SearchParameters { SearchParameters { keyword: kw.into(), ..Default::default() } }

    #[test]
    fn keyword_rules() {
        assert_eq!(validate_search_params(&with_kw("")).unwrap_err().code_str(), "keyword_empty");
        assert_eq!(validate_search_params(&with_kw("   ")).unwrap_err().code_str(), "keyword_empty");
        assert_eq!(validate_search_params(&with_kw(" a ")).unwrap_err().code_str(), "keyword_too_short");
        assert!(validate_search_params(&with_kw("ab")).is_ok());
        // counted in characters, not bytes
        assert!(validate_search_params(&with_kw("电影")).is_ok());
        assert_eq!(validate_search_params(&with_kw("电")).unwrap_err().code_str(), "keyword_too_short");
    }

    #[test]
    fn concurrency_bounds() {
        let mut p = with_kw("avatar");
        for (c, ok) in [(Some(0), false), (Some(1), true), (Some(20), true), (Some(21), false), (None, true)] {
            p.concurrency = c;
            assert_eq!(validate_search_params(&p).is_ok(), ok, "concurrency {:?}", c);
        }
    }
}
