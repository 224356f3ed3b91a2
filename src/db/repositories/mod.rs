use sea_orm::sea_query::LikeExpr;

pub mod comment;
pub mod review;
pub mod taxonomy;
pub mod title;
pub mod user;

const LIKE_ESCAPE: char = '\\';

/// `%needle%` over a Unicode-lowercased needle, with the LIKE
/// metacharacters in it escaped so they match literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring match for a `name_lower` column. SQLite only
/// folds ASCII, so matching happens on values lowercased before storage.
pub(crate) fn name_search(search: Option<&str>) -> Option<LikeExpr> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| LikeExpr::new(contains_pattern(s)).escape(LIKE_ESCAPE))
}
