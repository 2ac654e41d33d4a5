//! Page-walking rules shared by the list endpoints.
//!
//! GitHub advertises adjacent pages in an RFC 8288 `Link` header:
//!
//! ```text
//! <https://api.github.com/user/repos?per_page=100&page=2>; rel="next",
//! <https://api.github.com/user/repos?per_page=100&page=5>; rel="last"
//! ```
//!
//! When the header is present it is authoritative. When it is absent, a
//! full page means "maybe more" and a short page means "done".

/// What to request after a page has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStep {
    /// Follow this absolute URL taken from the `Link` header.
    Follow(String),
    /// No `Link` header and the page was full: request `page + 1`.
    Increment,
    Done,
}

/// Decide whether to keep paginating.
///
/// An empty page always ends the walk.
#[must_use]
pub fn next_step(page_len: usize, per_page: usize, link_header: Option<&str>) -> PageStep {
    if page_len == 0 {
        return PageStep::Done;
    }
    match link_header {
        Some(header) => next_page_url(header).map_or(PageStep::Done, PageStep::Follow),
        None if page_len < per_page => PageStep::Done,
        None => PageStep::Increment,
    }
}

/// Extracts the `rel="next"` target from a `Link` header value.
#[must_use]
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .map(str::trim)
        .find(|segment| {
            segment
                .split(';')
                .skip(1)
                .any(|param| is_next_relation(param.trim()))
        })
        .and_then(extract_angle_bracket_url)
        .map(str::to_owned)
}

/// Matches `rel="next"` and `rel=next`, including multi-valued
/// `rel="next last"` forms.
fn is_next_relation(param: &str) -> bool {
    let Some(value) = param.strip_prefix("rel=") else {
        return false;
    };
    value
        .trim_matches('"')
        .split_whitespace()
        .any(|rel| rel.eq_ignore_ascii_case("next"))
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}
