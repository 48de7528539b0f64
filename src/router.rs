//! Deep link router for Sokoni
//!
//! ## Supported Routes
//!
//! - `sokoni://category/<slug-or-id>` - Open a category (also `categories/`)
//! - `sokoni://home` - Banner + category overview
//! - `sokoni://auth/callback?token=<token>` - Store a login token
//!
//! ## Robust Parsing
//!
//! - Case-insensitive scheme: `SOKONI://`, `sokoni://`
//! - Single-slash variants: `sokoni:/category/...`
//! - Query and fragment stripping: `sokoni://category/fruits?utm=1#top`
//! - Storefront paths: `/categories/fruits`, `#/categories/fruits`
//!
//! ## Example
//!
//! ```rust
//! use sokoni::router::{parse, Route};
//!
//! let route = parse("sokoni://category/fruits").unwrap();
//! assert_eq!(route, Route::Category { key: "fruits".to_string() });
//! ```

use crate::auth::token_from_callback_query;

/// Strip query and fragment from URL path
#[inline]
fn strip_query_frag(s: &str) -> &str {
    match s.find(['?', '#']) {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Extract path after sokoni:// scheme (case-insensitive, handles variants)
#[inline]
fn after_scheme(raw: &str) -> Option<&str> {
    let s = raw.trim();
    let rest = if let Some(pos) = s.find("://") {
        if !s[..pos].eq_ignore_ascii_case("sokoni") {
            return None;
        }
        &s[pos + 3..]
    } else {
        let (scheme, rest) = s.split_once(':')?;
        if !scheme.eq_ignore_ascii_case("sokoni") {
            return None;
        }
        rest
    };
    Some(rest.trim_start_matches('/'))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Banner + category overview
    Home,
    /// One category by slug or numeric id
    Category { key: String },
    /// Login callback carrying a token
    AuthCallback { token: String },
}

/// Parse a route from the accepted link formats.
///
/// Returns `None` for foreign schemes and unknown pages.
pub fn parse(raw: &str) -> Option<Route> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(Route::Home);
    }

    let path = if let Some(rest) = after_scheme(s) {
        rest
    } else if s.contains("://") {
        return None;
    } else if let Some(rest) = s.strip_prefix("#/") {
        rest
    } else {
        s.trim_start_matches('/')
    };

    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    let mut segments = strip_query_frag(path).split('/').filter(|s| !s.is_empty());

    let page = segments.next().unwrap_or("").to_ascii_lowercase();
    match page.as_str() {
        "" | "home" => Some(Route::Home),
        "category" | "categories" => match segments.next() {
            None => Some(Route::Home),
            Some(key) => {
                let key = urlencoding::decode(key)
                    .map(|k| k.into_owned())
                    .unwrap_or_else(|_| key.to_string());
                Some(Route::Category { key })
            }
        },
        "auth" => {
            if segments.next()?.eq_ignore_ascii_case("callback") {
                token_from_callback_query(query).map(|token| Route::AuthCallback { token })
            } else {
                None
            }
        }
        _ => None,
    }
}
