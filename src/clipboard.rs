//! Copying banner links.
//!
//! Storefront category links are rewritten to `sokoni://category/<key>` so
//! the copied text can be passed straight back to `sokoni --open`.

use anyhow::{bail, Result};

use crate::router::{self, Route};

/// The form of `link` worth sharing: category routes as deep links, anything
/// else (external pages, promos) unchanged.
pub fn share_link(link: &str) -> String {
    match router::parse(link) {
        Some(Route::Category { key }) => {
            format!("sokoni://category/{}", urlencoding::encode(&key))
        }
        _ => link.trim().to_string(),
    }
}

/// Put the shareable form of `link` on the system clipboard and return it.
pub fn copy_link(link: &str) -> Result<String> {
    if link.trim().is_empty() {
        bail!("banner has no link");
    }
    let text = share_link(link);
    set_clipboard(&text)?;
    log::info!("copied {text}");
    Ok(text)
}

#[cfg(feature = "native")]
fn set_clipboard(text: &str) -> Result<()> {
    use anyhow::anyhow;
    use copypasta::{ClipboardContext, ClipboardProvider};

    let mut ctx = ClipboardContext::new().map_err(|e| anyhow!("clipboard unavailable: {e}"))?;
    ctx.set_contents(text.to_owned())
        .map_err(|e| anyhow!("clipboard write failed: {e}"))
}

#[cfg(not(feature = "native"))]
fn set_clipboard(_text: &str) -> Result<()> {
    bail!("clipboard support not built in")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_links_become_deep_links() {
        assert_eq!(share_link("/categories/fruits"), "sokoni://category/fruits");
        assert_eq!(share_link("#/categories/Dried%20Fish"), "sokoni://category/Dried%20Fish");
        assert_eq!(share_link("SOKONI://category/7?utm=x"), "sokoni://category/7");
    }

    #[test]
    fn other_links_are_kept() {
        assert_eq!(share_link(" https://shop.example/promo "), "https://shop.example/promo");
    }

    #[test]
    fn blank_link_is_refused_before_touching_the_clipboard() {
        let err = copy_link("  ").unwrap_err();
        assert!(err.to_string().contains("no link"));
    }
}
