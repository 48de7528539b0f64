//! Application constants
//!
//! Centralized constants for UI dimensions, timing and user-facing strings.

/// UI layout and display constants
pub mod ui {
    /// Minimum terminal width in columns for usable display
    pub const MIN_WIDTH: u16 = 60;

    /// Minimum terminal height in rows for usable display
    pub const MIN_HEIGHT: u16 = 18;

    /// Height of the banner carousel pane (rows, including borders)
    pub const BANNER_HEIGHT: u16 = 7;

    /// Width of one card in the category strip (columns)
    pub const CATEGORY_CARD_WIDTH: u16 = 16;

    /// Gap between category cards (columns)
    pub const CATEGORY_CARD_GAP: u16 = 1;
}

/// Application state and behavior constants
pub mod app {
    /// Duration to show toast notifications (seconds)
    pub const TOAST_DURATION_SECS: u64 = 2;

    /// Maximum number of debug log lines to retain in memory
    pub const MAX_DEBUG_LOG_LINES: usize = 50;
}

/// User-facing message strings
pub mod messages {
    /// Toast message when copying a banner link
    pub const COPY_LINK: &str = "Copied banner link";

    /// Toast message when clipboard operation fails
    pub const COPY_FAILED: &str = "Copy failed";

    /// Toast when the active banner has nothing to open
    pub const NO_LINK: &str = "This banner has no link";

    /// Not-found panel title
    pub const NOT_FOUND: &str = "Category not found";

    /// Not-found panel action
    pub const BACK_TO_CATEGORIES: &str = "Back to Categories";

    /// Partial result warning when products were rate limited
    pub const PRODUCTS_RATE_LIMITED: &str =
        "Products are temporarily unavailable (too many requests). Press r to retry.";

    /// Shown after logout
    pub const LOGGED_OUT: &str = "Logged out";
}
