use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::auth::AuthContext;
use crate::carousel::{Carousel, CarouselSettings, Direction, TrackEvent};
use crate::category_strip::CategoryStrip;
use crate::constants::{app as app_consts, messages, ui as ui_consts};
use crate::loader::{FetchAttempt, LoadOutcome, LoadRequest, LoadStatus};
use crate::router::Route;
use crate::theme::{Palette, Theme};
use crate::types::{slides_from_banners, AppEvent, Category, Product};

/// Focusable panes, top to bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pane {
    Banners,
    Categories,
    Products,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Banners => Pane::Categories,
            Pane::Categories => Pane::Products,
            Pane::Products => Pane::Banners,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Banners => Pane::Products,
            Pane::Categories => Pane::Banners,
            Pane::Products => Pane::Categories,
        }
    }
}

/// What the products pane currently shows, derived from the fetch attempt.
#[derive(Debug, PartialEq)]
pub enum CategoryView<'a> {
    /// Nothing requested yet
    Empty,
    Loading {
        key: &'a str,
        retry_count: u32,
    },
    Loaded {
        category: &'a Category,
        products: &'a [Product],
        rate_limited: bool,
    },
    NotFound {
        key: &'a str,
    },
    Error {
        message: String,
        retry_count: u32,
    },
}

pub struct App {
    quit: bool,
    pane: Pane,
    fps: u32,
    theme: Theme,
    colors: Palette,

    carousel: Carousel,
    banners_error: Option<String>,

    categories: Vec<Category>,
    strip: CategoryStrip,
    list_tx: Option<UnboundedSender<u32>>,
    list_retry_count: u32,
    list_loading: bool,
    categories_error: Option<String>,

    attempt: FetchAttempt,
    load_tx: Option<UnboundedSender<LoadRequest>>,
    product_sel: usize,

    auth: AuthContext,

    debug_log: Vec<String>,
    debug_visible: bool,
    toast_message: Option<(String, Instant)>,
    spinner: usize,
}

impl App {
    pub fn new(
        fps: u32,
        theme: Theme,
        carousel_settings: CarouselSettings,
        tracker: Option<UnboundedSender<TrackEvent>>,
        load_tx: Option<UnboundedSender<LoadRequest>>,
        auth: AuthContext,
    ) -> Self {
        let mut carousel = Carousel::new(carousel_settings);
        if let Some(tx) = tracker {
            carousel = carousel.with_tracker(tx);
        }
        Self {
            quit: false,
            pane: Pane::Categories,
            fps,
            theme,
            colors: theme.palette(),
            carousel,
            banners_error: None,
            categories: Vec::new(),
            strip: CategoryStrip::new(0, ui_consts::CATEGORY_CARD_WIDTH, ui_consts::CATEGORY_CARD_GAP),
            list_tx: None,
            list_retry_count: 0,
            list_loading: false,
            categories_error: None,
            attempt: FetchAttempt::new(),
            load_tx,
            product_sel: 0,
            auth,
            debug_log: Vec::new(),
            debug_visible: false,
            toast_message: None,
            spinner: 0,
        }
    }

    /// Route category list requests to a list loader task.
    pub fn with_list_loader(mut self, tx: UnboundedSender<u32>) -> Self {
        self.list_tx = Some(tx);
        self
    }

    // ----- getters -----
    pub fn fps(&self) -> u32 {
        self.fps
    }
    pub fn quit_flag(&self) -> bool {
        self.quit
    }
    pub fn pane(&self) -> Pane {
        self.pane
    }
    pub fn theme(&self) -> &Palette {
        &self.colors
    }
    pub fn theme_name(&self) -> Theme {
        self.theme
    }
    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }
    pub fn banners_error(&self) -> Option<&str> {
        self.banners_error.as_deref()
    }
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
    pub fn strip(&self) -> &CategoryStrip {
        &self.strip
    }
    pub fn categories_error(&self) -> Option<&str> {
        self.categories_error.as_deref()
    }
    pub fn categories_loading(&self) -> bool {
        self.list_loading
    }
    pub fn list_retry_count(&self) -> u32 {
        self.list_retry_count
    }
    pub fn attempt(&self) -> &FetchAttempt {
        &self.attempt
    }
    pub fn product_selection(&self) -> usize {
        self.product_sel
    }
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }
    pub fn debug_log(&self) -> &[String] {
        &self.debug_log
    }
    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }

    pub fn spinner_frame(&self) -> &'static str {
        const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
        FRAMES[self.spinner % FRAMES.len()]
    }

    pub fn tick_spinner(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
    }

    pub fn category_view(&self) -> CategoryView<'_> {
        let key = match self.attempt.resource_key() {
            Some(k) => k,
            None => return CategoryView::Empty,
        };
        let retry_count = self.attempt.retry_count();
        match (self.attempt.status(), self.attempt.outcome()) {
            (LoadStatus::Loading, _) | (_, None) => CategoryView::Loading { key, retry_count },
            (_, Some(LoadOutcome::NotFound)) => CategoryView::NotFound { key },
            (_, Some(LoadOutcome::RateLimited { retry_count })) => CategoryView::Error {
                message: crate::loader::RATE_LIMITED_MESSAGE.to_string(),
                retry_count: *retry_count,
            },
            (_, Some(LoadOutcome::NetworkError { message, status })) => CategoryView::Error {
                message: match status {
                    Some(code) => format!("{message} (server answered {code})"),
                    None => message.clone(),
                },
                retry_count,
            },
            (
                _,
                Some(LoadOutcome::Ok {
                    category,
                    products,
                    dependents_rate_limited,
                }),
            ) => CategoryView::Loaded {
                category,
                products,
                rate_limited: *dependents_rate_limited,
            },
        }
    }

    /// Show a toast notification
    pub fn show_toast(&mut self, msg: String) {
        self.toast_message = Some((msg, Instant::now()));
    }

    /// Get current toast message if still active
    pub fn toast_message(&self) -> Option<&str> {
        let ttl = Duration::from_secs(app_consts::TOAST_DURATION_SECS);
        self.toast_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < ttl {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    pub fn log_debug(&mut self, msg: String) {
        log::debug!("{msg}");
        let ts = chrono::Local::now().format("%H:%M:%S");
        self.debug_log.push(format!("{ts} {msg}"));
        if self.debug_log.len() > app_consts::MAX_DEBUG_LOG_LINES {
            self.debug_log.remove(0);
        }
    }

    pub fn toggle_debug_panel(&mut self) {
        self.debug_visible = !self.debug_visible;
    }

    // ----- events -----
    pub fn on_event(&mut self, ev: AppEvent, now: Instant) {
        match ev {
            AppEvent::Quit => self.quit = true,
            AppEvent::BannersLoaded(banners) => {
                let slides = slides_from_banners(&banners);
                let count = slides.len();
                if self.carousel.load_slides(slides, now) {
                    self.log_debug(format!("Banners loaded: {count} active"));
                }
                self.banners_error = None;
            }
            AppEvent::BannersFailed(err) => {
                // no carousel is the whole error state
                self.log_debug(format!("Banners unavailable: {err}"));
                self.banners_error = Some(err);
            }
            AppEvent::CategoriesLoaded(categories) => {
                let changed = self.categories != categories;
                self.strip.set_len(categories.len());
                self.categories = categories;
                self.list_loading = false;
                self.list_retry_count = 0;
                self.categories_error = None;
                if changed {
                    self.log_debug(format!("Categories loaded: {}", self.categories.len()));
                }
            }
            AppEvent::CategoriesFailed {
                rate_limited,
                message,
            } => {
                self.list_loading = false;
                if rate_limited {
                    self.list_retry_count = self.list_retry_count.saturating_add(1);
                }
                self.log_debug(format!("Categories unavailable: {message}"));
                // a list that arrived through a category load still stands
                if self.categories.is_empty() {
                    self.categories_error = Some(if rate_limited {
                        crate::loader::RATE_LIMITED_MESSAGE.to_string()
                    } else {
                        message
                    });
                }
            }
            AppEvent::CategoryLoaded {
                generation,
                key,
                outcome,
            } => {
                let summary = match &outcome {
                    LoadOutcome::NotFound => "not found".to_string(),
                    LoadOutcome::RateLimited { retry_count } => {
                        format!("rate limited (attempt {retry_count})")
                    }
                    LoadOutcome::NetworkError { .. } => "network error".to_string(),
                    LoadOutcome::Ok { products, .. } => format!("{} products", products.len()),
                };
                let applied = match &outcome {
                    LoadOutcome::Ok { category, .. } => Some(category.clone()),
                    _ => None,
                };
                if self.attempt.apply(generation, &key, outcome) {
                    self.log_debug(format!("Category '{key}': {summary}"));
                    self.product_sel = 0;
                    if let Some(category) = applied {
                        self.select_in_strip(category);
                    }
                } else {
                    self.log_debug(format!("Category '{key}': stale result dropped"));
                }
            }
        }
    }

    /// Highlight a loaded category; an empty strip at least gets that one card
    /// until the full list arrives.
    fn select_in_strip(&mut self, category: Category) {
        let id = category.id;
        if self.categories.is_empty() {
            self.categories.push(category);
            self.strip.set_len(1);
            self.categories_error = None;
        }
        if let Some(idx) = self.categories.iter().position(|c| c.id == id) {
            self.strip.select(idx);
        }
    }

    /// Advance time-driven state (carousel transitions and auto-play).
    pub fn tick(&mut self, now: Instant) {
        self.carousel.tick(now);
    }

    pub fn apply_route(&mut self, route: &Route) {
        match route {
            Route::Home => self.back_to_categories(),
            Route::Category { key } => self.open_category(key),
            // tokens are handled by the session owner before routing
            Route::AuthCallback { .. } => {}
        }
    }

    // ----- loader -----
    /// Ask the list loader for categories, backing off by the list retry count.
    pub fn request_categories(&mut self) {
        let Some(tx) = &self.list_tx else { return };
        if tx.send(self.list_retry_count).is_err() {
            log::error!("category list loader is gone");
            return;
        }
        self.list_loading = true;
        self.categories_error = None;
        self.log_debug(format!("Load categories retry={}", self.list_retry_count));
    }

    /// `r` on the strip: only when the list is missing.
    pub fn retry_categories(&mut self) {
        if self.categories.is_empty() && !self.list_loading {
            self.request_categories();
        } else {
            self.log_debug("Retry ignored (categories present or loading)".to_string());
        }
    }

    /// Load `key`; a new key starts from a fresh retry count.
    pub fn open_category(&mut self, key: &str) {
        let generation = self.attempt.request(key);
        self.pane = Pane::Products;
        self.dispatch(generation);
    }

    pub fn open_selected_category(&mut self) {
        if let Some(c) = self.categories.get(self.strip.active_index()) {
            let slug = c.slug.clone();
            self.open_category(&slug);
        }
    }

    /// Retry the current key with backoff.
    pub fn retry(&mut self) {
        match self.attempt.retry() {
            Some(generation) => self.dispatch(generation),
            None => self.log_debug("Retry ignored (nothing retryable)".to_string()),
        }
    }

    pub fn back_to_categories(&mut self) {
        self.attempt.reset();
        self.product_sel = 0;
        self.pane = Pane::Categories;
    }

    fn dispatch(&mut self, generation: u64) {
        let key = match self.attempt.resource_key() {
            Some(k) => k.to_string(),
            None => return,
        };
        let req = LoadRequest {
            generation,
            key,
            retry_count: self.attempt.retry_count(),
        };
        self.log_debug(format!(
            "Load '{}' gen={} retry={}",
            req.key, req.generation, req.retry_count
        ));
        if let Some(tx) = &self.load_tx {
            if tx.send(req).is_err() {
                log::error!("loader task is gone");
            }
        }
    }

    // ----- carousel -----
    pub fn banner_step(&mut self, dir: Direction, now: Instant) {
        self.carousel.advance(dir, now);
    }

    /// Jump to a slide by position; positions past the last slide are ignored.
    pub fn banner_jump(&mut self, index: usize, now: Instant) {
        if index >= self.carousel.len() {
            return;
        }
        self.carousel.jump_to(index, now);
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        self.carousel.toggle_autoplay(now);
        let state = if self.carousel.autoplay() { "on" } else { "off" };
        self.show_toast(format!("Auto-play {state}"));
    }

    /// Follow the active banner's link; storefront category links open in place.
    pub fn activate_banner(&mut self) {
        let link = match self.carousel.activate() {
            Some(slide) => slide.link.clone(),
            None => return,
        };
        match link {
            Some(link) => match crate::router::parse(&link) {
                Some(Route::Category { key }) => self.open_category(&key),
                _ => self.show_toast(format!("Open {link}")),
            },
            None => self.show_toast(messages::NO_LINK.to_string()),
        }
    }

    pub fn active_banner_link(&self) -> Option<String> {
        self.carousel.active_slide().and_then(|s| s.link.clone())
    }

    // ----- focus / navigation -----
    pub fn next_pane(&mut self, now: Instant) {
        self.set_pane(self.pane.next(), now);
    }

    pub fn prev_pane(&mut self, now: Instant) {
        self.set_pane(self.pane.prev(), now);
    }

    /// Focus on the banner pane counts as hovering it.
    pub fn set_pane(&mut self, pane: Pane, now: Instant) {
        self.pane = pane;
        self.carousel.set_hovered(pane == Pane::Banners, now);
    }

    pub fn left(&mut self, now: Instant) {
        match self.pane {
            Pane::Banners => self.banner_step(Direction::Backward, now),
            Pane::Categories => self.strip.prev(),
            Pane::Products => {}
        }
    }

    pub fn right(&mut self, now: Instant) {
        match self.pane {
            Pane::Banners => self.banner_step(Direction::Forward, now),
            Pane::Categories => self.strip.next(),
            Pane::Products => {}
        }
    }

    pub fn up(&mut self) {
        if self.pane == Pane::Products {
            self.product_sel = self.product_sel.saturating_sub(1);
        }
    }

    pub fn down(&mut self) {
        if self.pane != Pane::Products {
            return;
        }
        let count = match self.category_view() {
            CategoryView::Loaded { products, .. } => products.len(),
            _ => 0,
        };
        if count > 0 {
            self.product_sel = (self.product_sel + 1).min(count - 1);
        }
    }

    pub fn enter(&mut self) {
        match self.pane {
            Pane::Banners => self.activate_banner(),
            Pane::Categories => self.open_selected_category(),
            Pane::Products => {
                if matches!(self.category_view(), CategoryView::NotFound { .. }) {
                    self.back_to_categories();
                }
            }
        }
    }

    pub fn on_logout(&mut self) {
        self.show_toast(messages::LOGGED_OUT.to_string());
        self.log_debug("Session cleared".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Banner;
    use tokio::sync::mpsc::unbounded_channel;

    fn cat(id: u64, slug: &str) -> Category {
        Category {
            id,
            slug: slug.into(),
            name: slug.into(),
            description: None,
            image_url: None,
            products_count: None,
        }
    }

    fn banner(id: u64, order: i64, link: Option<&str>) -> Banner {
        Banner {
            id,
            title: Some(format!("B{id}")),
            subtitle: None,
            order,
            is_active: true,
            image_url: None,
            mobile_image_url: None,
            button_text: None,
            button_link: link.map(str::to_string),
            category_slug: None,
        }
    }

    fn app_with_loader() -> (App, tokio::sync::mpsc::UnboundedReceiver<LoadRequest>) {
        let (tx, rx) = unbounded_channel();
        let app = App::new(
            30,
            Theme::Market,
            CarouselSettings::default(),
            None,
            Some(tx),
            AuthContext::anonymous(),
        );
        (app, rx)
    }

    #[test]
    fn open_category_dispatches_and_stale_results_are_ignored() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        app.on_event(AppEvent::CategoriesLoaded(vec![cat(1, "fruits"), cat(2, "dairy")]), now);

        app.open_category("fruits");
        let first = rx.try_recv().unwrap();
        app.open_category("dairy");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.retry_count, 0);

        app.on_event(
            AppEvent::CategoryLoaded {
                generation: first.generation,
                key: first.key.clone(),
                outcome: LoadOutcome::Ok {
                    category: cat(1, "fruits"),
                    products: vec![],
                    dependents_rate_limited: false,
                },
            },
            now,
        );
        assert!(matches!(app.category_view(), CategoryView::Loading { key: "dairy", .. }));

        app.on_event(
            AppEvent::CategoryLoaded {
                generation: second.generation,
                key: second.key,
                outcome: LoadOutcome::Ok {
                    category: cat(2, "dairy"),
                    products: vec![],
                    dependents_rate_limited: false,
                },
            },
            now,
        );
        match app.category_view() {
            CategoryView::Loaded { category, .. } => assert_eq!(category.slug, "dairy"),
            other => panic!("unexpected view {other:?}"),
        }
        assert_eq!(app.strip().active_index(), 1);
    }

    #[test]
    fn retry_carries_rate_limit_count() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        app.open_category("fruits");
        let req = rx.try_recv().unwrap();
        app.on_event(
            AppEvent::CategoryLoaded {
                generation: req.generation,
                key: req.key,
                outcome: LoadOutcome::RateLimited { retry_count: 1 },
            },
            now,
        );
        assert!(matches!(
            app.category_view(),
            CategoryView::Error { retry_count: 1, .. }
        ));
        app.retry();
        let again = rx.try_recv().unwrap();
        assert_eq!(again.retry_count, 1);
        assert_eq!(again.key, "fruits");
    }

    #[test]
    fn not_found_enter_goes_back() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        app.open_category("nonexistent-slug");
        let req = rx.try_recv().unwrap();
        app.on_event(
            AppEvent::CategoryLoaded {
                generation: req.generation,
                key: req.key,
                outcome: LoadOutcome::NotFound,
            },
            now,
        );
        assert_eq!(
            app.category_view(),
            CategoryView::NotFound {
                key: "nonexistent-slug"
            }
        );
        app.retry();
        assert!(rx.try_recv().is_err(), "no retry after not found");
        app.enter();
        assert_eq!(app.pane(), Pane::Categories);
        assert_eq!(app.category_view(), CategoryView::Empty);
    }

    #[test]
    fn banner_focus_pauses_and_category_links_open() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        app.on_event(
            AppEvent::BannersLoaded(vec![
                banner(1, 0, Some("/categories/fruits")),
                banner(2, 1, None),
            ]),
            now,
        );
        app.set_pane(Pane::Banners, now);
        assert!(app.carousel().is_paused());
        app.set_pane(Pane::Categories, now);
        assert!(!app.carousel().is_paused());

        app.set_pane(Pane::Banners, now);
        app.enter();
        assert_eq!(rx.try_recv().unwrap().key, "fruits");
        assert_eq!(app.pane(), Pane::Products);
    }

    fn ok(category: Category) -> LoadOutcome {
        LoadOutcome::Ok {
            category,
            products: vec![],
            dependents_rate_limited: false,
        }
    }

    #[test]
    fn deep_link_load_fills_an_empty_strip() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        assert!(app.categories().is_empty());

        app.open_category("fruits");
        let req = rx.try_recv().unwrap();
        app.on_event(
            AppEvent::CategoryLoaded {
                generation: req.generation,
                key: req.key,
                outcome: ok(cat(1, "fruits")),
            },
            now,
        );
        assert_eq!(app.categories().len(), 1);
        assert_eq!(app.strip().len(), 1);

        app.back_to_categories();
        app.enter();
        let again = rx.try_recv().expect("enter on the strip loads the category");
        assert_eq!(again.key, "fruits");
    }

    #[test]
    fn list_forwarded_by_the_loader_replaces_the_placeholder() {
        let now = Instant::now();
        let (mut app, mut rx) = app_with_loader();
        app.open_category("dairy");
        let req = rx.try_recv().unwrap();

        // order the loader task sends them in
        app.on_event(AppEvent::CategoriesLoaded(vec![cat(1, "fruits"), cat(2, "dairy")]), now);
        app.on_event(
            AppEvent::CategoryLoaded {
                generation: req.generation,
                key: req.key,
                outcome: ok(cat(2, "dairy")),
            },
            now,
        );
        assert_eq!(app.strip().len(), 2);
        assert_eq!(app.strip().active_index(), 1);

        app.back_to_categories();
        app.left(now);
        app.enter();
        assert_eq!(rx.try_recv().unwrap().key, "fruits");
    }

    #[test]
    fn rate_limited_category_list_retries_with_backoff_count() {
        let now = Instant::now();
        let (list_tx, mut list_rx) = unbounded_channel();
        let (app, _rx) = app_with_loader();
        let mut app = app.with_list_loader(list_tx);

        app.request_categories();
        assert_eq!(list_rx.try_recv().unwrap(), 0);
        assert!(app.categories_loading());

        app.on_event(
            AppEvent::CategoriesFailed {
                rate_limited: true,
                message: "rate limited (429)".into(),
            },
            now,
        );
        assert_eq!(app.list_retry_count(), 1);
        assert_eq!(app.categories_error(), Some(crate::loader::RATE_LIMITED_MESSAGE));

        app.retry_categories();
        assert_eq!(list_rx.try_recv().unwrap(), 1);
        assert!(app.categories_error().is_none());

        app.on_event(AppEvent::CategoriesLoaded(vec![cat(1, "fruits")]), now);
        assert_eq!(app.list_retry_count(), 0);
        assert!(!app.categories_loading());

        app.retry_categories();
        assert!(list_rx.try_recv().is_err(), "a loaded list is not re-requested");
    }

    #[test]
    fn generic_list_failure_keeps_the_retry_count() {
        let now = Instant::now();
        let (list_tx, mut list_rx) = unbounded_channel();
        let (app, _rx) = app_with_loader();
        let mut app = app.with_list_loader(list_tx);

        app.request_categories();
        list_rx.try_recv().unwrap();
        app.on_event(
            AppEvent::CategoriesFailed {
                rate_limited: false,
                message: "http 500".into(),
            },
            now,
        );
        assert_eq!(app.categories_error(), Some("http 500"));
        app.retry_categories();
        assert_eq!(list_rx.try_recv().unwrap(), 0);
    }

    #[test]
    fn digit_past_the_last_slide_is_ignored() {
        let now = Instant::now();
        let (mut app, _rx) = app_with_loader();
        let banners = (1..=5).map(|i| banner(i, i as i64, None)).collect();
        app.on_event(AppEvent::BannersLoaded(banners), now);
        assert_eq!(app.carousel().len(), 5);

        // key '7'
        app.banner_jump(6, now);
        assert_eq!(app.carousel().active_index(), 0);
        assert!(!app.carousel().is_transitioning());

        // key '5'
        app.banner_jump(4, now);
        assert_eq!(app.carousel().active_index(), 4);
    }

    #[test]
    fn failed_banners_leave_carousel_empty() {
        let now = Instant::now();
        let (mut app, _rx) = app_with_loader();
        app.on_event(AppEvent::BannersFailed("http 500".into()), now);
        assert!(app.carousel().is_empty());
        assert_eq!(app.banners_error(), Some("http 500"));
        app.set_pane(Pane::Banners, now);
        app.right(now);
        assert_eq!(app.carousel().active_index(), 0);
    }
}
