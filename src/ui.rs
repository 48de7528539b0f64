use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect, Alignment},
    widgets::{Block, Borders, BorderType, List, ListItem, ListState, Paragraph, Wrap, Clear},
    style::{Style, Modifier},
    text::{Line, Span},
};

use crate::app::{App, CategoryView, Pane};
use crate::carousel::Direction as SlideDirection;
use crate::constants::{messages, ui as ui_consts};
use crate::types::{Product, Slide};

// ===============================
// Top-level draw
// ===============================
pub fn draw(f:&mut Frame, app:&mut App){
    app.tick_spinner();
    let now = Instant::now();

    let area = f.area();
    if area.width < ui_consts::MIN_WIDTH || area.height < ui_consts::MIN_HEIGHT {
        let msg = format!(
            "Terminal too small ({}x{}), need at least {}x{}",
            area.width, area.height, ui_consts::MIN_WIDTH, ui_consts::MIN_HEIGHT
        );
        f.render_widget(Paragraph::new(msg).wrap(Wrap { trim: true }), area);
        return;
    }

    let show_debug = app.debug_visible() && !app.debug_log().is_empty();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(6);
    constraints.push(Constraint::Length(1));                                // header
    if !app.carousel().is_empty() {
        constraints.push(Constraint::Length(ui_consts::BANNER_HEIGHT));    // banners (hidden when none)
    }
    constraints.push(Constraint::Length(4));                                // category strip
    constraints.push(Constraint::Min(0));                                   // products
    if show_debug { constraints.push(Constraint::Length(6)); }
    constraints.push(Constraint::Length(1));                                // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut idx = 0usize;
    header(f, chunks[idx], app); idx += 1;
    if !app.carousel().is_empty() {
        banner_pane(f, chunks[idx], app, now); idx += 1;
    }
    category_strip(f, chunks[idx], app); idx += 1;
    products_pane(f, chunks[idx], app); idx += 1;
    if show_debug {
        debug_panel(f, chunks[idx], app); idx += 1;
    }
    footer(f, chunks[idx], app);

    if app.toast_message().is_some() {
        draw_toast_modal(f, app);
    }
}

// ===============================
// Header
// ===============================
fn header(f:&mut Frame, area:Rect, app:&App){
    let tabs = [(Pane::Banners, "Banners"), (Pane::Categories, "Categories"), (Pane::Products, "Products")];
    let mut spans = Vec::new();

    for (i, (pane, title)) in tabs.iter().enumerate() {
        spans.push(Span::raw(if i == 0 { "┌─" } else { "┬─" }));
        if *pane == app.pane() {
            spans.push(Span::styled(
                *title,
                Style::default().fg(app.theme().border_focus).add_modifier(Modifier::BOLD)
            ));
        } else {
            spans.push(Span::raw(*title));
        }
        spans.push(Span::raw("─"));
    }
    spans.push(Span::raw("┐"));

    let who = match app.auth().user() {
        Some(u) if u.is_admin => format!("  {} (admin)", u.name),
        Some(u) => format!("  {}", u.name),
        None if app.auth().is_authenticated() => "  signed in".to_string(),
        None => "  guest".to_string(),
    };
    spans.push(Span::styled(who, Style::default().fg(app.theme().muted)));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ===============================
// Banners
// ===============================
fn pane_block(app:&App, title:String, focused:bool) -> Block<'static> {
    Block::default()
        .title(if focused { format!(" [ {title} ] ") } else { format!(" {title} ") })
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Double } else { BorderType::Rounded })
        .border_style(Style::default()
            .fg(if focused { app.theme().border_focus } else { app.theme().border })
            .add_modifier(if focused { Modifier::BOLD } else { Modifier::empty() }))
}

fn banner_pane(f:&mut Frame, area:Rect, app:&App, now:Instant){
    let carousel = app.carousel();
    let focused = app.pane() == Pane::Banners;

    let mut title = format!("Banner {}/{}", carousel.active_index() + 1, carousel.len());
    if carousel.is_paused() {
        title.push_str(" · paused");
    }
    let block = pane_block(app, title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(active) = carousel.active_slide() else { return };

    // Incoming slide slides in from the side it travels toward
    let indent = if carousel.is_transitioning() {
        let remaining = 1.0 - carousel.transition_progress(now);
        (remaining * inner.width as f32 / 3.0) as usize
    } else {
        0
    };

    let mut lines: Vec<Line> = Vec::with_capacity(5);
    if let Some(prev) = carousel.staged_slide() {
        let arrow = match carousel.direction() {
            SlideDirection::Forward => "«",
            SlideDirection::Backward => "»",
        };
        lines.push(Line::from(Span::styled(
            format!("{arrow} {}", prev.title),
            Style::default().fg(app.theme().muted),
        )));
    } else {
        lines.push(Line::raw(""));
    }
    lines.extend(slide_lines(app, active, indent, carousel.direction()));

    let dots: Vec<Span> = carousel.indicator().iter().map(|on| {
        if *on {
            Span::styled("● ", Style::default().fg(app.theme().brand))
        } else {
            Span::styled("○ ", Style::default().fg(app.theme().muted))
        }
    }).collect();
    lines.push(Line::from(dots).alignment(Alignment::Center));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn slide_lines(app:&App, slide:&Slide, indent:usize, dir:SlideDirection) -> Vec<Line<'static>> {
    let pad = " ".repeat(indent);
    let lead = |s: String| match dir {
        SlideDirection::Forward => format!("{pad}{s}"),
        SlideDirection::Backward => s,
    };

    let mut out = vec![Line::from(Span::styled(
        lead(slide.title.clone()),
        Style::default().fg(app.theme().text).add_modifier(Modifier::BOLD),
    ))];
    out.push(Line::from(Span::styled(
        lead(slide.subtitle.clone().unwrap_or_default()),
        Style::default().fg(app.theme().muted),
    )));
    let cta = match (&slide.cta, &slide.link) {
        (Some(text), Some(_)) => format!("[ {text} ]  Enter"),
        (None, Some(link)) => format!("→ {link}"),
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };
    out.push(Line::from(Span::styled(lead(cta), Style::default().fg(app.theme().brand))));
    out
}

// ===============================
// Categories
// ===============================
fn category_strip(f:&mut Frame, area:Rect, app:&App){
    let strip = app.strip();
    let focused = app.pane() == Pane::Categories;
    let title = if !app.categories().is_empty() {
        format!("Categories ({})", app.categories().len())
    } else if app.categories_error().is_some() {
        "Categories · error".to_string()
    } else {
        format!("Categories {}", app.spinner_frame())
    };
    let block = pane_block(app, title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(err) = app.categories_error() {
        let mut hint = vec![
            Span::styled("r", Style::default().fg(app.theme().border_focus)),
            Span::raw(" retry"),
        ];
        if app.list_retry_count() > 0 {
            hint.push(Span::styled(
                format!("  (attempt {})", app.list_retry_count()),
                Style::default().fg(app.theme().muted),
            ));
        }
        let lines = vec![
            Line::from(Span::styled(err.to_string(), Style::default().fg(app.theme().rate_limited))),
            Line::from(hint),
        ];
        f.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let range = strip.visible_range(inner.width);
    let mut spans: Vec<Span> = Vec::new();
    if range.start > 0 {
        spans.push(Span::styled("‹ ", Style::default().fg(app.theme().muted)));
    }
    let width = strip.card_width() as usize;
    for i in range.clone() {
        let Some(cat) = app.categories().get(i) else { break };
        let label = truncate(&cat.name, width.saturating_sub(2));
        let text = format!("[{label:^w$}]", w = width.saturating_sub(2));
        let style = if i == strip.active_index() {
            if focused {
                Style::default().bg(app.theme().highlight_bg).fg(app.theme().highlight_fg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme().border_focus)
            }
        } else {
            Style::default().fg(app.theme().text)
        };
        spans.push(Span::styled(text, style));
        spans.push(Span::raw(" "));
    }
    if range.end < strip.len() {
        spans.push(Span::styled("›", Style::default().fg(app.theme().muted)));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(cat) = app.categories().get(strip.active_index()) {
        let count = cat.products_count.map(|n| format!("{n} products")).unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("{}  {}", cat.description.as_deref().unwrap_or(""), count),
            Style::default().fg(app.theme().muted),
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ===============================
// Products
// ===============================
fn products_pane(f:&mut Frame, area:Rect, app:&App){
    let focused = app.pane() == Pane::Products;
    let theme = *app.theme();

    match app.category_view() {
        CategoryView::Empty => {
            let block = pane_block(app, "Products".into(), focused);
            let hint = Paragraph::new("Pick a category and press Enter.")
                .style(Style::default().fg(theme.muted))
                .block(block);
            f.render_widget(hint, area);
        }
        CategoryView::Loading { key, retry_count } => {
            let block = pane_block(app, format!("Products · {key}"), focused);
            let mut text = format!("{} Loading '{key}'...", app.spinner_frame());
            if retry_count > 0 {
                text.push_str(&format!("\n\nRetry attempt {retry_count}, backing off."));
            }
            f.render_widget(Paragraph::new(text).block(block), area);
        }
        CategoryView::NotFound { key } => {
            let block = pane_block(app, messages::NOT_FOUND.into(), focused);
            let lines = vec![
                Line::from(Span::styled(
                    format!("No category matches '{key}'."),
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::raw(""),
                Line::from(vec![
                    Span::styled("Enter", Style::default().fg(theme.border_focus)),
                    Span::raw(format!(" {}", messages::BACK_TO_CATEGORIES)),
                ]),
            ];
            f.render_widget(Paragraph::new(lines).block(block), area);
        }
        CategoryView::Error { message, retry_count } => {
            let block = pane_block(app, "Products · error".into(), focused);
            let mut lines = vec![
                Line::from(Span::styled(message, Style::default().fg(theme.rate_limited).add_modifier(Modifier::BOLD))),
                Line::raw(""),
            ];
            if retry_count > 0 {
                lines.push(Line::raw(format!("Attempt {retry_count}")));
            }
            lines.push(Line::from(vec![
                Span::styled("r", Style::default().fg(theme.border_focus)),
                Span::raw(" retry  "),
                Span::styled("Esc", Style::default().fg(theme.border_focus)),
                Span::raw(format!(" {}", messages::BACK_TO_CATEGORIES)),
            ]));
            f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
        }
        CategoryView::Loaded { category, products, rate_limited } => {
            let block = pane_block(app, format!("{} ({})", category.name, products.len()), focused);
            let inner = block.inner(area);
            f.render_widget(block, area);

            let (warn_area, list_area) = if rate_limited {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Min(0)])
                    .split(inner);
                (Some(rows[0]), rows[1])
            } else {
                (None, inner)
            };
            if let Some(r) = warn_area {
                let warn = Paragraph::new(format!("⚠ {}  (r to retry)", messages::PRODUCTS_RATE_LIMITED))
                    .style(Style::default().fg(theme.rate_limited));
                f.render_widget(warn, r);
            }

            if products.is_empty() {
                f.render_widget(
                    Paragraph::new("No products in this category yet.").style(Style::default().fg(theme.muted)),
                    list_area,
                );
                return;
            }

            let name_w = (list_area.width as usize).saturating_sub(26).max(8);
            let items: Vec<ListItem> = products.iter().map(|p| product_row(app, p, name_w)).collect();
            let mut st = ListState::default();
            if focused {
                st.select(Some(app.product_selection().min(products.len() - 1)));
            }
            let list = List::new(items)
                .highlight_style(Style::default().bg(theme.highlight_bg).fg(theme.highlight_fg).add_modifier(Modifier::BOLD));
            f.render_stateful_widget(list, list_area, &mut st);
        }
    }
}

fn product_row(app:&App, p:&Product, name_w:usize) -> ListItem<'static> {
    let price = format!("{:>10.2}", p.effective_price());
    let unit = p.unit.as_deref().map(|u| format!("/{u}")).unwrap_or_default();
    let mut spans = vec![
        Span::raw(format!("{:<w$} ", truncate(&p.name, name_w), w = name_w)),
        Span::styled(price, Style::default().fg(app.theme().price)),
        Span::styled(format!("{unit:<6}"), Style::default().fg(app.theme().muted)),
    ];
    if p.effective_price() < p.price {
        spans.push(Span::styled(" sale", Style::default().fg(app.theme().sale)));
    }
    if !p.in_stock() {
        spans.push(Span::styled(" out", Style::default().fg(app.theme().sold_out)));
    }
    ListItem::new(Line::from(spans))
}

// ===============================
// Footer / Debug
// ===============================
fn footer(f:&mut Frame, area:Rect, app:&App){
    let key = |k: &'static str| Span::styled(k, Style::default().fg(app.theme().border_focus));
    let mut spans: Vec<Span> = Vec::with_capacity(24);

    spans.push(key("Tab"));
    spans.push(Span::raw(" switch │ "));
    spans.push(key("←/→"));
    spans.push(Span::raw(" browse │ "));
    spans.push(key("Enter"));
    spans.push(Span::raw(" open │ "));
    match app.pane() {
        Pane::Banners => {
            spans.push(key("Space"));
            spans.push(Span::raw(" auto-play │ "));
            spans.push(key("c"));
            spans.push(Span::raw(" copy link │ "));
        }
        Pane::Products => {
            spans.push(key("r"));
            spans.push(Span::raw(" retry │ "));
            spans.push(key("Esc"));
            spans.push(Span::raw(" back │ "));
        }
        Pane::Categories => {
            if app.categories_error().is_some() {
                spans.push(key("r"));
                spans.push(Span::raw(" retry │ "));
            }
        }
    }
    spans.push(key("L"));
    spans.push(Span::raw(" logout │ "));
    spans.push(key("q"));
    spans.push(Span::raw(" quit"));

    if app.debug_visible() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("[DEBUG]", Style::default().fg(app.theme().debug)));
    }
    spans.push(Span::raw(format!(" │ FPS {}", app.fps())));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn debug_panel(f:&mut Frame, area:Rect, app:&App){
    let log = app.debug_log();
    let lines_to_show = (area.height.saturating_sub(2)) as usize;
    let start = log.len().saturating_sub(lines_to_show);
    let lines: Vec<Line> = log[start..].iter().map(|msg| Line::from(Span::raw(msg.as_str()))).collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(app.theme().muted))
        .block(Block::default()
            .title(" Debug ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(app.theme().muted)));

    f.render_widget(paragraph, area);
}

// ===============================
// Overlays
// ===============================
fn draw_toast_modal(f: &mut Frame, app: &App) {
    let message = app.toast_message().unwrap_or("");

    let area = f.area();
    let width = (area.width * 4) / 10;
    let height = 3;
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let overlay = Rect { x, y, width, height };

    f.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme().notice));

    let text = Paragraph::new(format!("✓ {message}"))
        .style(Style::default().fg(app.theme().notice).add_modifier(Modifier::BOLD))
        .block(block);

    f.render_widget(text, overlay);
}

// ===============================
// Helpers
// ===============================
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return s.chars().take(max_chars).collect();
    }
    let head: String = s.chars().take(max_chars - 1).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::carousel::CarouselSettings;
    use crate::theme::Theme;
    use crate::types::{AppEvent, Category};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate("Fruits", 10), "Fruits");
        assert_eq!(truncate("Vegetables & Herbs", 8), "Vegetab…");
    }

    #[test]
    fn renders_categories_without_banners() {
        let mut app = App::new(30, Theme::Market, CarouselSettings::default(), None, None, AuthContext::anonymous());
        app.on_event(
            AppEvent::CategoriesLoaded(vec![Category {
                id: 1,
                slug: "fruits".into(),
                name: "Fruits".into(),
                description: None,
                image_url: None,
                products_count: Some(3),
            }]),
            Instant::now(),
        );
        let screen = render(&mut app);
        assert!(screen.contains("Fruits"));
        assert!(screen.contains("Categories (1)"));
        assert!(!screen.contains("Banner 1/"));
    }

    #[test]
    fn failed_category_list_offers_retry() {
        let mut app = App::new(30, Theme::Market, CarouselSettings::default(), None, None, AuthContext::anonymous());
        app.on_event(
            AppEvent::CategoriesFailed {
                rate_limited: true,
                message: "rate limited (429)".into(),
            },
            Instant::now(),
        );
        let screen = render(&mut app);
        assert!(screen.contains("Categories · error"));
        assert!(screen.contains("Too many requests"));
        assert!(screen.contains("r retry  (attempt 1)"));
    }

    #[test]
    fn small_terminal_shows_notice() {
        let mut app = App::new(30, Theme::Market, CarouselSettings::default(), None, None, AuthContext::anonymous());
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("too small"));
    }
}
