use std::time::{Duration, Instant};

use tokio::sync::mpsc::unbounded_channel;

use sokoni::carousel::{Carousel, CarouselSettings, Direction, Phase, TrackEvent, TrackKind};
use sokoni::types::{slides_from_banners, Banner};

fn banners(n: u64) -> Vec<Banner> {
    (1..=n)
        .map(|id| Banner {
            id,
            title: Some(format!("Offer {id}")),
            subtitle: None,
            // reversed on purpose, the carousel orders by `order`
            order: (n - id) as i64,
            is_active: true,
            image_url: None,
            mobile_image_url: None,
            button_text: Some("Shop now".into()),
            button_link: None,
            category_slug: Some("fruits".into()),
        })
        .collect()
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TrackEvent>) -> Vec<TrackEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

#[test]
fn five_slides_auto_advance_then_wrap_backwards() {
    let settings = CarouselSettings::default();
    let t0 = Instant::now();
    let mut c = Carousel::new(settings);
    assert!(c.load_slides(slides_from_banners(&banners(5)), t0));
    assert_eq!(c.active_slide().map(|s| s.id), Some(5));

    // one interval without interaction
    let t1 = t0 + settings.interval;
    assert!(c.tick(t1));
    assert_eq!(c.active_index(), 1);
    assert_eq!(c.direction(), Direction::Forward);
    assert_eq!(c.phase(), Phase::Transitioning);

    let t2 = t1 + settings.transition;
    c.tick(t2);
    assert_eq!(c.phase(), Phase::Ready);

    // previous arrow twice
    assert!(c.advance(Direction::Backward, t2));
    let t3 = t2 + settings.transition;
    c.tick(t3);
    assert!(c.advance(Direction::Backward, t3));
    c.tick(t3 + settings.transition);
    assert_eq!(c.active_index(), 4);
    assert_eq!(c.direction(), Direction::Backward);
}

#[test]
fn navigation_is_locked_while_transitioning() {
    let settings = CarouselSettings::default();
    let t0 = Instant::now();
    let mut c = Carousel::new(settings);
    c.load_slides(slides_from_banners(&banners(3)), t0);

    assert!(c.advance(Direction::Forward, t0));
    assert!(!c.advance(Direction::Forward, t0 + Duration::from_millis(10)));
    assert!(!c.jump_to(2, t0 + Duration::from_millis(20)));
    assert_eq!(c.active_index(), 1);
}

#[test]
fn focus_pauses_and_leaving_restarts_the_full_interval() {
    let settings = CarouselSettings::default();
    let t0 = Instant::now();
    let mut c = Carousel::new(settings);
    c.load_slides(slides_from_banners(&banners(2)), t0);

    c.set_hovered(true, t0 + Duration::from_secs(5));
    assert!(!c.tick(t0 + Duration::from_secs(30)));
    assert_eq!(c.active_index(), 0);

    let left = t0 + Duration::from_secs(31);
    c.set_hovered(false, left);
    assert!(!c.tick(left + settings.interval - Duration::from_millis(1)));
    assert!(c.tick(left + settings.interval));
    assert_eq!(c.active_index(), 1);
}

#[test]
fn impressions_and_clicks_reach_the_tracker() {
    let (tx, mut rx) = unbounded_channel();
    let settings = CarouselSettings::default();
    let t0 = Instant::now();
    let mut c = Carousel::new(settings).with_tracker(tx);
    c.load_slides(slides_from_banners(&banners(3)), t0);

    c.jump_to(2, t0);
    c.tick(t0 + settings.transition);
    let link = c.activate().and_then(|s| s.link.clone());
    assert_eq!(link.as_deref(), Some("/categories/fruits"));

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            TrackEvent { banner_id: 3, kind: TrackKind::Impression },
            TrackEvent { banner_id: 1, kind: TrackKind::Click },
        ]
    );
}

#[test]
fn single_slide_never_rotates() {
    let t0 = Instant::now();
    let mut c = Carousel::new(CarouselSettings::default());
    c.load_slides(slides_from_banners(&banners(1)), t0);
    assert_eq!(c.next_auto_at(), None);
    assert!(!c.advance(Direction::Forward, t0));
    assert!(!c.tick(t0 + Duration::from_secs(60)));
}
