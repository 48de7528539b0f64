// Native binary for Sokoni - Terminal UI mode

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use sokoni::{
    api::{self, HttpStorefront, StorefrontApi},
    app::{App, Pane},
    auth::AuthSession,
    carousel::TrackEvent,
    clipboard,
    config::{load, Command, Config, CustomerAction},
    constants::messages,
    customers::{CustomerStatusRepository, HttpCustomerStatusRepository},
    loader::LoaderHandle,
    router::{self, Route},
    telemetry,
    types::AppEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    let cfg = load().context("Failed to load configuration")?;
    init_logging(&cfg)?;

    let session = AuthSession::init(&cfg.credentials_path);
    let api = HttpStorefront::new(&cfg.api_url, cfg.api_timeout_ms, session.context())?;

    match cfg.command.clone() {
        Some(cmd) => run_command(cmd, &cfg, &session, api).await,
        None => run_tui(cfg, session, api).await,
    }
}

fn init_logging(cfg: &Config) -> Result<()> {
    // ratatui owns the terminal, so logs go to a file
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("opening log file {}", cfg.log_file.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

async fn run_command(cmd: Command, cfg: &Config, session: &AuthSession, api: HttpStorefront) -> Result<()> {
    match cmd {
        Command::Config => {
            cfg.print_summary();
            Ok(())
        }
        Command::Logout => {
            session.teardown()?;
            println!("{}", messages::LOGGED_OUT);
            Ok(())
        }
        Command::Customer { action } => {
            if !session.context().is_authenticated() {
                bail!("not signed in; open a sokoni://auth/callback?token=... link first");
            }
            let (id, active) = match action {
                CustomerAction::Activate { id } => (id, true),
                CustomerAction::Deactivate { id } => (id, false),
            };
            let repo = HttpCustomerStatusRepository::new(api);
            let customer = repo
                .set_active(id, active)
                .await
                .with_context(|| format!("updating customer #{id}"))?;
            println!(
                "Customer #{} ({}) is now {}",
                customer.id,
                customer.name,
                if customer.is_active { "active" } else { "inactive" }
            );
            Ok(())
        }
    }
}

async fn run_tui(cfg: Config, session: AuthSession, http: HttpStorefront) -> Result<()> {
    let api: Arc<dyn StorefrontApi> = Arc::new(http);

    // channels
    let (tx, rx) = unbounded_channel::<AppEvent>();
    let (track_tx, track_rx) = unbounded_channel::<TrackEvent>();

    // background tasks; the loader stops when its handle drops
    let loader = LoaderHandle::spawn(Arc::clone(&api), cfg.loader_settings(), tx.clone());
    let mut tasks: Vec<JoinHandle<Result<()>>> = Vec::with_capacity(2);
    tasks.push(tokio::spawn(telemetry::run_telemetry(Arc::clone(&api), track_rx)));
    tasks.push(spawn_banner_fetch(Arc::clone(&api), tx.clone()));

    let mut app = App::new(
        cfg.render_fps,
        cfg.theme,
        cfg.carousel_settings(),
        Some(track_tx),
        Some(loader.sender()),
        session.context(),
    )
    .with_list_loader(loader.list_sender());
    app.request_categories();

    // Apply deep link route from CLI (if provided)
    // Example: sokoni --open sokoni://category/fruits
    if let Some(link) = cfg.open.as_deref() {
        match router::parse(link) {
            Some(Route::AuthCallback { token }) => {
                session.login(token, None)?;
                app.show_toast("Signed in".to_string());
            }
            Some(route) => {
                app.apply_route(&route);
                log::info!("Applied deep link route from CLI: {link}");
            }
            None => log::warn!("Ignoring unrecognised link: {link}"),
        }
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let res = run_loop(&mut app, &mut terminal, rx, &session).await;

    // cleanup
    drop(loader);
    for task in &tasks {
        task.abort();
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    res
}

fn spawn_banner_fetch(api: Arc<dyn StorefrontApi>, tx: UnboundedSender<AppEvent>) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let ev = match api::fetch_banners(api.as_ref()).await {
            Ok(banners) => AppEvent::BannersLoaded(banners),
            Err(e) => {
                log::warn!("{e:#}");
                AppEvent::BannersFailed(e.to_string())
            }
        };
        let _ = tx.send(ev);
        Ok(())
    })
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
    session: &AuthSession,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k, session);
                }
            }
        }
        let now = Instant::now();
        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev, now);
        }
        app.tick(now);

        if last_frame.elapsed() >= budget {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent, session: &AuthSession) {
    let now = Instant::now();
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);

    match k.code {
        KeyCode::Char('c') if ctrl => app.on_event(AppEvent::Quit, now),
        KeyCode::Char('d') if ctrl => app.toggle_debug_panel(),
        KeyCode::Char('q') => app.on_event(AppEvent::Quit, now),
        KeyCode::Tab => app.next_pane(now),
        KeyCode::BackTab => app.prev_pane(now),
        KeyCode::Left => app.left(now),
        KeyCode::Right => app.right(now),
        KeyCode::Up => app.up(),
        KeyCode::Down => app.down(),
        KeyCode::Enter => app.enter(),
        KeyCode::Esc | KeyCode::Char('b') if app.pane() == Pane::Products => app.back_to_categories(),
        KeyCode::Char('r') if app.pane() == Pane::Products => app.retry(),
        KeyCode::Char('r') if app.pane() == Pane::Categories => app.retry_categories(),
        KeyCode::Char(' ') if app.pane() == Pane::Banners => app.toggle_autoplay(now),
        // digits past the last slide are ignored by banner_jump
        KeyCode::Char(c @ '1'..='9') if app.pane() == Pane::Banners => {
            let idx = (c as u8 - b'1') as usize;
            app.banner_jump(idx, now);
        }
        KeyCode::Char('c') if app.pane() == Pane::Banners => match app.active_banner_link() {
            Some(link) => match clipboard::copy_link(&link) {
                Ok(copied) => {
                    app.log_debug(format!("Copied {copied}"));
                    app.show_toast(messages::COPY_LINK.to_string());
                }
                Err(e) => {
                    log::warn!("copy failed: {e:#}");
                    app.show_toast(format!("{}: {e}", messages::COPY_FAILED));
                }
            },
            None => app.show_toast(messages::NO_LINK.to_string()),
        },
        KeyCode::Char('L') => match session.teardown() {
            Ok(()) => app.on_logout(),
            Err(e) => {
                log::error!("logout failed: {e:#}");
                app.show_toast(format!("Logout failed: {e}"));
            }
        },
        _ => {}
    }
}
