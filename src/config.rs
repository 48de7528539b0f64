use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::carousel::CarouselSettings;
use crate::loader::LoaderSettings;
use crate::theme::Theme;

/// Sokoni - terminal storefront browser
///
/// Browse homepage banners, categories and products of a storefront API.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "sokoni")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal storefront browser", long_about = None)]
pub struct CliArgs {
    /// Storefront API base URL
    #[arg(long, env = "SOKONI_API_URL")]
    pub api_url: Option<String>,

    /// HTTP request timeout in milliseconds (1000-60000)
    #[arg(long, env = "API_TIMEOUT_MS")]
    pub api_timeout_ms: Option<u64>,

    /// Base backoff per retry attempt in milliseconds (100-10000)
    #[arg(long, env = "BACKOFF_BASE_MS")]
    pub backoff_base_ms: Option<u64>,

    /// Products requested per category page (1-100)
    #[arg(long, env = "PRODUCTS_PER_PAGE")]
    pub products_per_page: Option<u32>,

    /// Banner auto-advance interval in milliseconds (1000-60000)
    #[arg(long, env = "CAROUSEL_INTERVAL_MS")]
    pub carousel_interval_ms: Option<u64>,

    /// Banner transition duration in milliseconds (100-5000)
    #[arg(long, env = "CAROUSEL_TRANSITION_MS")]
    pub carousel_transition_ms: Option<u64>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Color theme: market, night, mono
    #[arg(long, env = "THEME")]
    pub theme: Option<String>,

    /// Path of the persisted credentials file
    #[arg(long, env = "SOKONI_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, env = "SOKONI_LOG")]
    pub log_file: Option<PathBuf>,

    /// Deep link to open on startup, e.g. sokoni://category/fruits
    #[arg(long)]
    pub open: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Admin: change a customer's account status
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Forget the stored token
    Logout,
    /// Print the resolved configuration and exit
    Config,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CustomerAction {
    /// Re-enable a customer account
    Activate { id: u64 },
    /// Disable a customer account
    Deactivate { id: u64 },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub api_timeout_ms: u64,
    pub backoff_base_ms: u64,
    pub products_per_page: u32,
    pub carousel_interval_ms: u64,
    pub carousel_transition_ms: u64,
    pub render_fps: u32,
    pub theme: Theme,
    pub credentials_path: PathBuf,
    pub log_file: PathBuf,
    pub open: Option<String>,
    pub command: Option<Command>,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

fn default_credentials_path() -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".config").join("sokoni").join("credentials.json"))
        .unwrap_or_else(|_| PathBuf::from("sokoni-credentials.json"))
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    from_args(CliArgs::parse())
}

/// Resolve parsed arguments into a validated [`Config`].
pub fn from_args(args: CliArgs) -> Result<Config> {
    let api_url = args
        .api_url
        .unwrap_or_else(|| "http://localhost:8000/api".to_string());
    validate_url(&api_url, "SOKONI_API_URL")?;

    let api_timeout_ms =
        validate_in_range(args.api_timeout_ms.unwrap_or(8000), 1000, 60000, "API_TIMEOUT_MS")?;
    let backoff_base_ms =
        validate_in_range(args.backoff_base_ms.unwrap_or(1000), 100, 10000, "BACKOFF_BASE_MS")?;
    let products_per_page =
        validate_in_range(args.products_per_page.unwrap_or(24), 1, 100, "PRODUCTS_PER_PAGE")?;
    let carousel_interval_ms = validate_in_range(
        args.carousel_interval_ms.unwrap_or(6000),
        1000,
        60000,
        "CAROUSEL_INTERVAL_MS",
    )?;
    let carousel_transition_ms = validate_in_range(
        args.carousel_transition_ms.unwrap_or(700),
        100,
        5000,
        "CAROUSEL_TRANSITION_MS",
    )?;
    if carousel_transition_ms >= carousel_interval_ms {
        return Err(anyhow!(
            "CAROUSEL_TRANSITION_MS ({carousel_transition_ms}) must be shorter than CAROUSEL_INTERVAL_MS ({carousel_interval_ms})"
        ));
    }
    let render_fps = validate_in_range(args.render_fps.unwrap_or(30), 1, 120, "RENDER_FPS")?;

    let theme = match args.theme {
        Some(name) => name.parse::<Theme>().map_err(|e| anyhow!(e))?,
        None => Theme::default(),
    };

    Ok(Config {
        api_url,
        api_timeout_ms,
        backoff_base_ms,
        products_per_page,
        carousel_interval_ms,
        carousel_transition_ms,
        render_fps,
        theme,
        credentials_path: args.credentials.unwrap_or_else(default_credentials_path),
        log_file: args.log_file.unwrap_or_else(|| PathBuf::from("sokoni.log")),
        open: args.open,
        command: args.command,
    })
}

impl Config {
    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            per_page: self.products_per_page,
        }
    }

    pub fn carousel_settings(&self) -> CarouselSettings {
        CarouselSettings {
            interval: Duration::from_millis(self.carousel_interval_ms),
            transition: Duration::from_millis(self.carousel_transition_ms),
        }
    }

    /// Print current configuration (useful for debugging)
    pub fn print_summary(&self) {
        eprintln!("Sokoni Configuration:");
        eprintln!("  API URL: {}", self.api_url);
        eprintln!("  API Timeout: {}ms", self.api_timeout_ms);
        eprintln!("  Backoff Base: {}ms", self.backoff_base_ms);
        eprintln!("  Products/Page: {}", self.products_per_page);
        eprintln!(
            "  Carousel: every {}ms, {}ms transition",
            self.carousel_interval_ms, self.carousel_transition_ms
        );
        eprintln!("  Render FPS: {}", self.render_fps);
        eprintln!("  Theme: {}", self.theme);
        eprintln!("  Credentials: {}", self.credentials_path.display());
        eprintln!("  Log File: {}", self.log_file.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Config> {
        let mut full = vec!["sokoni"];
        full.extend_from_slice(argv);
        from_args(CliArgs::try_parse_from(full)?)
    }

    #[test]
    fn defaults_apply() {
        let cfg = parse(&["--api-url", "https://shop.example/api"]).unwrap();
        assert_eq!(cfg.backoff_base_ms, 1000);
        assert_eq!(cfg.carousel_interval_ms, 6000);
        assert_eq!(cfg.carousel_transition_ms, 700);
        assert_eq!(cfg.loader_settings().backoff_base, Duration::from_secs(1));
        assert_eq!(cfg.theme, Theme::Market);
        assert!(cfg.command.is_none());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = parse(&["--api-url", "https://x/api", "--render-fps", "500"]).unwrap_err();
        assert!(err.to_string().contains("RENDER_FPS"));
        assert!(parse(&["--api-url", "ftp://x"]).is_err());
        assert!(parse(&[
            "--api-url",
            "https://x/api",
            "--carousel-interval-ms",
            "1000",
            "--carousel-transition-ms",
            "1000"
        ])
        .is_err());
    }

    #[test]
    fn customer_subcommand_parses() {
        let cfg = parse(&["--api-url", "https://x/api", "customer", "deactivate", "42"]).unwrap();
        assert_eq!(
            cfg.command,
            Some(Command::Customer {
                action: CustomerAction::Deactivate { id: 42 }
            })
        );
    }

    #[test]
    fn theme_names_resolve() {
        let cfg = parse(&["--api-url", "https://x/api", "--theme", "dark"]).unwrap();
        assert_eq!(cfg.theme, Theme::Night);
        assert!(parse(&["--api-url", "https://x/api", "--theme", "neon"]).is_err());
    }
}
