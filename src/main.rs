//! FrogTools command line
//!
//! Every subcommand builds the same application context the desktop
//! screens use and runs one action against it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frogtools::app::{default_stylesheet_path, AppContext};
use frogtools::backend::{HttpBackend, UpdateEvent, UpdateSink, DEFAULT_BACKEND_URL};
use frogtools::catalog::{urls, HttpFetcher};
use frogtools::github::GithubClient;
use frogtools::settings::UpdateStatus;
use frogtools::style::StyleDocument;
use frogtools::theme::{builtin_variants, PartialPalette, CUSTOM_PREFIX};
use frogtools::wizard::{
    AssetBrowser, ItemStatus, PrefixStep, ProgressCallback, ProgressEvent, RunSummary,
    SelectionSpec, DEFAULT_PREFIX,
};

type Browser = AssetBrowser<HttpFetcher, HttpBackend>;

#[derive(Parser)]
#[command(name = "frogtools")]
#[command(version)]
#[command(about = "Champion skin extraction and repath toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Preferences file (default: <config dir>/frogtools/prefs.json)
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Backend server URL (overrides the BackendUrl preference)
    #[arg(long, global = true, env = "FROGTOOLS_BACKEND_URL")]
    backend_url: Option<String>,

    /// Also write a daily rolling JSON log into this directory
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every champion
    Champions,

    /// List the skins of a champion
    Skins {
        /// Champion name, alias or id
        champion: String,
    },

    /// List the chromas of one skin
    Chromas {
        champion: String,
        /// Skin number (0 = base skin)
        skin: u32,
    },

    /// Extract skins through the backend
    Extract {
        /// One or more champion:skin[:chroma]
        #[arg(required = true)]
        selections: Vec<SelectionSpec>,
    },

    /// Extract and repath skins with custom prefixes
    Repath {
        /// One or more champion:skin
        #[arg(required = true)]
        selections: Vec<SelectionSpec>,

        /// Prefix per skin in order; the last one fills the rest.
        /// Prompts interactively when omitted.
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },

    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Manage themes
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Manage custom fonts
    Fonts {
        #[command(subcommand)]
        action: FontsAction,
    },

    /// Hash table management
    Hashes {
        #[command(subcommand)]
        action: HashesAction,
    },

    /// GitHub integration
    Github {
        #[command(subcommand)]
        action: GithubAction,
    },

    /// Application updates
    Update {
        #[command(subcommand)]
        action: UpdateAction,
    },

    /// Backend process control
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    Get { key: String },
    /// Values are parsed as JSON when possible, otherwise stored as text
    Set { key: String, value: String },
    List,
}

#[derive(Subcommand)]
enum ThemeAction {
    List,
    /// Select a variant (built-in or custom:<name>) and write the stylesheet
    Apply {
        variant: String,
        #[arg(long)]
        css: Option<PathBuf>,
    },
    /// Save a custom theme; missing colours are derived
    Save {
        name: String,
        #[arg(long)]
        accent: Option<String>,
        #[arg(long)]
        bg: Option<String>,
        #[arg(long)]
        surface: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    Delete { name: String },
}

#[derive(Subcommand)]
enum FontsAction {
    List,
    /// Apply a font by name (`system` to reset) and write the stylesheet
    Apply {
        name: String,
        #[arg(long)]
        css: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HashesAction {
    Check,
    Download,
}

#[derive(Subcommand)]
enum GithubAction {
    /// Test the stored credentials against the repository
    Test,
}

#[derive(Subcommand)]
enum UpdateAction {
    Check,
    Download,
    /// Download if needed, then install
    Install,
}

#[derive(Subcommand)]
enum BackendAction {
    Restart,
}

/// Console logging only when verbose or RUST_LOG is set; the file log
/// whenever a directory is given
fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console = verbose || std::env::var("RUST_LOG").is_ok();
    if !console && log_dir.is_none() {
        return Ok(None);
    }

    let directive = if verbose {
        "frogtools=debug"
    } else if console {
        "frogtools=warn"
    } else {
        "frogtools=info"
    };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "frogtools.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    let console_layer = console.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let ctx = AppContext::open(cli.prefs, cli.backend_url).await?;

    match cli.command {
        Commands::Champions => {
            let mut browser = loaded_browser(&ctx).await?;
            for champion in browser.champions() {
                println!("{:>5}  {:<16} {}", champion.id, champion.name, champion.alias);
            }
            eprintln!("\nTotal: {} champions", browser.champions().len());
            print_alerts(&mut browser);
        }

        Commands::Skins { champion } => {
            let mut browser = loaded_browser(&ctx).await?;
            let champ = find_champion(&browser, &champion)?;
            let skins = browser.select_champion(&champ).await?.to_vec();
            for skin in &skins {
                println!("{:>3}  {:<40} {}", skin.id, skin.name, skin.rarity);
            }
            if let Some(skin) = skins.first() {
                println!("\nSplash: {}", urls::skin_splash_url(&champ.alias, skin.id));
            }
        }

        Commands::Chromas { champion, skin } => {
            let mut browser = loaded_browser(&ctx).await?;
            let champ = find_champion(&browser, &champion)?;
            let found = browser
                .select_champion(&champ)
                .await?
                .iter()
                .find(|s| s.id == skin)
                .cloned()
                .with_context(|| format!("{} has no skin {}", champ.name, skin))?;
            let chromas = browser.chromas_for(&found).await;
            if chromas.is_empty() {
                println!("{} has no chromas", found.name);
            }
            for chroma in chromas {
                println!("{:>8}  {:<40} {}", chroma.id, chroma.name, chroma.color);
            }
        }

        Commands::Extract { selections } => {
            let mut browser = loaded_browser(&ctx).await?;
            for spec in &selections {
                browser.select_spec(spec).await?;
            }
            attach_progress(&mut browser, "Extracting");
            let watcher = watch_ctrl_c(&browser);
            let result = browser.extract_selected().await;
            watcher.abort();
            print_alerts(&mut browser);
            report("Extraction", &result?);
        }

        Commands::Repath {
            selections,
            prefixes,
        } => {
            let mut browser = loaded_browser(&ctx).await?;
            for spec in &selections {
                browser.select_spec(spec).await?;
            }
            if let Err(e) = browser.begin_repath().await {
                print_alerts(&mut browser);
                return Err(e.into());
            }

            if prefixes.is_empty() {
                prompt_prefixes(&mut browser)?;
            } else {
                fill_prefixes(&mut browser, &prefixes)?;
            }

            attach_progress(&mut browser, "Repathing");
            let watcher = watch_ctrl_c(&browser);
            let result = browser.run_repath().await;
            watcher.abort();
            print_alerts(&mut browser);
            report("Repath", &result?);
        }

        Commands::Prefs { action } => match action {
            PrefsAction::Get { key } => match ctx.prefs.get(&key).await {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            },
            PrefsAction::Set { key, value } => {
                let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
                ctx.prefs.set(&key, parsed.clone()).await;
                println!("{} = {}", key, parsed);
            }
            PrefsAction::List => {
                for (key, value) in ctx.prefs.snapshot().await {
                    println!("{:<20} {}", key, value);
                }
            }
        },

        Commands::Theme { action } => {
            let themes = ctx.themes();
            match action {
                ThemeAction::List => {
                    let selected = ctx
                        .prefs
                        .get_string(frogtools::prefs::keys::THEME_VARIANT)
                        .await
                        .unwrap_or_default();
                    for (name, display) in builtin_variants() {
                        let mark = if name == selected { "*" } else { " " };
                        println!("{} {:<12} {}", mark, name, display);
                    }
                    for (name, palette) in themes.custom_themes().await {
                        let variant = format!("{}{}", CUSTOM_PREFIX, name);
                        let mark = if variant == selected { "*" } else { " " };
                        println!("{} {:<12} accent {} bg {}", mark, variant, palette.accent, palette.bg);
                    }
                }
                ThemeAction::Apply { variant, css } => {
                    let mut doc = ctx.current_style().await?;
                    let applied = themes.select(&mut doc, &variant).await;
                    if applied != variant {
                        eprintln!("'{}' not found, using {}", variant, applied);
                    }
                    write_stylesheet(&doc, css)?;
                }
                ThemeAction::Save {
                    name,
                    accent,
                    bg,
                    surface,
                    text,
                } => {
                    let partial = PartialPalette {
                        accent,
                        bg,
                        surface,
                        text,
                        ..Default::default()
                    };
                    let palette = themes.set_custom_theme(&name, &partial).await?;
                    println!("Saved {}{} (accent {}, bg {})", CUSTOM_PREFIX, name, palette.accent, palette.bg);
                }
                ThemeAction::Delete { name } => {
                    if themes.delete_custom_theme(&name).await {
                        println!("Deleted {}", name);
                    } else {
                        bail!("No custom theme named '{}'", name);
                    }
                }
            }
        }

        Commands::Fonts { action } => {
            let fonts = ctx.fonts().await?;
            match action {
                FontsAction::List => {
                    let mut doc = StyleDocument::new();
                    let state = fonts.ensure_font_persistence(&mut doc).await;
                    for entry in fonts.scan_fonts()? {
                        let mark = if entry.name == state.name() { "*" } else { " " };
                        println!("{} {:<24} {}", mark, entry.name, entry.display_name);
                    }
                    eprintln!("\nFonts directory: {}", fonts.fonts_dir().display());
                }
                FontsAction::Apply { name, css } => {
                    let mut doc = ctx.current_style().await?;
                    if !fonts.apply_font(&mut doc, &name).await {
                        bail!("Could not load font '{}'", name);
                    }
                    write_stylesheet(&doc, css)?;
                }
            }
        }

        Commands::Hashes { action } => {
            let mut settings = ctx.settings();
            let ok = match action {
                HashesAction::Check => settings.check_hashes().await.is_some(),
                HashesAction::Download => settings.download_hashes().await.is_some(),
            };
            print_log(settings.log());
            if !ok {
                bail!("Hash operation failed");
            }
        }

        Commands::Github { action } => match action {
            GithubAction::Test => {
                let mut settings = ctx.settings();
                let client = GithubClient::new()?;
                let status = settings.test_github_connection(&client).await;
                print_log(settings.log());
                if !status.is_some_and(|s| s.is_connected()) {
                    bail!("GitHub connection test failed");
                }
            }
        },

        Commands::Update { action } => {
            let mut settings = ctx.settings();
            if let Some(version) = settings.app_version().await {
                println!("Current version: {}", version);
            }
            settings.check_for_updates().await;

            if matches!(action, UpdateAction::Download | UpdateAction::Install)
                && matches!(settings.update_status(), UpdateStatus::Available { .. })
            {
                let bar = ProgressBar::new(100);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% | {msg}")?
                        .progress_chars("=>-"),
                );
                let sink_bar = bar.clone();
                let observer: UpdateSink = Arc::new(move |event: UpdateEvent| {
                    if let UpdateEvent::DownloadProgress { percent, .. } = event {
                        sink_bar.set_position(percent.clamp(0.0, 100.0) as u64);
                    }
                });
                settings.download_update(Some(observer)).await;
                bar.finish_and_clear();
            }

            if matches!(action, UpdateAction::Install) {
                settings.install_update().await;
            }
            print_log(settings.log());
            if let UpdateStatus::Error(message) = settings.update_status() {
                bail!("Update failed: {}", message);
            }
        }

        Commands::Backend { action } => match action {
            BackendAction::Restart => {
                let mut settings = ctx.settings();
                let ok = settings.restart_backend().await;
                print_log(settings.log());
                if !ok {
                    bail!(
                        "Could not reach the backend (default {})",
                        DEFAULT_BACKEND_URL
                    );
                }
            }
        },
    }

    Ok(())
}

async fn loaded_browser(ctx: &AppContext) -> Result<Browser> {
    let mut browser = ctx.asset_browser()?;
    if let Err(e) = browser.load_catalog().await {
        print_alerts(&mut browser);
        return Err(e.into());
    }
    Ok(browser)
}

fn find_champion(browser: &Browser, query: &str) -> Result<frogtools::catalog::Champion> {
    browser
        .find_champion(query)
        .cloned()
        .with_context(|| format!("Unknown champion '{}'", query))
}

fn print_alerts(browser: &mut Browser) {
    for alert in browser.take_alerts() {
        eprintln!("ALERT {}", alert);
    }
}

fn print_log(log: &frogtools::activity::ActivityLog) {
    for line in log.lines() {
        println!("{}", line);
    }
}

fn write_stylesheet(doc: &StyleDocument, css: Option<PathBuf>) -> Result<()> {
    let path = match css {
        Some(path) => path,
        None => default_stylesheet_path()?,
    };
    doc.write_css(&path)?;
    println!("Stylesheet written to {}", path.display());
    Ok(())
}

fn attach_progress(browser: &mut Browser, action: &str) {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(action.to_string());

    let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| {
        bar.set_length(event.total as u64);
        match &event.status {
            ItemStatus::Running => bar.set_message(event.label.clone()),
            ItemStatus::Failed(msg) => {
                bar.println(format!("FAILED {}: {}", event.label, msg));
                bar.inc(1);
            }
            ItemStatus::Done | ItemStatus::Cancelled => bar.inc(1),
            ItemStatus::Pending => {}
        }
        if event.index + 1 == event.total && event.status.is_finished() {
            bar.finish_and_clear();
        }
    });
    browser.set_progress_callback(callback);
}

/// Ctrl+C cancels the running batch after the current item
fn watch_ctrl_c(browser: &Browser) -> tokio::task::JoinHandle<()> {
    let handle = browser.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current item...");
            handle.cancel().await;
        }
    })
}

fn report(action: &str, summary: &RunSummary) {
    println!("\n=== {} Summary ===", action);
    for item in &summary.items {
        println!("  {:<40} {}", item.label, item.status);
    }
    println!(
        "{} done, {} failed{}",
        summary.succeeded(),
        summary.failed(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
}

/// `--prefix` values in step order; the last one covers every remaining skin
fn fill_prefixes(browser: &mut Browser, prefixes: &[String]) -> Result<()> {
    for (i, prefix) in prefixes.iter().enumerate() {
        browser.set_prefix_input(prefix)?;
        let step = if i + 1 == prefixes.len() {
            browser.apply_prefix_to_remaining()?
        } else {
            browser.submit_prefix()?
        };
        if step == PrefixStep::Complete {
            break;
        }
    }
    Ok(())
}

/// Ask for each prefix on stdin.
/// Empty keeps the shown value, `<` goes back, `!value` applies to the rest.
fn prompt_prefixes(browser: &mut Browser) -> Result<()> {
    println!("Enter a prefix per skin. Empty keeps the shown value, '<' goes back, '!prefix' applies to all remaining.");
    loop {
        let (prompt, shown) = match browser.prefix_wizard() {
            Some(wizard) if !wizard.is_complete() => {
                let target = wizard.current();
                let shown = if wizard.input().is_empty() {
                    DEFAULT_PREFIX.to_string()
                } else {
                    wizard.input().to_string()
                };
                (
                    format!(
                        "[{}/{}] {} - {}",
                        wizard.step() + 1,
                        wizard.total(),
                        target.champion,
                        target.skin_name
                    ),
                    shown,
                )
            }
            _ => return Ok(()),
        };

        print!("{} [{}]: ", prompt, shown);
        std::io::stdout().flush()?;
        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            browser.abandon_repath();
            bail!("Prefix entry aborted");
        }
        let line = input.trim();

        if line == "<" {
            if !browser.prefix_back()? {
                println!("Already at the first skin");
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix('!') {
            browser.set_prefix_input(rest)?;
            browser.apply_prefix_to_remaining()?;
            return Ok(());
        }
        if !line.is_empty() {
            browser.set_prefix_input(line)?;
        }
        if browser.submit_prefix()? == PrefixStep::Complete {
            return Ok(());
        }
    }
}
