use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::warn;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use guild_tester::browser::{BrowserConfig, BrowserKind, WebDriverDocument, new_session};
use guild_tester::clock::TokioClock;
use guild_tester::config::HarnessConfig;
use guild_tester::document::Document;
use guild_tester::poll::{AbortSignal, Poller};
use guild_tester::reports;
use guild_tester::runner::{ScenarioResult, run_scenario, run_simulated};
use guild_tester::scenario::{ScenarioCtx, ScenarioId, get_scenario, list_scenarios};
use guild_tester::simulated::DEFAULT_LATENCY_MS;
use guild_tester::snapshot::Snapshot;
use guild_tester::util::{artifacts_dir, capture_artifacts, split_csv};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// In-process simulated guild on virtual time (fast, no browser)
    Simulated,
    /// Browser automation against a running guild (slow, captures artifacts)
    Browser,
    /// Run both simulated and browser scenarios
    Both,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HeadlessMode {
    /// Run browsers in headless mode
    Headless,
    /// Run browsers with visible windows
    Windowed,
}

impl HeadlessMode {
    const fn is_headless(self) -> bool {
        matches!(self, Self::Headless)
    }
}

#[derive(Debug, Parser)]
#[command(name = "guild-tester", version)]
#[command(about = "Asynchronous state verification for the QA Guild game")]
struct Args {
    /// Run mode: simulated (fast), browser (real UI), or both
    #[arg(long, value_enum, default_value_t = RunMode::Simulated)]
    mode: RunMode,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Harness configuration file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default wait timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Delay before the simulated guild applies an action - simulated mode only
    #[arg(long, default_value_t = DEFAULT_LATENCY_MS)]
    latency_ms: u64,

    // Browser-specific options
    /// Browsers to run (chrome,edge,firefox,safari) - browser mode only
    #[arg(long, default_value = "chrome")]
    browsers: String,

    /// Base URL of the guild application
    #[arg(long)]
    base_url: Option<String>,

    /// Artifacts directory for screenshots and DOM dumps
    #[arg(long, default_value = "target/guild-artifacts")]
    artifacts_dir: String,

    /// Connect to a Selenium Grid/Appium hub instead of local drivers
    #[arg(long)]
    hub: Option<String>,

    /// Run headless where supported
    #[arg(long, value_enum, default_value_t = HeadlessMode::Headless)]
    headless: HeadlessMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let config = build_config(&args)?;
    let scenarios = expand_scenarios(&args.scenarios);
    anyhow::ensure!(
        !scenarios.is_empty(),
        "no known scenario in --scenarios {:?}",
        args.scenarios
    );
    let browsers = expand_browsers(&args)?;
    let abort = AbortSignal::new();
    abort_on_ctrl_c(abort.clone());

    let start_time = Instant::now();
    let mut all_results = run_simulated_scenarios(&args, &scenarios, &config, &abort).await;
    all_results.extend(run_browser_scenarios(&args, &browsers, &scenarios, &config, &abort).await);

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🛡️  QA Guild Verification Harness".bright_cyan().bold());
    println!("{}", "==================================".cyan());
}

fn build_config(args: &Args) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.poll.timeout_ms = timeout_ms;
    }
    if let Some(interval_ms) = args.interval_ms {
        anyhow::ensure!(interval_ms > 0, "--interval-ms must be positive");
        config.poll.interval_ms = interval_ms;
    }
    Ok(config)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<ScenarioId> {
    let mut scenarios: Vec<ScenarioId> = Vec::new();
    for name in split_csv(scenarios_arg) {
        let expanded = if name.eq_ignore_ascii_case("all") {
            ScenarioId::ALL.to_vec()
        } else if let Some(id) = get_scenario(&name) {
            vec![id]
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        for id in expanded {
            if !scenarios.contains(&id) {
                scenarios.push(id);
            }
        }
    }
    scenarios
}

fn abort_on_ctrl_c(abort: AbortSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, aborting pending waits");
            abort.abort();
        }
    });
}

fn parse_browser_kind(name: &str) -> Option<BrowserKind> {
    match name {
        "chrome" => Some(BrowserKind::Chrome),
        "edge" => Some(BrowserKind::Edge),
        "firefox" => Some(BrowserKind::Firefox),
        "safari" => Some(BrowserKind::Safari),
        _ => None,
    }
}

/// Browsers to run in browser mode. A browser run with no known browser
/// is an error rather than an empty pass.
fn expand_browsers(args: &Args) -> Result<Vec<BrowserKind>> {
    if !matches!(args.mode, RunMode::Browser | RunMode::Both) {
        return Ok(Vec::new());
    }
    let mut browsers = Vec::new();
    for name in split_csv(&args.browsers) {
        match parse_browser_kind(&name) {
            Some(kind) if !browsers.contains(&kind) => browsers.push(kind),
            Some(_) => {}
            None => eprintln!("⚠️  Unknown browser: {}", name.yellow()),
        }
    }
    anyhow::ensure!(
        !browsers.is_empty(),
        "no known browser in --browsers {:?}",
        args.browsers
    );
    Ok(browsers)
}

fn build_browser_config(args: &Args) -> BrowserConfig {
    BrowserConfig {
        headless: args.headless.is_headless(),
        remote_hub: args.hub.clone(),
        ..BrowserConfig::default()
    }
}

fn print_result_line(result: &ScenarioResult) {
    match &result.reason {
        None => println!(
            "✅ [{}] {} - {:?}",
            result.target.green(),
            result.scenario_key,
            result.duration
        ),
        Some(reason) => eprintln!(
            "❌ [{}] {} - {} after {:?}: {reason}",
            result.target.red(),
            result.scenario_key,
            result.outcome,
            result.duration
        ),
    }
}

async fn run_simulated_scenarios(
    args: &Args,
    scenarios: &[ScenarioId],
    config: &HarnessConfig,
    abort: &AbortSignal,
) -> Vec<ScenarioResult> {
    if !matches!(args.mode, RunMode::Simulated | RunMode::Both) {
        return Vec::new();
    }

    println!("{}", "🧪 Running Simulated Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let latency = Duration::from_millis(args.latency_ms);
    let results = run_simulated(scenarios, config, latency, args.verbose, abort).await;
    results.iter().for_each(print_result_line);
    results
}

async fn run_browser_scenarios(
    args: &Args,
    browsers: &[BrowserKind],
    scenarios: &[ScenarioId],
    config: &HarnessConfig,
    abort: &AbortSignal,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if browsers.is_empty() {
        return results;
    }

    println!("{}", "🌐 Running Browser Scenarios".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    let cfg = build_browser_config(args);

    for &kind in browsers {
        let driver = match new_session(kind, &cfg).await {
            Ok(d) => d,
            Err(e) => {
                eprintln!("❌ Could not start {}: {e}", kind.label());
                results.extend(scenarios.iter().map(|&id| {
                    ScenarioResult::errored(id, kind.label(), format!("could not start session: {e}"))
                }));
                continue;
            }
        };

        results.extend(
            run_browser_scenarios_for_driver(args, scenarios, config, abort, kind, &driver).await,
        );
        if let Err(e) = driver.quit().await {
            warn!("could not close {} session: {e}", kind.label());
        }
    }

    results
}

async fn run_browser_scenarios_for_driver(
    args: &Args,
    scenarios: &[ScenarioId],
    config: &HarnessConfig,
    abort: &AbortSignal,
    kind: BrowserKind,
    driver: &thirtyfour::WebDriver,
) -> Vec<ScenarioResult> {
    let document = WebDriverDocument::new(driver);
    let poller = Poller::new(Arc::new(TokioClock::new()), &config.poll, abort.clone());
    let ctx = ScenarioCtx::new(&document, poller, config, args.verbose);

    let mut results = Vec::with_capacity(scenarios.len());
    for &id in scenarios {
        let result = run_scenario(id, &ctx, kind.label()).await;
        print_result_line(&result);

        if let Some(reason) = &result.reason {
            let dir = artifacts_dir(&args.artifacts_dir, kind.label(), id.key());
            let snapshot = last_snapshot(&ctx).await;
            if let Err(e) = capture_artifacts(driver, &dir, snapshot.as_ref(), reason).await {
                warn!("could not capture artifacts in {dir}: {e:#}");
            }
        }
        results.push(result);
    }
    results
}

/// Best-effort read of the quest state for the artifacts of a failure.
async fn last_snapshot<D: Document>(ctx: &ScenarioCtx<'_, D>) -> Option<Snapshot> {
    let quest = ctx.quest().ok()?;
    quest.snapshot().await.ok()
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# QA Guild Verification Results\n\n_No scenarios executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            let duration = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: RunMode::Simulated,
            scenarios: "all".to_string(),
            list_scenarios: false,
            report: "json".to_string(),
            verbose: false,
            output: None,
            config: None,
            timeout_ms: None,
            interval_ms: None,
            latency_ms: 0,
            browsers: "chrome".to_string(),
            base_url: None,
            artifacts_dir: "target/guild-artifacts".to_string(),
            hub: None,
            headless: HeadlessMode::Headless,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "guild-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("rewards,all");
        assert_eq!(expanded.len(), ScenarioId::ALL.len());
        assert_eq!(expanded[0], ScenarioId::Rewards);
    }

    #[test]
    fn expand_scenarios_skips_unknown_and_preserves_order() {
        let expanded = expand_scenarios("warriors,smoke,landing,warriors");
        assert_eq!(expanded, vec![ScenarioId::Warriors, ScenarioId::Landing]);
    }

    #[test]
    fn cli_flags_override_the_config() {
        let args = Args {
            base_url: Some("http://guild.test:8080/".to_string()),
            timeout_ms: Some(2_000),
            interval_ms: Some(50),
            ..base_args()
        };
        let config = build_config(&args).expect("config");
        assert_eq!(config.base_url, "http://guild.test:8080/");
        assert_eq!(config.poll.timeout(), Duration::from_secs(2));
        assert_eq!(config.poll.interval(), Duration::from_millis(50));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let args = Args {
            interval_ms: Some(0),
            ..base_args()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let path = temp_path("config");
        std::fs::write(
            &path,
            r#"{ "base_url": "http://from-file/", "poll": { "timeout_ms": 500 } }"#,
        )
        .expect("write config");
        let args = Args {
            config: Some(path),
            timeout_ms: Some(750),
            ..base_args()
        };
        let config = build_config(&args).expect("config");
        assert_eq!(config.base_url, "http://from-file/");
        assert_eq!(config.poll.timeout_ms, 750);
        assert_eq!(config.poll.interval_ms, 300);
    }

    #[test]
    fn parses_known_browsers_only() {
        assert_eq!(parse_browser_kind("firefox"), Some(BrowserKind::Firefox));
        assert_eq!(parse_browser_kind("lynx"), None);
        let args = Args {
            headless: HeadlessMode::Windowed,
            hub: Some("http://grid:4444".to_string()),
            ..base_args()
        };
        let cfg = build_browser_config(&args);
        assert!(!cfg.headless);
        assert_eq!(cfg.remote_hub.as_deref(), Some("http://grid:4444"));
    }

    #[test]
    fn browser_mode_is_skipped_in_simulated_runs() {
        let args = base_args();
        let browsers = expand_browsers(&args).expect("simulated mode needs no browser");
        assert!(browsers.is_empty());
        let results = tokio_test::block_on(run_browser_scenarios(
            &args,
            &browsers,
            &[ScenarioId::Rewards],
            &HarnessConfig::default(),
            &AbortSignal::new(),
        ));
        assert!(results.is_empty());
    }

    #[test]
    fn browser_mode_without_a_known_browser_is_an_error() {
        let args = Args {
            mode: RunMode::Browser,
            browsers: "lynx,mosaic".to_string(),
            ..base_args()
        };
        let err = expand_browsers(&args).expect_err("nothing to run");
        assert!(err.to_string().contains("no known browser"));

        let args = Args {
            mode: RunMode::Both,
            browsers: "firefox,lynx,firefox".to_string(),
            ..base_args()
        };
        assert_eq!(
            expand_browsers(&args).expect("firefox is known"),
            vec![BrowserKind::Firefox]
        );
    }

    #[test]
    fn simulated_mode_runs_the_requested_scenarios() {
        let args = base_args();
        let results = tokio_test::block_on(run_simulated_scenarios(
            &args,
            &[ScenarioId::Rewards, ScenarioId::QuestDetails],
            &HarnessConfig::default(),
            &AbortSignal::new(),
        ));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].scenario_key, "rewards");
        assert!(results.iter().all(ScenarioResult::passed), "{results:?}");
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).expect("report");
        let content = std::fs::read_to_string(temp).expect("read report");
        assert!(content.contains("[]"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).expect("list"));
        let content = std::fs::read_to_string(temp).expect("read list");
        assert!(content.contains("progress-tracking"));
        assert!(content.contains("config-validation"));
    }

    #[test]
    fn maybe_list_scenarios_is_a_no_op_by_default() {
        assert!(!maybe_list_scenarios(&base_args()).expect("list"));
    }
}
