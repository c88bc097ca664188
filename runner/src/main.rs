//! Multi-account batch runner CLI.
//!
//! Discovers per-account config files, optionally blocks on a confirmation
//! prompt, runs the task engine per account, pushes the summary, and exits
//! with the overall status: 0 clean, 1 attention required, 2 captcha pending.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::Parser;
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use tracing::{info, warn};

use mhy_multi::batch::{BatchConfig, run_batch};
use mhy_multi::exit_codes;
use mhy_multi::io::discover::{DiscoverOptions, locate};
use mhy_multi::io::engine::ProcessEngine;
use mhy_multi::io::notify::notifier_from_config;
use mhy_multi::io::settings::{Settings, load_engine_config};
use mhy_multi::logging;

#[derive(Parser)]
#[command(
    name = "mhy-multi",
    version,
    about = "Multi-account task runner for AutoMihoyoBBS"
)]
struct Cli {
    /// Pass `autorun` to skip the confirmation prompt.
    #[arg(value_name = "MODE")]
    mode: Option<String>,
}

impl Cli {
    fn autorun(&self) -> bool {
        match self.mode.as_deref() {
            Some("autorun") => true,
            Some(other) => {
                warn!(mode = other, "unrecognized mode argument, ignoring");
                false
            }
            None => false,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::ATTENTION);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    info!("multi-account mode starting");
    info!(path = %settings.config_path.display(), "searching for config files");

    let opts = DiscoverOptions {
        prefix: settings.prefix.clone(),
        qinglong: settings.qinglong,
    };
    let files = locate(&settings.config_path, &opts);
    if files.is_empty() {
        bail!(
            "no config files found under {}",
            settings.config_path.display()
        );
    }
    info!(count = files.len(), "found config files");

    if !(cli.autorun() || settings.autorun) {
        let interrupt = PromptInterrupt::install()?;
        if !confirm_start(&files)? {
            info!("aborted at confirmation prompt");
            return Ok(exit_codes::OK);
        }
        interrupt.prompt_over();
    }

    let engine_cfg = load_engine_config(&settings.engine_config_path)
        .with_context(|| format!("load {}", settings.engine_config_path.display()))?;
    let engine = ProcessEngine::new(&engine_cfg).context("configure task engine")?;
    let batch_cfg = BatchConfig {
        delay_secs: engine_cfg.delay_min_secs..=engine_cfg.delay_max_secs,
    };

    let report = run_batch(&files, &engine, &batch_cfg);
    let summary = report.render();
    let overall = report.overall();
    info!("{summary}");

    let notifier = notifier_from_config(&engine_cfg.notify);
    if let Err(err) = notifier.push(overall.code(), &summary) {
        warn!("push notification failed: {err:#}");
    }

    Ok(overall.code())
}

/// Interrupt policy around the confirmation prompt.
///
/// Ctrl+C while the prompt is up aborts the whole run cleanly with exit 0;
/// once the batch starts, the default disposition applies again (there is no
/// mid-batch cancellation).
struct PromptInterrupt {
    prompt_active: Arc<AtomicBool>,
    batch_started: Arc<AtomicBool>,
}

impl PromptInterrupt {
    fn install() -> Result<Self> {
        let prompt_active = Arc::new(AtomicBool::new(true));
        let batch_started = Arc::new(AtomicBool::new(false));
        flag::register_conditional_shutdown(SIGINT, exit_codes::OK, Arc::clone(&prompt_active))
            .context("register prompt interrupt handler")?;
        flag::register_conditional_default(SIGINT, Arc::clone(&batch_started))
            .context("register default interrupt handler")?;
        Ok(Self {
            prompt_active,
            batch_started,
        })
    }

    fn prompt_over(&self) {
        self.prompt_active.store(false, Ordering::SeqCst);
        self.batch_started.store(true, Ordering::SeqCst);
    }
}

/// List the discovered files and block on an Enter prompt.
///
/// EOF, an interrupted read, or any other read error counts as abort; the
/// caller exits cleanly with code 0.
fn confirm_start(files: &[PathBuf]) -> Result<bool> {
    let listing: Vec<String> = files.iter().map(|file| file.display().to_string()).collect();
    println!("找到 {} 个配置文件:\n{}", files.len(), listing.join("\n"));
    print!("按回车开始执行，或 Ctrl+C 退出: ");
    std::io::stdout().flush().context("flush stdout")?;

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) => Ok(false),
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}
