use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audit::engine::AxeEngine;
use crate::browser::BrowserSession;
use crate::cli::config::AuditorConfig;
use crate::crawler::{CrawlEvent, CrawlOrchestrator};
use crate::report::{self, CrawlOptions, ExportFormat, Language, ReportFormatter, Translator};

/// Arguments of the `audit` command
pub struct AuditArgs {
    pub url: String,
    pub contrast: bool,
    pub output: Option<PathBuf>,
    pub format: String,
    pub lang: Option<String>,
    pub config: Option<PathBuf>,
}

/// Crawl and audit a site, print the report and optionally save it
pub async fn audit(args: AuditArgs) -> Result<()> {
    let config = AuditorConfig::load(args.config.as_deref())?;

    // Reject bad input before any browser is started
    let options = CrawlOptions::new(&args.url, args.contrast || config.audit.contrast_check)?;

    let format: ExportFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    let language = match args.lang {
        Some(lang) => lang.parse::<Language>().map_err(anyhow::Error::msg)?,
        None => config.report.language,
    };

    let translator = match &config.report.translations_file {
        Some(path) => Translator::from_file(path)?,
        None => Translator::default(),
    };

    let engine = AxeEngine::load(&config.audit.axe_script)
        .await
        .context("Failed to load the axe-core script")?;

    let session = BrowserSession::connect(config.browser.clone())
        .await
        .context("Failed to start the browser session")?;

    let orchestrator = Arc::new(CrawlOrchestrator::new(
        Arc::new(engine),
        config.browser.settle_delay(),
    ));
    let mut handle = orchestrator.spawn(options, session);

    // Ctrl-C cancels before the next page load
    let token = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling crawl");
            token.cancel();
        }
    });

    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            CrawlEvent::Progress(progress) => {
                println!("[{}/{}] {}", progress.current, progress.total, progress.label);
            }
            CrawlEvent::Finished(report) => outcome = Some(Ok(report)),
            CrawlEvent::Failed(failure) => {
                error!("{}", failure.detail);
                outcome = Some(Err(failure));
            }
        }
    }

    handle.join().await;
    interrupt.abort();

    let report = match outcome {
        Some(Ok(report)) => report,
        Some(Err(failure)) => anyhow::bail!("Audit failed: {}", failure.summary),
        None => anyhow::bail!("Audit ended without a result"),
    };

    let formatter = ReportFormatter::new(language, &translator);
    println!();
    println!("{}", formatter.render(&report));

    if let Some(path) = args.output {
        let contents = report::render(&report, format, &formatter)?;
        report::save(&contents, &path)?;
        info!("Report exported to: {}", path.display());
    }

    Ok(())
}

/// Write the default configuration file
pub async fn init_config() -> Result<()> {
    let path = AuditorConfig::default().save_as_default()?;
    println!("Default configuration written to: {}", path.display());

    Ok(())
}

/// Show the current configuration
pub async fn show_config(path: Option<PathBuf>) -> Result<()> {
    let config = AuditorConfig::load(path.as_deref())?;
    println!("Current configuration:");
    println!("{:#?}", config);

    Ok(())
}
