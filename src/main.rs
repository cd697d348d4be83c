use std::path::PathBuf;

use clap::Parser;

use ghostfile::models::request::MirrorRequest;

#[derive(Parser, Debug)]
#[command(
    name = "ghostfile",
    version,
    about = "Mirror a directory tree as empty placeholder files"
)]
struct Cli {
    /// Directory to mirror
    source: PathBuf,

    /// Where the placeholder tree is created
    destination: PathBuf,

    /// Files created concurrently per batch
    #[arg(short = 'b', long)]
    batch_size: Option<usize>,

    /// Maximum concurrent directory reads while scanning
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Descend into symlinked directories instead of creating a placeholder for the link
    #[arg(long)]
    follow_symlinks: bool,

    /// Scan the source and report counts without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Only report the final outcome
    #[arg(short, long)]
    quiet: bool,

    /// Log every file that could not be created
    #[arg(long)]
    verbose_skips: bool,

    /// Write the operation report as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Write the timestamped operation log as text
    #[arg(long)]
    export_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (logs to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = ghostfile::config::settings::Settings::default().with_overrides(
        cli.batch_size,
        cli.concurrency,
        cli.follow_symlinks,
        cli.verbose_skips,
    );
    tracing::debug!(?settings, "settings resolved");

    let request = MirrorRequest::new(cli.source, cli.destination);
    let mut app = ghostfile::app::App::new(request, settings, cli.quiet);

    let report = if cli.dry_run {
        app.preview().await?
    } else {
        app.run().await?
    };

    if let Some(ref path) = cli.export_json {
        ghostfile::export::json::export_json(&report, path)?;
        println!("Exported to: {}", path.display());
    }
    if let Some(ref path) = cli.export_log {
        ghostfile::export::text::export_log(&report, path)?;
        println!("Exported to: {}", path.display());
    }

    let summary = &report.summary;
    println!(
        "{}: {}/{} items ({} ms)",
        summary.outcome, summary.completed, summary.total, summary.elapsed_ms
    );

    let code = ghostfile::app::exit_code(&summary.outcome);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
