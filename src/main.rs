use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use garmentkit::{init_logging, Config, DesignerSession, FileAssetLoader, SessionSnapshot};

#[derive(Parser, Debug)]
#[command(name = "garmentkit", version, long_version = garmentkit::BUILD_DATE)]
struct Cli {
    /// Config file (JSON or TOML). Defaults to the user config, if any.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved session to a zip of mockups and design layers.
    Export(ExportArgs),
    /// Print the price of every designed garment in a saved session.
    Quote(QuoteArgs),
    /// Print the default configuration as JSON.
    DefaultConfig,
    /// List font families available for text.
    Fonts,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Session snapshot JSON.
    #[arg(long)]
    snapshot: PathBuf,

    /// Directory garment photos and artwork are resolved against.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Garment type to export instead of the snapshot's selection.
    #[arg(long)]
    garment: Option<String>,

    /// Output zip path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct QuoteArgs {
    /// Session snapshot JSON.
    #[arg(long)]
    snapshot: PathBuf,

    /// Directory garment photos and artwork are resolved against.
    #[arg(long, default_value = ".")]
    assets: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(cli.config.as_deref(), args).await,
        Command::Quote(args) => cmd_quote(cli.config.as_deref(), args).await,
        Command::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&Config::default())?);
            Ok(())
        }
        Command::Fonts => {
            for family in garmentkit::designer::list_system_families() {
                println!("{}", family);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Config::load_or_default().context("load user config"),
    }
}

async fn open_session(
    config: Option<&Path>,
    assets: &Path,
    snapshot: &Path,
) -> anyhow::Result<DesignerSession> {
    let config = load_config(config)?;
    let loader = Rc::new(FileAssetLoader::new(assets));
    let session = DesignerSession::new(config, loader).context("invalid configuration")?;

    let snapshot = SessionSnapshot::load_from_file(snapshot)
        .with_context(|| format!("read snapshot '{}'", snapshot.display()))?;
    let outcome = session
        .restore_snapshot(snapshot)
        .await
        .context("restore snapshot")?;
    anyhow::ensure!(outcome.is_completed(), "snapshot restore was interrupted");
    Ok(session)
}

async fn cmd_export(config: Option<&Path>, args: ExportArgs) -> anyhow::Result<()> {
    let session = open_session(config, &args.assets, &args.snapshot).await?;
    if let Some(garment) = &args.garment {
        session
            .on_garment_changed(garment)
            .await
            .with_context(|| format!("select garment '{}'", garment))?;
    }

    let bytes = session.export_archive().await.context("export design")?;
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write archive '{}'", args.out.display()))?;

    let variant = session.variant();
    match session.quote() {
        Some(quote) => println!(
            "{}: {} bytes written to {} (subtotal {})",
            variant.garment,
            bytes.len(),
            args.out.display(),
            quote.subtotal
        ),
        None => println!(
            "{}: nothing printed, empty archive written to {}",
            variant.garment,
            args.out.display()
        ),
    }
    Ok(())
}

async fn cmd_quote(config: Option<&Path>, args: QuoteArgs) -> anyhow::Result<()> {
    let session = open_session(config, &args.assets, &args.snapshot).await?;
    let garments: Vec<String> = session.config().garments.keys().cloned().collect();

    let mut quotes = serde_json::Map::new();
    for garment in garments {
        if let Some(quote) = session.quote_for(&garment) {
            quotes.insert(garment, serde_json::to_value(quote)?);
        }
    }
    println!("{}", serde_json::to_string_pretty(&quotes)?);
    Ok(())
}
