use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use boothkit::{
    BackgroundSpec, Booth, BoothConfig, ComposeRequestFile, ErrorResponse, PreviewSession,
    TickStatus,
    preview::{ImageSequenceSource, InMemorySurface},
};

#[derive(Parser, Debug)]
#[command(name = "boothkit", version)]
struct Cli {
    /// Booth configuration JSON. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured output directory.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Override the configured asset root.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List layout templates as JSON.
    Templates,
    /// Compose a strip from captured photos.
    Compose(ComposeArgs),
    /// Run the live preview loop over a directory of frames and capture stills.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Request JSON (`images`, `template`, `frame`, `logo`, `background`). Image paths are
    /// relative to the request file.
    #[arg(long, conflicts_with_all = ["template", "photo"])]
    request: Option<PathBuf>,

    #[arg(long)]
    template: Option<String>,

    /// Photo file, in slot order. Repeat for each slot.
    #[arg(long)]
    photo: Vec<PathBuf>,

    /// Frame asset id.
    #[arg(long)]
    frame: Option<String>,

    /// Logo asset id.
    #[arg(long)]
    logo: Option<String>,

    /// Background asset id (recorded only; backgrounds are applied during capture).
    #[arg(long)]
    background: Option<String>,

    /// Also write the QR code PNG here.
    #[arg(long)]
    code_out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Directory of .png/.jpg frames, replayed in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// Template whose capture count bounds the roll.
    #[arg(long, default_value = "")]
    template: String,

    /// Enable green-screen replacement.
    #[arg(long)]
    keying: bool,

    /// Key intensity, 0-100.
    #[arg(long)]
    intensity: Option<f64>,

    /// Background image file.
    #[arg(long, conflicts_with = "background")]
    background_image: Option<PathBuf>,

    /// Background asset id.
    #[arg(long)]
    background: Option<String>,

    /// Solid background colour, `#rrggbb`. Used when no image is given.
    #[arg(long)]
    background_color: Option<String>,

    /// Tick at which the capture signal goes high. Repeat for several shots.
    #[arg(long)]
    capture_at: Vec<u64>,

    /// Ticks the capture signal stays high.
    #[arg(long, default_value_t = 3)]
    hold: u64,

    /// Where captured JPEGs are written.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = BoothConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = cli.assets {
        config.asset_root = dir;
    }
    boothkit::logging::init_logging(&config.logging);

    let booth = Booth::from_config(config)?;
    match cli.cmd {
        Command::Templates => cmd_templates(&booth),
        Command::Compose(args) => cmd_compose(&booth, args),
        Command::Preview(args) => cmd_preview(&booth, args),
    }
}

fn cmd_templates(booth: &Booth) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&booth.catalog().summaries())?;
    println!("{json}");
    Ok(())
}

fn cmd_compose(booth: &Booth, args: ComposeArgs) -> anyhow::Result<()> {
    let (file, base_dir) = match &args.request {
        Some(path) => (
            ComposeRequestFile::load(path)?,
            path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
        ),
        None => (
            ComposeRequestFile {
                images: args.photo,
                template_id: args.template,
                frame_id: None,
                background_id: None,
                logo_id: None,
            },
            PathBuf::from("."),
        ),
    };
    let mut file = file;
    file.frame_id = args.frame.or(file.frame_id);
    file.logo_id = args.logo.or(file.logo_id);
    file.background_id = args.background.or(file.background_id);

    let result = file
        .into_request(&base_dir)
        .and_then(|request| booth.process(&request));
    let result = match result {
        Ok(r) => r,
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
            return Err(err.into());
        }
    };

    if let Some(out) = &args.code_out {
        let code = result
            .code_image
            .as_ref()
            .context("code image was not produced")?;
        std::fs::write(out, &code.png)
            .with_context(|| format!("write code image '{}'", out.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_preview(booth: &Booth, args: PreviewArgs) -> anyhow::Result<()> {
    let mut opts = booth.preview_opts(&args.template)?;
    opts.keying = args.keying;
    if let Some(i) = args.intensity {
        opts.intensity = i;
    }

    let background = match (&args.background_image, &args.background) {
        (Some(path), _) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read background '{}'", path.display()))?;
            let img = boothkit::assets::decode::decode_rgba(&bytes)?;
            BackgroundSpec::from_selection(Some(img), args.background_color.as_deref())
        }
        (None, Some(id)) => Some(booth.background(id)?),
        (None, None) => BackgroundSpec::from_selection(None, args.background_color.as_deref()),
    };

    let source = ImageSequenceSource::open(&args.frames)?;
    let total_ticks = source.remaining() as u64;

    let mut session = PreviewSession::start(source, InMemorySurface::new(), &opts);
    session.set_background(background);

    let hold = args.hold.max(1);
    for tick in 0..total_ticks {
        let signal = args
            .capture_at
            .iter()
            .any(|&at| tick >= at && tick < at + hold);
        let outcome = session.tick(signal);
        if outcome.status == TickStatus::Stopped {
            break;
        }
    }
    let stats = session.stats();
    let roll = session.finish();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create '{}'", args.out_dir.display()))?;
    let mut written = Vec::new();
    for photo in roll.photos() {
        let path = args.out_dir.join(format!("capture-{:02}.jpg", photo.index + 1));
        std::fs::write(&path, &photo.jpeg[..])
            .with_context(|| format!("write capture '{}'", path.display()))?;
        written.push(path);
    }

    let summary = serde_json::json!({
        "ticks": stats.ticks,
        "presented": stats.presented,
        "skipped": stats.skipped,
        "captured": stats.captured,
        "photos": written,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
