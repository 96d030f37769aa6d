use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storysheet", version)]
struct Cli {
    /// JSON config file. `STORYSHEET_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `storysheet=trace`. Falls back to `RUST_LOG`, then `info`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose the layout, props and style reference sheets as PNGs.
    Compose(ComposeArgs),
    /// Compose the references, then generate the final storyboard sheet.
    Generate(GenerateArgs),
    /// Write an empty white storyboard frame.
    BlankFrame(BlankFrameArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `layout.png`, `props.png` and `style.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Print how many font faces are available for labels.
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scene description.
    #[arg(long)]
    prompt: String,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BlankFrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());
    let cfg = storysheet::Config::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Compose(args) => cmd_compose(&cfg, args),
        Command::Generate(args) => cmd_generate(&cfg, args),
        Command::BlankFrame(args) => cmd_blank_frame(args),
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compose(
    cfg: &storysheet::Config,
    collections: &storysheet::Collections,
) -> anyhow::Result<storysheet::ReferenceSet> {
    let coordinator = storysheet::Coordinator::new(storysheet::ComposeContext::from_config(cfg));
    match coordinator.refresh(collections) {
        storysheet::PipelineState::Ready { refs, .. } => Ok((*refs).clone()),
        storysheet::PipelineState::Failed { message, .. } => {
            anyhow::bail!("composing references failed: {message}")
        }
        storysheet::PipelineState::Idle => anyhow::bail!("no pipeline run was published"),
    }
}

fn cmd_compose(cfg: &storysheet::Config, args: ComposeArgs) -> anyhow::Result<()> {
    if args.dump_fonts {
        let labels = storysheet::LabelRenderer::new(&cfg.font_dirs);
        eprintln!("label fonts: {} faces", labels.face_count());
    }

    let collections = storysheet::load_project(&args.in_path)?;
    let refs = compose(cfg, &collections)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for role in storysheet::Role::ALL {
        match refs.get(role) {
            Some(composite) => {
                let path = args.out_dir.join(format!("{}.png", role.name()));
                write_bytes(&path, composite.image.as_bytes())?;
                eprintln!(
                    "{}: wrote {} ({}x{})",
                    role.caption(),
                    path.display(),
                    composite.width,
                    composite.height
                );
            }
            None => eprintln!("{}: no items, skipped", role.caption()),
        }
    }
    Ok(())
}

fn cmd_generate(cfg: &storysheet::Config, args: GenerateArgs) -> anyhow::Result<()> {
    let collections = storysheet::load_project(&args.in_path)?;
    let refs = compose(cfg, &collections)?;
    if refs.is_empty() {
        tracing::warn!("project has no frames, props or styles; generating from the prompt alone");
    }

    let client = storysheet::client_from_config(cfg)?;
    let credentials = client.credentials();
    let request = storysheet::GenerationRequest::new(args.prompt, &refs, cfg);
    let mut session = storysheet::GenerationSession::new(&client, &client, credentials.as_ref());
    let image = session.run(&request, &collections.props.descriptions())?;

    write_bytes(&args.out, image.as_bytes())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_blank_frame(args: BlankFrameArgs) -> anyhow::Result<()> {
    let frame = storysheet::blank_frame()?;
    write_bytes(&args.out, frame.as_bytes())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
