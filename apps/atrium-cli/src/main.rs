use anyhow::{bail, Context as _};
use atrium_assets::ModelData;
use atrium_loading::LoadPhase;
use atrium_render::{DebugTextRenderer, TickOutcome};
use atrium_scene::{resolve_target, SceneConfig, SceneContext};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atrium-cli", about = "CLI tool for atrium scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset root directory, overriding the config
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective scene config as YAML
    Config,
    /// Show the node tree of a glTF model and where the glass targets land
    Inspect {
        /// Path to a .gltf or .glb file
        model: PathBuf,
    },
    /// Load every scene asset, report progress, and replay the fade-out
    Check {
        /// Timeline sample interval in milliseconds
        #[arg(long, default_value = "500")]
        step_ms: u64,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(root) = &cli.assets {
        config.assets.root = root.clone();
    }
    Ok(config)
}

fn print_node(model: &ModelData, index: usize, depth: usize) {
    let Some(node) = model.nodes.get(index) else {
        return;
    };
    let name = model.node_name(index).unwrap_or("<unnamed>");
    let mesh = node.mesh.map(|m| format!(" mesh={m}")).unwrap_or_default();
    println!("{:indent$}[{index}] {name}{mesh}", "", indent = depth * 2);
    for &child in &node.children {
        print_node(model, child, depth + 1);
    }
}

fn inspect(path: &Path, config: &SceneConfig) -> anyhow::Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let model = ModelData::import(&bytes, path.parent())?;

    println!("Model: {}", path.display());
    println!(
        "Nodes: {}  Meshes: {}  Materials: {}  Triangles: {}",
        model.nodes.len(),
        model.meshes.len(),
        model.materials.len(),
        model.triangle_count()
    );
    for &root in &model.roots {
        print_node(&model, root, 1);
    }

    println!("Glass targets:");
    for target in &config.model.glass_targets {
        let resolution = resolve_target(&model, target);
        let landed = resolution
            .node()
            .map(|n| format!("[{n}] {}", model.node_name(n).unwrap_or("<unnamed>")))
            .unwrap_or_else(|| "not found".into());
        println!("  {} / {:?}: {landed}", target.root, target.child);
    }
    Ok(())
}

fn check(config: SceneConfig, step: Duration) -> anyhow::Result<()> {
    let total = config.loading.total();
    let mut ctx = SceneContext::new(config)?;
    let requests = ctx.begin_loading()?;
    tracing::debug!(scene = %ctx.id(), "check started");
    println!("Loading {} assets from {}", requests.len(), ctx.asset_root().dir().display());

    let (tx, rx) = mpsc::channel();
    let handles = atrium_assets::dispatch(&ctx.asset_root(), &requests, move |request, result| {
        // The receiver outlives every loader.
        let _ = tx.send((request.url, result));
    })?;

    for _ in 0..requests.len() {
        let (url, result) = rx.recv().context("loader thread exited without reporting")?;
        let status = match &result {
            Ok(asset) => format!("ok ({} bytes)", asset.byte_len),
            Err(e) => format!("FAILED: {e}"),
        };
        // Arrivals are stamped at zero so the replayed timeline starts at load end.
        ctx.on_asset_settled(Duration::ZERO, &url, result)?;
        println!("  [{}] {url} {status}", ctx.loading().progress());
    }
    for handle in handles {
        if handle.join().is_err() {
            bail!("asset loader thread panicked");
        }
    }

    let phase = ctx.phase();
    println!("Phase: {phase}");
    if ctx.screen().inform_text().is_visible() {
        println!("Overlay message: {}", ctx.screen().inform_message());
    }

    println!("Fade timeline:");
    let step = step.max(Duration::from_millis(1));
    let mut now = Duration::ZERO;
    loop {
        ctx.advance(now);
        let bar = ctx.screen().progress_bar().visual(now);
        println!(
            "  t={:>5.2}s  overlay={:.3}  bar={:.3} {:?}",
            now.as_secs_f32(),
            ctx.scene().overlay_alpha,
            bar.scale_x,
            bar.anchor
        );
        if now >= total {
            break;
        }
        now = (now + step).min(total);
    }

    let mut renderer = DebugTextRenderer::new();
    if let TickOutcome::Rendered(text) = ctx.tick(&mut renderer)? {
        print!("{text}");
    }

    if phase != LoadPhase::Complete {
        bail!("{} asset(s) failed to load", ctx.loading().failed().len());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match &cli.command {
        Commands::Info => {
            println!("atrium-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", atrium_assets::crate_info());
            println!("loading: {}", atrium_loading::crate_info());
            println!("overlay: {}", atrium_overlay::crate_info());
            println!("render: {}", atrium_render::crate_info());
            println!("scene: {}", atrium_scene::crate_info());
        }
        Commands::Config => {
            let config = load_config(&cli)?;
            print!("{}", config.to_yaml()?);
        }
        Commands::Inspect { model } => {
            let config = load_config(&cli)?;
            inspect(model, &config)?;
        }
        Commands::Check { step_ms } => {
            let config = load_config(&cli)?;
            check(config, Duration::from_millis(*step_ms))?;
        }
    }

    Ok(())
}
