use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lenticular", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every frame of a project to numbered images.
    Export(ExportArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Compute 3D disparity for every object and write the updated project.
    Disparity(DisparityArgs),
    /// Print the single-view zone width and zone distance for a viewing geometry.
    Zone(ZoneArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory image sources are resolved against. Defaults to the project's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Output path pattern; `%i` becomes the 1-based frame number.
    #[arg(long)]
    out: String,

    /// Encoder quality (1-100), used by JPEG.
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Render frames on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker count for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory image sources are resolved against. Defaults to the project's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct GeometryArgs {
    /// Eye-to-print distance in inches.
    #[arg(long, default_value_t = 20.0)]
    view_distance: f64,

    /// Full lens viewing angle in degrees.
    #[arg(long, default_value_t = 30.0)]
    view_angle: f64,

    /// Nearest allowed layer depth in inches.
    #[arg(long, default_value_t = 2.0)]
    foreground: f64,

    /// Farthest allowed layer depth in inches (negative, behind the print).
    #[arg(long, default_value_t = -2.0, allow_negative_numbers = true)]
    background: f64,
}

impl GeometryArgs {
    fn geometry(&self) -> lenticular::ViewingGeometry {
        lenticular::ViewingGeometry {
            view_distance_in: self.view_distance,
            view_angle_deg: self.view_angle,
            foreground_in: self.foreground,
            background_in: self.background,
        }
    }
}

#[derive(Parser, Debug)]
struct DisparityArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output project JSON. Defaults to overwriting the input.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    geometry: GeometryArgs,
}

#[derive(Parser, Debug)]
struct ZoneArgs {
    /// Frame count.
    #[arg(long)]
    frames: u32,

    #[command(flatten)]
    geometry: GeometryArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Disparity(args) => cmd_disparity(args),
        Command::Zone(args) => cmd_zone(args),
    }
}

fn read_project(path: &Path) -> anyhow::Result<lenticular::Project> {
    lenticular::Project::from_path(path)
        .with_context(|| format!("load project '{}'", path.display()))
}

fn load_assets(
    project: &lenticular::Project,
    in_path: &Path,
    assets: Option<&Path>,
) -> anyhow::Result<lenticular::ImageStore> {
    let root = assets.unwrap_or_else(|| in_path.parent().unwrap_or_else(|| Path::new(".")));
    Ok(lenticular::ImageStore::prepare(project, root)?)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    let store = load_assets(&project, &args.in_path, args.assets.as_deref())?;

    let opts = lenticular::ExportOpts {
        pattern: args.out,
        quality: args.quality,
        threading: lenticular::ExportThreading {
            parallel: args.parallel,
            threads: args.threads,
        },
    };
    let stats = lenticular::export_project(&project, &store, &opts)?;
    eprintln!(
        "wrote {} frames ({} draws) to {}",
        stats.frames_written, stats.objects_drawn, opts.pattern
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    use lenticular::Rasterizer as _;

    let project = read_project(&args.in_path)?;
    let store = load_assets(&project, &args.in_path, args.assets.as_deref())?;

    let mut raster = lenticular::CpuRasterizer::new(&store);
    let drawn = lenticular::compose_frame(
        &project,
        lenticular::FrameIndex(args.frame),
        &store,
        &mut raster,
    )?;
    raster.export_canvas(&args.out, 100)?;
    eprintln!("wrote {} ({drawn} objects)", args.out.display());
    Ok(())
}

fn cmd_disparity(args: DisparityArgs) -> anyhow::Result<()> {
    let mut project = read_project(&args.in_path)?;
    let geometry = args.geometry.geometry();
    let updated = lenticular::apply_disparity(&mut project, &geometry)?;

    let out = args.out.unwrap_or(args.in_path);
    project
        .to_path(&out)
        .with_context(|| format!("write project '{}'", out.display()))?;
    eprintln!("updated {updated} objects, wrote {}", out.display());
    Ok(())
}

fn cmd_zone(args: ZoneArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.frames > 0, "--frames must be > 0");
    let geometry = args.geometry.geometry();
    geometry.validate()?;
    println!(
        "single view zone width: {:.4} in",
        geometry.single_view_zone_width(args.frames)
    );
    println!("zone distance: {} frames", geometry.zone_distance(args.frames));
    Ok(())
}
