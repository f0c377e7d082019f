use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "layerfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a filter graph and write the device-space output as a PNG.
    Render(RenderArgs),
    /// Parse and validate a filter graph, printing it back in canonical form.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Filter graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Source PNG, placed at the device origin.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Device width in pixels.
    #[arg(long)]
    width: u32,

    /// Device height in pixels.
    #[arg(long)]
    height: u32,

    /// Total transform as `a,b,c,d,e,f` (kurbo coefficient order). Identity when omitted.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    ctm: Option<Vec<f64>>,

    /// Print scratch surface counters as JSON on stderr.
    #[arg(long)]
    stats: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Filter graph JSON.
    #[arg(long)]
    graph: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_graph_json(path: &Path) -> anyhow::Result<layerfx::FilterSpec> {
    let f = File::open(path).with_context(|| format!("open graph '{}'", path.display()))?;
    let spec: layerfx::FilterSpec =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse graph JSON")?;
    spec.validate()?;
    Ok(spec)
}

fn read_source_png(path: &Path) -> anyhow::Result<layerfx::SpecialImage> {
    let img = image::open(path)
        .with_context(|| format!("read png '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(layerfx::SpecialImage::from_rgba8(w, h, img.as_raw())?)
}

fn parse_ctm(values: Option<Vec<f64>>) -> anyhow::Result<layerfx::Affine> {
    match values {
        None => Ok(layerfx::Affine::IDENTITY),
        Some(v) => {
            let coeffs: [f64; 6] = v
                .as_slice()
                .try_into()
                .map_err(|_| anyhow::anyhow!("--ctm needs 6 values, got {}", v.len()))?;
            anyhow::ensure!(coeffs.iter().all(|c| c.is_finite()), "--ctm values must be finite");
            Ok(layerfx::Affine::new(coeffs))
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.width > 0 && args.height > 0,
        "device size must be non-zero"
    );
    let width = i32::try_from(args.width).context("width out of range")?;
    let height = i32::try_from(args.height).context("height out of range")?;

    let spec = read_graph_json(&args.graph)?;
    let filter = layerfx::ImageFilter::from_spec(&spec)?;
    let ctm = parse_ctm(args.ctm)?;
    let source = args
        .source
        .as_deref()
        .map(read_source_png)
        .transpose()?
        .map(|img| (img, layerfx::Device::new(layerfx::IPoint::ZERO)));

    let factory = Arc::new(layerfx::RasterSurfaceFactory::new(
        layerfx::RasterOpts::from_env(),
    ));
    let clip = layerfx::Device::new(layerfx::IRect::new(0, 0, width, height));
    let layer = layerfx::apply_filter(&filter, ctm, clip, source, factory.clone());

    let mut canvas = vec![0u8; args.width as usize * args.height as usize * 4];
    if let Some((image, origin)) = layer.to_device() {
        blit(&mut canvas, args.width as usize, &image, origin.get());
    } else {
        tracing::info!("filter produced no visible output");
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &canvas,
        args.width,
        args.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.stats {
        let stats = factory.stats().snapshot();
        eprintln!("{}", serde_json::to_string(&stats)?);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Copy straight-alpha rows of `image` into `canvas` at `origin`. The image always lies inside
/// the device clip.
fn blit(canvas: &mut [u8], canvas_width: usize, image: &layerfx::SpecialImage, origin: layerfx::IPoint) {
    let size = image.dimensions();
    let row_len = size.width as usize * 4;
    let pixels = image.to_rgba8();
    for (y, row) in pixels.chunks_exact(row_len).enumerate() {
        let start = ((origin.y as usize + y) * canvas_width + origin.x as usize) * 4;
        canvas[start..start + row_len].copy_from_slice(row);
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let spec = read_graph_json(&args.graph)?;
    layerfx::ImageFilter::from_spec(&spec)?;
    println!("{}", spec.to_json()?);
    Ok(())
}
