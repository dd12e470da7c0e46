use argh::FromArgs;
use tokio_util::sync::CancellationToken;

use tweenflow::{
    flow::FarnebackParams, imgproc::parallel::ExecutionStrategy, io::functional::read_image_layout,
    run, FsStorage, PathTemplate, RunConfig, RunSummary,
};

#[derive(FromArgs, Debug)]
/// Increase the frame rate of an image sequence with motion-compensated interpolation.
struct Args {
    /// filename template of the sequence
    #[argh(option, short = 'i', default = "String::from(\"./img_%03d.tif\")")]
    images: String,

    /// interpolation factor
    #[argh(option, short = 'f', default = "2")]
    interpolation_factor: usize,

    /// number of input images
    #[argh(option, short = 'n', default = "2")]
    number_of_images: usize,

    /// index of the first input image
    #[argh(option, default = "0")]
    first_image: usize,

    /// keep the input numbering, the originals must already sit at i * factor
    #[argh(switch)]
    no_rename: bool,

    /// number of pyramid levels of the motion estimator
    #[argh(option, default = "3")]
    levels: usize,

    /// side of the motion estimator averaging window
    #[argh(option, default = "33")]
    wside: usize,

    /// iterations per pyramid level
    #[argh(option, default = "3")]
    iters: usize,

    /// radius of the polynomial expansion
    #[argh(option, default = "5")]
    poly_n: usize,

    /// sigma of the polynomial expansion
    #[argh(option, default = "1.2")]
    poly_sigma: f32,

    /// number of threads, 0 uses all cores
    #[argh(option, default = "0")]
    threads: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    // every frame must share the layout of the first original
    let template = PathTemplate::parse(&args.images)?;
    let first = if args.no_rename {
        args.first_image * args.interpolation_factor
    } else {
        args.first_image
    };
    let layout = read_image_layout(template.path_for(first))?;
    log::info!("input frames are {layout}");

    let config = RunConfig {
        images: args.images,
        first_image: args.first_image,
        n_images: args.number_of_images,
        factor: args.interpolation_factor,
        rename: !args.no_rename,
        flow: FarnebackParams {
            levels: args.levels,
            wside: args.wside,
            iters: args.iters,
            poly_n: args.poly_n,
            poly_sigma: args.poly_sigma,
            ..Default::default()
        },
        strategy: match args.threads {
            0 => ExecutionStrategy::Parallel,
            n => ExecutionStrategy::Fixed(n),
        },
    };

    // stop after the pairs in flight when Ctrl-C is pressed
    let cancel = CancellationToken::new();
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            log::warn!("Received Ctrl-C signal. Finishing the current frames.");
            cancel.cancel();
        }
    })?;

    let summary: RunSummary = match (layout.bit_depth, layout.channels) {
        (8, 1) => run::<u8, 1, _>(&config, FsStorage::new(), cancel)?,
        (8, 3) => run::<u8, 3, _>(&config, FsStorage::new(), cancel)?,
        (8, 4) => run::<u8, 4, _>(&config, FsStorage::new(), cancel)?,
        (16, 1) => run::<u16, 1, _>(&config, FsStorage::new(), cancel)?,
        (16, 3) => run::<u16, 3, _>(&config, FsStorage::new(), cancel)?,
        (16, 4) => run::<u16, 4, _>(&config, FsStorage::new(), cancel)?,
        (depth, channels) => {
            return Err(format!("unsupported format: {depth} bits, {channels} channels").into())
        }
    };

    println!(
        "Renamed {} and interpolated {} frame(s) in {}",
        summary.renamed, summary.written, config.images
    );

    Ok(())
}
