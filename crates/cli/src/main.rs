use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use faceprep_core::detection::domain::face_landmarker::FaceLandmarker;
use faceprep_core::detection::infrastructure::onnx_landmark_predictor::OnnxLandmarkPredictor;
use faceprep_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use faceprep_core::pipeline::annotate_images_use_case::AnnotateImagesUseCase;
use faceprep_core::pipeline::convert_config::ConvertConfig;
use faceprep_core::pipeline::convert_dataset_use_case::ConvertDatasetUseCase;
use faceprep_core::pipeline::convert_utterance_use_case::ConvertUtteranceUseCase;
use faceprep_core::pipeline::dataset_executor::WorkerFactory;
use faceprep_core::pipeline::group_utterances_use_case::GroupUtterancesUseCase;
use faceprep_core::pipeline::image_statistics_use_case::ImageStatisticsUseCase;
use faceprep_core::pipeline::infrastructure::threaded_dataset_executor::ThreadedDatasetExecutor;
use faceprep_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use faceprep_core::pipeline::render_landmarks_use_case::RenderLandmarksUseCase;
use faceprep_core::pipeline::resize_frames_use_case::ResizeFramesUseCase;
use faceprep_core::rendering::infrastructure::renderer_factory::{create_renderer, RenderKind};
use faceprep_core::shared::constants::{
    IMAGE_OUTPUT_EXTENSION, LANDMARK_IMAGE_SIZE, MASK_OUTPUT_EXTENSION,
    STATS_FRAMES_PER_UTTERANCE, TARGET_SIZE,
};
use faceprep_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use faceprep_core::video::infrastructure::image_file_reader::ImageFileReader;
use faceprep_core::video::infrastructure::image_file_writer::ImageFileWriter;
use faceprep_core::video::infrastructure::npy_landmark_store::NpyLandmarkStore;

/// Face-centred dataset preparation for talking-head videos and images.
#[derive(Parser)]
#[command(name = "faceprep")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert <root>/<actor>/<utterance> videos into aligned crops and landmarks.
    Convert(ConvertArgs),
    /// Write landmarks (and optional masks / line images) for a tree of images.
    Annotate(AnnotateArgs),
    /// Render stored landmarks as point or line images.
    Render(RenderArgs),
    /// Per-channel mean and std of a frame dataset.
    Stats(StatsArgs),
    /// Box-average aligned frames down to a smaller size.
    Resize(ResizeArgs),
    /// Move flat <actor>/<utterance>-<NNN> frames into utterance folders.
    Group(GroupArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// YOLO face detection model (.onnx).
    #[arg(long)]
    detector_model: PathBuf,

    /// 68-point landmark regression model (.onnx).
    #[arg(long)]
    landmark_model: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// ONNX Runtime intra-op threads per session.
    #[arg(long, default_value = "1")]
    threads: usize,
}

#[derive(Args)]
struct ConvertArgs {
    /// Root of the <actor>/<utterance>.mp4 videos.
    video_root: PathBuf,

    /// Output root for aligned frames.
    #[arg(long)]
    image_root: PathBuf,

    /// Output root for normalised landmarks.
    #[arg(long)]
    landmark_root: PathBuf,

    /// Side length of the written crops.
    #[arg(long, default_value_t = TARGET_SIZE)]
    target_size: u32,

    /// Utterances converted in parallel.
    #[arg(long, default_value = "1")]
    workers: usize,

    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Args)]
struct AnnotateArgs {
    /// Root of the images to annotate (searched recursively).
    image_root: PathBuf,

    /// Output root for landmarks.
    #[arg(long)]
    landmark_root: PathBuf,

    /// Output root for face masks.
    #[arg(long)]
    mask_root: Option<PathBuf>,

    /// Output root for landmark line images.
    #[arg(long)]
    line_root: Option<PathBuf>,

    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Args)]
struct RenderArgs {
    /// Root of the <actor>/<utterance>/<NNN>.npy landmarks.
    landmark_root: PathBuf,

    /// Output root for the rendered images.
    target_root: PathBuf,

    /// Representation: points or lines.
    #[arg(long, default_value = "points")]
    kind: String,

    /// Canvas side length.
    #[arg(long, default_value_t = LANDMARK_IMAGE_SIZE)]
    size: u32,
}

#[derive(Args)]
struct StatsArgs {
    /// Root of the <actor>/<utterance>/ frame directories.
    root: PathBuf,

    /// Compute statistics on grayscale frames.
    #[arg(long)]
    gray: bool,

    /// Frames sampled per utterance.
    #[arg(long, default_value_t = STATS_FRAMES_PER_UTTERANCE)]
    samples: usize,

    /// Seed for a reproducible sample.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct ResizeArgs {
    /// Root of the <actor>/<utterance>/ frame directories.
    source_root: PathBuf,

    /// Output root for the resized frames.
    target_root: PathBuf,

    /// Target frame height; the downsampling factor is height / size.
    #[arg(long, default_value_t = TARGET_SIZE)]
    size: u32,
}

#[derive(Args)]
struct GroupArgs {
    /// Root of the <actor>/ directories, rewritten in place.
    root: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Annotate(args) => run_annotate(args),
        Command::Render(args) => run_render(args),
        Command::Stats(args) => run_stats(args),
        Command::Resize(args) => run_resize(args),
        Command::Group(args) => run_group(args),
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConvertConfig::new(args.image_root, args.landmark_root);
    config.target_size = args.target_size;
    config.workers = args.workers;
    log::info!(
        "Crops of {0}x{0}, detection at {1} rows, {2} workers",
        config.target_size,
        config.detection_height(),
        config.workers
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    let factory = worker_factory(&config, args.models, cancelled.clone());

    let mut use_case = ConvertDatasetUseCase::new(
        Box::new(ThreadedDatasetExecutor::new(config.workers)),
        Box::new(StdoutPipelineLogger::new(1, "utterances")),
        config,
    );
    let report = use_case.execute(&args.video_root, factory, cancelled)?;
    log::info!(
        "{} utterances: {} frames written, {} skipped, {} without face",
        report.utterances,
        report.frames_written,
        report.frames_skipped,
        report.frames_without_face
    );
    Ok(())
}

/// Each worker loads its own ONNX sessions and decoder.
fn worker_factory(
    config: &ConvertConfig,
    models: ModelArgs,
    cancelled: Arc<AtomicBool>,
) -> Arc<WorkerFactory> {
    let config = config.clone();
    Arc::new(move || -> Result<ConvertUtteranceUseCase, Box<dyn std::error::Error>> {
        let reader = FfmpegReader::new().with_output_height(config.detection_height());
        Ok(ConvertUtteranceUseCase::new(
            Box::new(reader),
            build_landmarker(&models)?,
            Box::new(ImageFileWriter::new()),
            Box::new(NpyLandmarkStore::new()),
            &config,
            cancelled.clone(),
        ))
    })
}

fn run_annotate(args: AnnotateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = AnnotateImagesUseCase::new(
        Box::new(ImageFileReader::new()),
        build_landmarker(&args.models)?,
        Box::new(NpyLandmarkStore::new()),
        Box::new(ImageFileWriter::new()),
        args.landmark_root,
        Box::new(StdoutPipelineLogger::new(100, "images")),
        Arc::new(AtomicBool::new(false)),
    );
    if let Some(root) = args.mask_root {
        use_case = use_case.with_derived(root, create_renderer(RenderKind::Mask), MASK_OUTPUT_EXTENSION);
    }
    if let Some(root) = args.line_root {
        use_case =
            use_case.with_derived(root, create_renderer(RenderKind::Lines), IMAGE_OUTPUT_EXTENSION);
    }

    let report = use_case.execute(&args.image_root)?;
    log::info!(
        "{} images: {} annotated, {} without face",
        report.images,
        report.annotated,
        report.without_face
    );
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = RenderLandmarksUseCase::new(
        Box::new(NpyLandmarkStore::new()),
        create_renderer(parse_render_kind(&args.kind)),
        Box::new(ImageFileWriter::new()),
        args.size,
        Box::new(StdoutPipelineLogger::new(500, "files")),
    );
    let written = use_case.execute(&args.landmark_root, &args.target_root)?;
    log::info!("{written} images written to {}", args.target_root.display());
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = ImageStatisticsUseCase::new(Box::new(ImageFileReader::new()), args.gray, args.seed)
        .with_samples_per_utterance(args.samples);
    let stats = use_case.execute(&args.root)?;
    println!(
        "{} frames used from {} utterances",
        stats.frames, stats.utterances
    );
    println!("Mean: {:?}", stats.mean);
    println!("Std: {:?}", stats.std);
    Ok(())
}

fn run_resize(args: ResizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = ResizeFramesUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        args.size,
        Box::new(StdoutPipelineLogger::new(500, "frames")),
    );
    let written = use_case.execute(&args.source_root, &args.target_root)?;
    log::info!("{written} frames written to {}", args.target_root.display());
    Ok(())
}

fn run_group(args: GroupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = GroupUtterancesUseCase::new(Box::new(StdoutPipelineLogger::new(1, "actors")));
    let moved = use_case.execute(&args.root)?;
    log::info!("{moved} files grouped under {}", args.root.display());
    Ok(())
}

fn build_landmarker(models: &ModelArgs) -> Result<FaceLandmarker, Box<dyn std::error::Error>> {
    let detector =
        OnnxYoloDetector::new(&models.detector_model, models.confidence, models.threads)?;
    let predictor = OnnxLandmarkPredictor::new(&models.landmark_model, models.threads)?;
    Ok(FaceLandmarker::new(Box::new(detector), Box::new(predictor)))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Convert(args) => {
            require_dir(&args.video_root)?;
            validate_models(&args.models)?;
            if args.target_size == 0 {
                return Err("Target size must be positive".into());
            }
            if args.workers == 0 {
                return Err("Workers must be at least 1".into());
            }
        }
        Command::Annotate(args) => {
            require_dir(&args.image_root)?;
            validate_models(&args.models)?;
        }
        Command::Render(args) => {
            require_dir(&args.landmark_root)?;
            if args.kind != "points" && args.kind != "lines" {
                return Err(format!("Kind must be 'points' or 'lines', got '{}'", args.kind).into());
            }
            if args.size == 0 {
                return Err("Size must be positive".into());
            }
        }
        Command::Stats(args) => {
            require_dir(&args.root)?;
            if args.samples == 0 {
                return Err("Samples must be at least 1".into());
            }
        }
        Command::Resize(args) => {
            require_dir(&args.source_root)?;
            if args.size == 0 {
                return Err("Size must be positive".into());
            }
            if args.target_root.starts_with(&args.source_root) {
                return Err("Target root must lie outside the source root".into());
            }
        }
        Command::Group(args) => require_dir(&args.root)?,
    }
    Ok(())
}

fn validate_models(models: &ModelArgs) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&models.detector_model, &models.landmark_model] {
        if !path.is_file() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&models.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            models.confidence
        )
        .into());
    }
    if models.threads == 0 {
        return Err("Threads must be at least 1".into());
    }
    Ok(())
}

fn require_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("Input directory not found: {}", path.display()).into());
    }
    Ok(())
}

fn parse_render_kind(kind: &str) -> RenderKind {
    if kind == "lines" {
        RenderKind::Lines
    } else {
        RenderKind::Points
    }
}
