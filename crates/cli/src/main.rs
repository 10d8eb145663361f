use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facemetric_core::capture::domain::frame_source::FrameSource;
use facemetric_core::capture::infrastructure::image_file_source::ImageFileSource;
use facemetric_core::capture::infrastructure::memory_image_source::MemoryImageSource;
use facemetric_core::detection::domain::landmark_detector::LandmarkDetector;
use facemetric_core::detection::infrastructure::model_resolver;
use facemetric_core::detection::infrastructure::onnx_face_mesh_detector::OnnxFaceMeshDetector;
use facemetric_core::pipeline::score_image_use_case::ScoreImageUseCase;
use facemetric_core::shared::constants::{
    FACE_MESH_MODEL_NAME, FACE_MESH_MODEL_URL, IMAGE_EXTENSIONS,
};

/// Facial scoring from images and live camera capture.
#[derive(Parser)]
#[command(name = "facemetric")]
struct Cli {
    /// Path to an image file. If not set, use the camera.
    #[arg(long, short)]
    image: Option<PathBuf>,

    /// Read encoded image bytes from standard input instead of a file.
    #[arg(long)]
    stdin: bool,

    /// Camera device index.
    #[arg(long, default_value = "0")]
    camera: usize,

    /// With the camera, stop after this many frames and report the average.
    #[arg(long)]
    frames: Option<usize>,

    /// Face presence confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Use a local face mesh model instead of the cached/downloaded one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Print the result as JSON instead of prose.
    #[arg(long)]
    json: bool,
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

    let detector = build_detector(&cli)?;

    if cli.stdin {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        run_single(Box::new(MemoryImageSource::new(bytes)), detector, cli.json)
    } else if let Some(ref image) = cli.image {
        run_single(Box::new(ImageFileSource::new(image)), detector, cli.json)
    } else {
        run_camera(&cli, detector)
    }
}

fn run_single(
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = ScoreImageUseCase::new(source, detector);
    let report = use_case.execute()?;

    if let Some(b) = report.breakdown {
        log::debug!(
            "symmetry {:.1}, size {:.1}, center {:.1}",
            b.symmetry,
            b.size,
            b.center
        );
    } else {
        log::info!("no face detected");
    }

    if json {
        println!("{}", serde_json::json!({ "score": report.score }));
    } else {
        println!("Facial score: {}", report.score);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn run_camera(
    cli: &Cli,
    detector: Box<dyn LandmarkDetector>,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use facemetric_core::capture::infrastructure::v4l_camera_source::V4lCameraSource;
    use facemetric_core::pipeline::score_stream_use_case::{FrameObserver, ScoreStreamUseCase};
    use facemetric_core::pipeline::session_score::SessionScore;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let observer: FrameObserver = Box::new(move |frame, score| {
        log::info!("frame {frame}: {score}");
        !stop.load(Ordering::SeqCst)
    });

    let source: Box<dyn FrameSource> = Box::new(V4lCameraSource::new(cli.camera));
    let mut use_case = ScoreStreamUseCase::new(source, detector, cli.frames, Some(observer));

    match use_case.execute()? {
        SessionScore::Average { score, frames } => {
            if cli.json {
                println!("{}", serde_json::json!({ "score": score, "frames": frames }));
            } else {
                println!("Facial score (average over {frames} frames): {score}");
            }
            Ok(())
        }
        SessionScore::NoFrames => Err("no frames captured".into()),
    }
}

#[cfg(not(target_os = "linux"))]
fn run_camera(
    _cli: &Cli,
    _detector: Box<dyn LandmarkDetector>,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("camera capture is only supported on Linux".into())
}

fn build_detector(cli: &Cli) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {FACE_MESH_MODEL_NAME}");
            let path = model_resolver::resolve(
                FACE_MESH_MODEL_NAME,
                FACE_MESH_MODEL_URL,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };
    Ok(Box::new(OnnxFaceMeshDetector::new(
        &model_path,
        cli.confidence,
    )?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.stdin && cli.image.is_some() {
        return Err("--image and --stdin are mutually exclusive".into());
    }
    if let Some(ref image) = cli.image {
        if !image.exists() {
            return Err(format!("Input file not found: {}", image.display()).into());
        }
        if !is_image(image) {
            log::warn!(
                "unrecognized image extension on {}; attempting to decode anyway",
                image.display()
            );
        }
    }
    if (cli.stdin || cli.image.is_some()) && cli.frames.is_some() {
        return Err("--frames only applies to camera capture".into());
    }
    if cli.frames == Some(0) {
        return Err("Frame limit must be positive".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(ref model) = cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face mesh model... {pct}%");
    } else {
        eprint!("\rDownloading face mesh model... {downloaded} bytes");
    }
}
