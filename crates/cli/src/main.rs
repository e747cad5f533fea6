use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use proctorlens_core::analysis::domain::landmark_provider::LandmarkProvider;
use proctorlens_core::analysis::domain::object_detector::ObjectDetector;
use proctorlens_core::analysis::infrastructure::onnx_coco_detector::OnnxCocoDetector;
use proctorlens_core::analysis::infrastructure::onnx_face_mesh::OnnxFaceMesh;
use proctorlens_core::annotation::frame_annotator::FrameAnnotator;
use proctorlens_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use proctorlens_core::pipeline::annotate_media_use_case::AnnotateMediaUseCase;
use proctorlens_core::shared::constants::{
    COCO_CLASS_CELL_PHONE, COCO_MODEL_NAME, COCO_MODEL_URL, DEFAULT_FACE_CONFIDENCE,
    DEFAULT_PHONE_CONFIDENCE, FACE_MESH_MODEL_NAME, FACE_MESH_MODEL_URL, IMAGE_EXTENSIONS,
};
use proctorlens_core::shared::model_resolver;
use proctorlens_core::video::domain::image_writer::ImageWriter;
use proctorlens_core::video::domain::video_reader::VideoReader;
use proctorlens_core::video::domain::video_writer::VideoWriter;
use proctorlens_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use proctorlens_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use proctorlens_core::video::infrastructure::image_file_reader::ImageFileReader;
use proctorlens_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Head pose, eye gaze, and phone annotation for videos and images.
#[derive(Parser)]
#[command(name = "proctorlens")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Output file.
    output: PathBuf,

    /// Analyze every Nth frame; in-between frames are copied through.
    #[arg(long, default_value = "1")]
    stride: usize,

    /// Minimum confidence for mobile phone detections (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_PHONE_CONFIDENCE)]
    phone_confidence: f64,

    /// Minimum face presence score for landmark analysis (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_FACE_CONFIDENCE)]
    face_confidence: f64,

    /// Directory with pre-downloaded ONNX models.
    #[arg(long)]
    models_dir: Option<PathBuf>,
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

    let landmark_provider = build_landmark_provider(&cli)?;
    let object_detector = build_object_detector(&cli)?;
    let annotator = FrameAnnotator::new(COCO_CLASS_CELL_PHONE, cli.phone_confidence);

    if is_image(&cli.input) {
        run_image(
            &cli.input,
            &cli.output,
            landmark_provider,
            object_detector,
            annotator,
        )?;
    } else {
        run_video(
            &cli.input,
            &cli.output,
            cli.stride,
            landmark_provider,
            object_detector,
            annotator,
        )?;
    }

    Ok(())
}

fn run_image(
    input: &Path,
    output: &Path,
    landmark_provider: Box<dyn LandmarkProvider>,
    object_detector: Box<dyn ObjectDetector>,
    annotator: FrameAnnotator,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(ImageFileReader::new());
    let image_writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());

    let mut use_case = AnnotateImageUseCase::new(
        reader,
        image_writer,
        landmark_provider,
        object_detector,
        annotator,
    );
    let summary = use_case.execute(input, output)?;

    if let Some(direction) = summary.head_direction {
        log::info!("Head direction: {}", direction.as_str());
    }
    if summary.mobile_detected {
        log::warn!("Mobile phone detected in {}", input.display());
    }
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_video(
    input: &Path,
    output: &Path,
    stride: usize,
    landmark_provider: Box<dyn LandmarkProvider>,
    object_detector: Box<dyn ObjectDetector>,
    annotator: FrameAnnotator,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let writer: Box<dyn VideoWriter> = Box::new(FfmpegWriter::new());

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = AnnotateMediaUseCase::new(
        reader,
        writer,
        landmark_provider,
        object_detector,
        annotator,
        stride,
        Some(progress),
        None,
    );
    let summary = use_case.execute(input, output)?;
    eprintln!();

    log::info!(
        "Wrote {} frames ({} analyzed, {} with a phone) to {}",
        summary.frames_written,
        summary.frames_analyzed,
        summary.mobile_frames,
        output.display()
    );
    Ok(())
}

fn build_landmark_provider(
    cli: &Cli,
) -> Result<Box<dyn LandmarkProvider>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MESH_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        FACE_MESH_MODEL_NAME,
        FACE_MESH_MODEL_URL,
        cli.models_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("face mesh", d, t))),
    )?;
    eprintln!();

    Ok(Box::new(OnnxFaceMesh::new(
        &model_path,
        cli.face_confidence,
    )?))
}

fn build_object_detector(cli: &Cli) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {COCO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        COCO_MODEL_NAME,
        COCO_MODEL_URL,
        cli.models_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("object detection", d, t))),
    )?;
    eprintln!();

    Ok(Box::new(OnnxCocoDetector::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.stride == 0 {
        return Err("Stride must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.phone_confidence) {
        return Err(format!(
            "Phone confidence must be between 0.0 and 1.0, got {}",
            cli.phone_confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.face_confidence) {
        return Err(format!(
            "Face confidence must be between 0.0 and 1.0, got {}",
            cli.face_confidence
        )
        .into());
    }
    if let Some(ref dir) = cli.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
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

fn download_progress(label: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {label} model... {pct}%");
    } else {
        eprint!("\rDownloading {label} model... {downloaded} bytes");
    }
}
