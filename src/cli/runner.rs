use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stickerkit::{
    AlphaChannelSegmenter, MaskFileSegmenter, Segmenter, StickerArtifact, StickerConfig,
    StickerExporter, process_directory, process_file_to_artifact,
};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Config file values (or defaults) with command-line flags layered on top.
pub fn resolve_config(args: &CliArgs) -> Result<StickerConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            StickerConfig::from_json_file(path)?
        }
        None => StickerConfig::default(),
    };

    let params = &mut config.params;
    if let Some(format) = args.format {
        params.format = format;
    }
    if let Some(size) = args.size {
        params.target_size = size;
    }
    if let Some(threshold) = args.threshold {
        params.alpha_threshold = threshold;
    }
    if let Some(padding) = args.padding {
        params.padding_fraction = padding;
    }
    if let Some(filter) = args.filter {
        params.filter = filter;
    }
    if args.border.is_some() {
        params.border = args.border;
    }
    if args.timeout_ms.is_some() {
        params.oracle_timeout_ms = args.timeout_ms;
    }
    params.validate()?;

    let export = &mut config.export;
    if let Some(dir) = &args.cache_dir {
        export.cache_dir = dir.clone();
    }
    if let Some(dir) = &args.shared_dir {
        export.shared_dir = dir.clone();
    }
    export.sidecar |= args.sidecar;

    Ok(config)
}

/// One file through `segmenter`, which is closed whether or not the run succeeds.
fn run_with_segmenter(
    input: &Path,
    segmenter: Arc<dyn Segmenter>,
    config: &StickerConfig,
    exporter: &StickerExporter,
) -> Result<StickerArtifact, AppError> {
    let result = process_file_to_artifact(input, &segmenter, &config.params, exporter);
    segmenter.close();
    Ok(result?)
}

fn process_single_file(
    input: &Path,
    mask: Option<&Path>,
    config: &StickerConfig,
    exporter: &StickerExporter,
) -> Result<(), AppError> {
    let segmenter: Arc<dyn Segmenter> = match mask {
        Some(mask) => Arc::new(MaskFileSegmenter::new(mask)),
        None => Arc::new(AlphaChannelSegmenter),
    };
    let artifact = run_with_segmenter(input, segmenter, config, exporter)?;

    info!(
        "Successfully processed: {:?} -> {:?}",
        input,
        artifact.primary_path()
    );
    println!("{}", artifact.primary_path().display());
    match artifact.secondary_path() {
        Some(path) => println!("{}", path.display()),
        None => warn!("Sticker was not copied to {:?}", config.export.shared_dir),
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging();
    }

    let config = resolve_config(&args)?;
    let exporter = StickerExporter::new(config.export.clone(), config.params.format);
    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        if args.input.is_some() {
            return Err(AppError::Conflict {
                first: "--input",
                second: "--input-dir",
            }
            .into());
        }
        if args.mask.is_some() {
            return Err(AppError::Conflict {
                first: "--mask",
                second: "--input-dir",
            }
            .into());
        }
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Primary output directory: {:?}", config.export.cache_dir);

        let report = process_directory(
            &input_dir,
            args.mask_dir.as_deref(),
            &config.params,
            &exporter,
            args.batch,
        )?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
        for path in &report.artifacts {
            println!("{}", path.display());
        }

        if report.errors > 0 {
            return Err(AppError::BatchFailures {
                errors: report.errors,
                dir: input_dir,
            }
            .into());
        }
    } else {
        let input = args.input.as_deref().ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        process_single_file(input, args.mask.as_deref(), &config, &exporter)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use stickerkit::{OutputFormat, ResizeFilter};

    #[test]
    fn flags_override_defaults() {
        let args = CliArgs::try_parse_from([
            "stickerkit",
            "--input",
            "photo.jpg",
            "--format",
            "png",
            "--size",
            "256",
            "--filter",
            "lanczos3",
            "--border",
            "20",
            "--cache-dir",
            "/tmp/cache",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.params.format, OutputFormat::Png);
        assert_eq!(config.params.target_size, 256);
        assert_eq!(config.params.filter, ResizeFilter::Lanczos3);
        assert_eq!(config.params.border, Some(20));
        assert_eq!(config.params.alpha_threshold, 10);
        assert_eq!(config.export.cache_dir, Path::new("/tmp/cache"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "params": { "target_size": 128, "padding_fraction": 0.5 } }"#,
        )
        .unwrap();

        let config_arg = path.to_string_lossy().into_owned();
        let args =
            CliArgs::try_parse_from(["stickerkit", "--config", &config_arg, "--size", "300"])
                .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.params.target_size, 300);
        assert_eq!(config.params.padding_fraction, 0.5);
    }

    #[test]
    fn zero_size_is_rejected() {
        let args = CliArgs::try_parse_from(["stickerkit", "--size", "0"]).unwrap();
        assert!(matches!(
            resolve_config(&args),
            Err(AppError::Sticker(stickerkit::Error::InvalidArgument { .. }))
        ));
    }

    struct CountingSegmenter(std::sync::atomic::AtomicUsize);

    impl Segmenter for CountingSegmenter {
        fn segment(
            &self,
            _image: &stickerkit::RasterImage,
        ) -> Result<stickerkit::ForegroundMask, stickerkit::OracleError> {
            Err(stickerkit::OracleError::Unavailable("offline".to_string()))
        }

        fn close(&self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn segmenter_is_closed_when_the_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        stickerkit::RasterImage::new(4, 4).save(&input).unwrap();
        let args = CliArgs::try_parse_from(["stickerkit"]).unwrap();
        let mut config = resolve_config(&args).unwrap();
        config.export.cache_dir = dir.path().join("cache");
        config.export.shared_dir = dir.path().join("shared");
        let exporter = StickerExporter::new(config.export.clone(), config.params.format);

        let segmenter = Arc::new(CountingSegmenter(Default::default()));
        let shared: Arc<dyn Segmenter> = segmenter.clone();
        let err = run_with_segmenter(&input, shared, &config, &exporter).unwrap_err();
        assert!(matches!(
            err,
            AppError::Sticker(stickerkit::Error::SegmentationFailed(_))
        ));
        assert_eq!(segmenter.0.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(!dir.path().join("cache").exists());
    }

    #[test]
    fn missing_input_is_reported() {
        let args = CliArgs::try_parse_from(["stickerkit"]).unwrap();
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("--input"));
    }
}
