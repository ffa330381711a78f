use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use parking_lot::Mutex;
use qr_scanner::front::{Shell, write_results};
use qr_scanner::session::ScanSession;
use qr_scanner::source::{CameraProvider, SystemCameras};
use qr_scanner::worker::{ScanEvent, ScanWorker, WorkerSettings};
use qr_scanner::{ExportFormat, ScanConfig, SourceRequest, logging, scan_blocking, tools};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "qrscan",
    version,
    about = "Scan QR codes from a webcam, an image file or a directory of images"
)]
struct Cli {
    /// Start the interactive scanner (the default when no mode is given)
    #[arg(long, conflicts_with_all = ["webcam", "image", "directory"])]
    gui: bool,

    /// Scan frames from a camera
    #[arg(long, conflicts_with_all = ["image", "directory"])]
    webcam: bool,

    /// Webcam scan length in seconds, 0 scans until stopped
    #[arg(long, value_name = "SECONDS")]
    duration: Option<u64>,

    /// Do not echo detections live or listen for the quit key
    #[arg(long)]
    no_preview: bool,

    /// Camera index
    #[arg(long, value_name = "INDEX", default_value_t = 0)]
    device: u32,

    /// Scan a single image file
    #[arg(long, value_name = "PATH", conflicts_with = "directory")]
    image: Option<PathBuf>,

    /// Scan every image under a directory
    #[arg(long, value_name = "PATH")]
    directory: Option<PathBuf>,

    /// Only scan the top level of --directory
    #[arg(long)]
    no_recursive: bool,

    /// Scan at most this many files from --directory, in path order
    #[arg(long, value_name = "N")]
    max_files: Option<usize>,

    /// Write results here (.json for JSON, anything else for text)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Force the output format
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    format: Option<ExportFormat>,

    /// Drop repeated payloads (default for webcam scans)
    #[arg(long, conflicts_with = "no_dedup")]
    dedup: bool,

    /// Keep repeated payloads (default for image and directory scans)
    #[arg(long)]
    no_dedup: bool,

    /// Record symbols that were located but could not be decoded
    #[arg(long)]
    keep_undecoded: bool,

    /// Decode directory images in parallel
    #[arg(long)]
    parallel: bool,

    /// Append logs to this file instead of qr_scanner.log ("-" disables it)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Downscale images whose longer side exceeds this many pixels
    #[arg(long, value_name = "PIXELS")]
    max_dim: Option<u32>,
}

fn parse_format(value: &str) -> Result<ExportFormat, qr_scanner::ScanError> {
    value.parse()
}

impl Cli {
    /// Environment defaults with command-line overrides applied.
    fn config(&self) -> ScanConfig {
        self.apply(ScanConfig::from_env())
    }

    fn apply(&self, mut config: ScanConfig) -> ScanConfig {
        if self.dedup {
            config.dedup = Some(true);
        } else if self.no_dedup {
            config.dedup = Some(false);
        }
        config.keep_undecoded |= self.keep_undecoded;
        config.parallel |= self.parallel;
        if let Some(secs) = self.duration {
            config.webcam_duration = Duration::from_secs(secs);
        }
        if let Some(max_dim) = self.max_dim {
            config.max_dimension = (max_dim > 0).then_some(max_dim);
        }
        if let Some(path) = &self.log_file {
            config.log.path = (path.as_os_str() != "-").then(|| path.clone());
        }
        config
    }

    /// `None` means the interactive front end.
    fn request(&self, config: &ScanConfig) -> Option<SourceRequest> {
        if self.gui {
            return None;
        }
        if self.webcam {
            return Some(SourceRequest::webcam(
                self.device,
                config.webcam_duration,
                !self.no_preview,
            ));
        }
        if let Some(path) = &self.image {
            return Some(SourceRequest::image(path));
        }
        self.directory.as_ref().map(|path| {
            SourceRequest::directory(path, !self.no_recursive).with_limit(self.max_files)
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();
    let _log = logging::init(&config.log);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &ScanConfig) -> Result<()> {
    let cameras: Arc<dyn CameraProvider> = Arc::new(SystemCameras);
    let Some(request) = cli.request(config) else {
        info!("Starting interactive scanner");
        let mut shell = Shell::new(config.clone(), cameras, io::stdout()).with_device(cli.device);
        shell
            .run(BufReader::new(io::stdin()))
            .context("interactive scanner failed")?;
        return Ok(());
    };

    let mut session = match &request {
        SourceRequest::Webcam(_) => scan_webcam(request.clone(), config, cameras)?,
        _ => scan_blocking(&request, config).map(|(session, _)| session)?,
    };

    let records = session.snapshot();
    let mut stdout = io::stdout().lock();
    write_results(&mut stdout, &records)?;

    let target = cli.output.clone().or_else(|| {
        (!records.is_empty()).then(|| {
            tools::default_output_path(Local::now(), cli.format.unwrap_or(ExportFormat::Json))
        })
    });
    if let Some(path) = target {
        let format = session
            .export(&path, cli.format)
            .with_context(|| format!("could not save results to {}", path.display()))?;
        writeln!(stdout, "\nResults saved to {} ({format})", path.display())?;
    }
    Ok(())
}

/// Run a camera scan on a worker, echoing detections and listening for `q`
/// on stdin when preview is on.
fn scan_webcam(
    request: SourceRequest,
    config: &ScanConfig,
    cameras: Arc<dyn CameraProvider>,
) -> Result<ScanSession> {
    let preview = matches!(&request, SourceRequest::Webcam(options) if options.preview);
    let session = ScanSession::shared(config.dedup_for(request.kind()));
    let invoker = Arc::new(qr_scanner::decoder::DecodeInvoker::new(
        qr_scanner::decoder::QrDecoder::new(),
        config.invoker_options(),
    ));
    let settings = WorkerSettings {
        max_dimension: config.max_dimension,
        parallel: config.parallel,
    };
    let worker = ScanWorker::spawn(request, settings, invoker, cameras, Arc::clone(&session))?;

    if preview {
        println!("Scanning webcam. Type q and press Enter to stop.");
        let cancel = worker.cancel_handle();
        let listener = thread::Builder::new()
            .name("qr-quit-key".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    match line {
                        Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                            cancel.cancel();
                            return;
                        }
                        Ok(_) => {}
                        Err(_) => return,
                    }
                }
            });
        if let Err(err) = listener {
            warn!("quit key unavailable: {err}");
        }
    }

    let mut failure = None;
    for event in worker.events().iter() {
        match event {
            ScanEvent::Detected(record) if preview => {
                let rect = &record.bounding_rect;
                println!(
                    "New QR code detected: {} at ({}, {}) {}x{}",
                    record.data, rect.left, rect.top, rect.width, rect.height
                )
            }
            ScanEvent::Failed(err) => failure = Some(err),
            _ => {}
        }
    }
    worker.join()?;
    if let Some(err) = failure {
        return Err(anyhow!(err).context("webcam scan failed"));
    }

    Arc::try_unwrap(session)
        .map(Mutex::into_inner)
        .map_err(|_| anyhow!("scan session is still shared after the worker exited"))
}
