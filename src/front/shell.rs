//! Interactive front end.
//!
//! Reads one command per line and drives scans through a [`ScanWorker`].
//! Webcam scans run in the background while commands keep being read; image
//! and directory scans are waited for before the next command. Results of
//! finished scans accumulate in a results pane until `clear`.

use super::write_results;
use crate::config::ScanConfig;
use crate::decoder::{DecodeInvoker, QrDecoder};
use crate::error::{Result, ScanError};
use crate::export::{self, ExportFormat};
use crate::models::{ScanRecord, SourceKind};
use crate::session::{ScanSession, SharedSession};
use crate::source::{CameraProvider, SourceRequest};
use crate::worker::{ScanEvent, ScanWorker, WorkerSettings};
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, select, unbounded};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const HELP: &str = "\
Commands:
  webcam [SECONDS]                  scan the camera (0 = until stop)
  stop                              stop the running webcam scan
  image PATH                        scan one image file
  directory PATH [--no-recursive]   scan every image under PATH
  results                           list the codes found so far
  clear                             empty the results
  export PATH [json|text]           save the results
  help                              show this text
  quit                              stop any scan and exit";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a camera scan; `None` uses the configured duration
    Webcam {
        /// Seconds to scan, 0 for unbounded
        seconds: Option<u64>,
    },
    /// Cancel the running scan
    Stop,
    /// Scan a file
    Image(PathBuf),
    /// Scan a directory
    Directory {
        /// Root to walk
        path: PathBuf,
        /// Walk subdirectories
        recursive: bool,
    },
    /// List the results pane
    Results,
    /// Empty the results pane
    Clear,
    /// Write the results pane
    Export {
        /// Destination
        path: PathBuf,
        /// Explicit format, else from the extension
        format: Option<ExportFormat>,
    },
    /// Show usage
    Help,
    /// Leave the shell
    Quit,
}

impl FromStr for Command {
    type Err = ScanError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let require_path = |what: &str| {
            if rest.is_empty() {
                Err(ScanError::InvalidArguments(format!("usage: {what} PATH")))
            } else {
                Ok(())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "webcam" | "camera" => {
                let seconds = if rest.is_empty() {
                    None
                } else {
                    Some(rest.parse::<u64>().map_err(|_| {
                        ScanError::InvalidArguments(format!("invalid duration '{rest}'"))
                    })?)
                };
                Ok(Command::Webcam { seconds })
            }
            "stop" => Ok(Command::Stop),
            "image" => {
                require_path("image")?;
                Ok(Command::Image(PathBuf::from(rest)))
            }
            "directory" | "dir" => {
                require_path("directory")?;
                let (path, recursive) = match rest.strip_suffix("--no-recursive") {
                    Some(path) => (path.trim(), false),
                    None => (rest, true),
                };
                if path.is_empty() {
                    return Err(ScanError::InvalidArguments(
                        "usage: directory PATH [--no-recursive]".into(),
                    ));
                }
                Ok(Command::Directory {
                    path: PathBuf::from(path),
                    recursive,
                })
            }
            "results" => Ok(Command::Results),
            "clear" => Ok(Command::Clear),
            "export" | "save" => {
                require_path("export")?;
                let (path, format) = match rest.rsplit_once(char::is_whitespace) {
                    Some((path, last)) if is_format_name(last) => {
                        (path.trim(), Some(last.parse::<ExportFormat>()?))
                    }
                    _ => (rest, None),
                };
                Ok(Command::Export {
                    path: PathBuf::from(path),
                    format,
                })
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(ScanError::InvalidArguments(format!(
                "unknown command '{other}' (try 'help')"
            ))),
        }
    }
}

fn is_format_name(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "json" | "text" | "txt"
    )
}

struct ActiveScan {
    kind: SourceKind,
    worker: ScanWorker,
    session: SharedSession,
}

enum Input {
    Line(String),
    Closed,
    Event(ScanEvent),
    WorkerGone,
}

/// Line-driven scanner front end writing to `W`.
pub struct Shell<W: Write> {
    config: ScanConfig,
    invoker: Arc<DecodeInvoker<QrDecoder>>,
    cameras: Arc<dyn CameraProvider>,
    device: u32,
    results: Vec<ScanRecord>,
    first_scan: Option<DateTime<Local>>,
    active: Option<ActiveScan>,
    out: W,
}

impl<W: Write> Shell<W> {
    /// Shell with an empty results pane
    pub fn new(config: ScanConfig, cameras: Arc<dyn CameraProvider>, out: W) -> Self {
        let invoker = Arc::new(DecodeInvoker::new(
            QrDecoder::new(),
            config.invoker_options(),
        ));
        Self {
            config,
            invoker,
            cameras,
            device: 0,
            results: Vec::new(),
            first_scan: None,
            active: None,
            out,
        }
    }

    /// Camera used by `webcam`
    pub fn with_device(mut self, device: u32) -> Self {
        self.device = device;
        self
    }

    /// Results of finished scans
    pub fn results(&self) -> &[ScanRecord] {
        &self.results
    }

    /// Give back the output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Input is read on a helper thread so worker events are printed as they
    /// arrive. Any running scan is cancelled before returning.
    pub fn run<R>(&mut self, input: R) -> io::Result<()>
    where
        R: BufRead + Send + 'static,
    {
        let lines = spawn_reader(input);
        writeln!(self.out, "QR scanner ready. Type 'help' for commands.")?;
        loop {
            match self.next_input(&lines) {
                Input::Line(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.execute(command)?,
                        Err(err) => writeln!(self.out, "Error: {err}")?,
                    }
                }
                Input::Closed => break,
                Input::Event(event) => self.on_event(event)?,
                Input::WorkerGone => self.finish_active()?,
            }
        }
        if self.active.is_some() {
            self.stop()?;
        }
        writeln!(self.out, "Bye.")?;
        Ok(())
    }

    /// Run one command.
    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Webcam { seconds } => {
                let duration = seconds
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.webcam_duration);
                self.start(SourceRequest::webcam(self.device, duration, true))
            }
            Command::Stop => {
                if self.active.is_some() {
                    self.stop()
                } else {
                    writeln!(self.out, "No scan running.")
                }
            }
            Command::Image(path) => self.start(SourceRequest::image(path)),
            Command::Directory { path, recursive } => {
                self.start(SourceRequest::directory(path, recursive))
            }
            Command::Results => {
                let records = self.current_results();
                write_results(&mut self.out, &records)
            }
            Command::Clear => {
                self.results.clear();
                self.first_scan = None;
                writeln!(self.out, "Results cleared.")
            }
            Command::Export { path, format } => {
                let records = self.current_results();
                let format = ExportFormat::resolve(&path, format);
                let scan_date = self.first_scan.unwrap_or_else(Local::now);
                match export::export(&path, format, scan_date, &records) {
                    Ok(()) => writeln!(
                        self.out,
                        "Saved {} code(s) to {} ({format}).",
                        records.len(),
                        path.display()
                    ),
                    Err(err) => writeln!(self.out, "Error: {err}"),
                }
            }
            Command::Help => writeln!(self.out, "{HELP}"),
            Command::Quit => Ok(()),
        }
    }

    fn next_input(&self, lines: &Receiver<String>) -> Input {
        match &self.active {
            Some(active) => select! {
                recv(lines) -> line => line.map_or(Input::Closed, Input::Line),
                recv(active.worker.events()) -> event => {
                    event.map_or(Input::WorkerGone, Input::Event)
                }
            },
            None => lines.recv().map_or(Input::Closed, Input::Line),
        }
    }

    fn start(&mut self, request: SourceRequest) -> io::Result<()> {
        if self.active.is_some() {
            return writeln!(self.out, "Error: {}", ScanError::ScanInProgress);
        }
        let kind = request.kind();
        let session = ScanSession::shared(self.config.dedup_for(kind));
        let settings = WorkerSettings {
            max_dimension: self.config.max_dimension,
            parallel: self.config.parallel,
        };
        let worker = match ScanWorker::spawn(
            request,
            settings,
            Arc::clone(&self.invoker),
            Arc::clone(&self.cameras),
            Arc::clone(&session),
        ) {
            Ok(worker) => worker,
            Err(err) => return writeln!(self.out, "Error: {err}"),
        };
        self.active = Some(ActiveScan {
            kind,
            worker,
            session,
        });
        if kind == SourceKind::Webcam {
            return Ok(());
        }
        self.wait_active()
    }

    fn stop(&mut self) -> io::Result<()> {
        if let Some(active) = &self.active {
            active.worker.cancel();
        }
        self.wait_active()
    }

    /// Print events until the active scan has ended.
    fn wait_active(&mut self) -> io::Result<()> {
        loop {
            let event = match &self.active {
                Some(active) => active.worker.events().recv(),
                None => return Ok(()),
            };
            match event {
                Ok(event) => self.on_event(event)?,
                Err(_) => return self.finish_active(),
            }
        }
    }

    fn on_event(&mut self, event: ScanEvent) -> io::Result<()> {
        match event {
            ScanEvent::Started(kind) => {
                if kind == SourceKind::Webcam {
                    writeln!(self.out, "Webcam scan running. Type 'stop' to end it.")?;
                } else {
                    writeln!(self.out, "Scanning {kind}...")?;
                }
            }
            ScanEvent::Detected(record) => {
                writeln!(self.out, "New QR code detected: {}", record.data)?;
            }
            ScanEvent::Finished(summary) => {
                let found = self.finish_active_records();
                writeln!(
                    self.out,
                    "Scan complete: {} new code(s), {} frame(s), {} skipped.",
                    found, summary.frames, summary.skipped
                )?;
            }
            ScanEvent::Failed(err) => {
                self.finish_active_records();
                writeln!(self.out, "Error: {err}")?;
            }
        }
        Ok(())
    }

    fn finish_active(&mut self) -> io::Result<()> {
        if self.active.is_some() {
            let found = self.finish_active_records();
            warn!("scan worker ended without a final event");
            writeln!(self.out, "Scan ended: {found} new code(s).")?;
        }
        Ok(())
    }

    /// Move the finished scan's records into the pane; returns how many.
    fn finish_active_records(&mut self) -> usize {
        let Some(active) = self.active.take() else {
            return 0;
        };
        let ActiveScan {
            kind,
            worker,
            session,
        } = active;
        if let Err(err) = worker.join() {
            warn!("{err}");
        }
        let session = session.lock();
        if !session.is_empty() && self.first_scan.is_none() {
            self.first_scan = Some(session.started_at());
        }
        let records = session.snapshot();
        info!("{kind} scan added {} code(s) to the results", records.len());
        let found = records.len();
        self.results.extend(records);
        found
    }

    /// Finished results plus whatever the running scan has found so far.
    fn current_results(&self) -> Vec<ScanRecord> {
        let mut records = self.results.clone();
        if let Some(active) = &self.active {
            records.extend(active.session.lock().snapshot());
        }
        records
    }
}

fn spawn_reader<R>(input: R) -> Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("qr-shell-input".into())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!("stopped reading commands: {err}");
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        warn!("cannot start input thread: {err}");
    }
    rx
}
