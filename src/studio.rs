use crate::draft::ReportDraft;
use crate::export::{export_report, ExportedReport};
use crate::photo::{self, Photo};
use crate::rendering::Rasterizer;
use crate::template::parse_hex;
use crate::{Error, ExportConfig, Result};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Normalize(Vec<u8>, oneshot::Sender<Result<Photo>>),
    Export(Box<ReportDraft>, oneshot::Sender<Result<ExportedReport>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async front end to photo normalization and report export.
///
/// A dedicated worker thread owns the rasterizer and runs every job in
/// order, so rasterizer passes never overlap. Only one export may be in
/// flight at a time; a second request made meanwhile fails with
/// [`Error::Busy`] instead of queueing.
#[derive(Clone)]
pub struct Studio {
    cmd_tx: Sender<Command>,
    exporting: Arc<AtomicBool>,
}

/// Clears the export flag however the export ends.
struct ExportGuard(Arc<AtomicBool>);

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Studio {
    /// Spawn the worker thread. Fails if the configuration is unusable.
    pub async fn new(config: ExportConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            if let Err(err) = validate(&config) {
                let _ = init_tx.send(Err(err));
                return;
            }
            let rasterizer = Rasterizer::new(config.raster.clone());
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Normalize(bytes, resp) => {
                        let res = photo::normalize(&bytes, &config);
                        let _ = resp.send(res);
                    }
                    Command::Export(draft, resp) => {
                        let res = export_report(&draft, &rasterizer);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        debug!("studio worker stopping after {} renders", rasterizer.renders());
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self {
            cmd_tx,
            exporting: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Normalize an uploaded photo on the worker.
    pub async fn normalize(&self, bytes: Vec<u8>) -> Result<Photo> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Normalize(bytes, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Normalize canceled: {}", e)))?
    }

    /// Whether an export is currently running
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    /// Export a snapshot of `draft`.
    ///
    /// The draft is copied, so edits made while the export runs do not
    /// affect the result.
    pub async fn export(&self, draft: &ReportDraft) -> Result<ExportedReport> {
        if self
            .exporting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        let _guard = ExportGuard(self.exporting.clone());

        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::Export(Box::new(draft.clone()), tx));
        rx.await
            .map_err(|e| Error::Other(format!("Export canceled: {}", e)))?
    }

    /// Stop the worker thread.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

fn validate(config: &ExportConfig) -> Result<()> {
    if config.max_dimension == 0 {
        return Err(Error::ConfigError("max_dimension must be positive".into()));
    }
    let ratio = config.raster.pixel_ratio;
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(Error::ConfigError(format!("invalid pixel ratio {}", ratio)));
    }
    if parse_hex(&config.raster.background).is_none() {
        return Err(Error::ConfigError(format!(
            "invalid background color '{}'",
            config.raster.background
        )));
    }
    Ok(())
}
