use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use barcode_scan::analyzer::{self, LiveAnalyzer};
use barcode_scan::cli::{frame_period, link_line, Cli, Commands};
use barcode_scan::collaborators::TorchController;
use barcode_scan::config::Config;
use barcode_scan::decoder::{load_frame, QrDecoder};
use barcode_scan::error::ScanError;
use barcode_scan::scanner;
use barcode_scan::session::{ImageRef, SessionHandle, SessionState};
use barcode_scan::torch::NoTorch;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = Config::load().context("loading config")?;

    match cli.command {
        Commands::Decode { image, json } => {
            if !image.exists() {
                return Err(ScanError::FileNotFound(image.display().to_string()).into());
            }

            let decoder = Arc::new(QrDecoder::new(config.max_image_size));
            let state =
                analyzer::scan_image(decoder, ImageRef::new(&image), config.decode_timeout()).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_result(&state);
            }
        }

        Commands::Scan { folder, output, batch_size, recursive } => {
            let images = scanner::scan_folder(&folder, recursive)?;
            if images.is_empty() {
                return Err(ScanError::NoImagesFound(folder.display().to_string()).into());
            }
            eprintln!("{} image(s) found", images.len());

            let decoder = Arc::new(QrDecoder::new(config.max_image_size));
            let records = analyzer::scan_images(
                &images,
                decoder,
                batch_size.unwrap_or(config.default_batch_size),
                config.decode_timeout(),
                !cli.verbose,
            )
            .await;

            let found = records.iter().filter(|r| r.is_found()).count();
            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("write {}", path.display()))?;
                    eprintln!("results saved: {}", path.display());
                }
                None => println!("{json}"),
            }
            eprintln!("{found}/{} image(s) contained a barcode", records.len());
        }

        Commands::Live { frames, fps, flash } => {
            run_live(&config, &frames, fps, flash).await?;
        }

        Commands::Config { set_decode_timeout, show } => {
            if let Some(seconds) = set_decode_timeout {
                config.set_decode_timeout(seconds)?;
                config.save()?;
                println!("decode timeout set to {seconds}s");
            }

            if show {
                println!("settings ({}):", Config::config_path()?.display());
                println!("  decode timeout:       {}s", config.decode_timeout_seconds);
                println!("  max image size:       {}px", config.max_image_size);
                println!("  scan interval:        every {} frame(s)", config.scan_interval);
                println!("  frame queue capacity: {}", config.frame_queue_capacity);
                println!("  batch size:           {}", config.default_batch_size);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_live(config: &Config, frames: &[impl AsRef<Path>], fps: u32, flash: bool) -> Result<()> {
    let decoder = Arc::new(QrDecoder::new(config.max_image_size));
    let torch: Arc<dyn TorchController> = Arc::new(NoTorch);
    let session = SessionHandle::new(decoder.clone(), Some(torch), config.decode_timeout());

    if flash {
        session.toggle_flash().await;
        let state = session.snapshot();
        if let Some(message) = &state.error_message {
            eprintln!("{message}");
            session.clear_transient_message();
        }
    }

    let (tx, rx) = mpsc::channel(config.frame_queue_capacity);
    let analyzer_task = session.attach_analyzer(LiveAnalyzer::new(decoder, config.scan_interval), rx);

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match &state.current_detection {
                Some(d) => println!(
                    "[live] {}: {}",
                    d.symbol_type,
                    d.raw_value.as_deref().unwrap_or_default()
                ),
                None => println!("[live] no barcode in view"),
            }
            if let Some(err) = &state.analyzer_error {
                println!("[live] analyzer error: {err}");
            }
        }
    });

    let mut ticker = tokio::time::interval(frame_period(fps));
    for path in frames {
        ticker.tick().await;
        let path = path.as_ref();
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("skipping frame {}: {}", path.display(), e);
                continue;
            }
        };
        if tx.send(frame).await.is_err() {
            break;
        }
    }
    drop(tx);

    analyzer_task.await.context("live analyzer task")?;
    session.close();
    printer.abort();

    print_result(&session.snapshot());
    Ok(())
}

fn print_result(state: &SessionState) {
    match &state.current_detection {
        Some(d) => {
            println!("Type:   {}", d.symbol_type);
            println!("Value:  {}", d.raw_value.as_deref().unwrap_or_default());
            if let Some(bbox) = d.bounding_box {
                println!("Bounds: {bbox}");
            }
            if let Some(link) = link_line(d) {
                println!("Link:   {link}");
            }
        }
        None => println!("{}", state.error_message.as_deref().unwrap_or("No barcode found")),
    }
    if let Some(err) = &state.analyzer_error {
        println!("Analyzer error: {err}");
    }
}
