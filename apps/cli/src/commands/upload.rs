use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use indicatif::{ProgressBar, ProgressStyle};

use ahavault_cabinet::{ToastQueue, UploadControl};
use ahavault_protocol::format_file_size;
use ahavault_transfer::{
    FileResumeStore, HttpTusTransport, UploadSource, Uploader, default_resume_path,
};

use crate::context::Context;

pub async fn upload(ctx: &mut Context, path: &Path) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let source = UploadSource::from_path(path)
        .with_context(|| format!("cannot upload {}", path.display()))?;
    let filename = source.filename().to_string();
    let size = source.size();

    let transport = HttpTusTransport::new(&client.tus_endpoint(), client.token().map(str::to_string))?;
    let resume = FileResumeStore::new(default_resume_path(&ctx.config_dir))
        .context("failed to open the upload resume store")?;
    let uploader = Uploader::new(Arc::new(transport), Arc::new(resume))
        .with_chunk_size(ctx.config.chunk_size);

    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let mut control = UploadControl::new(Arc::new(uploader), move || {
        flag.store(true, Ordering::SeqCst);
    });
    let mut toasts = ToastQueue::new();

    eprintln!("uploading {filename} ({})", format_file_size(size));
    control.select(source)?;

    let bar = progress_bar(size)?;
    loop {
        tokio::select! {
            running = control.step(&mut toasts) => {
                bar.set_position(control.bytes_sent());
                if !running {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                control.cancel();
                bar.abandon();
                anyhow::bail!("upload cancelled, run the same command again to resume");
            }
        }
    }

    if !finished.load(Ordering::SeqCst) {
        bar.abandon();
        let message = toasts
            .last()
            .map(|t| t.text())
            .unwrap_or_else(|| "upload stopped unexpectedly".to_string());
        anyhow::bail!(message);
    }
    bar.finish_and_clear();

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "filename": filename,
            "size": size,
        }));
    }
    println!("Uploaded {filename}");
    Ok(())
}

fn progress_bar(size: u64) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )?
        .progress_chars("#>-"),
    );
    Ok(bar)
}
