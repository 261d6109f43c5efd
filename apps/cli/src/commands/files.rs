use std::path::Path;

use anyhow::Context as _;

use ahavault_cabinet::{FileBrowser, FilesView};
use ahavault_protocol::{FileItem, format_file_size};

use super::print_json;
use crate::context::Context;

pub async fn list(ctx: &mut Context, search: Option<&str>) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut browser = FileBrowser::new(&client);
    match search {
        Some(term) => browser.set_search(term).await,
        None => browser.refresh().await,
    }

    if ctx.json {
        return print_json(&browser.files());
    }
    match browser.view() {
        FilesView::Items(items) => {
            for file in &items {
                println!("{}", file_line(file));
            }
            if browser.total() > items.len() as u64 {
                println!("({} of {} files shown)", items.len(), browser.total());
            }
        }
        FilesView::Empty | FilesView::Loading => println!("No files"),
    }
    Ok(())
}

pub async fn delete(ctx: &mut Context, id: &str) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut browser = FileBrowser::new(&client);
    browser.delete(id).await?;
    if !ctx.json {
        println!("Deleted {id}");
    }
    Ok(())
}

pub async fn download(ctx: &mut Context, id: &str, out: &Path) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut browser = FileBrowser::new(&client);
    browser.refresh().await;
    let filename = browser
        .find(id)
        .and_then(|f| super::pickup::local_name(&f.filename))
        .unwrap_or_else(|| id.to_string());

    let dest = out.join(filename);
    let bytes = client
        .download(&client.file_download_url(id), &dest)
        .await
        .with_context(|| format!("failed to download {id}"))?;
    println!("{} ({})", dest.display(), format_file_size(bytes));
    Ok(())
}

fn file_line(file: &FileItem) -> String {
    let shared = if file.is_shared {
        format!("  shared x{}", file.share_count)
    } else {
        String::new()
    };
    format!(
        "{}  {:>9}  {}  {}{shared}",
        file.id,
        format_file_size(file.size),
        file.created_at.format("%Y-%m-%d %H:%M"),
        file.filename,
    )
}
