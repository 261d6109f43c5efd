use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use ahavault_pickup::{FileRow, PickupError, PickupFlow};
use ahavault_protocol::{ShareInfo, format_file_size};

use super::{password_or_prompt, print_json};
use crate::context::Context;

#[derive(Serialize)]
struct PickupOutput<'a> {
    share: &'a ShareInfo,
    files: &'a [FileRow],
}

pub async fn pickup(
    ctx: &mut Context,
    code: &str,
    password: Option<String>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let mut flow = PickupFlow::new(&client);
    flow.set_code(code);

    match flow.submit().await {
        Ok(()) => {}
        Err(PickupError::PasswordRequired) => {
            let password = password_or_prompt(password, "This share is protected. Password: ")?;
            flow.set_password(&password);
            flow.submit().await?;
        }
        Err(e) => return Err(e.into()),
    }

    let share = flow
        .share()
        .context("lookup finished without a share")?;
    let rows = flow.rows();

    if ctx.json {
        print_json(&PickupOutput {
            share,
            files: &rows,
        })?;
    } else {
        print_share(share, &rows);
    }

    if let Some(dir) = out {
        for row in &rows {
            let name = local_name(&row.filename).unwrap_or_else(|| row.file_id.clone());
            let dest = dir.join(name);
            let bytes = client
                .download(&row.download_url, &dest)
                .await
                .with_context(|| format!("failed to download {}", row.filename))?;
            eprintln!("saved {} ({})", dest.display(), format_file_size(bytes));
        }
    }
    Ok(())
}

fn print_share(share: &ShareInfo, rows: &[FileRow]) {
    let downloads = if share.is_unlimited() {
        "unlimited downloads".to_string()
    } else {
        format!("{} download(s) left", share.remaining_downloads)
    };
    println!(
        "{} file(s), {}, {downloads}, expires {}",
        rows.len(),
        format_file_size(share.total_size()),
        share.expires_at.format("%Y-%m-%d %H:%M UTC"),
    );
    for row in rows {
        println!("  {:>9}  {}", row.size_label, row.filename);
        println!("             {}", row.download_url);
    }
}

/// Final path component of a server-supplied filename, so downloads never
/// escape the target directory.
pub(super) fn local_name(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
