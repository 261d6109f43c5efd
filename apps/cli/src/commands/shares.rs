use chrono::{DateTime, Utc};
use serde::Serialize;

use ahavault_cabinet::{ShareDialog, SharesBrowser, ToastQueue, save_shared_files};
use ahavault_pickup::PickupCode;
use ahavault_protocol::{ShareStatus, ShareSummary, format_number};

use super::{flush_toasts, password_or_prompt, print_json};
use crate::context::Context;

pub async fn create(
    ctx: &mut Context,
    file_ids: Vec<String>,
    expires_in: i64,
    max_downloads: i32,
    password: Option<&str>,
) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut dialog = ShareDialog::new(file_ids);
    dialog.set_expires_in(expires_in)?;
    dialog.set_max_downloads(max_downloads)?;
    if let Some(password) = password {
        dialog.set_password(password);
    }

    let mut toasts = ToastQueue::new();
    let result = dialog.submit(&client, &mut toasts).await;
    flush_toasts(&mut toasts);
    let share = result?;

    if ctx.json {
        return print_json(&share);
    }
    let code = PickupCode::parse(&share.pickup_code)
        .map(|c| c.display_form())
        .unwrap_or_else(|_| share.pickup_code.clone());
    println!("Pickup code: {code}");
    println!("Expires:     {}", share.expires_at.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

#[derive(Serialize)]
struct ShareRow<'a> {
    #[serde(flatten)]
    share: &'a ShareSummary,
    status: ShareStatus,
}

pub async fn list(ctx: &mut Context, page: u32, page_size: u32) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut browser = SharesBrowser::with_page_size(&client, page_size);
    browser.load(page).await?;

    let now = Utc::now();
    if ctx.json {
        let rows: Vec<_> = browser
            .shares()
            .iter()
            .map(|share| ShareRow {
                share,
                status: share.status_at(now),
            })
            .collect();
        return print_json(&rows);
    }
    if browser.shares().is_empty() {
        println!("No shares");
        return Ok(());
    }
    for share in browser.shares() {
        println!("{}", share_line(share, now));
    }
    println!("page {}/{}", browser.page(), browser.page_count());
    Ok(())
}

pub async fn stop(ctx: &mut Context, id: &str) -> anyhow::Result<()> {
    ctx.require_login()?;
    let client = ctx.client()?;
    let mut browser = SharesBrowser::new(&client);
    browser.stop(id).await?;
    if !ctx.json {
        println!("Stopped {id}");
    }
    Ok(())
}

pub async fn save(
    ctx: &mut Context,
    code: &str,
    file_ids: Vec<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    ctx.require_login()?;
    let code = PickupCode::parse(code)?;
    let client = ctx.client()?;
    let saved = match save_shared_files(&client, code.as_str(), file_ids.clone(), password.clone()).await {
        Err(e) if e.is_password_required() && password.is_none() => {
            let password = password_or_prompt(None, "This share is protected. Password: ")?;
            save_shared_files(&client, code.as_str(), file_ids, Some(password)).await?
        }
        result => result?,
    };
    if ctx.json {
        return print_json(&saved);
    }
    println!("Saved {} file(s) to your cabinet", saved.len());
    for id in &saved {
        println!("  {id}");
    }
    Ok(())
}

fn status_label(status: ShareStatus) -> &'static str {
    match status {
        ShareStatus::Active => "active",
        ShareStatus::Expired => "expired",
        ShareStatus::Exhausted => "exhausted",
        ShareStatus::Stopped => "stopped",
    }
}

fn share_line(share: &ShareSummary, now: DateTime<Utc>) -> String {
    let downloads = match share.max_downloads {
        0 => format!("{} downloads", format_number(i64::from(share.current_downloads))),
        max => format!("{}/{} downloads", share.current_downloads, max),
    };
    format!(
        "{}  {}  {:<9}  {}  expires {}",
        share.id,
        share.pickup_code,
        status_label(share.status_at(now)),
        downloads,
        share.expires_at.format("%Y-%m-%d %H:%M"),
    )
}
