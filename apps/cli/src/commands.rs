//! Command handlers. Each one prints its result to stdout; logs and
//! progress go to stderr.

mod auth;
mod files;
mod pickup;
mod shares;
mod upload;

use std::io::Write;

use anyhow::Context as _;
use serde::Serialize;

use ahavault_cabinet::{ToastKind, ToastQueue};

use crate::cli::{Command, FilesCommand, SharesCommand};
use crate::context::Context;

pub async fn run(command: Command, ctx: &mut Context) -> anyhow::Result<()> {
    match command {
        Command::Register {
            email,
            password,
            invite,
        } => auth::register(ctx, &email, password, invite.as_deref()).await,
        Command::Login { email, password } => auth::login(ctx, &email, password).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Whoami => auth::whoami(ctx).await,
        Command::Files { sub } => match sub {
            FilesCommand::List { search } => files::list(ctx, search.as_deref()).await,
            FilesCommand::Delete { id } => files::delete(ctx, &id).await,
            FilesCommand::Download { id, out } => files::download(ctx, &id, &out).await,
        },
        Command::Upload { file } => upload::upload(ctx, &file).await,
        Command::Share {
            file_ids,
            expires,
            max_downloads,
            password,
        } => shares::create(ctx, file_ids, expires, max_downloads, password.as_deref()).await,
        Command::Shares { sub } => match sub {
            SharesCommand::List { page, page_size } => shares::list(ctx, page, page_size).await,
            SharesCommand::Stop { id } => shares::stop(ctx, &id).await,
        },
        Command::Pickup {
            code,
            password,
            out,
        } => pickup::pickup(ctx, &code, password, out.as_deref()).await,
        Command::Save {
            code,
            file_ids,
            password,
        } => shares::save(ctx, &code, file_ids, password).await,
        Command::Health => health(ctx).await,
    }
}

async fn health(ctx: &mut Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let status = client
        .health()
        .await
        .with_context(|| format!("server at {} is unreachable", client.base_url()))?;
    if ctx.json {
        return print_json(&status);
    }
    println!("{}", status.status);
    anyhow::ensure!(status.is_ok(), "server reported status {}", status.status);
    Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{out}");
    Ok(())
}

/// Prints queued notifications to stderr and empties the queue.
fn flush_toasts(toasts: &mut ToastQueue) {
    for toast in toasts.drain() {
        let prefix = match toast.kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        };
        eprintln!("[{prefix}] {}", toast.text());
    }
}

/// Returns `given`, or reads a password from the terminal without echo.
fn password_or_prompt(given: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let password = rpassword::read_password().context("failed to read password")?;
    anyhow::ensure!(!password.is_empty(), "Password cannot be empty");
    Ok(password)
}
