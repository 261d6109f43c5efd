use ahavault_protocol::User;
use ahavault_session::AuthFlow;

use super::{password_or_prompt, print_json};
use crate::context::Context;

pub async fn register(
    ctx: &mut Context,
    email: &str,
    password: Option<String>,
    invite: Option<&str>,
) -> anyhow::Result<()> {
    let password = password_or_prompt(password, "Password (8+ characters): ")?;
    let client = ctx.client()?;
    let user = AuthFlow::new(&client, &mut ctx.session)
        .register(email, &password, invite)
        .await?;
    report_user(ctx, &user, "Registered and logged in as")
}

pub async fn login(ctx: &mut Context, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = password_or_prompt(password, "Password: ")?;
    let client = ctx.client()?;
    let user = AuthFlow::new(&client, &mut ctx.session)
        .login(email, &password)
        .await?;
    report_user(ctx, &user, "Logged in as")
}

pub async fn logout(ctx: &mut Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    AuthFlow::new(&client, &mut ctx.session).logout().await?;
    if !ctx.json {
        println!("Logged out");
    }
    Ok(())
}

pub async fn whoami(ctx: &mut Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let user = AuthFlow::new(&client, &mut ctx.session).whoami().await?;
    report_user(ctx, &user, "Logged in as")
}

fn report_user(ctx: &Context, user: &User, lead: &str) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(user);
    }
    println!("{lead} {} ({})", user.email, user.role);
    Ok(())
}
