use super::{CmdResult, Ctx, block_on, print_json, print_lines, require_admin};
use crate::api::{
    ApiError, AuthClient, CodePurpose, ContactClient, ContactMessage, EmailClient, NewUser, Role, Session, UserUpdate,
    UsersClient,
};
use crate::cli::commands::*;
use crate::cli::output::{format_logs, format_users};
use crate::io::lock::WorkspaceLock;
use crate::io::store::LocalStore;

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("invalid role: {} (expected admin or user)", s))
}

/// Two-step sign-in: without `--code` a verification code is mailed, with it
/// the credentials are checked and the session stored.
pub(super) fn cmd_login(ctx: &Ctx, args: LoginArgs) -> CmdResult {
    let ws = ctx.workspace()?;
    let api = &ws.config.api;

    let Some(code) = args.code else {
        let client = EmailClient::new(&api.email_url)?;
        block_on(client.send_code(&args.email, CodePurpose::Login))??;
        println!("verification code sent to {}", args.email.trim());
        println!("run `sm login {} --password <password> --code <code>`", args.email.trim());
        return Ok(());
    };

    let client = AuthClient::new(&api.auth_url)?;
    let resp = block_on(client.login(&args.email, &args.password, &code))??;
    let session = Session {
        token: resp.token,
        user: resp.user,
    };

    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
    let mut store = LocalStore::open(&ws.dir);
    store.set_session(&session)?;
    store.save()?;
    tracing::info!(user = %session.user.email, "signed in");

    if ctx.json {
        return print_json(&session.user);
    }
    println!("signed in as {} ({})", session.user.display_name(), session.user.role);
    Ok(())
}

pub(super) fn cmd_logout(ctx: &Ctx) -> CmdResult {
    let ws = ctx.workspace()?;
    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
    let mut store = LocalStore::open(&ws.dir);
    let Some(session) = store.session() else {
        println!("not signed in");
        return Ok(());
    };

    // the local session goes away even if the backend call fails
    let client = AuthClient::new(&ws.config.api.auth_url)?;
    if let Err(e) = block_on(client.logout(&session.token))? {
        tracing::warn!(error = %e, "backend logout failed");
        eprintln!("warning: {}", e);
    }
    store.clear_session();
    store.save()?;
    println!("signed out");
    Ok(())
}

pub(super) fn cmd_whoami(ctx: &Ctx) -> CmdResult {
    let ws = ctx.workspace()?;
    let Some(session) = LocalStore::open(&ws.dir).session() else {
        return Err("not signed in".into());
    };

    let client = AuthClient::new(&ws.config.api.auth_url)?;
    let user = match block_on(client.verify(&session.token))? {
        Ok(user) => user,
        Err(ApiError::Backend { .. }) => {
            let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
            let mut store = LocalStore::open(&ws.dir);
            store.clear_session();
            store.save()?;
            return Err("session expired: sign in again with `sm login`".into());
        }
        Err(e) => return Err(e.into()),
    };

    if ctx.json {
        return print_json(&user);
    }
    println!("{} <{}> ({})", user.display_name(), user.email, user.role);
    Ok(())
}

pub(super) fn cmd_users(ctx: &Ctx, cmd: UsersCmd) -> CmdResult {
    let ws = ctx.workspace()?;
    let session = require_admin(&ws)?;
    let client = UsersClient::new(&ws.config.api.users_url, &session.token)?;

    match cmd.action {
        UsersAction::List => {
            let users = block_on(client.list_users())??;
            if ctx.json {
                return print_json(&users);
            }
            if users.is_empty() {
                println!("no users");
            } else {
                print_lines(&format_users(&users));
            }
        }
        UsersAction::Create(args) => {
            let user = NewUser {
                email: args.email,
                password: args.password,
                full_name: args.name,
                role: parse_role(&args.role)?,
            };
            let ack = block_on(client.create_user(&user))??;
            match ack.id {
                Some(id) => println!("created user {} ({})", id, user.email),
                None => println!("created user {}", user.email),
            }
        }
        UsersAction::Update(args) => {
            let update = UserUpdate {
                full_name: args.name,
                role: args.role.as_deref().map(parse_role).transpose()?,
                is_active: args.active,
            };
            block_on(client.update_user(args.id, &update))??;
            println!("updated user {}", args.id);
        }
        UsersAction::Passwd(args) => {
            block_on(client.change_password(args.id, &args.password))??;
            println!("password changed for user {}", args.id);
        }
        UsersAction::Logs(args) => {
            let logs = block_on(client.activity_logs(args.limit, args.offset))??;
            if ctx.json {
                return print_json(&logs);
            }
            if logs.is_empty() {
                println!("no activity");
            } else {
                print_lines(&format_logs(&logs));
            }
        }
    }
    Ok(())
}

pub(super) fn cmd_contact(ctx: &Ctx, args: ContactArgs) -> CmdResult {
    let ws = ctx.workspace()?;
    let msg = ContactMessage {
        name: args.name,
        email: args.email,
        message: args.message,
    };
    msg.validate()?;
    let client = ContactClient::new(&ws.config.api.contact_url)?;
    block_on(client.submit(&msg))??;
    println!("message sent");
    Ok(())
}
