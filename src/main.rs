//! steamshift CLI.

use clap::{Parser, Subcommand};

use steamshift::login_users;
use steamshift::steam_id::SteamId;
use steamshift::switcher;
use steamshift::vac_cache;
use steamshift::{AppContext, Error, Result};

#[derive(Parser, Debug)]
#[command(name = "steamshift", version, about = "Fast Steam account switcher")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known accounts with VAC/limited status.
    List {
        /// Skip the remote status refresh; show cached flags only.
        #[arg(long)]
        offline: bool,
    },
    /// Restart Steam logged into the given account.
    Switch {
        /// Any SteamID form: 64-bit, 32-bit, STEAM_0:y:z or [U:1:w].
        steam_id: String,
        /// Do not start Steam again after switching.
        #[arg(long)]
        no_start: bool,
    },
    /// Remove an account from loginusers.vdf (kept restorable).
    Forget { steam_id: String },
    /// Restore previously forgotten accounts.
    Restore { steam_ids: Vec<String> },
    /// Print all four representations of a SteamID.
    Convert { steam_id: String },
    /// Copy loginusers.vdf into the backups folder.
    Backup,
    /// Delete the forgotten-accounts archive.
    ClearForgotten,
    /// Delete cached avatars so they re-download on next list.
    ClearImages,
    /// Delete the VAC/limited status cache, forcing a full refresh.
    ClearCache,
}

fn parse_id64(input: &str) -> Result<u64> {
    Ok(SteamId::parse(input)?.id64)
}

fn last_login(timestamp: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

async fn list(ctx: &AppContext, offline: bool) -> Result<()> {
    let users = login_users::load(&ctx.settings.login_users_vdf())?;
    let ids: Vec<u64> = users.iter().map(|u| u.steam_id).collect();

    let statuses = if offline {
        vac_cache::load_cache(&ctx.paths.vac_cache_file, ctx.vac_cache_expiry())
    } else {
        vac_cache::refresh(
            &ctx.paths.vac_cache_file,
            &ctx.paths.images_dir,
            ctx.vac_cache_expiry(),
            ctx.image_expiry(),
            &ids,
        )
        .await?
    };

    for user in &users {
        let status = statuses.get(&user.steam_id);
        let marks = format!(
            "{}{}{}",
            if user.most_recent { " [current]" } else { "" },
            if status.map(|s| s.vac).unwrap_or(false) { " [VAC]" } else { "" },
            if status.map(|s| s.ltd).unwrap_or(false) { " [limited]" } else { "" },
        );
        println!(
            "{:<17}  {:<24}  {:<16}  {}{}",
            user.steam_id,
            user.persona_name,
            user.account_name,
            last_login(user.timestamp),
            marks,
        );
    }
    Ok(())
}

async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::List { offline } => list(ctx, offline).await,
        Command::Switch { steam_id, no_start } => {
            let id64 = parse_id64(&steam_id)?;
            let mut settings = ctx.settings.clone();
            if no_start {
                settings.autostart = false;
            }
            let ctx = AppContext::with_settings(settings, &ctx.paths.root);
            switcher::switch_to(&ctx, &id64.to_string())
        }
        Command::Forget { steam_id } => switcher::forget(ctx, parse_id64(&steam_id)?),
        Command::Restore { steam_ids } => {
            let ids = steam_ids
                .iter()
                .map(|s| parse_id64(s))
                .collect::<Result<Vec<u64>>>()?;
            let count = switcher::restore(ctx, &ids)?;
            println!("restored {count} account(s)");
            Ok(())
        }
        Command::Convert { steam_id } => {
            let sid = SteamId::parse(&steam_id)?;
            println!("SteamID:   {}", sid.id);
            println!("SteamID3:  {}", sid.id3);
            println!("SteamID32: {}", sid.id32);
            println!("SteamID64: {}", sid.id64);
            Ok(())
        }
        Command::Backup => {
            let dest =
                login_users::backup(&ctx.settings.login_users_vdf(), &ctx.paths.backups_dir)?;
            println!("backed up to {}", dest.to_string_lossy());
            Ok(())
        }
        Command::ClearForgotten => steamshift::forgotten::clear(&ctx.paths.forgotten_file),
        Command::ClearImages => {
            let removed = vac_cache::clear_images(&ctx.paths.images_dir)?;
            println!("removed {removed} cached image(s)");
            Ok(())
        }
        Command::ClearCache => vac_cache::delete_cache_file(&ctx.paths.vac_cache_file),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(ctx) = AppContext::from_system() else {
        eprintln!("could not resolve a config directory");
        std::process::exit(1);
    };
    if let Err(e) = ctx.paths.ensure_dirs() {
        eprintln!("could not create config directories: {e}");
        std::process::exit(1);
    }
    if let Err(e) = steamshift::logger::init(&ctx.paths.logs_dir) {
        eprintln!("logger init failed: {e}");
    }

    if let Err(e) = run(&ctx, cli.command).await {
        log::error!("{e}");
        eprintln!("error: {e}");
        if let Error::StoreUnavailable(_) = e {
            eprintln!("check the steamPath setting in settings.json");
        }
        std::process::exit(e.exit_code());
    }
}
