use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use vmess_share::accounts::AccountStore;
use vmess_share::app;
use vmess_share::config::{Settings, DEFAULT_CONFIG_PATH};
use vmess_share::logging;
use vmess_share::share::{decode_link, encode_locked, encode_unlocked, new_opaque_id, QrCaption};
use vmess_share::users::{Client, UserFile};

#[derive(Parser)]
#[command(name = "vmess-share")]
#[command(about = "VMess 分享链接生成器 / VMess share link generator", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the share API
    Serve {
        /// Override listen_port from the config file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the share link for one user-file row
    Link {
        /// Row number in the user file
        #[arg(short, long)]
        user: usize,

        /// Wrap the link in the device-lock envelope
        #[arg(long)]
        locked: bool,

        /// Remark label, instead of the one derived from server_host
        #[arg(long)]
        subdomain: Option<String>,
    },

    /// Print a fresh account id
    Uuid,

    /// Add an account to the user file and the v2ray config
    Add {
        #[arg(long)]
        username: String,

        /// Account id, generated when omitted
        #[arg(long, default_value = "")]
        id: String,

        #[arg(long, default_value = "")]
        device_id: String,

        #[arg(long, default_value = "")]
        start_date: String,

        #[arg(long, default_value = "")]
        expire_date: String,
    },

    /// Remove an account after retyping its id tail and username
    Remove {
        /// Row number in the user file
        #[arg(short, long)]
        user: usize,

        /// Last 4 characters of the account id
        #[arg(long)]
        id_tail: String,

        #[arg(long)]
        username: String,
    },

    /// Decode a vmess:// or v2box://locked= link
    Inspect {
        link: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> vmess_share::Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            let mut settings = Settings::load(&cli.config).await?;
            if let Some(port) = port {
                settings.listen_port = port;
            }
            app::serve(settings).await
        }
        Commands::Link {
            user,
            locked,
            subdomain,
        } => {
            let mut settings = Settings::load(&cli.config).await?;
            if subdomain.is_some() {
                settings.subdomain = subdomain;
            }
            let users = UserFile::load(&settings.user_file).await?;
            let identity = users.get(user)?.identity(user);
            let profile = settings.profile(None);

            let uri = if locked {
                encode_locked(&identity, &profile)?
            } else {
                encode_unlocked(&identity, &profile)?
            };
            let caption = QrCaption::new(&identity, &profile.subdomain, locked);
            println!("{}", caption.title);
            println!("{}", uri);
            println!("{}", caption.remarks);
            Ok(())
        }
        Commands::Uuid => {
            println!("{}", new_opaque_id());
            Ok(())
        }
        Commands::Add {
            username,
            id,
            device_id,
            start_date,
            expire_date,
        } => {
            let settings = Settings::load(&cli.config).await?;
            let client = Client {
                id,
                alter_id: 1,
                username,
                device_id,
                start_date,
                expire_date,
            };
            let (number, client) = AccountStore::from_settings(&settings).create(client).await?;
            println!("#{} {} {}", number, client.username, client.id);
            Ok(())
        }
        Commands::Remove {
            user,
            id_tail,
            username,
        } => {
            let settings = Settings::load(&cli.config).await?;
            let removed = AccountStore::from_settings(&settings)
                .delete(user, &id_tail, &username)
                .await?;
            println!("removed #{} {} {}", user, removed.username, removed.id);
            Ok(())
        }
        Commands::Inspect { link } => {
            let decoded = decode_link(&link)?;
            println!("locked: {}", decoded.locked);
            println!("{}", serde_json::to_string_pretty(&decoded.link)?);
            Ok(())
        }
    }
}
