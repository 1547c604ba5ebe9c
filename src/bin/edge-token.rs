use clap::{Parser, Subcommand};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use edge_proxy::security::auth::{now_epoch_millis, password_digest, AUTH_PARAM, TIMESTAMP_PARAM};

#[derive(Parser)]
#[command(name = "edge-token")]
#[command(about = "Generate and try proxy auth tokens for edge-proxy", long_about = None)]
struct Cli {
    /// Shared proxy password.
    #[arg(short, long, env = "PASSWORD")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the password digest substituted into pages
    Digest,
    /// Print an auth/t query string
    Sign {
        /// Issue time in epoch milliseconds (default: now)
        #[arg(long)]
        at: Option<i64>,
    },
    /// Print a complete proxy URL for a target
    Url {
        target: String,

        #[arg(short, long, default_value = "http://localhost:3000")]
        base: String,

        #[arg(long, default_value = "proxy")]
        prefix: String,
    },
    /// Fetch a target through a running edge-proxy and print status and headers
    Fetch {
        target: String,

        #[arg(short, long, default_value = "http://localhost:3000")]
        base: String,

        #[arg(long, default_value = "proxy")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let digest = password_digest(&cli.password);

    match cli.command {
        Commands::Digest => println!("{}", digest),
        Commands::Sign { at } => println!("{}", query(&digest, at.unwrap_or_else(now_epoch_millis))),
        Commands::Url { target, base, prefix } => {
            println!("{}", proxy_url(&base, &prefix, &target, &digest));
        }
        Commands::Fetch { target, base, prefix } => {
            let url = proxy_url(&base, &prefix, &target, &digest);
            let res = reqwest::Client::new().get(&url).send().await?;
            println!("{} {}", res.status(), url);
            for (name, value) in res.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }
    }

    Ok(())
}

fn query(digest: &str, issued_at_ms: i64) -> String {
    format!("{}={}&{}={}", AUTH_PARAM, digest, TIMESTAMP_PARAM, issued_at_ms)
}

fn proxy_url(base: &str, prefix: &str, target: &str, digest: &str) -> String {
    format!(
        "{}/{}/{}?{}",
        base.trim_end_matches('/'),
        prefix,
        utf8_percent_encode(target, NON_ALPHANUMERIC),
        query(digest, now_epoch_millis())
    )
}
