use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use url::Url;

use profile_loader::{
    ClientConfig, ProfileError, ProfileLoader, ProfileResource, Result,
    Session,
};

#[derive(Parser, Debug)]
#[clap(name = "profile-cli")]
#[clap(about = "Load profile pictures from the user service", long_about = None)]
struct Cli {
    #[clap(long, value_parser, help = "JSON config file")]
    config: Option<PathBuf>,
    #[clap(
        long,
        env = "PROFILE_ENDPOINT",
        help = "Base URL of the user routes"
    )]
    endpoint: Option<Url>,
    #[clap(long, env = "ACCESS_TOKEN", help = "Bearer credential")]
    token: Option<String>,
    #[clap(long, default_value = "", help = "Name shown for the user")]
    name: String,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the profile picture and print what it resolved to
    Load {
        #[clap(long, value_parser, help = "Write image bytes to this file")]
        save: Option<PathBuf>,
    },
    /// End the session on the server
    Logout,
}

impl Cli {
    /// Config file first, then the environment, then `--endpoint`
    fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_with(|key| std::env::var(key).ok())
    }

    fn client_config_with<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        let mut config = config.with_vars(lookup)?;
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        Ok(config)
    }

    fn session(&self) -> Session {
        match &self.token {
            Some(token) => Session::authenticated(token, &self.name),
            None => Session::anonymous(),
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = ProfileLoader::new(cli.client_config()?)?;
    let session = cli.session();

    match &cli.command {
        Command::Load { save } => {
            let resource = match loader.try_load(&session).await {
                Ok(resource) => resource,
                Err(ProfileError::Unauthenticated) => {
                    println!("Not logged in, using the fallback avatar");
                    return Ok(());
                }
                Err(e) => {
                    println!("No profile picture ({}), using the fallback", e);
                    return Ok(());
                }
            };
            match resource {
                ProfileResource::Image(handle) => {
                    println!(
                        "Image {} ({}, {} bytes)",
                        handle.url(),
                        handle.media_type(),
                        handle.len()
                    );
                    if let (Some(path), Some(blob)) =
                        (save, loader.registry().resolve(handle.url()))
                    {
                        fs::write(path, &blob.data)?;
                        println!("Saved to {}", path.display());
                    }
                }
                ProfileResource::TextUrl(url) => println!("Remote {}", url),
                ProfileResource::Absent => println!("No profile picture"),
            }
        }
        Command::Logout => {
            loader.logout(&session).await?;
            println!("Logged out");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    profile_loader::initialize();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
