//! FileVault CLI Client
//!
//! Command-line interface for interacting with a FileVault server.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use filevault::{Client, Result, VaultError};

/// FileVault CLI
#[derive(Parser, Debug)]
#[command(name = "filevault-cli")]
#[command(about = "CLI for the FileVault file server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:10001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored files
    List,

    /// Download a file
    Get {
        /// Name of the stored file
        name: String,

        /// Where to write it (defaults to the stored name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a local file
    Upload {
        /// Local file to send
        path: PathBuf,

        /// Name to store it under (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete a stored file
    Delete {
        /// Name of the stored file
        name: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let client = Client::new(&args.server);

    match run(&client, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(client: &Client, command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            for name in client.list()? {
                println!("{}", name);
            }
        }
        Commands::Get { name, output } => {
            let bytes = client.get(&name)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&name));
            std::fs::write(&path, &bytes)?;
            println!("{} ({} bytes) saved to {}", name, bytes.len(), path.display());
        }
        Commands::Upload { path, name } => {
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        VaultError::InvalidFilename(path.display().to_string())
                    })?,
            };
            let bytes = std::fs::read(&path)?;
            println!("{}", client.upload(&name, &bytes)?);
        }
        Commands::Delete { name } => {
            println!("{}", client.delete(&name)?);
        }
    }
    Ok(())
}
