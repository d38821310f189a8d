use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use linguist_core::packaging::{self, ARCHIVE_NAME, PUBLIC_DIR};

#[derive(Parser)]
#[command(name = "linguist-pack", about = "Package the LinguistAI browser extension")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Zip an unpacked extension directory
    Zip {
        /// Directory containing manifest.json
        #[arg(default_value = "extension")]
        extension_dir: PathBuf,
        /// Output archive path
        #[arg(default_value = "extension.zip")]
        output: PathBuf,
    },

    /// Assemble public/ with the landing page and the extension archive
    Build {
        /// Project root holding extension/ and landing/
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Zip { extension_dir, output } => {
            let report = packaging::zip_directory(&extension_dir, &output).unwrap_or_else(|e| {
                eprintln!("Failed to zip {}: {}", extension_dir.display(), e);
                process::exit(1);
            });
            println!(
                "Created {} ({} files, {} bytes)",
                output.display(),
                report.files,
                report.bytes
            );
        }
        Command::Build { root } => {
            let report = packaging::build_public(&root).unwrap_or_else(|e| {
                eprintln!("Build failed: {}", e);
                process::exit(1);
            });
            println!("Copied landing/ to {}/landing/", PUBLIC_DIR);
            println!(
                "Created {}/{} ({} files)",
                PUBLIC_DIR, ARCHIVE_NAME, report.files
            );
        }
    }
}
