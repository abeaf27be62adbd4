use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mbox_sort::{CategoryTable, ExtractOptions, extract_mailbox, organize_tree};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract emails from an mbox file into per-sender folders
    Extract {
        /// Path to .mbox file
        mbox_file: PathBuf,

        /// Output directory
        #[arg(long, default_value = "output")]
        out: PathBuf,

        /// Max emails to extract
        #[arg(long)]
        limit: Option<usize>,

        /// Filter by keyword in Subject or From
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Sort extracted emails into category folders per sender
    Organize {
        /// Directory produced by `extract`
        #[arg(default_value = "sorted_emails_output")]
        target_dir: PathBuf,

        /// JSON file with category rules
        #[arg(long, env = "MBOX_SORT_RULES")]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mbox_sort=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Extract {
            mbox_file,
            out,
            limit,
            keyword,
        } => {
            let options = ExtractOptions {
                output_dir: out,
                limit,
                keyword,
            };
            let summary = extract_mailbox(&mbox_file, &options)
                .with_context(|| format!("extract {}", mbox_file.display()))?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Done. Processed {} messages. Extracted {} files to '{}'.",
                    summary.processed,
                    summary.extracted,
                    options.output_dir.display()
                );
            }
        }
        Command::Organize { target_dir, rules } => {
            let table = match rules {
                Some(path) => CategoryTable::from_json_file(&path)
                    .with_context(|| format!("load rules {}", path.display()))?,
                None => CategoryTable::default(),
            };
            let summary = organize_tree(&target_dir, &table)
                .with_context(|| format!("organize {}", target_dir.display()))?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Organization complete. Moved {} files and {} attachment folders across {} senders ({} failed).",
                    summary.moved, summary.attachment_dirs_moved, summary.senders, summary.failed
                );
            }
        }
    }

    Ok(())
}
