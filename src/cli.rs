use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::board::Board;
use crate::config::StoreConfig;
use crate::pipeline::stages;
use crate::store;

#[derive(Parser)]
#[command(name = "dealboard")]
#[command(author, version, about = "CRM Deal Pipeline Board", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Record store to read deals from
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Mock)]
    store: StoreKind,

    /// Deal file used by the mock store (created with sample deals if missing)
    #[arg(long, global = true, default_value = "deals.json")]
    data: PathBuf,

    /// Record service base URL
    #[arg(long, global = true, env = "DEALBOARD_URL")]
    url: Option<String>,

    /// Record service project ID
    #[arg(long, global = true, env = "DEALBOARD_PROJECT_ID")]
    project_id: Option<String>,

    /// Record service public key
    #[arg(long, global = true, env = "DEALBOARD_PUBLIC_KEY", hide_env_values = true)]
    public_key: Option<String>,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    Mock,
    Remote,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pipeline stages in board order
    Stages,

    /// Show every column with its deals, totals and stage analytics
    Board,

    /// Drag a deal onto another stage
    Move {
        /// Deal ID
        #[arg(short, long)]
        deal: i64,

        /// Target stage ID (e.g., "Qualified" or "Closed Won")
        #[arg(short, long)]
        to: String,
    },
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig> {
        let config = match self.store {
            StoreKind::Mock => StoreConfig::mock(&self.data),
            StoreKind::Remote => {
                let Some(url) = self.url.as_deref() else {
                    bail!("--url (or DEALBOARD_URL) is required for the remote store");
                };
                StoreConfig::remote(url, self.project_id.as_deref(), self.public_key.as_deref())?
            }
        };

        Ok(config)
    }

    async fn open_board(&self) -> Result<Board> {
        let store = store::connect(self.store_config()?).await?;
        let mut board = Board::new(store);
        board.refresh().await?;
        Ok(board)
    }

    fn write_output<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Stages => self.write_output(&stages::all()),
            Commands::Board => {
                let board = self.open_board().await?;
                self.write_output(&board.view(Utc::now()))
            }
            Commands::Move { deal, to } => {
                if !stages::is_known(to) {
                    let known: Vec<_> = stages::all().iter().map(|s| s.id).collect();
                    bail!("Unknown stage {to:?}; expected one of: {}", known.join(", "));
                }

                let mut board = self.open_board().await?;
                board.drag_start(*deal)?;
                board.drag_enter(to);

                match board.drop_on(to).await? {
                    Some(moved) => self.write_output(&moved),
                    None => {
                        info!("Deal {deal} is already in {to}; nothing to move");
                        let current = board.deals().iter().find(|d| d.id == *deal);
                        self.write_output(&current)
                    }
                }
            }
        }
    }
}
