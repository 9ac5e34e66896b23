mod create;
mod get;
mod show;

use clap::{Parser, Subcommand};
use google_objects::Result;

pub use create::InputFormat;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "sheets-cli")]
#[command(about = "Read and create Google Sheets from the command line", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Get {
                spreadsheet,
                sheet,
                key,
            } => get::execute(spreadsheet, sheet, key.as_deref()).await,
            Commands::Create {
                title,
                sheet,
                input,
                format,
            } => create::execute(title, sheet, input, *format).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a sheet as JSON records keyed by its header row
    Get {
        /// Spreadsheet id
        #[arg(long)]
        spreadsheet: String,
        #[arg(long, default_value = "Sheet1")]
        sheet: String,
        /// API key, instead of the configured credentials
        #[arg(long)]
        key: Option<String>,
    },
    /// Create a spreadsheet from a JSON or CSV file
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "Sheet1")]
        sheet: String,
        #[arg(long)]
        input: std::path::PathBuf,
        #[arg(long, value_enum, default_value_t = InputFormat::Json)]
        format: InputFormat,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
