//! sfx-export entry point.

use signalfx_exporter::cli::{self, Cli};
use signalfx_exporter::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli).await
}
