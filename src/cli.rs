use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CATALOG_PATH: &str = "app/data/content.json";
pub const DEFAULT_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OLD_TAG: &str = "bibliophileai-20";
pub const DEFAULT_NEW_TAG: &str = "busybibliophi-20";

#[derive(Debug, Parser)]
#[command(author, version, about = "Maintenance tasks for the niche book catalog")]
pub struct Cli {
    /// Path to the catalog JSON document.
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_PATH)]
    pub catalog: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Backfill cover image URLs from the book metadata API.
    Covers(CoversArgs),
    /// Regenerate the book list of one niche.
    Generate(GenerateArgs),
    /// Rewrite the affiliate tag on every purchase link.
    Retag(RetagArgs),
}

#[derive(Debug, Args)]
pub struct CoversArgs {
    /// Volumes search endpoint of the metadata API.
    #[arg(long, default_value = DEFAULT_BOOKS_API_URL)]
    pub books_api_url: String,

    /// Pause between metadata requests.
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Niche to regenerate (default: a random niche).
    #[arg(long)]
    pub slug: Option<String>,

    /// Generate but do not write the catalog.
    #[arg(long)]
    pub dry_run: bool,

    /// OpenAI API base URL.
    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,

    /// OpenAI model used for recommendations.
    #[arg(long, default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,

    /// Affiliate tag embedded in generated purchase links.
    #[arg(long, default_value = DEFAULT_NEW_TAG)]
    pub affiliate_tag: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct RetagArgs {
    /// Tag token to replace.
    #[arg(long, default_value = DEFAULT_OLD_TAG)]
    pub old_tag: String,

    /// Tag token to write.
    #[arg(long, default_value = DEFAULT_NEW_TAG)]
    pub new_tag: String,
}
