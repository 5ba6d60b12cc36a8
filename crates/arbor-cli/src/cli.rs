use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor — content-addressed, deduplicating object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database directory.
    #[arg(long, global = true, default_value = ".")]
    pub db: String,

    /// Content hash algorithm for new objects.
    #[arg(long, global = true, default_value = "sha256")]
    pub algo: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new database
    Init(InitArgs),
    /// Store a file as a single block
    PutBlock(PutBlockArgs),
    /// Print an object's contents
    Cat(CatArgs),
    /// Chunk-ingest a file and link it as a stream
    Put(PutArgs),
    /// Append a file's contents to a stream
    Append(AppendArgs),
    /// List the objects reachable from an address
    Ls(LsArgs),
    /// Re-hash an object against its address
    Verify(VerifyArgs),
    /// Remove an object or stream link
    Rm(RmArgs),
    /// Show an object's class and size
    Stat(StatArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Shard directory depth.
    #[arg(long, default_value = "2")]
    pub depth: usize,
}

#[derive(Args)]
pub struct PutBlockArgs {
    /// Input file, or `-` for stdin.
    pub file: String,
}

#[derive(Args)]
pub struct CatArgs {
    /// Object address or stream label.
    pub address: String,
}

#[derive(Args)]
pub struct PutArgs {
    /// Input file, or `-` for stdin.
    pub file: String,
    /// Stream label to link the ingested tree under.
    #[arg(short, long)]
    pub stream: String,
}

#[derive(Args)]
pub struct AppendArgs {
    /// Input file, or `-` for stdin.
    pub file: String,
    /// Stream label to append to.
    #[arg(short, long)]
    pub stream: String,
}

#[derive(Args)]
pub struct LsArgs {
    /// Object address or stream label.
    pub address: String,
    /// Include inner tree nodes, not just leaves.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Object address or stream label.
    pub address: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Object address or stream label.
    pub address: String,
}

#[derive(Args)]
pub struct StatArgs {
    /// Object address or stream label.
    pub address: String,
}
