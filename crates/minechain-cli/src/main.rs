use anyhow::Result;
use clap::{Parser, Subcommand};
use minechain_core::chain::Chain;
use minechain_core::{mine::mine_parallel, Block};
use minechain_tx::keys::KeyPair;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "minechain")]
#[command(about = "Proof-of-work ledger demo")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grow a chain from genesis, mining blocks with UUID payloads
    Run {
        /// Number of mined blocks to append
        #[arg(long, default_value_t = 10)]
        blocks: u32,
        /// Leading zero bits each seal must show
        #[arg(long, default_value_t = 20)]
        difficulty: u32,
    },
    /// Mine a single block over the given payload and print it
    Mine {
        /// Block payload
        #[arg(long)]
        data: String,
        /// Leading zero bits the seal must show
        #[arg(long, default_value_t = 16)]
        difficulty: u32,
    },
    /// Generate a signing key and write it to a file
    Keygen {
        /// Destination file for the hex-encoded secret key
        #[arg(long, default_value = "./private_key")]
        out: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run { blocks, difficulty } => {
            info!("starting chain");
            let mut chain = Chain::genesis("genesis");
            chain.append_data("first", 0);
            for _ in 0..blocks {
                chain.append_data(Uuid::new_v4().to_string(), difficulty);
                println!("finished block {}", chain.tip().index);
            }
            print!("{chain}");
        }
        Command::Mine { data, difficulty } => {
            let genesis = Block::genesis("genesis");
            let block = mine_parallel(Block::next(&genesis, data, difficulty));
            print!("{block}");
        }
        Command::Keygen { out } => {
            let key = KeyPair::generate();
            key.save(&out)?;
            println!("wrote signing key to {out}");
        }
    }
    Ok(())
}
