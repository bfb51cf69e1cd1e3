// healthledger CLI
//
// keygen  write a secp256k1 keypair as <name>.priv / <name>.pub hex files
// demo    register, create and share a record against an in-process ledger
// sweep   delete expired ciphertext rows from a document store

use clap::{Parser, Subcommand};
use healthledger::client::{ClientConfig, ClientSession};
use healthledger::crypto::Keypair;
use healthledger::docstore::SledDocumentStore;
use healthledger::ledger::AccessTier;
use healthledger::node::LocalLedger;
use healthledger::workflow::{remove_expired_data, PatientClient, WorkflowConfig};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a keypair
    Keygen {
        name: String,
        /// Directory the key files are written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Run the create / share / read scenario end to end
    Demo {
        /// Document store directory (in-memory when omitted)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Remove expired documents
    Sweep {
        #[arg(short, long)]
        store: PathBuf,
        /// Cutoff as epoch seconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().compact().with_env_filter(env_filter).init();

    match args.command {
        Command::Keygen { name, out } => keygen(&name, &out),
        Command::Demo { store } => demo(store).await,
        Command::Sweep { store, now } => {
            let store = SledDocumentStore::open(store)?;
            let now = now.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let deleted = remove_expired_data(&store, now).await?;
            store.flush()?;
            println!("removed {} expired documents", deleted);
            Ok(())
        }
    }
}

fn keygen(name: &str, out: &Path) -> Result<(), Box<dyn Error>> {
    let keypair = Keypair::generate();
    fs::create_dir_all(out)?;
    fs::write(out.join(format!("{}.priv", name)), keypair.to_hex())?;
    fs::write(out.join(format!("{}.pub", name)), keypair.public_key().to_hex())?;
    println!("{} {}", name, keypair.public_key());
    Ok(())
}

async fn demo(store: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let ledger = Arc::new(LocalLedger::new());
    let store = Arc::new(match store {
        Some(path) => SledDocumentStore::open(path)?,
        None => SledDocumentStore::temporary()?,
    });

    let mut clients = Vec::new();
    for name in ["alice", "bob"] {
        let session = ClientSession::open(
            name,
            Keypair::generate(),
            ledger.clone(),
            ledger.clone(),
            ClientConfig::default(),
        )
        .await?;
        let client = PatientClient::open(session, store.clone(), store.clone(), WorkflowConfig::default()).await?;
        client.register().await?;
        clients.push(client);
    }
    let (alice, bob) = (&clients[0], &clients[1]);

    let created = alice.create_patient_data("vitals", b"120/80", AccessTier::Regular).await?;
    println!("alice created {} ({})", created.name, created.hash);

    let shared = alice.share_data(&created.hash, bob.name()).await?;
    println!("alice shared {} with bob as {}", created.hash, shared.hash);

    for node in bob.list_shared_patient_data(alice.name()).await? {
        let document = bob.get_shared_patient_data(&node.hash, alice.name()).await?;
        println!(
            "bob reads {}: {}",
            document.pointer.name,
            String::from_utf8_lossy(&document.plaintext)
        );
    }

    for client in &clients {
        client.close().await?;
    }
    Ok(())
}
