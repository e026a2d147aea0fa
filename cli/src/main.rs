//! `lair` - LavishLair governance command line

mod display;

use clap::{Parser, Subcommand, ValueEnum};
use lair_core::{Address, U256};
use lair_governance::{
    format_proposal, ChainConnector, ClientConfig, DeploymentBook, GovernanceSession,
    JsonRpcProvider, Proposal, ProposalView, VoteChoice,
};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lair")]
#[command(about = "LavishLair DAO governance client")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet / node
    #[arg(long)]
    rpc_url: Option<String>,

    /// Deployment record (chain id -> contract addresses)
    #[arg(long, value_name = "FILE")]
    deployments: Option<PathBuf>,

    /// Chain the contracts live on
    #[arg(long)]
    chain_id: Option<u64>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all proposals, most recent first
    Proposals,

    /// Show one proposal
    Show { id: U256 },

    /// Propose boosting an NFT contract
    Propose {
        /// What the proposal is for
        description: String,

        /// Requested boost in ETH
        #[arg(short, long, default_value = "0")]
        amount: String,

        /// NFT contract to boost (defaults to the voting token)
        #[arg(short, long)]
        token: Option<Address>,
    },

    /// Cast a vote
    Vote {
        id: U256,

        #[arg(value_enum)]
        choice: Choice,
    },

    /// Delegate your voting power to yourself
    Delegate,

    /// Queue and execute a proposal whose vote has ended
    Execute {
        id: U256,

        /// Skip queueing (retry after a failed execute)
        #[arg(long)]
        already_queued: bool,
    },

    /// Contribute ETH to the treasury
    Contribute {
        /// Amount in ETH, e.g. 1.5
        amount: String,
    },

    /// Pay the beneficiary of an executed proposal
    Payout { id: U256 },

    /// List accounts that voted on a proposal
    Voters { id: U256 },

    /// Show your voting power
    Power,

    /// Mint a voting token
    Mint {
        /// Recipient (defaults to your account)
        to: Option<Address>,
    },

    /// Average block time over the last 500 blocks
    BlockTime,

    /// Write a default configuration file
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Choice {
    For,
    Against,
}

impl From<Choice> for VoteChoice {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::For => VoteChoice::For,
            Choice::Against => VoteChoice::Against,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(cli: &Cli, path: &Path) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::load(path)?;
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(deployments) = &cli.deployments {
        config.deployments = deployments.clone();
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = chain_id;
    }
    Ok(config)
}

fn view(proposal: &Proposal) -> Result<ProposalView, Box<dyn std::error::Error>> {
    Ok(format_proposal(&proposal.to_raw())?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::config_path);
    let config = load_config(&cli, &config_path)?;
    log::debug!(
        "→ config {}: rpc {}, chain {}, deployments {}",
        config_path.display(),
        config.rpc_url,
        config.chain_id,
        config.deployments.display()
    );

    if let Commands::InitConfig = cli.command {
        config.save(&config_path)?;
        println!("{} Wrote {}", "✓".green(), config_path.display());
        return Ok(());
    }

    let provider = JsonRpcProvider::new(config.rpc_url.as_str(), config.request_timeout())?;
    let deployments = DeploymentBook::load(&config.deployments)?;
    let connector = ChainConnector::new(Arc::new(provider), deployments);

    let mut session = match GovernanceSession::open(connector, &config).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e.to_string().red());
            return Err(e.into());
        }
    };

    let result = run(&mut session, cli.command, cli.json).await;
    session.disconnect();

    if let Err(e) = &result {
        eprintln!("{} {}", "✗".red(), e.to_string().red());
    }
    result
}

async fn run(
    session: &mut GovernanceSession,
    command: Commands,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Proposals => {
            let views = session
                .proposals()
                .iter()
                .map(view)
                .collect::<Result<Vec<_>, _>>()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
                return Ok(());
            }

            let avg = session.estimate_block_time().await;
            let current = session.current_block().number;
            display::header(&format!(
                "🏛️ Proposals ({} open, block {})",
                session.open_proposal_count(),
                current
            ));
            if views.is_empty() {
                println!("{}", "No proposals yet".yellow());
            }
            for v in &views {
                let remaining = session.time_remaining(v.end_block, avg);
                display::proposal_row(v, &remaining, v.end_block >= current);
            }
            println!();
        }

        Commands::Show { id } => {
            session.refresh_tally(&id).await?;
            let proposal = session.refresh_status(&id).await?.clone();
            let v = view(&proposal)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&v)?);
                return Ok(());
            }
            let avg = session.estimate_block_time().await;
            display::proposal_detail(&v, &session.time_remaining(v.end_block, avg));
        }

        Commands::Propose {
            description,
            amount,
            token,
        } => {
            let token = token.unwrap_or_else(|| session.contracts().token.address());
            let outcome = session.propose(token, &description, &amount).await?;
            display::receipt("propose", &outcome.receipt);
            match outcome.proposal_id {
                Some(id) => println!("Proposal #{} created", id.to_string().bold()),
                None => println!("{}", "⚠ ProposalCreated event not found in receipt".yellow()),
            }
        }

        Commands::Vote { id, choice } => {
            let outcome = session.vote(&id, choice.into()).await?;
            display::receipt("vote", &outcome.receipt);
            let v = view(&outcome.proposal)?;
            println!("Tally: {} for / {} against", v.upvotes, v.downvotes);
        }

        Commands::Delegate => {
            let outcome = session.delegate().await?;
            display::receipt("delegate", &outcome.receipt);
            println!("Voting power: {}", outcome.voting_power.to_string().green());
        }

        Commands::Execute { id, already_queued } => {
            let outcome = if already_queued {
                session.execute(&id).await?
            } else {
                session.queue_then_execute(&id).await?
            };
            if let Some(queue) = &outcome.queue {
                display::receipt("queue", queue);
            }
            display::receipt("execute", &outcome.execute);
        }

        Commands::Contribute { amount } => {
            let outcome = session.contribute(&amount).await?;
            display::receipt("contribute", &outcome.receipt);
            match outcome.credited {
                Some(credited) => println!("Credited {} ETH", credited.green()),
                None => println!("{}", "⚠ No Action event in receipt".yellow()),
            }
        }

        Commands::Payout { id } => {
            let receipt = session.payout_beneficiary(&id).await?;
            display::receipt("payBeneficiary", &receipt);
        }

        Commands::Voters { id } => {
            let voters = session.list_voters(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&voters)?);
                return Ok(());
            }
            display::header(&format!("🗳️ Voters on #{}", id));
            display::voters(&voters);
            println!();
        }

        Commands::Power => {
            let account = session.account();
            let power = session.voting_power();
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "account": account, "votingPower": power.to_string() })
                );
            } else {
                println!("{}: {}", display::short_address(&account.to_hex()), power.to_string().green());
            }
        }

        Commands::Mint { to } => {
            let to = to.unwrap_or_else(|| session.account());
            let receipt = session.mint_voting_token(to).await?;
            display::receipt("safeMint", &receipt);
        }

        Commands::BlockTime => match session.estimate_block_time().await {
            Some(avg) => println!("Average block time: {:.2}s", avg),
            None => println!("{}", "Block time unknown (chain too short or blocks unavailable)".yellow()),
        },

        // Handled before connecting
        Commands::InitConfig => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_vote() {
        let cli = Cli::parse_from(["lair", "vote", "12", "against"]);
        match cli.command {
            Commands::Vote { id, choice } => {
                assert_eq!(id, U256::from(12u8));
                assert_eq!(VoteChoice::from(choice), VoteChoice::Against);
            }
            _ => panic!("expected vote"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["lair", "--chain-id", "31337", "--rpc-url", "http://node:8545", "power"]);
        let config = load_config(&cli, &dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.confirmation_timeout_secs, 120);
    }
}
