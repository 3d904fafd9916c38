use clap::{Args, Parser, Subcommand, ValueEnum};
use ethers::types::Address;
use safety_map::aggregation::{digest_reviews, format_keywords};
use safety_map::api::BackendClient;
use safety_map::blockchain::{probe_signer, SignerChoice};
use safety_map::config::{BackendConfig, NetworkConfig};
use safety_map::models::TxStatus;
use safety_map::{BlockchainGateway, GatewayError, ReviewInput, SignerProvider};

/// Community safety map - read and submit on-chain location reviews
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Network preset
    #[arg(short, long, value_enum, default_value_t = Network::Sepolia, global = true)]
    network: Network,

    /// JSON-RPC endpoint of a wallet to sign with (falls back to the development key)
    #[arg(long, env = "SAFETY_MAP_WALLET_URL", global = true)]
    wallet_url: Option<String>,

    /// Companion backend base URL
    #[arg(long, env = "SAFETY_MAP_BACKEND_URL", default_value = BackendConfig::DEFAULT_URL, global = true)]
    backend_url: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Network {
    Sepolia,
    Hardhat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reviews grouped by location with scores, tags and summaries
    Locations {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Number of reviews on chain
    Count,
    /// Submit a review
    Submit(SubmitArgs),
    /// Register the account, or log in if already registered
    Register,
    /// Reward token balance
    Balance {
        /// Account to query (defaults to the connected one)
        address: Option<String>,
    },
    /// Print new reviews as they are submitted
    Watch,
    /// Check the companion backend
    Health,
    /// Resolve an address to coordinates through the backend
    Geocode { address: String },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    province: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    district: String,
    #[arg(long, default_value_t = 0)]
    night_lighting: u8,
    #[arg(long, default_value_t = 0)]
    security_status: u8,
    #[arg(long, default_value_t = 0)]
    female_density: u8,
    #[arg(long, default_value_t = 0)]
    overall_safety: u8,
    #[arg(long, default_value = "")]
    text: String,
    #[arg(long, default_value = "")]
    summary: String,
    /// Comma separated tags
    #[arg(long, default_value = "")]
    keywords: String,
    /// Fill summary and tags from the backend's text analysis
    #[arg(long)]
    analyze: bool,
    /// Wait for the transaction to be mined
    #[arg(long)]
    wait: bool,
}

impl SubmitArgs {
    fn into_input(self) -> ReviewInput {
        ReviewInput {
            address: self.address,
            latitude: self.lat,
            longitude: self.lng,
            province: self.province,
            city: self.city,
            district: self.district,
            night_lighting: self.night_lighting,
            security_status: self.security_status,
            female_density: self.female_density,
            overall_safety: self.overall_safety,
            text_review: self.text,
            ai_summary: self.summary,
            keywords: self.keywords,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { "safety_map=debug" } else { "safety_map=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let backend = BackendClient::new(&BackendConfig::new(cli.backend_url.clone()))?;

    match &cli.command {
        Command::Health => {
            let health = backend.health().await?;
            println!("Backend: {}", health.status);
            println!("   • Map service configured: {}", health.baidu_map_configured);
            println!("   • Text analysis configured: {}", health.deepseek_configured);
            return Ok(());
        }
        Command::Geocode { address } => {
            let result = backend.geocoding(address).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
        _ => {}
    }

    let preset = match cli.network {
        Network::Sepolia => NetworkConfig::sepolia(),
        Network::Hardhat => NetworkConfig::hardhat(),
    };
    let mut network = preset.with_env_overrides()?;
    if cli.wallet_url.is_some() {
        network.wallet_url = cli.wallet_url.clone();
    }

    match probe_signer(&network).await? {
        SignerChoice::Injected(wallet) => {
            run(BlockchainGateway::new(wallet, network), cli.command, &backend).await?
        }
        SignerChoice::Local(key) => {
            run(BlockchainGateway::new(key, network), cli.command, &backend).await?
        }
    }

    Ok(())
}

async fn run<S: SignerProvider>(
    mut gateway: BlockchainGateway<S>,
    command: Command,
    backend: &BackendClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = gateway.connect().await?;
    println!("✅ Connected {:?} ({}) on {}\n", account.address, account.signer, gateway.network().chain_name());

    match command {
        Command::Locations { json } => {
            let reviews = gateway.get_all_reviews().await?;
            let digests = digest_reviews(reviews);

            if json {
                println!("{}", serde_json::to_string_pretty(&digests)?);
                return Ok(());
            }

            if digests.is_empty() {
                println!("No reviews yet.");
            }
            for digest in &digests {
                let location = &digest.location;
                println!("📍 {} ({:.6}, {:.6})", location.address, location.latitude, location.longitude);
                println!("   Reviews: {}", location.reviews.len());
                println!(
                    "   Scores: lighting {:.1} · security {:.1} · density {:.1} · safety {:.1} · overall {:.1}",
                    digest.scores.night_lighting,
                    digest.scores.security_status,
                    digest.scores.female_density,
                    digest.scores.overall_safety,
                    digest.scores.overall,
                );
                let tags = format_keywords(&digest.keywords);
                if !tags.is_empty() {
                    println!("   Tags: {}", tags.join(" "));
                }
                for line in digest.summary.lines() {
                    println!("   {}", line);
                }
                println!();
            }
        }
        Command::Count => {
            println!("Reviews on chain: {}", gateway.get_review_count().await?);
        }
        Command::Submit(args) => {
            let analyze = args.analyze;
            let wait = args.wait;
            let mut input = args.into_input();

            if analyze && !input.text_review.trim().is_empty() {
                match backend.analyze_review(&input.text_review).await {
                    Ok(analysis) => {
                        if input.ai_summary.is_empty() {
                            input.ai_summary = analysis.summary.clone();
                        }
                        if input.keywords.is_empty() {
                            input.keywords = analysis.keywords_csv();
                        }
                    }
                    Err(e) => tracing::warn!("Text analysis unavailable: {}", e),
                }
            }

            let submitted = match gateway.submit_review(&input).await {
                Ok(submitted) => submitted,
                Err(GatewayError::InsufficientFunds { balance, minimum }) => {
                    eprintln!(
                        "❌ Balance {} ETH is below the {} ETH kept for gas",
                        ethers::utils::format_ether(balance),
                        ethers::utils::format_ether(minimum)
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };
            println!("📝 Review {} sent: {:?}", submitted.review_id, submitted.tx_hash);

            if wait {
                let outcome = gateway.wait_for_transaction(submitted.tx_hash).await?;
                match outcome.status {
                    TxStatus::Success => println!("✅ Mined in block {}", outcome.block_number.unwrap_or_default()),
                    TxStatus::Failed => println!("❌ Transaction reverted"),
                }
            }
        }
        Command::Register => {
            let outcome = gateway.register_or_login().await?;
            if outcome.is_new_user {
                let symbol = gateway.get_token_symbol().await?;
                println!("🎉 Registered! Reward: {} {}", outcome.reward_amount, symbol);
                if let Some(hash) = outcome.tx_hash {
                    println!("   Transaction: {:?}", hash);
                }
            } else {
                println!("👋 Welcome back");
            }
        }
        Command::Balance { address } => {
            let address = address
                .map(|a| a.parse::<Address>().map_err(|_| GatewayError::InvalidAddress(a)))
                .transpose()?;
            let balance = gateway.get_token_balance(address).await?;
            let symbol = gateway.get_token_symbol().await?;
            println!("💰 {} {}", balance, symbol);
        }
        Command::Watch => {
            let subscription = gateway.on_review_submitted(|review, count| {
                println!(
                    "🆕 {} ({:.6}, {:.6}) safety {} · {} reviews total",
                    review.address, review.latitude, review.longitude, review.overall_safety, count
                );
            })?;
            println!("Watching for new reviews, Ctrl-C to stop...");
            tokio::signal::ctrl_c().await?;
            subscription.cancel();
        }
        Command::Health | Command::Geocode { .. } => unreachable!("handled before connecting"),
    }

    gateway.disconnect();
    Ok(())
}
