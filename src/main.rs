use clap::{Parser, Subcommand};
use tier_tag::{
    config::Settings,
    host::{InMemoryPlaceholders, InMemoryRegistry, InMemoryScoreSource, PrincipalRegistry, ScriptedScore, TokioScheduler},
    models::{compute_tier, normalize_score, Principal, TierLabel},
    service::{Collaborators, RefreshReport, TierService},
    TierTagError,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "tier-tag")]
#[clap(about = "ELO tier tags for placeholder-driven chat formats", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single ELO score
    Classify {
        /// ELO score
        #[clap(allow_hyphen_values = true)]
        score: f64,
    },
    
    /// List the tier bands
    Bands,
    
    /// Run the refresh service against a simulated server
    Simulate {
        /// Number of online players
        #[clap(short, long, default_value = "8")]
        players: usize,
        
        /// Refresh cycles to observe
        #[clap(short, long, default_value = "3")]
        cycles: usize,
        
        /// Override the refresh period in ticks (20 ticks = 1s)
        #[clap(long)]
        period_ticks: Option<u64>,
        
        /// Print cache statistics as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    
    let (settings, load_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e @ TierTagError::Config(_)) => (Settings::default(), Some(e)),
        Err(e) => return Err(e.into()),
    };
    
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    
    if let Some(e) = load_error {
        warn!("Using default settings: {}", e);
    }
    
    match cli.command {
        Commands::Classify { score } => {
            let tier = compute_tier(normalize_score(score));
            println!("{} {}", tier.tag(), tier.as_str());
        }
        
        Commands::Bands => {
            let mut lower = 0.0;
            for tier in TierLabel::ALL {
                match tier.upper_bound() {
                    Some(upper) => {
                        println!("{:<4} {:>8} .. {:<8} {}", tier.tag(), lower, upper, tier.as_str());
                        lower = upper;
                    }
                    None => println!("{:<4} {:>8} .. {:<8} {}", tier.tag(), lower, "", tier.as_str()),
                }
            }
        }
        
        Commands::Simulate { players, cycles, period_ticks, json } => {
            let mut settings = settings;
            if let Some(ticks) = period_ticks {
                settings.refresh.period_ticks = ticks;
                settings.validate().map_err(|e| anyhow::anyhow!(e))?;
            }
            simulate(settings, players, cycles, json).await?;
        }
    }
    
    Ok(())
}

async fn simulate(settings: Settings, players: usize, cycles: usize, json: bool) -> anyhow::Result<()> {
    let registry = Arc::new(InMemoryRegistry::default());
    let source = Arc::new(InMemoryScoreSource::new());
    let placeholders = Arc::new(InMemoryPlaceholders::new());
    
    for i in 0..players {
        registry.join(Principal::random(format!("Player{}", i + 1)));
    }
    rescore(&registry, &source);
    
    let service = TierService::new(
        Collaborators {
            registry: registry.clone(),
            source: source.clone(),
            scheduler: Arc::new(TokioScheduler::new()),
            placeholders: placeholders.clone(),
        },
        settings.refresh.clone(),
        settings.placeholder.clone(),
    );
    
    let report = service.start().await?;
    print_cycle(1, &report, &registry, &placeholders, json)?;
    
    let period = settings.refresh.period();
    for cycle in 2..=cycles {
        rescore(&registry, &source);
        info!("Waiting {}s for the next scheduled refresh", period.as_secs());
        tokio::time::sleep(period + Duration::from_millis(250)).await;
        
        let report = service.last_report().unwrap_or_default();
        print_cycle(cycle, &report, &registry, &placeholders, json)?;
    }
    
    if json {
        println!("{}", serde_json::to_string_pretty(&service.cache().stats())?);
    }
    
    service.stop();
    Ok(())
}

/// Give every online player a fresh random ELO, with the odd broken reply
fn rescore(registry: &InMemoryRegistry, source: &InMemoryScoreSource) {
    let mut rng = rand::thread_rng();
    for principal in registry.list_current_principals() {
        let roll: f64 = rng.gen();
        let scripted = if roll < 0.1 {
            ScriptedScore::Unavailable
        } else if roll < 0.15 {
            ScriptedScore::Raw("null".to_string())
        } else {
            ScriptedScore::Raw(format!("{:.0}", rng.gen_range(0.0..50_000.0)))
        };
        source.set(&principal, scripted);
    }
}

fn print_cycle(
    cycle: usize,
    report: &RefreshReport,
    registry: &InMemoryRegistry,
    placeholders: &InMemoryPlaceholders,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    
    println!("\n=== Refresh cycle {} ===", cycle);
    for principal in registry.list_current_principals() {
        println!("  {:<10} {}", principal.name, placeholders.apply(&principal, "%tiertag_tier%"));
    }
    if report.defaulted() > 0 {
        println!("  ({} of {} scores defaulted to 0)", report.defaulted(), report.principals);
    }
    Ok(())
}
