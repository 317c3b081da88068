//! Cadence CLI - action budget and content strategy for a posting agent.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cadence_core::{ActionType, ContentType, GovernorConfig, MetricsUpdate, Platform, PostId, RetryConfig};
use cadence_evolution::AdaptiveWeighting;
use cadence_execution::{BudgetLedger, FollowLimiter};
use cadence_progress::{BasicOutcomeTracker, OutcomeTracker};
use cadence_reflection::{strategy_narrative, JsonArchive, MetaReviewer, NoopArchive, ReportArchive};
use cadence_resilience::{
    CircuitBreaker, CircuitBreakerConfig, GenerationOptions, HttpGenerationClient, ResilientExecutor,
    ResilientGenerator, RetryOptions,
};
use cadence_storage::{JsonStorage, Storage};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Action budget and content strategy for a posting agent", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, default_value = ".cadence")]
    data_dir: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's budget
    Budget,
    /// Record an action against today's budget
    Record {
        /// Action type (scheduled_post, reply, quote_post, like, repost, follow, discretionary_post)
        action_type: String,
        /// What the action was
        description: String,
        /// Platform id of the resulting item
        #[arg(long)]
        external_ref: Option<String>,
    },
    /// Record a follow against today's follow limit
    Follow {
        /// Account followed
        account: String,
    },
    /// Track a newly published post
    Track {
        /// Content type
        content_type: String,
        /// Platform
        platform: String,
        /// Tone
        #[arg(long, default_value = "neutral")]
        tone: String,
        /// Topic
        #[arg(long, default_value = "")]
        topic: String,
    },
    /// Update engagement metrics for a post
    Metrics {
        /// Post ID
        id: String,
        /// Reactions
        #[arg(long)]
        reactions: Option<u32>,
        /// Replies
        #[arg(long)]
        replies: Option<u32>,
        /// Link clicks
        #[arg(long)]
        link_clicks: Option<u32>,
    },
    /// Score matured posts
    Score,
    /// Adapt content-type weights to recent scores
    Adapt {
        /// Days of scored posts to consider
        #[arg(long)]
        window_days: Option<u32>,
    },
    /// Run the weekly meta review
    Review {
        /// Also write the report as JSON into this directory
        #[arg(long)]
        archive_dir: Option<PathBuf>,
    },
    /// Draw a content type from the current weights
    Pick,
    /// Generate text through the resilient client
    Generate {
        /// Prompt
        prompt: String,
        /// Provider endpoint
        #[arg(long)]
        endpoint: String,
        /// Model name
        #[arg(long, default_value = "default")]
        model: String,
        /// Prepend the latest strategy narrative to the prompt
        #[arg(long)]
        with_strategy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GovernorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => GovernorConfig::default(),
    };

    let storage = Arc::new(JsonStorage::new(&cli.data_dir).await?);

    match cli.command {
        Commands::Budget => {
            let ledger = BudgetLedger::new(storage).with_config(config.budget);
            let summary = ledger.get_budget_summary().await;
            println!("{}", summary);
            for (action_type, count) in &summary.snapshot.breakdown_by_type {
                println!("  {}: {}", action_type, count);
            }
        }
        Commands::Record { action_type, description, external_ref } => {
            let action_type: ActionType = action_type.parse()?;
            let ledger = BudgetLedger::new(storage).with_config(config.budget);
            if ledger
                .record_action(action_type, &description, external_ref.as_deref())
                .await
            {
                println!("Recorded {}: {}", action_type, description);
            } else {
                println!("Budget exhausted, {} not recorded", action_type);
            }
            println!("{}", ledger.get_budget_summary().await);
        }
        Commands::Follow { account } => {
            let limiter = FollowLimiter::new(storage).with_limit(config.budget.daily_follow_limit);
            if limiter.record_follow(&account).await {
                println!("Recorded follow of {} ({} today)", account, limiter.follows_today().await);
            } else {
                println!("Follow limit reached, {} not recorded", account);
            }
        }
        Commands::Track { content_type, platform, tone, topic } => {
            let content_type: ContentType = content_type.parse()?;
            let platform: Platform = platform.parse()?;
            let tracker = BasicOutcomeTracker::new(storage).with_config(config.scoring);
            let post = tracker.track_post(content_type, platform, &tone, &topic).await?;
            println!("Tracking post: {} ({} on {})", post.id, post.content_type, post.platform);
        }
        Commands::Metrics { id, reactions, replies, link_clicks } => {
            let post_id: PostId = id.parse()?;
            let update = MetricsUpdate { reactions, replies, link_clicks };
            let tracker = BasicOutcomeTracker::new(storage).with_config(config.scoring);
            tracker.update_post_metrics(post_id, &update).await?;
            println!("Updated metrics for {}", post_id);
        }
        Commands::Score => {
            let tracker = BasicOutcomeTracker::new(storage).with_config(config.scoring);
            let scored = tracker.score_old_posts().await;
            println!("Scored {} post(s)", scored);
        }
        Commands::Adapt { window_days } => {
            let weighting = AdaptiveWeighting::new(storage).with_config(config.weights);
            let adjustments = match window_days {
                Some(days) => weighting.adapt_weights(days).await?,
                None => weighting.adapt_configured().await?,
            };
            if adjustments.is_empty() {
                println!("No scored posts in window, weights unchanged");
            }
            for a in &adjustments {
                println!("  {}: {} -> {} ({:+.1})", a.content_type, a.from, a.to, a.differential);
            }
            println!("Weights:");
            for w in weighting.current_weights().await {
                println!("  {}: {}", w.content_type, w.weight);
            }
        }
        Commands::Review { archive_dir } => {
            let reviewer = MetaReviewer::new(storage, Arc::new(NoopArchive)).with_config(config.review);
            let Some(report) = reviewer.run_meta_review().await? else {
                println!("Not enough data for a review this week");
                return Ok(());
            };

            // Awaited here so the write finishes before the process exits.
            if let Some(dir) = archive_dir {
                if let Err(e) = JsonArchive::new(dir).archive(&report).await {
                    warn!("Failed to archive report {}: {}", report.id, e);
                }
            }

            println!("Report {}", report.id);
            println!("  Posts: {}", report.total_posts);
            println!("  Average: {:.1} (last week {:.1})", report.avg_score, report.last_week_avg);
            println!("  Trend: {}", report.trend);
            println!();
            println!("{}", strategy_narrative(&report));
        }
        Commands::Pick => {
            let weighting = AdaptiveWeighting::new(storage).with_config(config.weights);
            let mut rng = rand::thread_rng();
            match weighting.select_content_type(&mut rng).await {
                Some(content_type) => println!("{}", content_type),
                None => println!("No content type has a positive weight"),
            }
        }
        Commands::Generate { prompt, endpoint, model, with_strategy } => {
            let mut full_prompt = String::new();
            if with_strategy {
                match storage.list_reports().await?.last() {
                    Some(report) => {
                        full_prompt.push_str(&strategy_narrative(report));
                        full_prompt.push_str("\n\n");
                    }
                    None => info!("No review yet, generating without strategy"),
                }
            }
            full_prompt.push_str(&prompt);

            let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: config.breaker.failure_threshold,
                cooldown: Duration::from_secs(config.breaker.cooldown_secs),
            }));
            let client = HttpGenerationClient::new(endpoint, std::env::var("CADENCE_API_KEY").ok());
            let generator = ResilientGenerator::new(client, ResilientExecutor::new(breaker))
                .with_options(retry_options(&config.retry));

            let options = GenerationOptions { model, ..Default::default() };
            let generation = generator.generate(&full_prompt, &options).await?;
            println!("{}", generation.text);
            info!(
                input_tokens = generation.input_tokens,
                output_tokens = generation.output_tokens,
                "Generation complete"
            );
        }
    }

    Ok(())
}

fn retry_options(config: &RetryConfig) -> RetryOptions {
    RetryOptions::for_dependency("llm")
        .with_max_retries(config.max_retries)
        .with_base_delay(Duration::from_millis(config.base_delay_ms))
        .with_skip_client_errors(config.skip_client_errors)
        .with_attempt_timeout(Duration::from_secs(config.attempt_timeout_secs))
}
