use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Macro, MacroTarget};
use engine::{EngineConfig, FoodRecommendation, RecommendationEngine};
use nutrition_client::{FsvoClient, FsvoConfig, NutritionLookup};
use rand::Rng;
use sources::{DailyGoals, MealLog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// MacroRecs - Macro-aware food recommendations
#[derive(Parser)]
#[command(name = "macro-recs")]
#[command(about = "Food recommendations from macro-nutrient profiles", long_about = None)]
struct Cli {
    /// Path to the food composition table (CSV or TSV)
    #[arg(short, long, default_value = "data/swiss_food_composition_database.csv")]
    data: PathBuf,

    /// Optional JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Foods with a macro profile similar to a given food
    Similar {
        /// Food name (exact match first, then substring)
        #[arg(long)]
        food: String,

        #[arg(long, default_value = "5")]
        limit: usize,

        /// Show why each food was picked
        #[arg(long)]
        explain: bool,
    },

    /// Foods that fit the remaining macro budget
    Goal {
        /// Remaining budget as kcal,protein,fat,carbs
        #[arg(long, value_parser = parse_macros)]
        remaining: MacroTarget,

        /// Daily goals as kcal,protein,fat,carbs
        #[arg(long, value_parser = parse_macros)]
        goals: Option<MacroTarget>,

        #[arg(long, default_value = "5")]
        limit: usize,

        #[arg(long)]
        explain: bool,
    },

    /// Daily progress and suggestions from goals and a meal log
    Plan {
        /// JSON file with daily goals
        #[arg(long)]
        goals: PathBuf,

        /// JSON file with the meals logged today
        #[arg(long)]
        meals: PathBuf,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Search the local table by name
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show cluster sizes and profiles
    Clusters,

    /// Look a food up in the FSVO online database
    Lookup {
        #[arg(long)]
        query: String,

        /// Portion size in grams
        #[arg(long, default_value = "100")]
        portion: f64,

        /// Also list this many similar foods from the local table
        #[arg(long, default_value = "0")]
        similar: usize,
    },

    /// Run benchmark to test query performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Similar {
            food,
            limit,
            explain,
        } => handle_similar(&load_engine(&cli.data, config)?, &food, limit, explain),
        Commands::Goal {
            remaining,
            goals,
            limit,
            explain,
        } => handle_goal(
            &load_engine(&cli.data, config)?,
            &remaining,
            goals.as_ref(),
            limit,
            explain,
        ),
        Commands::Plan {
            goals,
            meals,
            limit,
        } => handle_plan(&load_engine(&cli.data, config)?, &goals, &meals, limit),
        Commands::Search { query, limit } => {
            handle_search(&load_engine(&cli.data, config)?, &query, limit)
        }
        Commands::Clusters => handle_clusters(&load_engine(&cli.data, config)?),
        Commands::Lookup {
            query,
            portion,
            similar,
        } => handle_lookup(&cli.data, config, &query, portion, similar).await,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(Arc::new(load_engine(&cli.data, config)?), requests, concurrent).await,
    }
}

/// Load the table and train the models (this may take a moment)
fn load_engine(data: &Path, config: EngineConfig) -> Result<RecommendationEngine> {
    println!("Loading food table from {}...", data.display());
    let start = Instant::now();
    let engine = RecommendationEngine::new(data, config)
        .with_context(|| format!("Failed to build recommendation engine from {}", data.display()))?;
    let stats = engine.stats();
    println!(
        "{} Loaded {} foods in {} categories ({} rows dropped) in {:?}",
        "✓".green(),
        stats.foods,
        stats.categories,
        stats.dropped_rows,
        start.elapsed()
    );
    Ok(engine)
}

/// Parse `kcal,protein,fat,carbs`.
fn parse_macros(value: &str) -> Result<MacroTarget> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .with_context(|| format!("'{}' is not a number", p.trim()))
        })
        .collect::<Result<_>>()?;
    let [kcal, protein, fat, carbs] = parts[..] else {
        bail!("expected kcal,protein,fat,carbs, got {} values", parts.len());
    };
    let target = MacroTarget::new(kcal, protein, fat, carbs);
    if !target.is_valid() {
        bail!("macro values must be finite and non-negative");
    }
    Ok(target)
}

/// Handle the 'similar' command
fn handle_similar(engine: &RecommendationEngine, food: &str, limit: usize, explain: bool) -> Result<()> {
    let similar = engine.similar_foods(food, limit);
    if similar.is_empty() {
        println!("{} No food matching '{}' was found", "✗".red(), food);
        return Ok(());
    }
    print_recommendations(&format!("Foods similar to '{}':", food), &similar, explain);
    Ok(())
}

/// Handle the 'goal' command
fn handle_goal(
    engine: &RecommendationEngine,
    remaining: &MacroTarget,
    goals: Option<&DailyGoals>,
    limit: usize,
    explain: bool,
) -> Result<()> {
    print_remaining(remaining);
    let aligned = engine.goal_aligned_foods(remaining, goals, limit);
    if aligned.is_empty() {
        println!("{} No foods fit the remaining budget", "✗".red());
        return Ok(());
    }
    print_recommendations("Foods for your remaining macros:", &aligned, explain);
    Ok(())
}

/// Handle the 'plan' command
fn handle_plan(engine: &RecommendationEngine, goals: &Path, meals: &Path, limit: usize) -> Result<()> {
    let goals: DailyGoals = read_json(goals).context("Failed to read daily goals")?;
    let log: MealLog = read_json(meals).context("Failed to read meal log")?;
    if !goals.is_valid() {
        bail!("Daily goals must be finite and non-negative");
    }

    println!("{}", "Today's progress:".bold().blue());
    let progress = log.progress(&goals);
    println!(
        "{}Energy: {:.0} / {:.0} kcal ({:.0}%)",
        "• ".green(),
        progress.kcal.consumed,
        progress.kcal.goal,
        progress.kcal.fraction * 100.0
    );
    for m in Macro::ALL {
        let p = progress.get(m);
        println!(
            "{}{}: {:.1} / {:.1} g ({:.0}%)",
            "• ".green(),
            capitalize(m.label()),
            p.consumed,
            p.goal,
            p.fraction * 100.0
        );
    }

    if log.goals_met(&goals) {
        println!("{} All macro goals met for today", "✓".green());
        return Ok(());
    }

    let remaining = log.remaining(&goals);
    print_remaining(&remaining);
    let aligned = engine.goal_aligned_foods(&remaining, Some(&goals), limit);
    if aligned.is_empty() {
        println!("{} No foods fit the remaining budget", "✗".red());
    } else {
        print_recommendations("Foods for your remaining macros:", &aligned, false);
    }

    if let Some(last) = log.last() {
        let similar = engine.similar_foods(&last.name, limit);
        if !similar.is_empty() {
            print_recommendations(&format!("Alternatives to '{}':", last.name), &similar, false);
        }
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, query: &str, limit: usize) -> Result<()> {
    let hits = engine.search(query, limit);
    println!("{}", format!("Search results for '{}':", query).bold().blue());
    if hits.is_empty() {
        println!("  (no matches)");
    }
    for (record, kind) in hits {
        println!(
            "  {} [{}] {:.0} kcal, P {:.1} g / F {:.1} g / C {:.1} g ({:?})",
            record.name,
            record.category,
            record.energy_kcal,
            record.protein_g,
            record.fat_g,
            record.carbs_g,
            kind
        );
    }
    Ok(())
}

/// Handle the 'clusters' command
fn handle_clusters(engine: &RecommendationEngine) -> Result<()> {
    let stats = engine.stats();
    println!(
        "{}",
        format!("{} clusters over {} foods ({:?}):", stats.clusters, stats.foods, stats.feature_space)
            .bold()
            .blue()
    );
    for summary in engine.cluster_summaries() {
        let [p, f, c] = summary.mean_ratios;
        println!(
            "{}Cluster {}: {} foods, mean P {:.0}% / F {:.0}% / C {:.0}%",
            "• ".cyan(),
            summary.cluster,
            summary.size,
            p * 100.0,
            f * 100.0,
            c * 100.0
        );
        let centroid: Vec<String> = summary.centroid.iter().map(|v| format!("{:.3}", v)).collect();
        println!("    centroid [{}]", centroid.join(", "));
    }
    Ok(())
}

/// Handle the 'lookup' command
async fn handle_lookup(
    data: &Path,
    config: EngineConfig,
    query: &str,
    portion: f64,
    similar: usize,
) -> Result<()> {
    if !(portion.is_finite() && portion > 0.0) {
        bail!("Portion must be a positive number of grams");
    }
    let client = FsvoClient::new(FsvoConfig::default()).context("Failed to create FSVO client")?;
    let hits = client
        .search(query)
        .await
        .with_context(|| format!("FSVO search for '{}' failed", query))?;

    println!("{}", format!("FSVO results for '{}':", query).bold().blue());
    for hit in hits.iter().take(10) {
        println!("  {} (id {})", hit.name, hit.id);
    }
    let best = hits
        .first()
        .ok_or_else(|| anyhow!("No FSVO food matches '{}'", query))?;

    let per_100g = client
        .details(best.id)
        .await
        .with_context(|| format!("Failed to fetch details for '{}'", best.name))?;
    let consumed = per_100g.per_portion(portion);
    println!("{}", format!("{} ({:.0} g):", best.name, portion).bold());
    println!(
        "{}{:.0} kcal, P {:.1} g / F {:.1} g / C {:.1} g",
        "• ".green(),
        consumed.kcal,
        consumed.protein_g,
        consumed.fat_g,
        consumed.carbs_g
    );

    if similar > 0 {
        let engine = load_engine(data, config)?;
        handle_similar(&engine, &best.name, similar, false)?;
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("Benchmark needs at least one request");
    }
    let names: Arc<Vec<String>> = Arc::new(
        engine
            .catalog()
            .records()
            .iter()
            .map(|r| r.name.clone())
            .collect(),
    );
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    info!("Running {} requests, {} at a time", requests, concurrent.max(1));

    let wall = Instant::now();
    let mut handles = vec![];
    for i in 0..requests {
        let engine = engine.clone();
        let names = names.clone();
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .context("Benchmark semaphore closed")?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut rng = rand::thread_rng();
            let start = Instant::now();
            if i % 2 == 0 {
                let name = &names[rng.gen_range(0..names.len())];
                engine.similar_foods(name, 10);
            } else {
                let remaining = MacroTarget::new(
                    rng.gen_range(200.0..1500.0),
                    rng.gen_range(5.0..120.0),
                    rng.gen_range(5.0..70.0),
                    rng.gen_range(5.0..250.0),
                );
                engine.goal_aligned_foods(&remaining, None, 10);
            }
            start.elapsed()
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await.context("Benchmark task panicked")?);
    }
    let total_time = wall.elapsed();

    let busy: Duration = timings.iter().sum();
    let avg_latency = busy / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Cannot parse {}", path.display()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print_remaining(remaining: &MacroTarget) {
    println!(
        "{} {:.0} kcal, P {:.1} g / F {:.1} g / C {:.1} g",
        "Remaining:".bold(),
        remaining.kcal,
        remaining.protein_g,
        remaining.fat_g,
        remaining.carbs_g
    );
}

/// Helper function to format and print recommendations
fn print_recommendations(title: &str, recommendations: &[FoodRecommendation], explain: bool) {
    println!("{}", title.bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        let food = &rec.food;
        println!(
            "{}. {} [{}] {:.0} kcal, P {:.1} g / F {:.1} g / C {:.1} g - Score: {:.3}",
            (i + 1).to_string().green(),
            food.name,
            food.category,
            food.energy_kcal,
            food.protein_g,
            food.fat_g,
            food.carbs_g,
            rec.score
        );
        if explain {
            println!("   Explanation: {}", rec.explanation);
        }
    }
}
