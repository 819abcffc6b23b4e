use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use dex_traders::browser::ChromeLauncher;
use dex_traders::gmgn::Gmgn;
use dex_traders::model::TradeRecord;
use dex_traders::report::{self, PREVIEW_ROWS};
use dex_traders::target::ExtractionTarget;
use dex_traders::{artifact, pairs, Settings, TraderScraper};

#[derive(Parser)]
#[command(name = "dex_traders", about = "Top-trader scraper for DEX analytics sites")]
struct Cli {
    /// Settings file (TOML/JSON/YAML); defaults to ./dex_traders.* if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a pair page's top traders into <output>.json
    Traders {
        /// Pair page URL (prompted if omitted)
        #[arg(long)]
        url: Option<String>,
        /// Output file name without extension (prompted if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the hottest tokens from the GMGN ranking
    Tokens {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Rank tokens, then fetch each token's realized-profit leaderboard
    Leaderboard {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Write all leaderboards to <output>.json
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Trending pairs from the explorer home page
    Pairs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let launcher = ChromeLauncher;

    let result = match cli.command {
        Commands::Traders { url, output } => {
            let url = match url {
                Some(u) => u,
                None => prompt("Enter DexScreener URL: ")?,
            };
            let output = match output {
                Some(o) => o,
                None => prompt("Enter output file name (without extension): ")?,
            };
            // bad input never reaches the browser
            let target = ExtractionTarget::new(&url, &output, &settings.site.supported_hosts)?;

            let outcome = TraderScraper::new(&launcher, &settings).run(&target).await?;
            for notice in &outcome.notices {
                println!("Note: {}", notice);
            }
            let dir = Path::new(&settings.output_dir);
            let path = artifact::write(&outcome.result, dir, target.output())?;

            println!(
                "\n{} | {} traders",
                outcome.result.project_name,
                outcome.result.traders.len()
            );
            if !outcome.result.traders.is_empty() {
                print!("{}", report::trader_preview(&outcome.result.traders, PREVIEW_ROWS));
            }
            println!("Saved to {}", path.display());
            Ok(())
        }
        Commands::Tokens { limit } => {
            let tokens = Gmgn::new(&launcher, &settings)
                .rank_tokens(limit, settings.gmgn.max_tokens)
                .await?;
            if tokens.is_empty() {
                println!("No tokens ranked.");
                return Ok(());
            }
            print!("{}", report::token_list(&tokens));
            Ok(())
        }
        Commands::Leaderboard { limit, output } => {
            let pb = ProgressBar::new(limit as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );

            let run = Gmgn::new(&launcher, &settings)
                .leaderboards(limit, output.as_deref(), |i, token| {
                    pb.set_position(i as u64);
                    pb.set_message(report::truncate(token.as_str(), 12));
                })
                .await;
            pb.finish_and_clear();
            let run = run?;

            if run.boards.is_empty() && run.failed == 0 {
                println!("No tokens ranked.");
                return Ok(());
            }
            print!("{}", report::leaderboard_summary(&run.boards));
            println!(
                "\n{} tokens, {} traders, {} failed",
                run.boards.len(),
                run.trader_count(),
                run.failed
            );

            if let Some(name) = &run.output {
                let by_token: BTreeMap<&str, &Vec<TradeRecord>> =
                    run.boards.iter().map(|(t, r)| (t.as_str(), r)).collect();
                let path = artifact::write_json(&by_token, Path::new(&settings.output_dir), name)?;
                println!("Saved to {}", path.display());
            }
            Ok(())
        }
        Commands::Pairs => {
            let found = pairs::discover_pairs(&launcher, &settings).await?;
            if found.is_empty() {
                println!("No pairs found.");
                return Ok(());
            }
            print!("{}", report::pair_table(&found));
            println!("\n{} pairs", found.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", report::format_duration(elapsed));
    }

    result
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
