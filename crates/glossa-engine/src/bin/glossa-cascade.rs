//! Glossa cascade runner
//!
//! Re-runs the FQN cascade for a term whose record already carries its new
//! name, e.g. after an interrupted rename, then re-sends the search documents
//! of the subtree. Safe to repeat: a second run over the same prefixes
//! rewrites nothing.
//!
//! Usage:
//!   glossa-cascade <old_fqn> <new_fqn>
//!   glossa-cascade --dry-run <old_fqn> <new_fqn>

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use glossa_db::{Database, PoolConfig};
use glossa_engine::{
    defaults, init_tracing, Backends, EngineConfig, EntityLookup, Include, LogConfig,
    LruEntityCache, TagSource, TagUsageStore, TermService,
};
use glossa_search::HttpSearchClient;

#[derive(Debug, Default)]
struct Args {
    old_fqn: String,
    new_fqn: String,
    dry_run: bool,
}

fn print_help() {
    println!(
        r#"glossa-cascade - re-run the FQN cascade for a renamed or moved term

USAGE:
    glossa-cascade [OPTIONS] <OLD_FQN> <NEW_FQN>

OPTIONS:
    -n, --dry-run    Report what would change without writing
    -h, --help       Print this help

ENVIRONMENT:
    DATABASE_URL     PostgreSQL connection string
    SEARCH_URL       Search engine base URL
    LOG_FORMAT       "json" or "text""#
    );
}

fn parse_args() -> anyhow::Result<Args> {
    let mut result = Args::default();
    let mut positional = Vec::new();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" | "-n" => result.dry_run = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            _ => positional.push(arg),
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([old_fqn, new_fqn]) => {
            result.old_fqn = old_fqn;
            result.new_fqn = new_fqn;
            Ok(result)
        }
        Err(_) => {
            print_help();
            bail!("expected <OLD_FQN> <NEW_FQN>")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _guard = init_tracing(LogConfig::from_env())?;
    let args = parse_args()?;

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env())
        .await
        .context("Failed to connect to database")?;
    let stores = db.stores();

    let root = stores
        .lookup
        .get_term_by_name(&args.new_fqn, Include::All)
        .await?
        .with_context(|| format!("No term named {}", args.new_fqn))?;

    if args.dry_run {
        let usages = stores
            .tag_usage
            .get_target_fqns(TagSource::Glossary, &args.old_fqn)
            .await?;
        println!(
            "{} -> {}: term {} found, {} targets still tagged with the old name",
            args.old_fqn,
            args.new_fqn,
            root.id,
            usages.len()
        );
        return Ok(());
    }

    let config = EngineConfig::from_env();
    let search = HttpSearchClient::from_env()?;
    let service = TermService::new(
        Backends {
            lookup: stores.lookup,
            terms: stores.terms,
            relationships: stores.relationships,
            tag_usage: stores.tag_usage,
            cache: Arc::new(LruEntityCache::new(config.cache_capacity)),
            search: Arc::new(search),
        },
        config,
    );

    let report = service
        .cascade()
        .propagate(root.id, &args.old_fqn, &args.new_fqn)
        .await;
    let reindexed = service.reindex_subtree(root.id).await;
    service.flush().await;

    info!(
        subsystem = "engine",
        component = "cascade",
        old_fqn = %args.old_fqn,
        new_fqn = %args.new_fqn,
        records = report.records_rewritten,
        usages = report.usages_rewritten,
        invalidated = report.invalidated,
        reindexed,
        "Cascade finished"
    );
    println!(
        "records rewritten: {}\nusages rewritten:  {}\ncache invalidated: {}\ndocuments queued:  {}",
        report.records_rewritten, report.usages_rewritten, report.invalidated, reindexed
    );

    if !report.is_clean() {
        for error in &report.errors {
            eprintln!("error: {}", error);
        }
        bail!("cascade finished with {} failed steps", report.errors.len());
    }
    Ok(())
}
