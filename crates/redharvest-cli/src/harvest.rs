//! `run` and `plan` command handlers.
//!
//! Called from `main` once the input has been validated. Request failures
//! inside a run are logged by the crawler and never abort it; only setup and
//! output errors are returned here.

use std::path::Path;

use anyhow::Context;
use serde_json::json;
use uuid::Uuid;

use redharvest_core::{AppConfig, HarvestPlan, RunBudget};
use redharvest_scraper::{
    spawn_jsonl_writer, Crawler, Harvester, HttpFetcher, MemorySink, RunSummary,
};

pub(crate) fn writes_to_stdout(output: Option<&Path>) -> bool {
    output.is_none_or(|path| path == Path::new("-"))
}

/// The effective-configuration line logged at run start and printed by `plan`.
pub(crate) fn describe_config(budget: &RunBudget) -> String {
    let end = budget
        .end_page
        .map_or_else(|| "unlimited".to_owned(), |end| end.to_string());
    format!(
        "Config -> posts={}, commentsPerPost={}, sort={}, time={}, nsfw={}, pages={}-{}",
        budget.max_post_count,
        budget.max_comments_per_post,
        budget.sort,
        budget.time_range,
        budget.include_nsfw,
        budget.start_page,
        end
    )
}

/// Runs one harvest, streaming records to `output` (or stdout).
///
/// # Errors
///
/// Returns an error if the fetcher cannot be built, the output cannot be
/// created, or writing records fails.
pub(crate) async fn run_harvest(
    config: &AppConfig,
    plan: &HarvestPlan,
    output: Option<&Path>,
) -> anyhow::Result<RunSummary> {
    let run_id = Uuid::new_v4();
    tracing::info!(
        run_id = %run_id,
        seeds = plan.seeds.len(),
        searches = plan.searches.len(),
        per_seed_quota = plan.allocation.per_seed_quota,
        max_items = plan.budget.max_items,
        "{}",
        describe_config(&plan.budget)
    );

    let fetcher = HttpFetcher::new(config, plan.max_request_retries, plan.max_concurrency)
        .context("failed to build HTTP fetcher")?;

    let (sink, writer) = match output.filter(|_| !writes_to_stdout(output)) {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            spawn_jsonl_writer(file)
        }
        None => spawn_jsonl_writer(tokio::io::stdout()),
    };

    let harvester = Harvester::new(plan, &config.platform_origin, sink);
    let stats = Crawler::new(&fetcher, &harvester, plan.max_concurrency)
        .run(harvester.initial_tasks(plan))
        .await;
    let summary = harvester.finish(run_id, stats);
    // Dropping the harvester closes the sink, which lets the writer finish.
    drop(harvester);

    let written = writer
        .await
        .context("record writer task failed")?
        .context("failed to write records")?;
    if written != u64::from(summary.items) {
        tracing::warn!(written, items = summary.items, "written line count differs from items stored");
    }

    tracing::info!(
        run_id = %run_id,
        items = summary.items,
        posts = summary.posts,
        max_posts = plan.budget.max_post_count,
        comments = summary.comments,
        communities = summary.communities,
        users = summary.users,
        pages_failed = summary.pages_failed,
        "harvest complete"
    );
    Ok(summary)
}

/// Prints the validated seeds, searches and first requests without fetching.
///
/// # Errors
///
/// Returns an error only if the JSON rendering fails.
pub(crate) fn print_plan(config: &AppConfig, plan: &HarvestPlan, as_json: bool) -> anyhow::Result<()> {
    let requests = Harvester::new(plan, &config.platform_origin, MemorySink::new())
        .initial_tasks(plan);

    if as_json {
        let rendered = json!({
            "seeds": plan.seeds,
            "perSeedQuota": plan.allocation.per_seed_quota,
            "searches": plan.searches,
            "maxItems": plan.budget.max_items,
            "requests": requests
                .iter()
                .map(|task| json!({"task": task.label(), "url": task.url}))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }

    println!("{}", describe_config(&plan.budget));
    println!(
        "maxItems={}, perSeedQuota={}",
        plan.budget.max_items, plan.allocation.per_seed_quota
    );
    println!("seeds ({}):", plan.seeds.len());
    for seed in &plan.seeds {
        println!("  {:<9} {}", seed.kind.to_string(), seed.key);
    }
    if !plan.searches.is_empty() {
        println!("searches ({}):", plan.searches.len());
        for query in &plan.searches {
            println!("  {query}");
        }
    }
    println!("first requests ({}):", requests.len());
    for task in &requests {
        println!("  {:<22} {}", task.label(), task.url);
    }
    Ok(())
}
