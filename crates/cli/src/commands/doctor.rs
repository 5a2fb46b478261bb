//! `helperbot doctor`: diagnose configuration and connectivity.

use super::load_config;
use helperbot_channels::{RedditEndpoints, RedditPlatform};
use helperbot_core::platform::Platform;
use helperbot_core::provider::Provider;
use helperbot_providers::OpenAiCompatProvider;
use helperbot_tools::{SearchBackend, SearchQuery, SearxngBackend};
use std::path::Path;
use std::time::Duration;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 helperbot doctor");
    println!("===================\n");

    let mut issues = 0;

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            return Err(e.into());
        }
    };

    let missing = config.missing_credentials();
    if missing.is_empty() {
        println!("  ✅ All required settings present");
    } else {
        println!("  ❌ Missing settings: {}", missing.join(", "));
        issues += 1;
    }

    // Reddit
    match RedditPlatform::new(&config.reddit, &config.bot.subreddits, RedditEndpoints::default()) {
        Ok(reddit) => match reddit.health_check().await {
            Ok(true) => println!("  ✅ Reddit login works for u/{}", reddit.bot_username()),
            Ok(false) => {
                println!("  ⚠️  Reddit token belongs to a different account than u/{}", reddit.bot_username());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Reddit login failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Reddit not configured: {e}");
            issues += 1;
        }
    }

    // Model endpoint
    match OpenAiCompatProvider::from_config(&config.model) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Model endpoint reachable ({})", config.model.model),
            Ok(false) => {
                println!("  ❌ Model endpoint rejected the API key ({})", config.model.base_url);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Model endpoint unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Model provider not configured: {e}");
            issues += 1;
        }
    }

    // Search backend
    match config.tools.searxng_base_url.as_deref() {
        Some(base) => {
            let probe = SearxngBackend::new(
                base,
                Duration::from_secs(config.tools.search_timeout_secs),
                config.tools.searxng_accept_invalid_certs,
                config.retry.search.clone(),
            );
            let query = SearchQuery {
                query: "rust programming language".into(),
                categories: Vec::new(),
                time_range: None,
                language: "en-US".into(),
                pageno: 1,
                max_results: 1,
            };
            match probe {
                Ok(backend) => match backend.search(&query).await {
                    Ok(hits) => println!("  ✅ SearXNG answered ({} result(s))", hits.len()),
                    Err(e) => {
                        println!("  ❌ SearXNG search failed: {e}");
                        issues += 1;
                    }
                },
                Err(e) => {
                    println!("  ❌ SearXNG client error: {e}");
                    issues += 1;
                }
            }
        }
        None => {
            println!("  ❌ SEARXNG_BASE_URL not set");
            issues += 1;
        }
    }

    // Renderer
    match config.tools.render_url.as_deref() {
        Some(url) => println!("  ✅ Headless renderer configured at {url}"),
        None => println!("  ⚠️  No headless renderer; web_render will report renderer_unavailable"),
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
