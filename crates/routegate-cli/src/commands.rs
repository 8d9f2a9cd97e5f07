//! Subcommand implementations
//!
//! Each command returns `Ok(true)` on success, `Ok(false)` when it ran but
//! found problems (failed loads, dangling references, unknown target).

use crate::loader::SimulatedLoader;
use anyhow::Context;
use routegate_core::{
    IdleStrategy, IdleTicket, InMemorySession, NavConfig, NavError, NavigateOptions,
    NavigationOutcome, Navigator, PrefetchMode, PrefetchScheduler, RegistryBuilder, RouteLoader,
    RoutePath, RouteRegistry, Router, UserInfo, UserSession,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Host navigator that reports every imperative navigation
#[derive(Debug, Default)]
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &RoutePath, options: &NavigateOptions) {
        let from = options
            .state
            .from
            .as_ref()
            .map_or_else(String::new, |from| format!(" (from {from})"));
        let mode = if options.replace { "replace" } else { "push" };
        println!("navigate[{mode}] -> {path}{from}");
    }
}

#[derive(Debug, Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    requires_auth: bool,
    prefetch: Vec<&'a str>,
}

fn load_config(path: &Path) -> anyhow::Result<NavConfig> {
    NavConfig::load(path)
        .map_err(NavError::from)
        .with_context(|| format!("loading route table {}", path.display()))
}

fn build_registry(
    config: &NavConfig,
    loader: &Arc<dyn RouteLoader>,
) -> anyhow::Result<RouteRegistry> {
    RegistryBuilder::from_config(config, |_| Arc::clone(loader))
        .build()
        .map_err(NavError::from)
        .context("building route registry")
}

fn demo_user() -> UserSession {
    UserSession {
        token: "simulated-token".to_string(),
        user: UserInfo {
            id: "1".to_string(),
            username: "demo".to_string(),
            nickname: "Demo User".to_string(),
            roles: vec!["user".to_string()],
        },
    }
}

/// Wait for idle tickets; returns (succeeded, scheduled)
async fn settle(tickets: Vec<IdleTicket>) -> (usize, usize) {
    let scheduled = tickets.iter().filter(|t| t.is_scheduled()).count();
    let mut succeeded = 0;
    for ticket in tickets {
        if ticket.is_scheduled() && ticket.settled().await {
            succeeded += 1;
        }
    }
    (succeeded, scheduled)
}

/// `routes`: print the flattened route table in declaration order
pub(crate) fn routes(config_path: &Path, json: bool) -> anyhow::Result<bool> {
    let config = load_config(config_path)?;
    let loader: Arc<dyn RouteLoader> = SimulatedLoader::new(Duration::ZERO, &[]);
    let registry = build_registry(&config, &loader)?;

    let rows: Vec<RouteRow<'_>> = registry
        .iter()
        .map(|route| RouteRow {
            path: route.path.as_str(),
            title: route.meta.title.as_deref(),
            requires_auth: route.requires_auth(),
            prefetch: route.prefetch_targets.iter().map(RoutePath::as_str).collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let access = if row.requires_auth { "auth" } else { "public" };
            println!(
                "{:<24} {:<6} {:<20} [{}]",
                row.path,
                access,
                row.title.unwrap_or("-"),
                row.prefetch.join(", ")
            );
        }
    }
    Ok(true)
}

/// `check`: reject duplicates, empty paths, a missing or protected login
/// route, a missing root route and dangling prefetch references
pub(crate) fn check(config_path: &Path) -> anyhow::Result<bool> {
    let config = load_config(config_path)?;
    let loader: Arc<dyn RouteLoader> = SimulatedLoader::new(Duration::ZERO, &[]);
    let registry = build_registry(&config, &loader)?;

    let issues = registry.audit(&config.login_path, &config.root_path);
    for issue in &issues {
        println!("problem: {issue}");
    }
    if issues.is_empty() {
        println!("ok: {} routes", registry.len());
    }
    Ok(issues.is_empty())
}

/// `simulate`: one navigation through the router, following a login redirect
pub(crate) async fn simulate(
    config_path: &Path,
    target: &str,
    authenticated: bool,
    fail: &[String],
    load_delay: Duration,
) -> anyhow::Result<bool> {
    let config = load_config(config_path)?;
    let loader: Arc<dyn RouteLoader> = SimulatedLoader::new(load_delay, fail);
    let registry = build_registry(&config, &loader)?;

    let session = Arc::new(InMemorySession::new());
    if authenticated {
        session.sign_in(demo_user());
    }
    let router =
        Router::from_config(&config, registry, None, Arc::clone(&session), ConsoleNavigator);

    let tickets = match router.navigate(target, None) {
        NavigationOutcome::Rendered { path, prefetches } => {
            println!("rendered {path}");
            prefetches
        }
        NavigationOutcome::Redirected(redirect) => {
            let resume = redirect.origin().map(RoutePath::as_str);
            println!("redirected to {} (resume {})", redirect.to, resume.unwrap_or("-"));
            match router.navigate(redirect.to.as_str(), resume) {
                NavigationOutcome::Rendered { path, prefetches } => {
                    println!("rendered {path}");
                    prefetches
                }
                _ => {
                    println!("login route {} cannot render", redirect.to);
                    return Ok(false);
                }
            }
        }
        NavigationOutcome::NotFound(path) => {
            println!("not found: {path}");
            return Ok(false);
        }
    };

    let (succeeded, scheduled) = settle(tickets).await;
    println!("prefetches: {succeeded}/{scheduled} succeeded");
    println!("completed: {}", join_paths(&router.scheduler().completed()));
    Ok(succeeded == scheduled)
}

/// `warm`: prefetch every registered route
pub(crate) async fn warm(
    config_path: &Path,
    immediate: bool,
    load_delay: Duration,
) -> anyhow::Result<bool> {
    let config = load_config(config_path)?;
    let loader: Arc<dyn RouteLoader> = SimulatedLoader::new(load_delay, &[]);
    let registry = build_registry(&config, &loader)?;

    let idle = IdleStrategy::select(None, config.fallback_delay());
    let scheduler =
        PrefetchScheduler::new(registry, idle).with_idle_timeout(config.idle_timeout());
    let mode = if immediate {
        PrefetchMode::Immediate
    } else {
        PrefetchMode::Idle
    };

    let report = scheduler.warm_all(mode).await;
    println!("loaded: {}", join_paths(&report.loaded));
    println!("skipped: {}", join_paths(&report.skipped));
    for failure in &report.failed {
        let kind = if failure.is_configuration() {
            "config"
        } else {
            "load"
        };
        println!("failed[{kind}]: {failure}");
    }
    Ok(report.is_clean())
}

fn join_paths(paths: &[RoutePath]) -> String {
    if paths.is_empty() {
        return "-".to_string();
    }
    paths.iter().map(RoutePath::as_str).collect::<Vec<_>>().join(", ")
}
