//! Dry-run router: prints which director(s) would handle a request
//! This is a utility binary, not part of the main application
//!
//! Usage: `route_once "Research new leads and add them to CRM."`
//! Uses Gemini when `GEMINI_API_KEY` is set, the offline gateway otherwise.

use director_backend::config::Config;
use director_backend::gateway;
use director_backend::orchestrator::Orchestrator;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let request = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if request.trim().is_empty() {
        eprintln!("Usage: route_once <request text>");
        return Err("No request given".into());
    }

    let config = Config::from_env();
    if config.llm.use_offline() {
        println!("Using offline gateway (set GEMINI_API_KEY to route with Gemini)\n");
    } else {
        println!("Routing with {}\n", config.llm.model);
    }

    let (llm, _images) = gateway::from_config(&config.llm);
    let orchestrator = Orchestrator::with_gateway(llm);

    match orchestrator.route(request.trim(), &[]).await {
        Ok(decision) => {
            println!("   ✓ Primary director: {}", decision.primary_director);
            let order: Vec<&str> = decision.execution_order().iter().map(|d| d.name()).collect();
            println!("   Execution order: {}", order.join(" -> "));
            if let Some(intent) = &decision.user_intent {
                println!("   Intent: {}", intent);
            }
            if let Some(level) = &decision.complexity_level {
                println!("   Complexity: {:?}", level);
            }
            if let Some(time) = &decision.estimated_time {
                println!("   Estimated time: {}", time);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("   ✗ {}", e);
            Err(e.into())
        }
    }
}
