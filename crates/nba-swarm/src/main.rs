//! Interactive CLI
//!
//! Talk to one swarm agent directly from a terminal. Prompts for the
//! agent's role name, then reads messages until the `EXIT` sentinel.
//! Every answer goes through a verification turn before it is printed,
//! and the remote assistant is retired on the way out.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use uuid::Uuid;

use agent_core::{ConvoStore, Session, DEFAULT_INSTANCE};
use nba_analyst::prompts::DOUBLE_CHECK;
use nba_analyst::{DATA_GUY_NAME, ORG};
use nba_swarm::{build_deps, init_tracing, SwarmConfig};

const EXIT_SENTINEL: &str = "EXIT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = SwarmConfig::from_env();
    let deps = build_deps(&config).await?;

    let stdin = io::stdin();
    let name = prompt(&stdin, "Which agent would you like to speak to?")?;
    let profile = deps
        .profile_store
        .get(&name, ORG, DEFAULT_INSTANCE)
        .await?
        .with_context(|| format!("no stored profile named '{name}'"))?;

    let registry = if name == DATA_GUY_NAME {
        deps.data_guy_registry.clone()
    } else {
        deps.analyst_registry.clone()
    };

    let convo_id = Uuid::new_v4().to_string();
    if let Some(store) = &deps.convo_store {
        store.create(&convo_id, ORG).await?;
    }

    let mut session =
        Session::create(deps.backend.clone(), deps.log_for(&convo_id), &profile, registry).await?;
    println!("Speaking to {name}. Type {EXIT_SENTINEL} to quit.");

    let mut message = prompt(&stdin, "What would you like to say?")?;
    while message != EXIT_SENTINEL {
        session.post_user_message(&message).await?;
        session.run_with(&deps.run_options).await?;

        // Verification turn; only the double-checked answer is shown
        session.post_user_message(DOUBLE_CHECK).await?;
        let answer = session.run_with(&deps.run_options).await?;
        println!("\n{name}: {answer}\n");

        message = prompt(&stdin, "")?;
    }

    session.delete().await;
    Ok(())
}

fn prompt(stdin: &io::Stdin, text: &str) -> anyhow::Result<String> {
    if !text.is_empty() {
        println!("{text}");
    }
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
