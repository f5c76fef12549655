//! `minilist`: serve the task API, or use it from the command line

use std::sync::Arc;

use clap::{Parser, Subcommand};

use minilist::api_client::{ApiClient, DEFAULT_API_URL};
use minilist::client::NotionClient;
use minilist::config::{FieldOverrides, Settings, DEFAULT_BIND};
use minilist::memory_store::MemoryStore;
use minilist::schema::SchemaResolver;
use minilist::server::{self, SharedService};
use minilist::sync::{SyncSession, ToggleOutcome};
use minilist::traits::TaskStore;
use minilist::utils::{print_items, print_task, today};
use minilist::widget::{self, WidgetEntry, REFRESH_INTERVAL};
use minilist::TaskService;

#[derive(Parser)]
#[command(name = "minilist", version, about = "Today's tasks, from a hosted database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the task API
    Serve {
        /// Listen address (defaults to MINILIST_BIND, then 127.0.0.1:3000)
        #[arg(long)]
        bind: Option<String>,
        /// Use an in-memory store instead of the hosted database
        #[arg(long)]
        memory: bool,
    },
    /// Show today's tasks
    Today {
        #[arg(long, env = "MINILIST_API_URL", default_value = DEFAULT_API_URL)]
        server: String,
    },
    /// Create a task
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, env = "MINILIST_API_URL", default_value = DEFAULT_API_URL)]
        server: String,
    },
    /// Toggle the completion status of one of today's tasks
    Toggle {
        id: String,
        #[arg(long, env = "MINILIST_API_URL", default_value = DEFAULT_API_URL)]
        server: String,
    },
    /// Archive a task
    Remove {
        id: String,
        #[arg(long, env = "MINILIST_API_URL", default_value = DEFAULT_API_URL)]
        server: String,
    },
    /// Display today's tasks the way the home-screen widget does, refreshing periodically
    Widget {
        #[arg(long, env = "MINILIST_API_URL", default_value = DEFAULT_API_URL)]
        server: String,
        /// Render once and exit
        #[arg(long)]
        once: bool,
        /// Toggle this task first, as the widget's checkbox does, then render once and exit
        #[arg(long, value_name = "ID")]
        toggle: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command).await {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> minilist::Result<()> {
    match command {
        Command::Serve { bind, memory } => serve(bind, memory).await,
        Command::Today { server } => {
            let session = SyncSession::new(ApiClient::new(&server)?);
            session.load(&today()).await;
            show(&session);
            Ok(())
        },
        Command::Add { title, due, server } => {
            let task = ApiClient::new(&server)?.create_task(&title, due.as_deref()).await?;
            print_task(&task);
            Ok(())
        },
        Command::Toggle { id, server } => {
            let session = SyncSession::new(ApiClient::new(&server)?);
            session.load(&today()).await;
            match session.toggle(&id).await {
                ToggleOutcome::Ignored => println!("No task {} due today.", id),
                ToggleOutcome::Confirmed | ToggleOutcome::RolledBack => show(&session),
            }
            Ok(())
        },
        Command::Remove { id, server } => {
            ApiClient::new(&server)?.delete_task(&id).await?;
            println!("Archived {}", id);
            Ok(())
        },
        Command::Widget { server, once, toggle } => {
            let session = SyncSession::new(ApiClient::new(&server)?);
            if let Some(id) = toggle {
                let date = today();
                session.load(&date).await;
                let (outcome, entry) = widget::toggle_task(&session, &date, &id).await;
                if outcome == ToggleOutcome::Ignored {
                    println!("No task {} due today.", id);
                }
                print!("{}", entry);
                return Ok(());
            }
            loop {
                let date = today();
                session.load(&date).await;
                print!("{}", WidgetEntry::from_state(&date, &session.snapshot()));
                if once {
                    return Ok(());
                }
                tokio::time::sleep(REFRESH_INTERVAL).await;
                println!();
            }
        },
    }
}

fn show<A>(session: &SyncSession<A>)
where
    A: minilist::traits::TaskApi,
{
    let state = session.snapshot();
    if let Some(err) = state.error() {
        eprintln!("{}", err);
    }
    print_items(state.items());
}

async fn serve(bind: Option<String>, memory: bool) -> minilist::Result<()> {
    let (store, overrides, bind_addr): (Arc<dyn TaskStore>, FieldOverrides, String) = if memory {
        log::info!("Using an in-memory store");
        let bind_addr = std::env::var(minilist::config::BIND_VAR).unwrap_or_else(|_| DEFAULT_BIND.to_string());
        (Arc::new(MemoryStore::with_task_schema()), FieldOverrides::from_env(), bind_addr)
    } else {
        let settings = Settings::from_env()?;
        let client = NotionClient::from_settings(&settings)?;
        (Arc::new(client), settings.overrides, settings.bind_addr)
    };
    let bind_addr = bind.unwrap_or(bind_addr);

    let service: SharedService = Arc::new(TaskService::new(store, SchemaResolver::new(overrides)));
    let (addr, handle) = server::start_server(&bind_addr, service).await
        .map_err(|err| minilist::Error::Configuration(format!("Unable to listen on {}: {}", bind_addr, err)))?;
    log::info!("Task API listening on http://{}", addr);
    println!("Task API listening on http://{}", addr);

    if let Err(err) = handle.await {
        log::error!("Task API server task failed: {}", err);
    }
    Ok(())
}
