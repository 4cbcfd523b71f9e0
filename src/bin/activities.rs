use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use toddler_activities::ledger::DEFAULT_LEDGER_PATH;
use toddler_activities::{
    Activity, ActivityClient, ActivityController, ActivityPatch, ClientError, NewActivity,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "activities", about = "Pick and track toddler activities")]
struct Cli {
    /// Base URL of the activities server.
    #[arg(long, env = "ACTIVITIES_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    #[arg(long, env = "ACTIVITIES_LEDGER_PATH", default_value = DEFAULT_LEDGER_PATH)]
    ledger: PathBuf,

    /// Local catalog read when the server is unreachable.
    #[arg(long, env = "ACTIVITIES_FALLBACK_CATALOG")]
    fallback_catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the whole catalog.
    List,
    /// Show a random activity.
    Pick,
    /// Record that an activity was done.
    Done { id: String },
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Overwrite the completion counter.
    SetCount { id: String, count: u64 },
    Delete { id: String },
    /// Completion counts, most done first.
    Stats {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show the server's write policy.
    Env,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let mut client = ActivityClient::new(cli.server);
    if let Some(path) = cli.fallback_catalog {
        client = client.with_fallback_catalog(path);
    }

    if let Command::Env = cli.command {
        let env = client.env_check().await?;
        println!(
            "environment: {}\nallow production writes: {}\nwrites allowed: {}\nchecked at: {}",
            env.environment, env.allow_production_writes, env.writes_allowed, env.time
        );
        return Ok(());
    }

    let mut controller = ActivityController::load(client, cli.ledger).await?;

    match cli.command {
        Command::List => {
            for activity in controller.catalog() {
                print_line(activity);
            }
        }
        Command::Pick => {
            let activity = controller.pick_another().await?.clone();
            print_card(&activity);
        }
        Command::Done { id } => {
            controller.show(&id)?;
            let count = controller.mark_done().await?;
            let times = if count == 1 { "time" } else { "times" };
            println!("Done {count} {times}");
            println!("Total activities completed: {}", controller.total_completions());
        }
        Command::Add {
            category,
            title,
            description,
        } => {
            let created = controller
                .add(NewActivity {
                    category,
                    title,
                    description,
                })
                .await?;
            print_card(&created);
        }
        Command::Edit {
            id,
            category,
            title,
            description,
        } => {
            let patch = ActivityPatch {
                category,
                title,
                description,
            };
            let updated = controller.edit(&id, &patch).await?;
            print_card(&updated);
        }
        Command::SetCount { id, count } => {
            let updated = controller.set_count(&id, count).await?;
            print_line(&updated);
        }
        Command::Delete { id } => {
            controller.delete(&id).await?;
            println!("Deleted activity {id}");
        }
        Command::Stats { category } => {
            let report = controller.stats(category.as_deref());
            println!("Categories: {}", report.categories.join(", "));
            for entry in &report.entries {
                println!(
                    "{:>4}  {} [{}] #{}",
                    entry.completion_count, entry.title, entry.category, entry.id
                );
            }
            println!("Total activities completed: {}", report.total_completions);
        }
        Command::Env => {}
    }

    Ok(())
}

fn print_line(activity: &Activity) {
    println!(
        "#{} [{}] {} (done {})",
        activity.id, activity.category, activity.title, activity.completion_count
    );
}

fn print_card(activity: &Activity) {
    println!("[{}] #{}", activity.category, activity.id);
    println!("{}", activity.title);
    println!("{}", activity.description);
    if activity.completion_count > 0 {
        println!("Done {} so far", activity.completion_count);
    }
}
