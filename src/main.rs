mod app;
mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use evently_core::config::EventlyConfig;
use tracing_subscriber::EnvFilter;

use app::App;
use commands::reviews::ReviewCommand;
use commands::sub::SubCommand;

#[derive(Parser)]
#[command(name = "evently")]
#[command(about = "Plan events with friends: join codes, sub-event calendars, attendance and reviews")]
struct Cli {
    /// Show debug logs (otherwise RUST_LOG, default "warn")
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account (prompts for a password)
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        username: String,
    },
    /// Sign in with email and password, or through a provider
    Signin {
        #[arg(short, long)]
        email: String,

        /// Sign in through this provider instead of a password (e.g. "google")
        #[arg(long)]
        provider: Option<String>,

        /// Display name reported by the provider
        #[arg(long, requires = "provider")]
        name: Option<String>,
    },
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Show or edit your profile
    Profile {
        #[arg(long)]
        username: Option<String>,

        /// Date of birth (YYYY-MM-DD, empty to clear)
        #[arg(long)]
        dob: Option<String>,
    },
    /// Create an event and print its join code
    Create {
        name: String,
    },
    /// Join an event by its code
    Join {
        code: String,
    },
    /// List the events you own and the ones you joined
    Events,
    /// Show an event with its sub-event calendar
    Show {
        /// Event id, or <owner>/<event> for events you joined
        event: String,

        /// Month to display (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Delete one of your events
    Delete {
        event_id: String,
    },
    /// Manage sub-events
    Sub {
        #[command(subcommand)]
        command: SubCommand,
    },
    /// Set attendance on a sub-event (toggles your own status by default)
    Attend {
        event: String,
        sub_event_id: String,

        /// attending, not-attending or not-sure
        status: String,

        /// Set the status of someone else instead
        #[arg(long)]
        email: Option<String>,
    },
    /// List participants of an event, or attendance on one sub-event
    Participants {
        event: String,
        sub_event_id: Option<String>,
    },
    /// Remove a participant from one of your events
    Kick {
        event_id: String,
        uid: String,
    },
    /// Make a participant the owner of one of your events
    Promote {
        event_id: String,
        uid: String,
    },
    /// Add or list sub-event reviews
    Review {
        #[command(subcommand)]
        command: ReviewCommand,
    },
    /// Finish or roll back interrupted ownership transfers
    Recover,
    /// Rebuild the join code and membership indexes from all events
    Reindex,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = EventlyConfig::load()?;
    let app = App::open(config)?;

    match cli.command {
        Commands::Signup { email, username } => commands::account::signup(&app, &email, &username).await,
        Commands::Signin {
            email,
            provider,
            name,
        } => commands::account::signin(&app, email, provider, name).await,
        Commands::Signout => commands::account::signout(&app).await,
        Commands::Whoami => commands::account::whoami(&app),
        Commands::Profile { username, dob } => commands::account::profile(&app, username, dob).await,
        Commands::Create { name } => commands::events::create(&app, &name).await,
        Commands::Join { code } => commands::events::join(&app, &code).await,
        Commands::Events => commands::events::list(&app).await,
        Commands::Show { event, month } => commands::events::show(&app, &event, month.as_deref()).await,
        Commands::Delete { event_id } => commands::events::delete(&app, &event_id).await,
        Commands::Sub { command } => commands::sub::run(&app, command).await,
        Commands::Attend {
            event,
            sub_event_id,
            status,
            email,
        } => commands::attend::attend(&app, &event, &sub_event_id, &status, email.as_deref()).await,
        Commands::Participants {
            event,
            sub_event_id,
        } => commands::attend::participants(&app, &event, sub_event_id.as_deref()).await,
        Commands::Kick { event_id, uid } => commands::attend::kick(&app, &event_id, &uid).await,
        Commands::Promote { event_id, uid } => commands::attend::promote(&app, &event_id, &uid).await,
        Commands::Review { command } => commands::reviews::run(&app, command).await,
        Commands::Recover => commands::maintenance::recover(&app).await,
        Commands::Reindex => commands::maintenance::reindex(&app).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("evently=debug,evently_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
