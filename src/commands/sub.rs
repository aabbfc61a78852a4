use anyhow::Result;
use clap::Subcommand;
use evently_core::SubEventDraft;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

#[derive(Subcommand)]
pub enum SubCommand {
    /// Add a sub-event to one of your events
    Add {
        event: String,

        #[arg(short, long)]
        name: String,

        /// First day (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Last day, inclusive (defaults to the start day)
        #[arg(short, long)]
        end: Option<String>,

        /// Start time (HH:MM)
        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long, default_value = "")]
        details: String,

        /// Image as a data URL (data:image/...)
        #[arg(long)]
        photo: Option<String>,
    },
    /// Change fields of a sub-event
    Update {
        event: String,
        sub_event_id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long)]
        details: Option<String>,

        /// Image as a data URL, empty to remove
        #[arg(long)]
        photo: Option<String>,
    },
    /// Delete a sub-event
    Delete {
        event: String,
        sub_event_id: String,
    },
    /// List sub-events of an event
    List {
        event: String,
    },
}

pub async fn run(app: &App, command: SubCommand) -> Result<()> {
    match command {
        SubCommand::Add {
            event,
            name,
            start,
            end,
            time,
            details,
            photo,
        } => {
            let route = app.route(&event)?;
            let draft = SubEventDraft {
                name,
                end_date: end.unwrap_or_else(|| start.clone()),
                start_date: start,
                start_time: time,
                details,
                photo,
            };
            let sub_event = app
                .repo
                .add_sub_event(&route.owner_id, &route.event_id, draft)
                .await?;

            println!("{} Added {}", "✓".green(), sub_event.render());
            println!("  invited {} attendee(s)", sub_event.attendees.len());
        }
        SubCommand::Update {
            event,
            sub_event_id,
            name,
            start,
            end,
            time,
            details,
            photo,
        } => {
            let route = app.route(&event)?;
            let Some(mut sub_event) = app
                .repo
                .list_sub_events(&route.owner_id, &route.event_id)
                .await?
                .into_iter()
                .find(|s| s.id == sub_event_id)
            else {
                anyhow::bail!("Sub-event {} not found", sub_event_id);
            };

            if let Some(name) = name {
                sub_event.name = name;
            }
            if let Some(start) = start {
                sub_event.start_date = start;
            }
            if let Some(end) = end {
                sub_event.end_date = end;
            }
            if let Some(time) = time {
                sub_event.start_time = Some(time).filter(|t| !t.is_empty());
            }
            if let Some(details) = details {
                sub_event.details = details;
            }
            if let Some(photo) = photo {
                sub_event.photo = Some(photo).filter(|p| !p.is_empty());
            }

            app.repo
                .update_sub_event(&route.owner_id, &route.event_id, &sub_event)
                .await?;
            println!("{} Updated {}", "✓".green(), sub_event.render());
        }
        SubCommand::Delete {
            event,
            sub_event_id,
        } => {
            let route = app.route(&event)?;
            app.repo
                .delete_sub_event(&route.owner_id, &route.event_id, &sub_event_id)
                .await?;
            println!("{} Deleted sub-event {}", "✓".green(), sub_event_id);
        }
        SubCommand::List { event } => {
            let route = app.route(&event)?;
            let sub_events = app
                .repo
                .list_sub_events(&route.owner_id, &route.event_id)
                .await?;

            if sub_events.is_empty() {
                println!("{}", "No sub-events".dimmed());
            }
            for sub_event in &sub_events {
                let mine = app.repo.current_status(sub_event)?;
                println!("{} {}", sub_event.render(), mine.render());
            }
        }
    }
    Ok(())
}
