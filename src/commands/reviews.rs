use anyhow::Result;
use clap::Subcommand;
use evently_core::{ReviewDraft, ReviewSort};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

#[derive(Subcommand)]
pub enum ReviewCommand {
    /// Review a sub-event
    Add {
        event: String,
        sub_event_id: String,

        /// 1 to 5
        #[arg(short, long)]
        rating: i64,

        #[arg(short, long)]
        comment: String,

        /// Image as a data URL (data:image/...)
        #[arg(long)]
        photo: Option<String>,
    },
    /// Show the reviews of a sub-event
    List {
        event: String,
        sub_event_id: String,

        /// newest, oldest or alpha
        #[arg(short, long, default_value = "newest")]
        sort: String,
    },
}

pub async fn run(app: &App, command: ReviewCommand) -> Result<()> {
    match command {
        ReviewCommand::Add {
            event,
            sub_event_id,
            rating,
            comment,
            photo,
        } => {
            let route = app.route(&event)?;
            let draft = ReviewDraft {
                comment,
                rating,
                photo,
            };
            app.repo
                .add_review(&route.owner_id, &route.event_id, &sub_event_id, draft)
                .await?;
            println!("{} Review added", "✓".green());
        }
        ReviewCommand::List {
            event,
            sub_event_id,
            sort,
        } => {
            let route = app.route(&event)?;
            let sort: ReviewSort = sort.parse()?;
            let reviews = app
                .repo
                .reviews(&route.owner_id, &route.event_id, &sub_event_id, sort)
                .await?;

            if reviews.is_empty() {
                println!("{}", "No reviews yet".dimmed());
            }
            for entry in &reviews {
                println!("  {}", entry.render());
            }
        }
    }
    Ok(())
}
