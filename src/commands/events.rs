use anyhow::Result;
use evently_core::JoinOutcome;
use evently_core::calendar::CalendarMonth;
use evently_core::path;
use evently_core::store::DocumentStore;
use evently_core::view::{DashboardChange, DashboardState, EventPageChange, EventPageState, ViewFeed};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::{Render, render_agenda, render_calendar};

pub async fn create(app: &App, name: &str) -> Result<()> {
    let created = app.repo.create_event(name).await?;

    println!("{} Created {}", "✓".green(), name.trim().bold());
    println!("  join code: {}", created.code.cyan().bold());
    println!("  id:        {}", created.event_id.dimmed());
    Ok(())
}

pub async fn join(app: &App, code: &str) -> Result<()> {
    match app.repo.join_event(code).await? {
        JoinOutcome::Joined(event) => {
            println!("{} Joined {}", "✓".green(), event.render());
        }
        JoinOutcome::AlreadyJoined(event) => {
            println!("{} Already joined {}", "·".dimmed(), event.render());
        }
    }
    Ok(())
}

/// Dashboard: the caller's events and the ones they joined.
pub async fn list(app: &App) -> Result<()> {
    let user = app.user()?;

    let mut feed = ViewFeed::new();
    feed.attach(
        app.store.subscribe(&path::owner_events(&user.uid)?).await?,
        DashboardChange::OwnedSnapshot,
    );
    feed.attach(
        app.store.subscribe(&path::all_events()?).await?,
        DashboardChange::AllEventsSnapshot,
    );

    // Each subscription delivers its current value first.
    let mut state = DashboardState::new(user);
    for _ in 0..2 {
        match feed.next().await {
            Some(change) => state = state.apply(change),
            None => break,
        }
    }

    println!("{}", "Your events".bold());
    if state.owned.is_empty() {
        println!("  {}", "none yet, create one with `evently create <name>`".dimmed());
    }
    for event in &state.owned {
        println!("  {}", event.render());
    }

    println!("\n{}", "Joined".bold());
    if state.joined.is_empty() {
        println!("  {}", "none yet, join one with `evently join <code>`".dimmed());
    }
    for event in &state.joined {
        println!("  {}", event.render());
    }
    Ok(())
}

/// Event page: details, month calendar and sub-events.
pub async fn show(app: &App, event: &str, month: Option<&str>) -> Result<()> {
    let user = app.user()?;
    let route = app.route(event)?;
    let month = match month {
        Some(month) => month.parse()?,
        None => CalendarMonth::current(),
    };

    let mut feed = ViewFeed::new();
    feed.attach(
        app.store
            .subscribe(&path::event(&route.owner_id, &route.event_id)?)
            .await?,
        EventPageChange::EventSnapshot,
    );
    let mut state = EventPageState::new(route.clone(), &user.uid, month);
    if let Some(change) = feed.next().await {
        state = state.apply(change);
    }

    let Some(event) = &state.event else {
        anyhow::bail!("Event {} not found", route);
    };

    println!("{}", event.render());
    if state.is_owner {
        println!("{}", "You own this event".dimmed());
    }
    println!();
    for line in render_calendar(&state) {
        println!("  {}", line);
    }

    let agenda = render_agenda(&state);
    if !agenda.is_empty() {
        println!();
        for line in agenda {
            println!("  {}", line);
        }
    }

    println!("\n{}", "Sub-events".bold());
    if state.sub_events.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for sub_event in &state.sub_events {
        println!("  {}", sub_event.render());
        if !sub_event.details.is_empty() {
            println!("      {}", sub_event.details);
        }
    }
    Ok(())
}

pub async fn delete(app: &App, event_id: &str) -> Result<()> {
    app.repo.delete_event(event_id).await?;
    println!("{} Deleted {}", "✓".green(), event_id);
    Ok(())
}
