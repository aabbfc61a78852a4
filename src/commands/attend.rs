use anyhow::Result;
use evently_core::AttendanceStatus;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn attend(
    app: &App,
    event: &str,
    sub_event_id: &str,
    status: &str,
    email: Option<&str>,
) -> Result<()> {
    let route = app.route(event)?;
    let status: AttendanceStatus = status.parse()?;

    match email {
        Some(email) => {
            app.repo
                .set_attendance_status(&route.owner_id, &route.event_id, sub_event_id, email, status)
                .await?;
            println!("{} {} is now {}", "✓".green(), email, status.render());
        }
        None => {
            let now = app
                .repo
                .toggle_own_status(&route.owner_id, &route.event_id, sub_event_id, status)
                .await?;
            println!("{} You are now {}", "✓".green(), now.render());
        }
    }
    Ok(())
}

pub async fn participants(app: &App, event: &str, sub_event_id: Option<&str>) -> Result<()> {
    let route = app.route(event)?;

    let Some(sub_event_id) = sub_event_id else {
        for (uid, email) in app.repo.event_attendees(&route.owner_id, &route.event_id).await? {
            let owner = if uid == route.owner_id { " (owner)" } else { "" };
            println!("{}{} {}", email, owner.cyan(), uid.dimmed());
        }
        return Ok(());
    };

    let sub_events = app.repo.list_sub_events(&route.owner_id, &route.event_id).await?;
    let Some(sub_event) = sub_events.iter().find(|s| s.id == sub_event_id) else {
        anyhow::bail!("Sub-event {} not found", sub_event_id);
    };

    println!("{}", sub_event.render());
    for (email, status) in app.repo.attendees(sub_event) {
        println!("  {} {}", email, status.render());
    }
    Ok(())
}

pub async fn kick(app: &App, event_id: &str, uid: &str) -> Result<()> {
    let user = app.user()?;
    let attendees = app.repo.event_attendees(&user.uid, event_id).await?;
    let Some((_, email)) = attendees.into_iter().find(|(attendee, _)| attendee == uid) else {
        anyhow::bail!("{} is not a participant of {}", uid, event_id);
    };

    app.repo.delete_participant(&user.uid, event_id, uid, &email).await?;
    println!("{} Removed {}", "✓".green(), email);
    Ok(())
}

pub async fn promote(app: &App, event_id: &str, uid: &str) -> Result<()> {
    app.repo.promote_to_owner(event_id, uid).await?;
    println!("{} {} now owns {}", "✓".green(), uid.bold(), format!("{}/{}", uid, event_id).dimmed());
    Ok(())
}
