//! Terminal rendering for evently types.

use chrono::{Datelike, Local};
use evently_core::calendar::CalendarMonth;
use evently_core::constants::MAX_RATING;
use evently_core::view::EventPageState;
use evently_core::{AttendanceStatus, Event, ReviewEntry, SubEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for AttendanceStatus {
    fn render(&self) -> String {
        match self {
            AttendanceStatus::Attending => self.as_str().green().to_string(),
            AttendanceStatus::NotAttending => self.as_str().red().to_string(),
            AttendanceStatus::NotSure => self.as_str().yellow().to_string(),
        }
    }
}

impl Render for Option<AttendanceStatus> {
    fn render(&self) -> String {
        match self {
            Some(status) => status.render(),
            None => "pending".dimmed().to_string(),
        }
    }
}

impl Render for Event {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            self.name.bold(),
            self.code.cyan(),
            format!("{}/{}", self.owner_id, self.id).dimmed()
        )
    }
}

impl Render for SubEvent {
    fn render(&self) -> String {
        let when = match &self.start_time {
            Some(time) => format!("{} {} .. {}", self.start_date, time, self.end_date),
            None => format!("{} .. {}", self.start_date, self.end_date),
        };
        let photo = if self.photo.is_some() { " [photo]" } else { "" };
        format!("{} {}{} {}", self.name.bold(), when, photo, self.id.dimmed())
    }
}

impl Render for ReviewEntry {
    fn render(&self) -> String {
        let rating = self.review.rating.clamp(0, MAX_RATING) as usize;
        let stars = format!(
            "{}{}",
            "*".repeat(rating),
            ".".repeat(MAX_RATING as usize - rating)
        );
        let photo = if self.review.photo.is_some() { " [photo]" } else { "" };
        format!(
            "{} {}{}\n      {} {}",
            stars.yellow(),
            self.review.comment,
            photo,
            self.review.user_email.dimmed(),
            self.review.timestamp.dimmed()
        )
    }
}

impl Render for CalendarMonth {
    fn render(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

/// Month grid (Monday first). Days with sub-events are highlighted, today is underlined.
pub fn render_calendar(state: &EventPageState) -> Vec<String> {
    let today = Local::now().date_naive();
    let mut lines = vec![
        state.month.render().bold().to_string(),
        "Mo Tu We Th Fr Sa Su".dimmed().to_string(),
    ];

    let lead = state.month.first_day().weekday().num_days_from_monday() as usize;
    let mut cells: Vec<String> = vec!["  ".to_string(); lead];
    for bucket in &state.days {
        let label = format!("{:>2}", bucket.date.day());
        let cell = if !bucket.sub_event_ids.is_empty() {
            label.green().bold().to_string()
        } else if bucket.date == today {
            label.underline().to_string()
        } else {
            label
        };
        cells.push(cell);
    }

    for week in cells.chunks(7) {
        lines.push(week.join(" "));
    }
    lines
}

/// One line per day that has sub-events.
pub fn render_agenda(state: &EventPageState) -> Vec<String> {
    let mut lines = Vec::new();
    for bucket in state.days.iter().filter(|b| !b.sub_event_ids.is_empty()) {
        let names: Vec<&str> = state
            .sub_events_on(bucket.date.day())
            .into_iter()
            .map(|s| s.name.as_str())
            .collect();
        lines.push(format!("{} {}", bucket.date.format("%a %b %-d").to_string().bold(), names.join(", ")));
    }
    lines
}
