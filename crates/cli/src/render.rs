//! Plain-text views of a [`Dashboard`].

use std::fmt::Write;

use engine::Dashboard;

const BAR_WIDTH: usize = 30;
const WEEK: u32 = 7;

pub fn dashboard(view: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: saved {} of {} ({} to go), streak {} day{}",
        view.username,
        view.total,
        view.monthly_goal,
        view.remaining,
        view.streak,
        if view.streak == 1 { "" } else { "s" },
    );
    let _ = writeln!(out, "{}", progress_bar(view.percent_complete));
    if let Some(target) = view.target_on(view.today) {
        let _ = writeln!(
            out,
            "today: saved {} of target {}",
            view.saved_on(view.today),
            target
        );
    }
    out.push('\n');
    out.push_str(&calendar(view));
    out.push('\n');
    out.push_str(&daily_chart(view));
    out
}

pub fn progress_bar(percent: u32) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

/// Month grid, seven days a row. `*` marks a day with savings, `+` a day
/// whose target was reached.
pub fn calendar(view: &Dashboard) -> String {
    let mut out = String::new();
    for day in 1..=view.days_in_month {
        let saved = view.saved_on(day);
        let mark = match view.target_on(day) {
            Some(target) if saved >= target => '+',
            _ if saved > 0 => '*',
            _ => ' ',
        };
        let cursor = if day == view.today { '>' } else { ' ' };
        let _ = write!(out, "{cursor}{day:>2}{mark} ");
        if day % WEEK == 0 || day == view.days_in_month {
            out.truncate(out.trim_end().len());
            out.push('\n');
        }
    }
    out
}

/// One bar per day up to today, scaled to the largest day.
pub fn daily_chart(view: &Dashboard) -> String {
    let last = view.today.min(view.days_in_month);
    let peak = (1..=last).map(|day| view.saved_on(day)).max().unwrap_or(0);

    let mut out = String::new();
    for day in 1..=last {
        let saved = view.saved_on(day);
        let width = if peak > 0 {
            usize::try_from(i128::from(saved) * BAR_WIDTH as i128 / i128::from(peak)).unwrap_or(0)
        } else {
            0
        };
        let _ = writeln!(out, "{day:>2} |{} {saved}", "=".repeat(width));
    }
    out
}
