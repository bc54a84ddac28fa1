//! Text rendering of intake progress and the reminder countdown. Only reads state, never
//! changes it.

use ansi_term::Colour::{Blue, Green};

use crate::{
    intake::{IntakeConfig, IntakeState},
    reminder::TimerSnapshot,
    utils::{
        percentage::{fill_percentage, Percentage},
        time::format_countdown,
    },
};

pub const BAR_WIDTH: usize = 24;

const FILLED: char = '█';
const EMPTY: char = '░';

pub fn progress_bar(percentage: Percentage, width: usize) -> String {
    let filled = percentage.portion_of(width).min(width);
    let mut bar = String::with_capacity(width * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(width - filled));
    bar
}

/// Block printed after every intake command.
pub fn status(state: &IntakeState, config: &IntakeConfig) -> String {
    let percentage = fill_percentage(state.volume_ml, config.daily_goal_ml);
    let volume = format!("{}ml / {}ml", state.volume_ml, config.daily_goal_ml);
    let volume = if percentage == Percentage::FULL {
        Green.bold().paint(volume)
    } else {
        Blue.bold().paint(volume)
    };

    let mut text = format!(
        "Daily Progress  {volume}\n{} {percentage}\n",
        Blue.paint(progress_bar(percentage, BAR_WIDTH))
    );
    if percentage == Percentage::FULL {
        text += "Daily goal reached!\n";
    }
    text += &format!("Each glass is {}ml\n", config.glass_size_ml);
    text
}

/// Single line shown while the reminder runs. Meant to be redrawn in place.
pub fn countdown_line(snapshot: &TimerSnapshot) -> String {
    if snapshot.is_active {
        format!(
            "Next reminder in {} (every {})",
            format_countdown(snapshot.seconds_remaining),
            snapshot.interval
        )
    } else {
        format!("Reminder off (every {})", snapshot.interval)
    }
}
