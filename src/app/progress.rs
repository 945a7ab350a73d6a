use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tokio::sync::oneshot;

use crate::http::Progress;

const BAR_WIDTH: usize = 30;
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

/// Redraws the progress line on stderr until `done_rx` fires or is dropped.
///
/// Does nothing when stderr is not a terminal.
pub(crate) fn setup_progress_indicator(
    progress: Progress,
    no_color: bool,
    mut done_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !std::io::stderr().is_terminal() {
            return;
        }

        let mut ticker = tokio::time::interval(REDRAW_INTERVAL);
        loop {
            tokio::select! {
                _ = &mut done_rx => {
                    if render_progress_line(&progress, no_color).is_ok() {
                        drop(finish_progress_line());
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if render_progress_line(&progress, no_color).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn render_progress_line(progress: &Progress, no_color: bool) -> Result<(), std::io::Error> {
    let line = build_progress_line(progress.completed(), progress.planned(), BAR_WIDTH, no_color);

    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        match segment.color {
            Some(color) => queue!(
                out,
                SetForegroundColor(color),
                Print(&segment.text),
                ResetColor
            )?,
            None => queue!(out, Print(&segment.text))?,
        }
    }
    out.flush()?;
    Ok(())
}

fn finish_progress_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// `[#####-----] 42.00% | 21/50 req`, split into colorable segments.
pub(super) fn build_progress_line(
    completed: u64,
    planned: u64,
    width: usize,
    no_color: bool,
) -> Vec<ProgressSegment> {
    let width = width.max(1);
    let goal = u128::from(planned.max(1));
    let current = u128::from(completed.min(planned));
    let width_u128 = u128::from(u64::try_from(width).unwrap_or(u64::MAX));

    let scaled = current
        .saturating_mul(width_u128)
        .checked_div(goal)
        .unwrap_or(0);
    let complete_size = usize::try_from(scaled).unwrap_or(width).min(width);
    let incomplete_size = width.saturating_sub(complete_size);

    let percent_x100 = current
        .saturating_mul(10_000)
        .checked_div(goal)
        .unwrap_or(0);
    let percent_whole = percent_x100.checked_div(100).unwrap_or(0);
    let percent_frac = percent_x100.checked_rem(100).unwrap_or(0);

    let bar = format!(
        "[{}{}]",
        "#".repeat(complete_size),
        "-".repeat(incomplete_size)
    );
    let percent_text = format!(" {}.{:02}%", percent_whole, percent_frac);
    let count_text = format!(" | {}/{} req", completed.min(planned), planned);

    if no_color {
        vec![
            ProgressSegment::plain(bar),
            ProgressSegment::plain(percent_text),
            ProgressSegment::plain(count_text),
        ]
    } else {
        vec![
            ProgressSegment::plain(bar),
            ProgressSegment::colored(percent_text, Color::Cyan),
            ProgressSegment::colored(count_text, Color::Yellow),
        ]
    }
}

pub(super) struct ProgressSegment {
    pub(super) text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}
