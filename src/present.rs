use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::models::{Decoration, Leaderboard, LeaderboardView, RankedEntry};

/// Receives finished leaderboards and renders them somewhere. Ranking is
/// already done; presenters only format.
pub trait Presenter {
    fn present(&mut self, boards: &[Leaderboard]) -> anyhow::Result<()>;
}

/// Plain-text table for a terminal.
pub struct TerminalPresenter<W: Write> {
    writer: W,
    limit: Option<usize>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(writer: W, limit: Option<usize>) -> Self {
        Self { writer, limit }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, boards: &[Leaderboard]) -> anyhow::Result<()> {
        for board in boards {
            let text = render_terminal(board, self.limit);
            self.writer.write_all(text.as_bytes())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Markdown report written to a file.
pub struct MarkdownPresenter {
    out: PathBuf,
    limit: Option<usize>,
}

impl MarkdownPresenter {
    pub fn new(out: PathBuf, limit: Option<usize>) -> Self {
        Self { out, limit }
    }
}

impl Presenter for MarkdownPresenter {
    fn present(&mut self, boards: &[Leaderboard]) -> anyhow::Result<()> {
        let report = render_markdown(boards, self.limit);
        std::fs::write(&self.out, report)
            .with_context(|| format!("failed to write report to {}", self.out.display()))?;
        Ok(())
    }
}

/// Pretty-printed JSON, one document per call.
pub struct JsonPresenter<W: Write> {
    writer: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, boards: &[Leaderboard]) -> anyhow::Result<()> {
        match boards {
            [board] => serde_json::to_writer_pretty(&mut self.writer, board)?,
            _ => serde_json::to_writer_pretty(&mut self.writer, boards)?,
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn decoration_label(decoration: Decoration) -> String {
    match decoration {
        Decoration::Medal(medal) => medal.emoji().to_string(),
        Decoration::Ordinal(n) => format!("{n}."),
        Decoration::Trailing => "🐢".to_string(),
    }
}

/// `"3h 05m"` until `resets_at`, or `"now"` once it has passed.
pub fn format_countdown(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = resets_at - now;
    if remaining <= chrono::Duration::zero() {
        return "now".to_string();
    }
    let minutes = remaining.num_minutes();
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn today_cell(entry: &RankedEntry) -> String {
    if entry.today_total > 0 {
        entry.today_total.to_string()
    } else {
        "-".to_string()
    }
}

fn badge(entry: &RankedEntry) -> &'static str {
    if entry.personal_record {
        " ⭐ PR"
    } else {
        ""
    }
}

fn visible(board: &Leaderboard, limit: Option<usize>) -> &[RankedEntry] {
    let shown = limit.unwrap_or(board.entries.len()).min(board.entries.len());
    &board.entries[..shown]
}

pub fn render_terminal(board: &Leaderboard, limit: Option<usize>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} pushups and counting", board.grand_total);
    let _ = writeln!(output, "{}", board.view.title());

    if board.entries.is_empty() {
        let _ = writeln!(output, "No submissions in this view yet.");
        let _ = writeln!(output);
        return output;
    }

    for entry in visible(board, limit) {
        let label = decoration_label(entry.decoration);
        match board.view {
            LeaderboardView::AllTime => {
                let _ = writeln!(
                    output,
                    "{:>4} {:<24} {:>7} all-time  PB {:>4}  today {:>4}",
                    label,
                    entry.identity,
                    entry.all_time_total,
                    entry.personal_best,
                    today_cell(entry)
                );
            }
            LeaderboardView::Today => {
                let resets = entry
                    .resets_at
                    .map(|at| format!("  resets in {}", format_countdown(at, board.generated_at)))
                    .unwrap_or_default();
                let _ = writeln!(
                    output,
                    "{:>4} {:<24} {:>5} today{}{}",
                    label,
                    entry.identity,
                    entry.today_total,
                    badge(entry),
                    resets
                );
            }
            LeaderboardView::Submissions => {
                let when = entry
                    .submitted_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    output,
                    "{:>4} {:<24} {:>5} on {}{}",
                    label,
                    entry.identity,
                    entry.score,
                    when,
                    badge(entry)
                );
            }
        }
    }

    let _ = writeln!(output);
    output
}

pub fn render_markdown(boards: &[Leaderboard], limit: Option<usize>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Pushup Challenge Leaderboard");
    if let Some(first) = boards.first() {
        let _ = writeln!(
            output,
            "Generated {}. {} pushups across {} submissions from {} participants.",
            first.generated_at.format("%Y-%m-%d %H:%M UTC"),
            first.grand_total,
            first.record_count,
            first.participant_count
        );
    }

    for board in boards {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", board.view.title());

        if board.entries.is_empty() {
            let _ = writeln!(output, "No submissions in this view yet.");
            continue;
        }

        for entry in visible(board, limit) {
            let who = if entry.identity.is_undefined() {
                entry.identity.to_string()
            } else {
                format!("[{}]({})", entry.identity, entry.identity.profile_url())
            };
            let label = decoration_label(entry.decoration);
            match board.view {
                LeaderboardView::AllTime => {
                    let today = if entry.today_total > 0 {
                        format!("[{}]({})", entry.today_total, entry.today_proof)
                    } else {
                        "-".to_string()
                    };
                    let _ = writeln!(
                        output,
                        "- {} {}: {} all-time, PB [{}]({}), today {}",
                        label,
                        who,
                        entry.all_time_total,
                        entry.personal_best,
                        entry.personal_best_proof,
                        today
                    );
                }
                LeaderboardView::Today => {
                    let _ = writeln!(
                        output,
                        "- {} {}: [{}]({}) today{}",
                        label,
                        who,
                        entry.today_total,
                        entry.today_proof,
                        badge(entry)
                    );
                }
                LeaderboardView::Submissions => {
                    let _ = writeln!(
                        output,
                        "- {} {}: [{}]({}){}",
                        label,
                        who,
                        entry.score,
                        entry.proof_reference.as_deref().unwrap_or_default(),
                        badge(entry)
                    );
                }
            }
        }
    }

    output
}
