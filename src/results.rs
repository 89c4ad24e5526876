// src/results.rs
use serde::Serialize;
use uuid::Uuid;

use crate::session::PollSession;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionResult {
    pub index: usize,
    /// "A", "B", ...
    pub letter: char,
    pub text: String,
    pub votes: usize,
    /// Share of votes cast, one decimal place
    pub percentage: f64,
    pub voters: Vec<String>,
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<OptionResult>,
    /// Indices of the options tied at the highest non-zero count
    pub winners: Vec<usize>,
    pub is_tie: bool,
    pub total_votes: usize,
    pub roster_size: usize,
    /// Whole percent of the roster that has voted
    pub participation_rate: u32,
    pub results_visible: bool,
}

/// Tally the active poll. Returns `None` when no poll is active.
pub fn tally(session: &PollSession) -> Option<PollResults> {
    let poll = session.active_poll()?;
    let votes = session.votes();
    let total_votes = votes.len();

    let mut options: Vec<OptionResult> = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let voters: Vec<String> = votes
                .iter()
                .filter(|v| v.selected_option == index)
                .map(|v| v.student_name.clone())
                .collect();
            OptionResult {
                index,
                letter: option_letter(index),
                text: text.clone(),
                votes: voters.len(),
                percentage: percentage(voters.len(), total_votes),
                voters,
                is_winner: false,
            }
        })
        .collect();

    let max_votes = options.iter().map(|o| o.votes).max().unwrap_or(0);
    let winners: Vec<usize> = if max_votes > 0 {
        options
            .iter()
            .filter(|o| o.votes == max_votes)
            .map(|o| o.index)
            .collect()
    } else {
        Vec::new()
    };
    for index in &winners {
        options[*index].is_winner = true;
    }

    let roster_size = session.students().len();

    Some(PollResults {
        poll_id: poll.id,
        question: poll.question.clone(),
        options,
        is_tie: winners.len() > 1,
        winners,
        total_votes,
        roster_size,
        participation_rate: participation_rate(total_votes, roster_size),
        results_visible: session.results_visible(),
    })
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

fn participation_rate(votes: usize, roster: usize) -> u32 {
    if roster == 0 {
        return 0;
    }
    (votes as f64 / roster as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerDisplay {
    pub remaining_seconds: u32,
    pub active: bool,
    /// MM:SS
    pub formatted: String,
    pub urgency: Urgency,
}

impl TimerDisplay {
    pub fn from_session(session: &PollSession) -> Self {
        let remaining = session.time_remaining();
        Self {
            remaining_seconds: remaining,
            active: session.timer_active(),
            formatted: format_clock(remaining),
            urgency: urgency(remaining),
        }
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn urgency(seconds: u32) -> Urgency {
    match seconds {
        0..=10 => Urgency::Critical,
        11..=30 => Urgency::Warning,
        _ => Urgency::Normal,
    }
}
