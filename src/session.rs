// src/session.rs
//! Poll session state machine.
//!
//! One `PollSession` owns the active poll, the roster, the vote set, the
//! countdown timer and the results flag. Every mutation goes through one of
//! the transition methods below; a rejected transition leaves state untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RejectedTransition, Result, ValidationError};
use crate::models::{
    validate_student_name, Poll, PollDraft, Role, Student, Vote, DEFAULT_TIME_LIMIT_SECS,
    MIN_OPTIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Used when a draft carries no time limit
    pub default_time_limit_seconds: u32,
    /// Move a still-active poll into history when a new one replaces it
    pub archive_on_replace: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_time_limit_seconds: DEFAULT_TIME_LIMIT_SECS,
            archive_on_replace: true,
        }
    }
}

/// Read-only copy of the whole session, handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub active_poll: Option<Poll>,
    pub votes: Vec<Vote>,
    pub students: Vec<Student>,
    pub time_remaining_seconds: u32,
    pub timer_active: bool,
    pub results_visible: bool,
    pub poll_history: Vec<Poll>,
    pub current_role: Option<Role>,
    pub current_student_name: Option<String>,
    pub can_create_new_poll: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Joined,
    /// Name already on the roster; treated as the same participant
    Rejoined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollCreated {
    pub poll: Poll,
    /// Id of the poll this one replaced, if any
    pub replaced: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    /// The student already had a vote for this poll and it was replaced
    pub replaced_previous: bool,
    /// Every student on the roster has now voted
    pub all_voted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TickOutcome {
    Running { remaining: u32 },
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedStudent {
    pub student: Student,
    pub vote: Option<Vote>,
}

/// The poll session store
#[derive(Debug, Clone)]
pub struct PollSession {
    config: SessionConfig,
    active_poll: Option<Poll>,
    votes: Vec<Vote>,
    students: Vec<Student>,
    time_remaining_seconds: u32,
    timer_active: bool,
    results_visible: bool,
    poll_history: Vec<Poll>,
    current_role: Option<Role>,
    current_student_name: Option<String>,
}

impl Default for PollSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl PollSession {
    /// Create an empty session: no poll, empty roster.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            active_poll: None,
            votes: Vec::new(),
            students: Vec::new(),
            time_remaining_seconds: 0,
            timer_active: false,
            results_visible: false,
            poll_history: Vec::new(),
            current_role: None,
            current_student_name: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn active_poll(&self) -> Option<&Poll> {
        self.active_poll.as_ref()
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Archived polls, most recent first
    pub fn history(&self) -> &[Poll] {
        &self.poll_history
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining_seconds
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn current_role(&self) -> Option<Role> {
        self.current_role
    }

    pub fn current_student_name(&self) -> Option<&str> {
        self.current_student_name.as_deref()
    }

    pub fn student(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    pub fn has_voted(&self, name: &str) -> bool {
        self.student(name).is_some_and(|s| s.has_voted)
    }

    fn all_voted(&self) -> bool {
        !self.students.is_empty() && self.students.iter().all(|s| s.has_voted)
    }

    /// Whether the teacher may start a new poll without cutting voting short.
    pub fn can_create_new_poll(&self) -> bool {
        self.active_poll.is_none() || self.all_voted()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_poll: self.active_poll.clone(),
            votes: self.votes.clone(),
            students: self.students.clone(),
            time_remaining_seconds: self.time_remaining_seconds,
            timer_active: self.timer_active,
            results_visible: self.results_visible,
            poll_history: self.poll_history.clone(),
            current_role: self.current_role,
            current_student_name: self.current_student_name.clone(),
            can_create_new_poll: self.can_create_new_poll(),
        }
    }

    // ---- roster ----

    pub fn select_role(&mut self, role: Role) {
        debug!(?role, "Role selected");
        self.current_role = Some(role);
    }

    /// Register the local participant as a student.
    ///
    /// A name that is already on the roster rejoins as the same student; no
    /// collision check is made between independent participants.
    pub fn register_student_name(&mut self, name: &str, now: DateTime<Utc>) -> Result<JoinOutcome> {
        let name = validate_student_name(name)?;
        let outcome = self.add_to_roster(&name, now);
        self.current_role = Some(Role::Student);
        self.current_student_name = Some(name);
        Ok(outcome)
    }

    /// Add a student to the roster on behalf of a remote client.
    ///
    /// Same idempotent-rejoin rule as [`register_student_name`](Self::register_student_name),
    /// but leaves the session-local role and name alone.
    pub fn join(&mut self, name: &str, now: DateTime<Utc>) -> Result<JoinOutcome> {
        let name = validate_student_name(name)?;
        Ok(self.add_to_roster(&name, now))
    }

    fn add_to_roster(&mut self, name: &str, now: DateTime<Utc>) -> JoinOutcome {
        if self.student(name).is_some() {
            debug!(student = %name, "Student rejoined");
            return JoinOutcome::Rejoined;
        }

        self.students.push(Student {
            name: name.to_string(),
            has_voted: false,
            joined_at: now,
        });
        info!(student = %name, roster_size = self.students.len(), "Student joined");
        JoinOutcome::Joined
    }

    /// Remove a student and any vote they cast. Completion is not re-evaluated.
    pub fn remove_student(&mut self, name: &str) -> Result<RemovedStudent> {
        let index = self
            .students
            .iter()
            .position(|s| s.name == name)
            .ok_or(RejectedTransition::UnknownStudent)?;

        let student = self.students.remove(index);
        let vote = self
            .votes
            .iter()
            .position(|v| v.student_name == name)
            .map(|i| self.votes.remove(i));

        if self.current_student_name.as_deref() == Some(name) {
            self.current_student_name = None;
        }

        info!(
            student = %name,
            had_vote = vote.is_some(),
            roster_size = self.students.len(),
            "Student removed"
        );

        Ok(RemovedStudent { student, vote })
    }

    // ---- poll lifecycle ----

    /// Open a new poll, replacing any active one.
    pub fn create_poll(&mut self, draft: &PollDraft, now: DateTime<Utc>) -> Result<PollCreated> {
        let question = draft.trimmed_question();
        if question.is_empty() {
            debug!("Poll rejected: empty question");
            return Err(RejectedTransition::EmptyQuestion.into());
        }

        let options = draft.trimmed_options();
        if options.len() < MIN_OPTIONS {
            debug!(options = options.len(), "Poll rejected: not enough options");
            return Err(RejectedTransition::NotEnoughOptions.into());
        }

        let time_limit = draft
            .time_limit_seconds
            .unwrap_or(self.config.default_time_limit_seconds);

        let replaced = self.active_poll.take().map(|previous| {
            let id = previous.id;
            if self.config.archive_on_replace {
                info!(poll_id = %id, "Archiving replaced poll");
                self.poll_history.insert(0, previous);
            } else {
                info!(poll_id = %id, "Discarding replaced poll");
            }
            id
        });

        let poll = Poll {
            id: Uuid::now_v7(),
            question: question.to_string(),
            options,
            created_at: now,
            time_limit_seconds: time_limit,
        };

        self.votes.clear();
        self.reset_voted_flags();
        self.time_remaining_seconds = time_limit;
        self.timer_active = time_limit > 0;
        // A zero limit has nothing to count down
        self.results_visible = time_limit == 0;
        self.active_poll = Some(poll.clone());

        info!(
            poll_id = %poll.id,
            options = poll.options.len(),
            time_limit,
            "Poll created"
        );

        Ok(PollCreated { poll, replaced })
    }

    /// Archive the active poll and return to the idle state.
    pub fn end_poll(&mut self) -> Result<Poll> {
        let poll = self
            .active_poll
            .take()
            .ok_or(RejectedTransition::NoActivePoll)?;

        self.poll_history.insert(0, poll.clone());
        self.votes.clear();
        self.time_remaining_seconds = 0;
        self.timer_active = false;
        self.results_visible = false;
        self.reset_voted_flags();

        info!(
            poll_id = %poll.id,
            history = self.poll_history.len(),
            "Poll ended"
        );

        Ok(poll)
    }

    fn reset_voted_flags(&mut self) {
        for student in &mut self.students {
            student.has_voted = false;
        }
    }

    // ---- voting ----

    /// Cast a vote as the locally registered student.
    pub fn submit_vote(&mut self, selected_option: usize, now: DateTime<Utc>) -> Result<VoteOutcome> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        let name = self
            .current_student_name
            .clone()
            .ok_or(RejectedTransition::NoStudentName)?;
        self.submit_vote_as(&name, selected_option, now)
    }

    /// Cast or replace a vote for `name`.
    pub fn submit_vote_as(
        &mut self,
        name: &str,
        selected_option: usize,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome> {
        let poll = self
            .active_poll
            .as_ref()
            .ok_or(RejectedTransition::NoActivePoll)?;

        if selected_option >= poll.options.len() {
            return Err(ValidationError::OptionOutOfRange {
                index: selected_option,
                len: poll.options.len(),
            }
            .into());
        }

        let poll_id = poll.id;
        let student = self
            .students
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or(RejectedTransition::UnknownStudent)?;
        student.has_voted = true;

        let before = self.votes.len();
        self.votes.retain(|v| v.student_name != name);
        let replaced_previous = self.votes.len() != before;

        self.votes.push(Vote {
            student_name: name.to_string(),
            poll_id,
            selected_option,
            timestamp: now,
        });

        debug!(
            student = %name,
            selected_option,
            replaced_previous,
            votes = self.votes.len(),
            "Vote recorded"
        );

        let all_voted = self.all_voted();
        if all_voted && !self.results_visible {
            self.results_visible = true;
            self.timer_active = false;
            info!(poll_id = %poll_id, "All students voted, showing results");
        }

        Ok(VoteOutcome {
            replaced_previous,
            all_voted,
        })
    }

    // ---- timer ----

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        if !self.timer_active {
            return Err(RejectedTransition::TimerInactive.into());
        }

        self.time_remaining_seconds = self.time_remaining_seconds.saturating_sub(1);

        if self.time_remaining_seconds == 0 {
            self.timer_active = false;
            self.results_visible = true;
            info!("Poll timer expired, showing results");
            return Ok(TickOutcome::Expired);
        }

        debug!(remaining = self.time_remaining_seconds, "Tick");
        Ok(TickOutcome::Running {
            remaining: self.time_remaining_seconds,
        })
    }

    /// Stop the countdown without revealing results.
    pub fn pause_timer(&mut self) -> Result<()> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        if !self.timer_active {
            return Err(RejectedTransition::TimerInactive.into());
        }
        self.timer_active = false;
        info!(remaining = self.time_remaining_seconds, "Poll timer paused");
        Ok(())
    }

    pub fn resume_timer(&mut self) -> Result<()> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        if self.results_visible {
            return Err(RejectedTransition::ResultsAlreadyVisible.into());
        }
        if self.time_remaining_seconds == 0 {
            return Err(RejectedTransition::TimerExpired.into());
        }
        self.timer_active = true;
        info!(remaining = self.time_remaining_seconds, "Poll timer resumed");
        Ok(())
    }

    // ---- results ----

    /// Teacher-initiated early reveal.
    pub fn show_results_now(&mut self) -> Result<()> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        self.results_visible = true;
        self.timer_active = false;
        info!("Results shown");
        Ok(())
    }

    pub fn hide_results(&mut self) -> Result<()> {
        if self.active_poll.is_none() {
            return Err(RejectedTransition::NoActivePoll.into());
        }
        self.results_visible = false;
        info!("Results hidden");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollError;

    fn draft(question: &str, options: &[&str], time_limit: u32) -> PollDraft {
        PollDraft::new(question, options, time_limit)
    }

    fn session_with_roster(names: &[&str]) -> PollSession {
        let mut session = PollSession::default();
        for name in names {
            session.join(name, Utc::now()).unwrap();
        }
        session
    }

    fn assert_invariants(session: &PollSession) {
        match session.active_poll() {
            None => {
                assert!(session.votes().is_empty());
                assert!(!session.timer_active());
                assert!(!session.results_visible());
            }
            Some(poll) => {
                for vote in session.votes() {
                    assert_eq!(vote.poll_id, poll.id);
                    assert!(vote.selected_option < poll.options.len());
                }
            }
        }
        for student in session.students() {
            let voted = session
                .votes()
                .iter()
                .any(|v| v.student_name == student.name);
            assert_eq!(student.has_voted, voted, "has_voted mismatch for {}", student.name);
        }
        let mut names: Vec<_> = session.votes().iter().map(|v| &v.student_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), session.votes().len());
        if session.time_remaining() == 0 {
            assert!(!session.timer_active());
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = PollSession::default();
        assert!(session.active_poll().is_none());
        assert!(session.students().is_empty());
        assert!(session.current_role().is_none());
        assert!(session.current_student_name().is_none());
        assert!(session.can_create_new_poll());
        assert_invariants(&session);
    }

    #[test]
    fn test_select_role_is_idempotent() {
        let mut session = PollSession::default();
        session.select_role(Role::Teacher);
        session.select_role(Role::Teacher);
        assert_eq!(session.current_role(), Some(Role::Teacher));
        assert!(session.active_poll().is_none());
    }

    #[test]
    fn test_register_student_name() {
        let mut session = PollSession::default();
        let outcome = session.register_student_name("  Ann ", Utc::now()).unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
        assert_eq!(session.current_role(), Some(Role::Student));
        assert_eq!(session.current_student_name(), Some("Ann"));
        assert_eq!(session.students().len(), 1);
        assert!(!session.students()[0].has_voted);
    }

    #[test]
    fn test_duplicate_name_rejoins() {
        let mut session = PollSession::default();
        let first = Utc::now();
        session.register_student_name("Ann", first).unwrap();
        let outcome = session
            .register_student_name("Ann", first + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(outcome, JoinOutcome::Rejoined);
        assert_eq!(session.students().len(), 1);
        assert_eq!(session.students()[0].joined_at, first);
    }

    #[test]
    fn test_register_rejects_invalid_name() {
        let mut session = PollSession::default();
        let err = session.register_student_name("   ", Utc::now()).unwrap_err();
        assert_eq!(err, PollError::Validation(ValidationError::EmptyName));
        assert!(session.current_role().is_none());
        assert!(session.students().is_empty());
    }

    #[test]
    fn test_join_leaves_local_context_alone() {
        let mut session = PollSession::default();
        session.select_role(Role::Teacher);
        session.join("Bo", Utc::now()).unwrap();
        assert_eq!(session.current_role(), Some(Role::Teacher));
        assert!(session.current_student_name().is_none());
        assert!(session.student("Bo").is_some());
    }

    #[test]
    fn test_pick_one_scenario() {
        let mut session = PollSession::default();
        session.register_student_name("Ann", Utc::now()).unwrap();

        let created = session
            .create_poll(&draft("Pick one", &["X", "Y"], 30), Utc::now())
            .unwrap();
        assert!(created.replaced.is_none());
        let poll = session.active_poll().unwrap();
        assert_eq!(poll.options, vec!["X", "Y"]);
        assert_eq!(session.time_remaining(), 30);
        assert!(session.timer_active());

        session.submit_vote(0, Utc::now()).unwrap();
        assert_eq!(session.votes().len(), 1);
        assert_eq!(session.votes()[0].student_name, "Ann");
        assert_eq!(session.votes()[0].selected_option, 0);
        assert!(session.has_voted("Ann"));
        assert_invariants(&session);
    }

    #[test]
    fn test_create_poll_trims_and_filters() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("  Best fruit? ", &[" apple ", "", "pear  "], 30), Utc::now())
            .unwrap();
        let poll = session.active_poll().unwrap();
        assert_eq!(poll.question, "Best fruit?");
        assert_eq!(poll.options, vec!["apple", "pear"]);
    }

    #[test]
    fn test_create_poll_rejections_leave_state() {
        let mut session = PollSession::default();
        let err = session
            .create_poll(&draft("   ", &["a", "b"], 30), Utc::now())
            .unwrap_err();
        assert_eq!(err, PollError::Rejected(RejectedTransition::EmptyQuestion));

        let err = session
            .create_poll(&draft("Q", &["a", "  "], 30), Utc::now())
            .unwrap_err();
        assert_eq!(err, PollError::Rejected(RejectedTransition::NotEnoughOptions));

        assert!(session.active_poll().is_none());
        assert_invariants(&session);
    }

    #[test]
    fn test_create_poll_default_time_limit() {
        let mut session = PollSession::default();
        let mut d = draft("Q", &["a", "b"], 0);
        d.time_limit_seconds = None;
        session.create_poll(&d, Utc::now()).unwrap();
        assert_eq!(session.time_remaining(), 60);
        assert!(session.timer_active());
    }

    #[test]
    fn test_create_poll_zero_limit_expires_immediately() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("Q", &["a", "b"], 0), Utc::now())
            .unwrap();
        assert!(!session.timer_active());
        assert!(session.results_visible());
        assert_invariants(&session);
    }

    #[test]
    fn test_create_poll_resets_votes_and_flags() {
        let mut session = session_with_roster(&["Ann", "Bo"]);
        session
            .create_poll(&draft("First", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.submit_vote_as("Ann", 1, Utc::now()).unwrap();
        session.show_results_now().unwrap();

        session
            .create_poll(&draft("Second", &["c", "d"], 45), Utc::now())
            .unwrap();
        assert!(session.votes().is_empty());
        assert!(session.students().iter().all(|s| !s.has_voted));
        assert!(!session.results_visible());
        assert!(session.timer_active());
        assert_eq!(session.time_remaining(), 45);
        assert_invariants(&session);
    }

    #[test]
    fn test_replace_archives_previous_poll() {
        let mut session = PollSession::default();
        let first = session
            .create_poll(&draft("First", &["a", "b"], 30), Utc::now())
            .unwrap();
        let second = session
            .create_poll(&draft("Second", &["a", "b"], 30), Utc::now())
            .unwrap();
        assert_eq!(second.replaced, Some(first.poll.id));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].question, "First");
    }

    #[test]
    fn test_replace_discards_when_configured() {
        let mut session = PollSession::new(SessionConfig {
            archive_on_replace: false,
            ..SessionConfig::default()
        });
        session
            .create_poll(&draft("First", &["a", "b"], 30), Utc::now())
            .unwrap();
        let second = session
            .create_poll(&draft("Second", &["a", "b"], 30), Utc::now())
            .unwrap();
        assert!(second.replaced.is_some());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_revote_replaces_previous() {
        let mut session = session_with_roster(&["Ann", "Bo"]);
        session
            .create_poll(&draft("Q", &["a", "b", "c"], 30), Utc::now())
            .unwrap();

        let first = session.submit_vote_as("Ann", 0, Utc::now()).unwrap();
        assert!(!first.replaced_previous);
        let second = session.submit_vote_as("Ann", 2, Utc::now()).unwrap();
        assert!(second.replaced_previous);

        assert_eq!(session.votes().len(), 1);
        assert_eq!(session.votes()[0].selected_option, 2);
        assert!(!session.results_visible());
        assert_invariants(&session);
    }

    #[test]
    fn test_out_of_range_vote_is_rejected() {
        let mut session = PollSession::default();
        session.register_student_name("Ann", Utc::now()).unwrap();
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();

        let err = session.submit_vote(2, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            PollError::Validation(ValidationError::OptionOutOfRange { index: 2, len: 2 })
        );
        assert!(session.votes().is_empty());
        assert!(!session.has_voted("Ann"));

        // An existing vote survives a bad re-vote untouched
        session.submit_vote(1, Utc::now()).unwrap();
        assert!(session.submit_vote(9, Utc::now()).is_err());
        assert_eq!(session.votes()[0].selected_option, 1);
        assert!(session.has_voted("Ann"));
    }

    #[test]
    fn test_vote_preconditions() {
        let mut session = PollSession::default();
        assert_eq!(
            session.submit_vote(0, Utc::now()).unwrap_err(),
            PollError::Rejected(RejectedTransition::NoActivePoll)
        );

        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        assert_eq!(
            session.submit_vote(0, Utc::now()).unwrap_err(),
            PollError::Rejected(RejectedTransition::NoStudentName)
        );
        assert_eq!(
            session.submit_vote_as("Ghost", 0, Utc::now()).unwrap_err(),
            PollError::Rejected(RejectedTransition::UnknownStudent)
        );
        assert!(session.votes().is_empty());
    }

    #[test]
    fn test_all_voted_shows_results_early() {
        let mut session = session_with_roster(&["A", "B"]);
        session
            .create_poll(&draft("Q", &["x", "y"], 60), Utc::now())
            .unwrap();

        let outcome = session.submit_vote_as("A", 0, Utc::now()).unwrap();
        assert!(!outcome.all_voted);
        assert!(!session.results_visible());

        let outcome = session.submit_vote_as("B", 1, Utc::now()).unwrap();
        assert!(outcome.all_voted);
        assert!(session.results_visible());
        assert!(!session.timer_active());
        assert_eq!(session.time_remaining(), 60);
        assert!(session.can_create_new_poll());
        assert_invariants(&session);
    }

    #[test]
    fn test_tick_counts_down() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("Q", &["a", "b"], 3), Utc::now())
            .unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 2 });
        assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 1 });
        assert_eq!(session.tick().unwrap(), TickOutcome::Expired);
        assert!(!session.timer_active());
        assert!(session.results_visible());
        assert_invariants(&session);
    }

    #[test]
    fn test_sixty_one_ticks_never_go_negative() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("Q", &["a", "b"], 60), Utc::now())
            .unwrap();

        for _ in 0..61 {
            let _ = session.tick();
            assert_invariants(&session);
        }
        assert_eq!(session.time_remaining(), 0);
        assert!(!session.timer_active());
        assert!(session.results_visible());

        // Further ticks are rejected and change nothing
        assert_eq!(
            session.tick().unwrap_err(),
            PollError::Rejected(RejectedTransition::TimerInactive)
        );
        assert!(!session.timer_active());
        assert_eq!(session.time_remaining(), 0);
    }

    #[test]
    fn test_tick_without_poll() {
        let mut session = PollSession::default();
        assert_eq!(
            session.tick().unwrap_err(),
            PollError::Rejected(RejectedTransition::NoActivePoll)
        );
        assert!(!session.results_visible());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.tick().unwrap();

        session.pause_timer().unwrap();
        assert!(!session.timer_active());
        assert!(!session.results_visible());
        assert!(session.tick().is_err());
        assert_eq!(session.time_remaining(), 29);
        assert_eq!(
            session.pause_timer().unwrap_err(),
            PollError::Rejected(RejectedTransition::TimerInactive)
        );

        session.resume_timer().unwrap();
        assert!(session.timer_active());
        assert_eq!(session.tick().unwrap(), TickOutcome::Running { remaining: 28 });

        session.show_results_now().unwrap();
        assert_eq!(
            session.resume_timer().unwrap_err(),
            PollError::Rejected(RejectedTransition::ResultsAlreadyVisible)
        );
    }

    #[test]
    fn test_show_and_hide_results() {
        let mut session = PollSession::default();
        assert!(session.show_results_now().is_err());

        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.show_results_now().unwrap();
        assert!(session.results_visible());
        assert!(!session.timer_active());

        session.hide_results().unwrap();
        assert!(!session.results_visible());
        assert!(session.active_poll().is_some());
        assert_eq!(session.time_remaining(), 30);
    }

    #[test]
    fn test_end_poll_archives_and_resets() {
        let mut session = session_with_roster(&["Ann", "Bo"]);
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.submit_vote_as("Ann", 0, Utc::now()).unwrap();

        let ended = session.end_poll().unwrap();
        assert_eq!(ended.question, "Q");
        assert!(session.active_poll().is_none());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.time_remaining(), 0);
        assert!(session.students().iter().all(|s| !s.has_voted));
        assert_invariants(&session);

        session
            .create_poll(&draft("Q2", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.end_poll().unwrap();
        assert_eq!(session.history()[0].question, "Q2");
        assert_eq!(session.history()[1].question, "Q");
    }

    #[test]
    fn test_end_poll_without_poll_is_noop() {
        let mut session = session_with_roster(&["Ann"]);
        let before = session.snapshot();
        assert_eq!(
            session.end_poll().unwrap_err(),
            PollError::Rejected(RejectedTransition::NoActivePoll)
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_remove_student_drops_vote() {
        let mut session = PollSession::default();
        session.join("Bo", Utc::now()).unwrap();
        session.register_student_name("Ann", Utc::now()).unwrap();
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.submit_vote(1, Utc::now()).unwrap();

        let removed = session.remove_student("Ann").unwrap();
        assert_eq!(removed.student.name, "Ann");
        assert_eq!(removed.vote.map(|v| v.selected_option), Some(1));
        assert!(session.votes().is_empty());
        assert!(session.current_student_name().is_none());
        assert_eq!(session.students().len(), 1);

        // Bo is now the only student and has not voted; nothing re-evaluates
        assert!(!session.results_visible());
        assert_invariants(&session);

        assert_eq!(
            session.remove_student("Ann").unwrap_err(),
            PollError::Rejected(RejectedTransition::UnknownStudent)
        );
    }

    #[test]
    fn test_can_create_new_poll() {
        let mut session = session_with_roster(&["Ann"]);
        assert!(session.can_create_new_poll());
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        assert!(!session.can_create_new_poll());
        session.submit_vote_as("Ann", 0, Utc::now()).unwrap();
        assert!(session.can_create_new_poll());
    }

    #[test]
    fn test_early_reveal_does_not_allow_new_poll() {
        let mut session = session_with_roster(&["Ann", "Bo"]);
        session
            .create_poll(&draft("Q", &["a", "b"], 30), Utc::now())
            .unwrap();
        session.submit_vote_as("Ann", 0, Utc::now()).unwrap();
        session.show_results_now().unwrap();
        assert!(!session.can_create_new_poll());
    }

    #[test]
    fn test_tick_after_expiry_and_hide_stays_hidden() {
        let mut session = PollSession::default();
        session
            .create_poll(&draft("Q", &["a", "b"], 2), Utc::now())
            .unwrap();
        session.tick().unwrap();
        assert_eq!(session.tick().unwrap(), TickOutcome::Expired);

        session.hide_results().unwrap();
        assert!(!session.results_visible());

        assert_eq!(
            session.tick().unwrap_err(),
            PollError::Rejected(RejectedTransition::TimerInactive)
        );
        assert!(!session.results_visible());
        assert!(!session.timer_active());
        assert_eq!(session.time_remaining(), 0);
        assert_invariants(&session);
    }
}
