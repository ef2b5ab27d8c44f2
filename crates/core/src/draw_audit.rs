//! Consistency audit over a persisted draw.
//!
//! [`audit_draw`] checks that the stored assignments of an event form a
//! derangement of its participants and aggregates notification delivery
//! status. It is a read-only diagnostic: structural problems become
//! `issues` (and make the report not `ok`); reciprocal pairs and undelivered
//! notifications become `warnings`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The participant fields the audit needs.
#[derive(Debug, Clone, Copy)]
pub struct AuditParticipant<'a> {
    pub id: DbId,
    pub name: &'a str,
    pub email: &'a str,
}

/// The assignment fields the audit needs.
#[derive(Debug, Clone, Copy)]
pub struct AuditAssignment<'a> {
    pub id: DbId,
    pub giver_id: DbId,
    pub receiver_id: DbId,
    pub sent_at: Option<Timestamp>,
    pub last_error: Option<&'a str>,
    pub external_message_id: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Notification state
// ---------------------------------------------------------------------------

/// Delivery state of one assignment, judged by its most recent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Pending,
    Sent,
    Failed,
}

impl NotificationState {
    /// A recorded error wins over an older `sent_at`.
    pub fn classify(sent_at: Option<Timestamp>, last_error: Option<&str>) -> Self {
        match (sent_at, last_error) {
            (_, Some(_)) => Self::Failed,
            (Some(_), None) => Self::Sent,
            (None, None) => Self::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantRef {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantCount {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReciprocalPair {
    pub giver_id: DbId,
    pub receiver_id: DbId,
    pub giver_name: String,
    pub receiver_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNotification {
    pub assignment_id: DbId,
    pub giver_name: String,
    pub giver_email: String,
    pub error: String,
    pub external_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
    pub sent: usize,
    pub failed: usize,
    pub pending: usize,
    pub failed_details: Vec<FailedNotification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub participants: usize,
    pub assignments: usize,
    pub unassigned_givers: Vec<ParticipantRef>,
    pub duplicate_givers: Vec<ParticipantCount>,
    pub receivers_missing: Vec<ParticipantRef>,
    pub receivers_multi: Vec<ParticipantCount>,
    /// Ids of assignments whose giver is also the receiver.
    pub self_pairs: Vec<DbId>,
    /// Ids of assignments referencing a participant outside the event.
    pub orphaned: Vec<DbId>,
    pub reciprocal_pairs: Vec<ReciprocalPair>,
    pub notifications: NotificationSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawReport {
    pub ok: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: AuditSummary,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Audit the assignments of one event against its participants.
pub fn audit_draw(
    participants: &[AuditParticipant<'_>],
    assignments: &[AuditAssignment<'_>],
) -> DrawReport {
    let mut summary = AuditSummary {
        participants: participants.len(),
        assignments: assignments.len(),
        ..AuditSummary::default()
    };

    if assignments.is_empty() {
        return DrawReport {
            ok: false,
            issues: vec!["No assignments found: the draw has not been performed.".to_string()],
            warnings: Vec::new(),
            summary,
        };
    }

    let by_id: HashMap<DbId, &AuditParticipant<'_>> =
        participants.iter().map(|p| (p.id, p)).collect();
    let known: HashSet<DbId> = by_id.keys().copied().collect();

    let mut giver_counts: HashMap<DbId, usize> = HashMap::new();
    let mut receiver_counts: HashMap<DbId, usize> = HashMap::new();
    let mut giver_to_receiver: HashMap<DbId, DbId> = HashMap::new();

    for a in assignments {
        *giver_counts.entry(a.giver_id).or_default() += 1;
        *receiver_counts.entry(a.receiver_id).or_default() += 1;
        giver_to_receiver.insert(a.giver_id, a.receiver_id);

        if a.giver_id == a.receiver_id {
            summary.self_pairs.push(a.id);
        }
        if !known.contains(&a.giver_id) || !known.contains(&a.receiver_id) {
            summary.orphaned.push(a.id);
        }
    }

    for p in participants {
        match giver_counts.get(&p.id).copied().unwrap_or(0) {
            0 => summary.unassigned_givers.push(participant_ref(p)),
            1 => {}
            n => summary.duplicate_givers.push(participant_count(p, n)),
        }
        match receiver_counts.get(&p.id).copied().unwrap_or(0) {
            0 => summary.receivers_missing.push(participant_ref(p)),
            1 => {}
            n => summary.receivers_multi.push(participant_count(p, n)),
        }
    }

    summary.reciprocal_pairs = find_reciprocal_pairs(participants, &giver_to_receiver, &by_id);
    summary.notifications = summarize_notifications(assignments, &by_id);

    let issues = collect_issues(&summary);
    let warnings = collect_warnings(&summary);

    DrawReport {
        ok: issues.is_empty(),
        issues,
        warnings,
        summary,
    }
}

/// Report each A <-> B cycle once, from the participant listed first.
fn find_reciprocal_pairs(
    participants: &[AuditParticipant<'_>],
    giver_to_receiver: &HashMap<DbId, DbId>,
    by_id: &HashMap<DbId, &AuditParticipant<'_>>,
) -> Vec<ReciprocalPair> {
    let mut seen: HashSet<DbId> = HashSet::new();
    let mut pairs = Vec::new();

    for p in participants {
        let Some(&receiver) = giver_to_receiver.get(&p.id) else {
            continue;
        };
        if receiver == p.id || seen.contains(&p.id) {
            continue;
        }
        if giver_to_receiver.get(&receiver) == Some(&p.id) {
            seen.insert(p.id);
            seen.insert(receiver);
            pairs.push(ReciprocalPair {
                giver_id: p.id,
                receiver_id: receiver,
                giver_name: p.name.to_string(),
                receiver_name: by_id
                    .get(&receiver)
                    .map(|r| r.name.to_string())
                    .unwrap_or_else(|| receiver.to_string()),
            });
        }
    }

    pairs
}

fn summarize_notifications(
    assignments: &[AuditAssignment<'_>],
    by_id: &HashMap<DbId, &AuditParticipant<'_>>,
) -> NotificationSummary {
    let mut out = NotificationSummary::default();

    for a in assignments {
        match NotificationState::classify(a.sent_at, a.last_error) {
            NotificationState::Sent => out.sent += 1,
            NotificationState::Pending => out.pending += 1,
            NotificationState::Failed => {
                out.failed += 1;
                let giver = by_id.get(&a.giver_id);
                out.failed_details.push(FailedNotification {
                    assignment_id: a.id,
                    giver_name: giver
                        .map(|g| g.name.to_string())
                        .unwrap_or_else(|| a.giver_id.to_string()),
                    giver_email: giver
                        .map(|g| g.email.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    error: a.last_error.unwrap_or_default().to_string(),
                    external_message_id: a.external_message_id.map(str::to_string),
                });
            }
        }
    }

    out
}

fn collect_issues(summary: &AuditSummary) -> Vec<String> {
    let mut issues = Vec::new();

    if !summary.self_pairs.is_empty() {
        issues.push(format!(
            "{} assignment(s) pair a participant with themselves.",
            summary.self_pairs.len()
        ));
    }
    if !summary.orphaned.is_empty() {
        issues.push(format!(
            "{} assignment(s) reference participants outside this event.",
            summary.orphaned.len()
        ));
    }
    if !summary.unassigned_givers.is_empty() {
        issues.push(format!(
            "{} participant(s) have no one to give to.",
            summary.unassigned_givers.len()
        ));
    }
    if !summary.duplicate_givers.is_empty() {
        issues.push(format!(
            "{} participant(s) give to more than one receiver.",
            summary.duplicate_givers.len()
        ));
    }
    if !summary.receivers_missing.is_empty() {
        issues.push(format!(
            "{} participant(s) receive no gift.",
            summary.receivers_missing.len()
        ));
    }
    if !summary.receivers_multi.is_empty() {
        issues.push(format!(
            "{} participant(s) receive more than one gift.",
            summary.receivers_multi.len()
        ));
    }
    if summary.assignments != summary.participants {
        issues.push(format!(
            "Assignment count {} does not match participant count {}.",
            summary.assignments, summary.participants
        ));
    }

    issues
}

fn collect_warnings(summary: &AuditSummary) -> Vec<String> {
    let mut warnings = Vec::new();

    if !summary.reciprocal_pairs.is_empty() {
        warnings.push(format!(
            "{} reciprocal pair(s) detected (A draws B and B draws A).",
            summary.reciprocal_pairs.len()
        ));
    }
    if summary.notifications.failed > 0 {
        warnings.push(format!(
            "{} notification(s) failed to send.",
            summary.notifications.failed
        ));
    }
    if summary.notifications.pending > 0 {
        warnings.push(format!(
            "{} notification(s) are pending.",
            summary.notifications.pending
        ));
    }

    warnings
}

fn participant_ref(p: &AuditParticipant<'_>) -> ParticipantRef {
    ParticipantRef {
        id: p.id,
        name: p.name.to_string(),
        email: p.email.to_string(),
    }
}

fn participant_count(p: &AuditParticipant<'_>, count: usize) -> ParticipantCount {
    ParticipantCount {
        id: p.id,
        name: p.name.to_string(),
        email: p.email.to_string(),
        count,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
