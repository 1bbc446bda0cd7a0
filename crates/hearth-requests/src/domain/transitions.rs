//! The request state machine.
//!
//! Every actor-driven transition is one row of [`TRANSITIONS`], keyed by the
//! current status, the actor's intent, and the actor's role. A row applies
//! only when all of its guards pass. Anything without a row is forbidden.
//! Readiness (`Incomplete` <-> `Ready`) is not actor-driven and is derived
//! from content after every edit by [`readiness_transition`].

use std::fmt;

use hearth_core::capability::CapabilitySet;
use hearth_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::RequestKind;
use super::status::RequestStatus;
use super::status::RequestStatus::{
    Approved, Archived, Canceled, InReview, Incomplete, Ready, Rejected, Reviewed, Submitted,
};
use ActorRole::{Owner, Reviewer};
use Intent::{Advance, Cancel};

/// What the actor asks the state machine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Move the request along its forward edge.
    Advance,
    /// Withdraw (owner) or decline (reviewer) the request.
    Cancel,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Advance => "advance",
            Self::Cancel => "cancel",
        })
    }
}

/// The role an actor plays relative to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The requester.
    Owner,
    /// A holder of the kind's reviewer capability who is not the requester.
    Reviewer,
}

impl ActorRole {
    /// Resolves the actor's role for a request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` if the actor is neither the owner nor
    /// holds the kind's reviewer capability.
    pub fn resolve(
        actor_id: Uuid,
        capabilities: &CapabilitySet,
        requester_id: Uuid,
        kind: RequestKind,
    ) -> Result<Self, DomainError> {
        if actor_id == requester_id {
            return Ok(Self::Owner);
        }
        if capabilities.has(kind.reviewer_capability()) {
            return Ok(Self::Reviewer);
        }
        Err(DomainError::Forbidden(format!(
            "actor {actor_id} is neither the requester nor a {kind} reviewer"
        )))
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "owner",
            Self::Reviewer => "reviewer",
        })
    }
}

/// Facts about the request a guard may inspect.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    /// The acting actor.
    pub actor_id: Uuid,
    /// The reviewer currently recorded on the request.
    pub reviewer_id: Option<Uuid>,
    /// Comments whose field has not been edited since.
    pub unresolved_comments: usize,
    /// Whether every field is valid.
    pub content_ready: bool,
}

/// A precondition on a transition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// No reviewer recorded, or the actor is the recorded reviewer.
    Claimable,
    /// The actor is the recorded reviewer.
    AssignedReviewer,
    /// At least one unresolved comment.
    HasUnresolvedComments,
    /// No unresolved comments.
    NoUnresolvedComments,
    /// Every field is valid.
    ContentComplete,
}

impl Guard {
    fn check(self, ctx: &TransitionContext) -> Result<(), DomainError> {
        match self {
            Self::Claimable => match ctx.reviewer_id {
                Some(reviewer) if reviewer != ctx.actor_id => Err(DomainError::Forbidden(
                    format!("request is claimed by reviewer {reviewer}"),
                )),
                _ => Ok(()),
            },
            Self::AssignedReviewer => {
                if ctx.reviewer_id == Some(ctx.actor_id) {
                    Ok(())
                } else {
                    Err(DomainError::Forbidden(
                        "only the assigned reviewer may act on this request".to_owned(),
                    ))
                }
            }
            Self::HasUnresolvedComments => {
                if ctx.unresolved_comments > 0 {
                    Ok(())
                } else {
                    Err(DomainError::Conflict(
                        "request has no unresolved comments".to_owned(),
                    ))
                }
            }
            Self::NoUnresolvedComments => {
                if ctx.unresolved_comments == 0 {
                    Ok(())
                } else {
                    Err(DomainError::Conflict(format!(
                        "request has {} unresolved comments",
                        ctx.unresolved_comments
                    )))
                }
            }
            Self::ContentComplete => {
                if ctx.content_ready {
                    Ok(())
                } else {
                    Err(DomainError::Conflict(
                        "request content is incomplete".to_owned(),
                    ))
                }
            }
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    /// Status the request must be in.
    pub from: RequestStatus,
    /// The actor's intent.
    pub intent: Intent,
    /// The actor's role.
    pub role: ActorRole,
    /// Status after the transition.
    pub to: RequestStatus,
    /// Preconditions, all of which must pass.
    pub guards: &'static [Guard],
}

const fn row(
    from: RequestStatus,
    intent: Intent,
    role: ActorRole,
    to: RequestStatus,
    guards: &'static [Guard],
) -> Transition {
    Transition {
        from,
        intent,
        role,
        to,
        guards,
    }
}

/// Every actor-driven transition.
pub const TRANSITIONS: &[Transition] = &[
    row(Ready, Advance, Owner, Submitted, &[]),
    row(Submitted, Advance, Reviewer, InReview, &[Guard::Claimable]),
    row(
        InReview,
        Advance,
        Reviewer,
        Reviewed,
        &[Guard::AssignedReviewer, Guard::HasUnresolvedComments],
    ),
    row(
        InReview,
        Advance,
        Reviewer,
        Approved,
        &[Guard::AssignedReviewer, Guard::NoUnresolvedComments],
    ),
    row(Reviewed, Advance, Owner, Ready, &[Guard::ContentComplete]),
    row(Submitted, Cancel, Reviewer, Rejected, &[Guard::Claimable]),
    row(Rejected, Advance, Owner, Archived, &[]),
    row(Incomplete, Cancel, Owner, Canceled, &[]),
    row(Ready, Cancel, Owner, Canceled, &[]),
    row(Submitted, Cancel, Owner, Canceled, &[]),
    row(InReview, Cancel, Owner, Canceled, &[]),
    row(Reviewed, Cancel, Owner, Canceled, &[]),
    row(Rejected, Cancel, Owner, Canceled, &[]),
];

/// Resolves an intent to a target status.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if no row matches, or the error of the
/// last failing guard if rows match but none passes.
pub fn resolve(
    from: RequestStatus,
    intent: Intent,
    role: ActorRole,
    ctx: &TransitionContext,
) -> Result<RequestStatus, DomainError> {
    let mut failure = None;
    for transition in TRANSITIONS
        .iter()
        .filter(|t| t.from == from && t.intent == intent && t.role == role)
    {
        match transition.guards.iter().try_for_each(|g| g.check(ctx)) {
            Ok(()) => return Ok(transition.to),
            Err(err) => failure = Some(err),
        }
    }
    Err(failure.unwrap_or_else(|| {
        DomainError::Forbidden(format!("{role} may not {intent} a request that is {from}"))
    }))
}

/// Returns the status readiness implies after an edit, if it differs.
#[must_use]
pub fn readiness_transition(status: RequestStatus, content_ready: bool) -> Option<RequestStatus> {
    match (status, content_ready) {
        (Incomplete, true) => Some(Ready),
        (Ready, false) => Some(Incomplete),
        _ => None,
    }
}
