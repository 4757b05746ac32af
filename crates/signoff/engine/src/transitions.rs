//! Transition table of the review workflow
//!
//! Every `(current, requested)` status pair maps to either a rule (guard plus
//! effect) or a rejection. The table is a single exhaustive `match`, so
//! adding a status forces a decision for every pair.

use signoff_types::CollectionStatus;

/// Role requirement checked before a transition runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    /// Member of the editors group
    Editor,
    /// Member of the editors or the reviewers group
    EditorOrReviewer,
    /// Member of the reviewers group and, with reviews enabled, not the
    /// actor who requested the review
    Reviewer,
    /// No role requirement beyond reaching the workflow
    Anyone,
}

/// What a transition does once its guard holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Copy source to preview and sign the preview
    RequestReview,
    /// Copy source to destination and sign it
    Sign,
    /// Drop the pending review request
    CancelReview,
    /// Re-sign destination and preview without copying records
    Resign,
    /// Restore source and preview to the destination content
    Rollback,
}

/// A permitted transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub guard: Guard,
    pub effect: Effect,
}

impl TransitionRule {
    const fn new(guard: Guard, effect: Effect) -> Self {
        Self { guard, effect }
    }

    /// Status persisted once the transition has been applied
    pub fn resulting_status(&self, current: CollectionStatus) -> CollectionStatus {
        match self.effect {
            Effect::RequestReview => CollectionStatus::ToReview,
            Effect::Sign => CollectionStatus::Signed,
            Effect::CancelReview | Effect::Rollback => CollectionStatus::WorkInProgress,
            Effect::Resign => current,
        }
    }
}

/// Look up the rule for `current -> requested`.
///
/// `None` means the pair is not a valid transition.
pub fn lookup(
    current: CollectionStatus,
    requested: CollectionStatus,
    to_review_enabled: bool,
) -> Option<TransitionRule> {
    use CollectionStatus::*;

    match (current, requested) {
        (WorkInProgress, ToReview) | (ToReview, ToReview) => {
            Some(TransitionRule::new(Guard::Editor, Effect::RequestReview))
        }
        (ToReview, ToSign) => Some(TransitionRule::new(Guard::Reviewer, Effect::Sign)),
        (WorkInProgress, ToSign) | (Signed, ToSign) if !to_review_enabled => {
            Some(TransitionRule::new(Guard::Reviewer, Effect::Sign))
        }
        (ToReview, WorkInProgress) => Some(TransitionRule::new(
            Guard::EditorOrReviewer,
            Effect::CancelReview,
        )),
        (WorkInProgress, ToResign) | (Signed, ToResign) => {
            Some(TransitionRule::new(Guard::Anyone, Effect::Resign))
        }
        (_, ToRollback) => Some(TransitionRule::new(Guard::Editor, Effect::Rollback)),

        (WorkInProgress, WorkInProgress)
        | (WorkInProgress, ToSign)
        | (WorkInProgress, Signed)
        | (ToReview, Signed)
        | (ToReview, ToResign)
        | (Signed, WorkInProgress)
        | (Signed, ToReview)
        | (Signed, ToSign)
        | (Signed, Signed)
        | (ToSign, _)
        | (ToResign, _)
        | (ToRollback, _) => None,
    }
}
