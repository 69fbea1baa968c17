use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::advance::{Actor, AdvanceStatus};
use crate::permission::PermissionCode;

impl AdvanceStatus {
    /// States an advance must be in before it may move to `self`.
    /// `Requested` has none: it is only ever written on creation.
    pub fn allowed_predecessors(self) -> &'static [AdvanceStatus] {
        use AdvanceStatus::*;
        match self {
            Requested => &[],
            Approved => &[Requested],
            Rejected => &[Requested],
            Cancelled => &[Requested, Approved],
            Paid => &[Approved],
        }
    }

    pub fn can_move_to(self, target: AdvanceStatus) -> bool {
        target.allowed_predecessors().contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AdvanceStatus::Rejected | AdvanceStatus::Cancelled | AdvanceStatus::Paid
        )
    }

    /// Whether the advance still counts against the employee's ceiling and
    /// the company's open debt.
    pub fn is_outstanding(self) -> bool {
        matches!(self, AdvanceStatus::Requested | AdvanceStatus::Approved)
    }

    /// What entering this status does to the company debt the advance was
    /// booked against.
    pub fn debt_effect(self) -> DebtEffect {
        match self {
            AdvanceStatus::Paid => DebtEffect::AddPaid,
            s if s.is_terminal() => DebtEffect::RemoveRequested,
            _ => DebtEffect::None,
        }
    }
}

/// Change to a company debt row caused by a status transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DebtEffect {
    None,
    /// The advance will never be paid: take its total off the requested sum.
    RemoveRequested,
    AddPaid,
}

/// Requested status change, as sent in the `subaction` field of `PUT /{id}`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Subaction {
    Approve,
    Reject,
    Cancel,
    Pay,
}

impl Subaction {
    pub fn target(self) -> AdvanceStatus {
        match self {
            Subaction::Approve => AdvanceStatus::Approved,
            Subaction::Reject => AdvanceStatus::Rejected,
            Subaction::Cancel => AdvanceStatus::Cancelled,
            Subaction::Pay => AdvanceStatus::Paid,
        }
    }

    pub fn permission(self) -> PermissionCode {
        match self {
            Subaction::Approve => PermissionCode::AdvanceApprove,
            Subaction::Reject => PermissionCode::AdvanceReject,
            Subaction::Cancel => PermissionCode::AdvanceCancel,
            Subaction::Pay => PermissionCode::AdvancePay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistory {
    pub status: AdvanceStatus,
    pub actor: Actor,
    pub actor_user_id: Option<u64>,
}

/// A validated status change and the single history row that records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: AdvanceStatus,
    pub to: AdvanceStatus,
    pub history: NewHistory,
}

pub fn initial_history(actor_user_id: Option<u64>) -> NewHistory {
    NewHistory {
        status: AdvanceStatus::Requested,
        actor: Actor::Employee,
        actor_user_id,
    }
}

pub fn plan_transition(
    current: AdvanceStatus,
    subaction: Subaction,
    actor: Actor,
    actor_user_id: Option<u64>,
) -> AppResult<Transition> {
    let to = subaction.target();
    if !current.can_move_to(to) {
        return Err(AppError::InvalidTransition { from: current, to });
    }

    Ok(Transition {
        from: current,
        to,
        history: NewHistory {
            status: to,
            actor,
            actor_user_id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn predecessor_table() {
        use AdvanceStatus::*;
        assert!(Requested.can_move_to(Approved));
        assert!(Requested.can_move_to(Rejected));
        assert!(Requested.can_move_to(Cancelled));
        assert!(Approved.can_move_to(Paid));
        assert!(Approved.can_move_to(Cancelled));

        assert!(!Requested.can_move_to(Paid));
        assert!(!Approved.can_move_to(Approved));
        assert!(!Rejected.can_move_to(Approved));
        assert!(!Cancelled.can_move_to(Paid));
    }

    #[test]
    fn nothing_moves_back_to_requested() {
        for status in AdvanceStatus::iter() {
            assert!(!status.can_move_to(AdvanceStatus::Requested));
        }
    }

    #[test]
    fn terminal_states_have_no_successor() {
        let subactions = [
            Subaction::Approve,
            Subaction::Reject,
            Subaction::Cancel,
            Subaction::Pay,
        ];
        for status in AdvanceStatus::iter().filter(|s| s.is_terminal()) {
            for sub in subactions {
                assert!(plan_transition(status, sub, Actor::Admin, Some(1)).is_err());
            }
        }
    }

    #[test]
    fn rejected_transition_reports_both_states() {
        let err = plan_transition(AdvanceStatus::Requested, Subaction::Pay, Actor::Admin, None)
            .unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, AdvanceStatus::Requested);
                assert_eq!(to, AdvanceStatus::Paid);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn one_history_row_per_transition() {
        let mut history = vec![initial_history(Some(7))];
        let mut status = AdvanceStatus::Requested;

        for (sub, actor) in [
            (Subaction::Approve, Actor::Admin),
            (Subaction::Pay, Actor::Admin),
        ] {
            let t = plan_transition(status, sub, actor, Some(1)).unwrap();
            status = t.to;
            history.push(t.history);
        }
        // the pay -> cancel attempt is refused and must not add a row
        if let Ok(t) = plan_transition(status, Subaction::Cancel, Actor::Employee, Some(7)) {
            history.push(t.history);
        }

        assert_eq!(status, AdvanceStatus::Paid);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].actor, Actor::Employee);
        assert_eq!(history.last().unwrap().status, AdvanceStatus::Paid);
    }

    #[test]
    fn debt_follows_the_target_status() {
        assert_eq!(AdvanceStatus::Requested.debt_effect(), DebtEffect::None);
        assert_eq!(AdvanceStatus::Approved.debt_effect(), DebtEffect::None);
        assert_eq!(AdvanceStatus::Rejected.debt_effect(), DebtEffect::RemoveRequested);
        assert_eq!(AdvanceStatus::Cancelled.debt_effect(), DebtEffect::RemoveRequested);
        assert_eq!(AdvanceStatus::Paid.debt_effect(), DebtEffect::AddPaid);
    }

    #[test]
    fn refused_transition_touches_no_debt() {
        let planned = plan_transition(
            AdvanceStatus::Rejected,
            Subaction::Cancel,
            Actor::Employee,
            Some(7),
        )
        .map(|t| t.to.debt_effect());
        assert!(planned.is_err());

        let t = plan_transition(AdvanceStatus::Approved, Subaction::Cancel, Actor::Employee, Some(7))
            .unwrap();
        assert_eq!(t.to.debt_effect(), DebtEffect::RemoveRequested);
        assert_eq!(t.history.actor, Actor::Employee);
    }

    #[test]
    fn subaction_parses_from_form_value() {
        assert_eq!("approve".parse::<Subaction>().unwrap(), Subaction::Approve);
        assert_eq!(Subaction::Pay.permission(), PermissionCode::AdvancePay);
        assert!("delete".parse::<Subaction>().is_err());
    }
}
