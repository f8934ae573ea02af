//! Centralized capability table. Every mutating handler consults this once
//! instead of scattering role checks through the request path.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coordinator,
    Reviewer,
    Submitter,
}

impl Role {
    /// Roles are stored as plain strings on the person row; anything
    /// unrecognized is treated as the least-privileged role.
    pub fn parse(raw: &str) -> Role {
        match raw {
            "admin" => Role::Admin,
            "coordinator" => Role::Coordinator,
            "reviewer" => Role::Reviewer,
            _ => Role::Submitter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
            Role::Reviewer => "reviewer",
            Role::Submitter => "submitter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitEvent,
    UpdateEvent,
    TransitionEvent,
    DestroyEvent,
    ViewInternal,
    InvitePerson,
    AssignInvites,
    AdministrateConference,
    GrantTravelAssistance,
}

const SUBMITTER_ACTIONS: &[Action] = &[Action::SubmitEvent, Action::UpdateEvent];

const REVIEWER_ACTIONS: &[Action] = &[
    Action::SubmitEvent,
    Action::UpdateEvent,
    Action::ViewInternal,
];

const COORDINATOR_ACTIONS: &[Action] = &[
    Action::SubmitEvent,
    Action::UpdateEvent,
    Action::TransitionEvent,
    Action::DestroyEvent,
    Action::ViewInternal,
];

pub fn can(role: Role, action: Action) -> bool {
    match role {
        // Admins hold every capability.
        Role::Admin => true,
        Role::Coordinator => COORDINATOR_ACTIONS.contains(&action),
        Role::Reviewer => REVIEWER_ACTIONS.contains(&action),
        Role::Submitter => SUBMITTER_ACTIONS.contains(&action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_hold_every_capability() {
        for action in [
            Action::SubmitEvent,
            Action::UpdateEvent,
            Action::TransitionEvent,
            Action::DestroyEvent,
            Action::ViewInternal,
            Action::InvitePerson,
            Action::AssignInvites,
            Action::AdministrateConference,
            Action::GrantTravelAssistance,
        ] {
            assert!(can(Role::Admin, action));
        }
    }

    #[test]
    fn coordinators_run_the_review_pipeline_but_not_invites() {
        assert!(can(Role::Coordinator, Action::TransitionEvent));
        assert!(can(Role::Coordinator, Action::DestroyEvent));
        assert!(can(Role::Coordinator, Action::ViewInternal));
        assert!(!can(Role::Coordinator, Action::InvitePerson));
        assert!(!can(Role::Coordinator, Action::AssignInvites));
        assert!(!can(Role::Coordinator, Action::AdministrateConference));
    }

    #[test]
    fn submitters_only_submit_and_edit() {
        assert!(can(Role::Submitter, Action::SubmitEvent));
        assert!(can(Role::Submitter, Action::UpdateEvent));
        assert!(!can(Role::Submitter, Action::TransitionEvent));
        assert!(!can(Role::Submitter, Action::ViewInternal));
        assert!(!can(Role::Submitter, Action::DestroyEvent));
    }

    #[test]
    fn reviewers_see_internal_fields() {
        assert!(can(Role::Reviewer, Action::ViewInternal));
        assert!(!can(Role::Reviewer, Action::TransitionEvent));
    }

    #[test]
    fn unknown_role_strings_fall_back_to_submitter() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("coordinator"), Role::Coordinator);
        assert_eq!(Role::parse("reviewer"), Role::Reviewer);
        assert_eq!(Role::parse("submitter"), Role::Submitter);
        assert_eq!(Role::parse("superhero"), Role::Submitter);
    }
}
