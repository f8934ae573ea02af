use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types::Text,
};

/// Review lifecycle of a submitted event. Stored as a postgres enum; the
/// only way to move between states is a transition listed in [`TRANSITIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::EventState)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    New,
    Submitted,
    Accepting,
    Rejecting,
    Confirmed,
    Canceled,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::New => "new",
            EventState::Submitted => "submitted",
            EventState::Accepting => "accepting",
            EventState::Rejecting => "rejecting",
            EventState::Confirmed => "confirmed",
            EventState::Canceled => "canceled",
        }
    }
}

impl ToSql<crate::schema::sql_types::EventState, Pg> for EventState {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::EventState, Pg> for EventState {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "new" => Ok(EventState::New),
            "submitted" => Ok(EventState::Submitted),
            "accepting" => Ok(EventState::Accepting),
            "rejecting" => Ok(EventState::Rejecting),
            "confirmed" => Ok(EventState::Confirmed),
            "canceled" => Ok(EventState::Canceled),
            s => Err(format!("Unrecognized event state: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Submit,
    Accept,
    Reject,
    Confirm,
    Cancel,
}

impl Transition {
    pub fn parse(raw: &str) -> Option<Transition> {
        match raw {
            "submit" => Some(Transition::Submit),
            "accept" => Some(Transition::Accept),
            "reject" => Some(Transition::Reject),
            "confirm" => Some(Transition::Confirm),
            "cancel" => Some(Transition::Cancel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::Accept => "accept",
            Transition::Reject => "reject",
            Transition::Confirm => "confirm",
            Transition::Cancel => "cancel",
        }
    }
}

/// The full transition table. Anything not listed here is an invalid
/// transition and leaves the event untouched.
pub const TRANSITIONS: &[(EventState, Transition, EventState)] = &[
    (EventState::New, Transition::Submit, EventState::Submitted),
    (EventState::Submitted, Transition::Accept, EventState::Accepting),
    (EventState::Submitted, Transition::Reject, EventState::Rejecting),
    (EventState::Accepting, Transition::Confirm, EventState::Confirmed),
    (EventState::New, Transition::Cancel, EventState::Canceled),
    (EventState::Submitted, Transition::Cancel, EventState::Canceled),
    (EventState::Accepting, Transition::Cancel, EventState::Canceled),
    (EventState::Rejecting, Transition::Cancel, EventState::Canceled),
    (EventState::Confirmed, Transition::Cancel, EventState::Canceled),
];

pub fn next_state(current: EventState, transition: Transition) -> Option<EventState> {
    TRANSITIONS
        .iter()
        .find(|(from, via, _)| *from == current && *via == transition)
        .map(|(_, _, to)| *to)
}

/// Collaboration pad stamped onto an event when it is confirmed.
pub fn pad_url(event_id: i32) -> String {
    format!("https://pad.cfp-portal.org/p/event-{}", event_id)
}

/// Notification phase used to pick default mail templates for an event's
/// presenters; only review outcomes are notifiable.
pub fn notification_phase(state: EventState) -> Option<&'static str> {
    match state {
        EventState::Accepting => Some("accept"),
        EventState::Rejecting => Some("reject"),
        EventState::Confirmed => Some("schedule"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_review_confirm_path() {
        let s = next_state(EventState::New, Transition::Submit).unwrap();
        assert_eq!(s, EventState::Submitted);
        assert_eq!(
            next_state(s, Transition::Accept),
            Some(EventState::Accepting)
        );
        assert_eq!(
            next_state(EventState::Accepting, Transition::Confirm),
            Some(EventState::Confirmed)
        );
    }

    #[test]
    fn confirm_is_only_reachable_from_accepting() {
        for state in [
            EventState::New,
            EventState::Submitted,
            EventState::Rejecting,
            EventState::Confirmed,
            EventState::Canceled,
        ] {
            assert_eq!(next_state(state, Transition::Confirm), None);
        }
    }

    #[test]
    fn cancel_reaches_canceled_from_every_live_state() {
        for state in [
            EventState::New,
            EventState::Submitted,
            EventState::Accepting,
            EventState::Rejecting,
            EventState::Confirmed,
        ] {
            assert_eq!(next_state(state, Transition::Cancel), Some(EventState::Canceled));
        }
        assert_eq!(next_state(EventState::Canceled, Transition::Cancel), None);
    }

    #[test]
    fn canceled_is_terminal() {
        for transition in [
            Transition::Submit,
            Transition::Accept,
            Transition::Reject,
            Transition::Confirm,
            Transition::Cancel,
        ] {
            assert_eq!(next_state(EventState::Canceled, transition), None);
        }
    }

    #[test]
    fn pad_url_is_derived_from_the_event_id() {
        let url = pad_url(42);
        assert!(!url.is_empty());
        assert!(url.contains("42"));
        assert_ne!(url, pad_url(43));
    }

    #[test]
    fn transition_names_round_trip() {
        for raw in ["submit", "accept", "reject", "confirm", "cancel"] {
            assert_eq!(Transition::parse(raw).unwrap().as_str(), raw);
        }
        assert_eq!(Transition::parse("promote"), None);
    }

    #[test]
    fn only_review_outcomes_are_notifiable() {
        assert_eq!(notification_phase(EventState::Accepting), Some("accept"));
        assert_eq!(notification_phase(EventState::Rejecting), Some("reject"));
        assert_eq!(notification_phase(EventState::Confirmed), Some("schedule"));
        assert_eq!(notification_phase(EventState::New), None);
        assert_eq!(notification_phase(EventState::Submitted), None);
        assert_eq!(notification_phase(EventState::Canceled), None);
    }
}
