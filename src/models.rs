use serde::{Deserialize, Serialize};
use crate::lifecycle::EventState;
use crate::schema::{
    attendance_statuses, attendees, conferences, event_people, events, invites,
    invites_assignations, persons,
};
use chrono::NaiveDateTime;
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types::Text,
    Insertable, Selectable,
};

#[derive(Debug, Clone, Queryable, Serialize, Selectable)]
#[diesel(table_name = persons)]
pub struct Person {
    pub id: i32,
    pub email: String,
    pub role: String,
    pub public_name: Option<String>,
    pub gender_pronoun: Option<String>,
    pub prior_attendance: Option<String>,
    pub goals: Option<String>,
    pub attendance_days: Option<String>,
    pub volunteer_interest: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl Person {
    pub fn role(&self) -> crate::policy::Role {
        crate::policy::Role::parse(&self.role)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = persons)]
pub struct NewPerson {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = conferences)]
pub struct Conference {
    pub id: i32,
    pub acronym: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub user_invites_enabled: bool,
    pub default_recording_license: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conferences)]
pub struct NewConference {
    pub acronym: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub user_invites_enabled: bool,
    pub default_recording_license: Option<String>,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = events)]
pub struct Event {
    pub id: i32,
    pub conference_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub event_type: String,
    pub state: EventState,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub submission_note: Option<String>,
    pub other_presenters: Option<String>,
    pub recording_license: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub track_id: Option<i32>,
    pub room_id: Option<i32>,
    pub public: bool,
    pub pad_url: Option<String>,
    pub travel_assistance: bool,
    pub travel_stipend_recipient: Option<String>,
    pub travel_assistance_status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl Event {
    /// Strip fields reserved for the review team before handing the event to
    /// a viewer without the ViewInternal capability.
    pub fn redacted(mut self) -> Event {
        self.note = None;
        self.submission_note = None;
        self.travel_stipend_recipient = None;
        self.travel_assistance_status = None;
        self
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub conference_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub event_type: String,
    pub state: EventState,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub submission_note: Option<String>,
    pub recording_license: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub track_id: Option<i32>,
    pub room_id: Option<i32>,
    pub public: bool,
    pub travel_assistance: bool,
    pub travel_stipend_recipient: Option<String>,
}

/// Field edits applied by the event update endpoint. `None` leaves the
/// column alone; the presenter list is handled separately by reconciliation.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = events)]
pub struct EventChanges {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub event_type: Option<String>,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub submission_note: Option<String>,
    pub recording_license: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub track_id: Option<i32>,
    pub room_id: Option<i32>,
    pub public: Option<bool>,
    pub travel_assistance: Option<bool>,
    pub travel_stipend_recipient: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::EventRole)]
#[serde(rename_all = "snake_case")]
pub enum EventRole {
    Submitter,
    Speaker,
    Collaborator,
}

impl ToSql<crate::schema::sql_types::EventRole, Pg> for EventRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match *self {
            EventRole::Submitter => "submitter",
            EventRole::Speaker => "speaker",
            EventRole::Collaborator => "collaborator",
        };
        <str as ToSql<Text, Pg>>::to_sql(s, out)
    }
}

impl FromSql<crate::schema::sql_types::EventRole, Pg> for EventRole {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "submitter" => Ok(EventRole::Submitter),
            "speaker" => Ok(EventRole::Speaker),
            "collaborator" => Ok(EventRole::Collaborator),
            s => Err(format!("Unrecognized event role: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = event_people)]
pub struct EventPerson {
    pub id: i32,
    pub event_id: i32,
    pub person_id: i32,
    pub event_role: EventRole,
    pub notification_subject: Option<String>,
    pub notification_body: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = event_people)]
pub struct NewEventPerson {
    pub event_id: i32,
    pub person_id: i32,
    pub event_role: EventRole,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = invites)]
pub struct Invite {
    pub id: i32,
    pub conference_id: i32,
    pub person_id: Option<i32>,
    pub email: String,
    pub sharing_allowed: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invites)]
pub struct NewInvite {
    pub conference_id: i32,
    pub person_id: Option<i32>,
    pub email: String,
    pub sharing_allowed: bool,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = invites_assignations)]
pub struct InvitesAssignation {
    pub id: i32,
    pub person_id: i32,
    pub conference_id: i32,
    pub number: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invites_assignations)]
pub struct NewInvitesAssignation {
    pub person_id: i32,
    pub conference_id: i32,
    pub number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::AttendanceState)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    Invited,
    Registered,
}

impl ToSql<crate::schema::sql_types::AttendanceState, Pg> for AttendanceState {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match *self {
            AttendanceState::Invited => "invited",
            AttendanceState::Registered => "registered",
        };
        <str as ToSql<Text, Pg>>::to_sql(s, out)
    }
}

impl FromSql<crate::schema::sql_types::AttendanceState, Pg> for AttendanceState {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "invited" => Ok(AttendanceState::Invited),
            "registered" => Ok(AttendanceState::Registered),
            s => Err(format!("Unrecognized attendance status: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = attendance_statuses)]
pub struct AttendanceStatus {
    pub id: i32,
    pub person_id: i32,
    pub conference_id: i32,
    pub status: AttendanceState,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendance_statuses)]
pub struct NewAttendanceStatus {
    pub person_id: i32,
    pub conference_id: i32,
    pub status: AttendanceState,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = attendees)]
pub struct Attendee {
    pub id: i32,
    pub person_id: i32,
    pub conference_id: i32,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendees)]
pub struct NewAttendee {
    pub person_id: i32,
    pub conference_id: i32,
    pub status: String,
}

// Request/Response models for API

#[derive(Debug, Clone, Deserialize)]
pub struct CreateConferenceRequest {
    pub person_id: i32,
    pub acronym: String,
    pub title: String,
    pub alt_title: Option<String>,
    #[serde(default)]
    pub user_invites_enabled: bool,
    pub default_recording_license: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPersonRequest {
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendInviteRequest {
    pub person_id: i32,
    pub email: String,
}

/// Bare acting-person payload for admin-only endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRequest {
    pub person_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorQuery {
    pub person_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignInvitesRequest {
    pub person_id: i32,
    pub delta: i32,
}

#[derive(Debug, Serialize)]
pub struct RemainingInvitesResponse {
    pub person_id: i32,
    pub conference_acronym: String,
    pub remaining: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub person_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub event_type: String,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub submission_note: Option<String>,
    pub recording_license: Option<String>,
    pub start_time: Option<String>,
    pub track_id: Option<i32>,
    pub room_id: Option<i32>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub travel_assistance: bool,
    pub travel_stipend_recipient: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventRequest {
    pub person_id: i32,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub event_type: Option<String>,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub submission_note: Option<String>,
    pub recording_license: Option<String>,
    pub start_time: Option<String>,
    pub track_id: Option<i32>,
    pub room_id: Option<i32>,
    pub public: Option<bool>,
    pub travel_assistance: Option<bool>,
    pub travel_stipend_recipient: Option<String>,
    pub other_presenters: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateEventResponse {
    pub message: String,
    pub event: Event,
    /// Emails that did not resolve to a registered person; reported back for
    /// display, never persisted.
    pub invalid_presenters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub person_id: i32,
    pub transition: String,
    #[serde(default)]
    pub send_mail: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEventsQuery {
    pub person_id: i32,
    pub state: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize, Queryable)]
pub struct TravelAssistanceRow {
    pub event_id: i32,
    pub event_title: String,
    pub submitter_email: String,
    pub stipend_recipient: Option<String>,
}

/// Profile fields collected by the ticketing form. All of them except the
/// volunteer checkbox are required to issue a ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketProfile {
    pub public_name: Option<String>,
    pub gender_pronoun: Option<String>,
    pub prior_attendance: Option<String>,
    pub goals: Option<String>,
    pub attendance_days: Option<String>,
    #[serde(default)]
    pub volunteer_interest: bool,
}

impl TicketProfile {
    pub fn missing_fields(&self) -> Vec<String> {
        let required = [
            (&self.public_name, "public name"),
            (&self.gender_pronoun, "gender pronoun"),
            (&self.prior_attendance, "prior attendance"),
            (&self.goals, "goals"),
            (&self.attendance_days, "attendance days"),
        ];

        required
            .iter()
            .filter(|(value, _)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketingRequest {
    pub person_id: i32,
    #[serde(flatten)]
    pub profile: TicketProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> TicketProfile {
        TicketProfile {
            public_name: Some("Ada".to_string()),
            gender_pronoun: Some("she/her".to_string()),
            prior_attendance: Some("2024".to_string()),
            goals: Some("meet collaborators".to_string()),
            attendance_days: Some("all".to_string()),
            volunteer_interest: false,
        }
    }

    #[test]
    fn complete_profile_has_no_missing_fields() {
        assert!(full_profile().missing_fields().is_empty());
    }

    #[test]
    fn blank_and_absent_fields_are_both_reported() {
        let mut profile = full_profile();
        profile.public_name = None;
        profile.goals = Some("   ".to_string());
        assert_eq!(profile.missing_fields(), vec!["public name", "goals"]);
    }

    #[test]
    fn volunteer_interest_is_optional() {
        let mut profile = full_profile();
        profile.volunteer_interest = false;
        assert!(profile.missing_fields().is_empty());
    }

    #[test]
    fn redaction_strips_review_only_fields() {
        let event = Event {
            id: 1,
            conference_id: 1,
            title: "Talk".to_string(),
            subtitle: None,
            event_type: "talk".to_string(),
            state: EventState::Submitted,
            abstract_text: Some("abstract".to_string()),
            description: Some("description".to_string()),
            note: Some("internal note".to_string()),
            submission_note: Some("please schedule early".to_string()),
            other_presenters: None,
            recording_license: None,
            start_time: None,
            track_id: None,
            room_id: None,
            public: true,
            pad_url: None,
            travel_assistance: true,
            travel_stipend_recipient: Some("friend@example.org".to_string()),
            travel_assistance_status: Some("granted".to_string()),
            created_at: None,
        };

        let redacted = event.redacted();
        assert!(redacted.note.is_none());
        assert!(redacted.submission_note.is_none());
        assert!(redacted.travel_stipend_recipient.is_none());
        assert!(redacted.travel_assistance_status.is_none());
        // Public content survives.
        assert_eq!(redacted.title, "Talk");
        assert_eq!(redacted.abstract_text.as_deref(), Some("abstract"));
    }
}
