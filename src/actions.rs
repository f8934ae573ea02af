use diesel::prelude::*;
use log::info;

use crate::errors::ServiceError;
use crate::invites::{normalize_email, remaining};
use crate::lifecycle::{self, EventState, Transition};
use crate::models::{
    self, AttendanceState, Attendee, Conference, Event, EventChanges, EventRole, Invite,
    InvitesAssignation, NewAttendanceStatus, NewAttendee, NewConference, NewEvent, NewEventPerson,
    NewInvite, NewInvitesAssignation, NewPerson, Person, TicketProfile, TravelAssistanceRow,
};
use crate::policy::{self, Action};

type Result<T> = std::result::Result<T, ServiceError>;

// ---------------------------------------------------------------------------
// Person/identity registry

pub fn get_person(conn: &mut PgConnection, id: i32) -> Result<Person> {
    use crate::schema::persons::dsl::persons;

    persons
        .find(id)
        .first::<Person>(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("person"))
}

pub fn get_person_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<Person>> {
    use crate::schema::persons;

    let person = persons::table
        .filter(persons::email.eq(normalize_email(email)))
        .first::<Person>(conn)
        .optional()?;

    Ok(person)
}

pub fn create_person(conn: &mut PgConnection, email: &str, role: &str) -> Result<Person> {
    use crate::schema::persons;

    let new_person = NewPerson {
        email: normalize_email(email),
        role: role.to_string(),
    };

    let id: i32 = diesel::insert_into(persons::table)
        .values(&new_person)
        .returning(persons::id)
        .get_result(conn)?;

    let person = persons::table.find(id).first::<Person>(conn)?;

    Ok(person)
}

pub fn get_conference_by_acronym(conn: &mut PgConnection, acronym: &str) -> Result<Conference> {
    use crate::schema::conferences;

    conferences::table
        .filter(conferences::acronym.eq(acronym))
        .first::<Conference>(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("conference"))
}

pub fn create_conference(conn: &mut PgConnection, new_conference: &NewConference) -> Result<Conference> {
    use crate::schema::conferences;

    let id: i32 = diesel::insert_into(conferences::table)
        .values(new_conference)
        .returning(conferences::id)
        .get_result(conn)?;

    let conference = conferences::table.find(id).first::<Conference>(conn)?;

    Ok(conference)
}

// ---------------------------------------------------------------------------
// Invitation ledger

pub fn remaining_invites(
    conn: &mut PgConnection,
    person_id: i32,
    conference_id: i32,
    base: i32,
) -> Result<i64> {
    use crate::schema::{invites, invites_assignations};

    let assignation: Option<i32> = invites_assignations::table
        .filter(invites_assignations::person_id.eq(person_id))
        .filter(invites_assignations::conference_id.eq(conference_id))
        .select(invites_assignations::number)
        .first(conn)
        .optional()?;

    let sent: i64 = invites::table
        .filter(invites::person_id.eq(person_id))
        .filter(invites::conference_id.eq(conference_id))
        .count()
        .get_result(conn)?;

    Ok(remaining(base, assignation, sent))
}

pub fn get_invite_for_email(
    conn: &mut PgConnection,
    email: &str,
    conference_id: i32,
) -> Result<Option<Invite>> {
    use crate::schema::invites;

    let invite = invites::table
        .filter(invites::conference_id.eq(conference_id))
        .filter(invites::email.eq(normalize_email(email)))
        .first::<Invite>(conn)
        .optional()?;

    Ok(invite)
}

/// Create an invite for `raw_email`, consuming one unit of the inviter's
/// quota. The inviter row is locked for the duration of the transaction so
/// two concurrent sends cannot both pass the quota check.
pub fn send_invite(
    conn: &mut PgConnection,
    inviter: &Person,
    conference: &Conference,
    raw_email: &str,
    sharing_allowed: bool,
    base: i32,
    enforce_quota: bool,
) -> Result<Invite> {
    let normalized = normalize_email(raw_email);
    let inviter_id = inviter.id;
    let conference_id = conference.id;

    conn.transaction(|conn| {
        use crate::schema::{invites, persons};

        let _locked: Person = persons::table.find(inviter_id).for_update().first(conn)?;

        let existing: Option<i32> = invites::table
            .filter(invites::conference_id.eq(conference_id))
            .filter(invites::email.eq(&normalized))
            .select(invites::id)
            .first(conn)
            .optional()?;

        if existing.is_some() {
            return Err(ServiceError::DuplicateInvite);
        }

        if enforce_quota && remaining_invites(conn, inviter_id, conference_id, base)? <= 0 {
            return Err(ServiceError::QuotaExceeded);
        }

        let new_invite = NewInvite {
            conference_id,
            person_id: Some(inviter_id),
            email: normalized.clone(),
            sharing_allowed,
        };

        let id: i32 = diesel::insert_into(invites::table)
            .values(&new_invite)
            .returning(invites::id)
            .get_result(conn)?;

        let invite = invites::table.find(id).first::<Invite>(conn)?;

        Ok(invite)
    })
}

/// Admin profile-page invite of an existing person. Re-inviting is allowed
/// and reuses the existing invite row; the attendance status is created as
/// `invited` but never regresses an already-`registered` person.
pub fn invite_person(
    conn: &mut PgConnection,
    admin: &Person,
    target: &Person,
    conference: &Conference,
) -> Result<(Invite, bool)> {
    let admin_id = admin.id;
    let target_id = target.id;
    let conference_id = conference.id;
    let email = normalize_email(&target.email);

    conn.transaction(|conn| {
        use crate::schema::{attendance_statuses, invites};

        let existing: Option<Invite> = invites::table
            .filter(invites::conference_id.eq(conference_id))
            .filter(invites::email.eq(&email))
            .first(conn)
            .optional()?;

        let (invite, resent) = match existing {
            Some(invite) => (invite, true),
            None => {
                let new_invite = NewInvite {
                    conference_id,
                    person_id: Some(admin_id),
                    email: email.clone(),
                    sharing_allowed: true,
                };

                let id: i32 = diesel::insert_into(invites::table)
                    .values(&new_invite)
                    .returning(invites::id)
                    .get_result(conn)?;

                (invites::table.find(id).first::<Invite>(conn)?, false)
            }
        };

        let status: Option<models::AttendanceStatus> = attendance_statuses::table
            .filter(attendance_statuses::person_id.eq(target_id))
            .filter(attendance_statuses::conference_id.eq(conference_id))
            .first(conn)
            .optional()?;

        // A registered person stays registered; only a missing row becomes
        // `invited`.
        if status.is_none() {
            diesel::insert_into(attendance_statuses::table)
                .values(&NewAttendanceStatus {
                    person_id: target_id,
                    conference_id,
                    status: AttendanceState::Invited,
                })
                .execute(conn)?;
        }

        Ok((invite, resent))
    })
}

/// Grant `delta` extra invites, on top of an existing assignation or the base
/// allowance. The assignation row is locked to serialize concurrent grants.
pub fn assign_invites(
    conn: &mut PgConnection,
    person_id: i32,
    conference_id: i32,
    delta: i32,
    base: i32,
) -> Result<InvitesAssignation> {
    conn.transaction(|conn| {
        use crate::schema::invites_assignations;

        let existing: Option<InvitesAssignation> = invites_assignations::table
            .filter(invites_assignations::person_id.eq(person_id))
            .filter(invites_assignations::conference_id.eq(conference_id))
            .for_update()
            .first(conn)
            .optional()?;

        let id = match existing {
            Some(row) => {
                diesel::update(invites_assignations::table.find(row.id))
                    .set(invites_assignations::number.eq(row.number + delta))
                    .execute(conn)?;
                row.id
            }
            None => diesel::insert_into(invites_assignations::table)
                .values(&NewInvitesAssignation {
                    person_id,
                    conference_id,
                    number: base + delta,
                })
                .returning(invites_assignations::id)
                .get_result(conn)?,
        };

        let assignation = invites_assignations::table
            .find(id)
            .first::<InvitesAssignation>(conn)?;

        Ok(assignation)
    })
}

/// Whether this person may send portal invites for this conference: admins
/// always can; everyone else needs the conference's invite feature enabled
/// and an invite of their own with onward sharing allowed.
pub fn can_send_invites(
    conn: &mut PgConnection,
    person: &Person,
    conference: &Conference,
) -> Result<bool> {
    use crate::schema::invites;

    if policy::can(person.role(), Action::InvitePerson) {
        return Ok(true);
    }

    if !conference.user_invites_enabled {
        return Ok(false);
    }

    let sharing: Option<bool> = invites::table
        .filter(invites::conference_id.eq(conference.id))
        .filter(invites::email.eq(normalize_email(&person.email)))
        .select(invites::sharing_allowed)
        .first(conn)
        .optional()?;

    Ok(sharing.unwrap_or(false))
}

// ---------------------------------------------------------------------------
// Event lifecycle

pub fn get_event(conn: &mut PgConnection, id: i32) -> Result<Event> {
    use crate::schema::events::dsl::events;

    events
        .find(id)
        .first::<Event>(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("event"))
}

pub fn create_event(
    conn: &mut PgConnection,
    conference: &Conference,
    submitter: &Person,
    req: &models::CreateEventRequest,
) -> Result<Event> {
    let start_time = match &req.start_time {
        Some(raw) => Some(
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map_err(|_| {
                ServiceError::Validation("start timestamp not in correct format".to_string())
            })?,
        ),
        None => None,
    };

    let new_event = NewEvent {
        conference_id: conference.id,
        title: req.title.clone(),
        subtitle: req.subtitle.clone(),
        event_type: req.event_type.clone(),
        state: EventState::New,
        abstract_text: req.abstract_text.clone(),
        description: req.description.clone(),
        submission_note: req.submission_note.clone(),
        recording_license: req
            .recording_license
            .clone()
            .or_else(|| conference.default_recording_license.clone()),
        start_time,
        track_id: req.track_id,
        room_id: req.room_id,
        public: req.public,
        travel_assistance: req.travel_assistance,
        travel_stipend_recipient: req.travel_stipend_recipient.clone(),
    };
    let submitter_id = submitter.id;

    conn.transaction(|conn| {
        use crate::schema::{event_people, events};

        let id: i32 = diesel::insert_into(events::table)
            .values(&new_event)
            .returning(events::id)
            .get_result(conn)?;

        diesel::insert_into(event_people::table)
            .values(&NewEventPerson {
                event_id: id,
                person_id: submitter_id,
                event_role: EventRole::Submitter,
            })
            .execute(conn)?;

        let event = events::table.find(id).first::<Event>(conn)?;

        Ok(event)
    })
}

pub fn list_events(
    conn: &mut PgConnection,
    conference_id: i32,
    state: Option<EventState>,
    event_type: Option<&str>,
) -> Result<Vec<Event>> {
    use crate::schema::events;

    let mut query = events::table
        .filter(events::conference_id.eq(conference_id))
        .into_boxed();

    if let Some(state) = state {
        query = query.filter(events::state.eq(state));
    }
    if let Some(event_type) = event_type {
        query = query.filter(events::event_type.eq(event_type.to_string()));
    }

    let found = query.order(events::id.asc()).load::<Event>(conn)?;

    Ok(found)
}

pub fn is_event_submitter(conn: &mut PgConnection, event_id: i32, person_id: i32) -> Result<bool> {
    use crate::schema::event_people;

    let found: Option<i32> = event_people::table
        .filter(event_people::event_id.eq(event_id))
        .filter(event_people::person_id.eq(person_id))
        .filter(event_people::event_role.eq(EventRole::Submitter))
        .select(event_people::id)
        .first(conn)
        .optional()?;

    Ok(found.is_some())
}

/// Apply field edits and reconcile the collaborator list in one transaction.
/// Returns the updated event, the people newly attached as collaborators
/// (each owed a notification) and the emails that resolved to nobody.
pub fn update_event(
    conn: &mut PgConnection,
    event_id: i32,
    changes: &EventChanges,
    other_presenters: Option<&str>,
) -> Result<(Event, Vec<Person>, Vec<String>)> {
    conn.transaction(|conn| {
        use crate::schema::events;

        let event: Event = events::table
            .find(event_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("event"))?;

        if !changes.is_noop() {
            diesel::update(events::table.find(event_id))
                .set(changes)
                .execute(conn)?;
        }

        let (added, invalid) = match other_presenters {
            Some(text) => reconcile_presenters(conn, &event, text)?,
            None => (Vec::new(), Vec::new()),
        };

        let updated = events::table.find(event_id).first::<Event>(conn)?;

        Ok((updated, added, invalid))
    })
}

impl EventChanges {
    pub fn is_noop(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.event_type.is_none()
            && self.abstract_text.is_none()
            && self.description.is_none()
            && self.note.is_none()
            && self.submission_note.is_none()
            && self.recording_license.is_none()
            && self.start_time.is_none()
            && self.track_id.is_none()
            && self.room_id.is_none()
            && self.public.is_none()
            && self.travel_assistance.is_none()
            && self.travel_stipend_recipient.is_none()
    }
}

/// Bring collaborator rows in line with the new presenter text. Must be
/// called inside the caller's transaction. Only collaborator rows are ever
/// created or removed here; submitter and speaker rows are untouchable.
fn reconcile_presenters(
    conn: &mut PgConnection,
    event: &Event,
    new_text: &str,
) -> Result<(Vec<Person>, Vec<String>)> {
    use crate::schema::{event_people, events};

    let parsed = crate::presenters::parse_list(new_text);
    let diff = crate::presenters::diff(event.other_presenters.as_deref(), new_text);

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    let mut added = Vec::new();

    for email in &parsed {
        match get_person_by_email(conn, email)? {
            Some(person) => {
                valid.push(email.clone());

                if !diff.added.contains(email) {
                    continue;
                }

                let exists: Option<i32> = event_people::table
                    .filter(event_people::event_id.eq(event.id))
                    .filter(event_people::person_id.eq(person.id))
                    .filter(event_people::event_role.eq(EventRole::Collaborator))
                    .select(event_people::id)
                    .first(conn)
                    .optional()?;

                if exists.is_none() {
                    diesel::insert_into(event_people::table)
                        .values(&NewEventPerson {
                            event_id: event.id,
                            person_id: person.id,
                            event_role: EventRole::Collaborator,
                        })
                        .execute(conn)?;
                    added.push(person);
                }
            }
            None => invalid.push(email.clone()),
        }
    }

    for email in &diff.removed {
        if let Some(person) = get_person_by_email(conn, email)? {
            info!("removing collaborator {} from event {}", person.email, event.id);
            diesel::delete(
                event_people::table
                    .filter(event_people::event_id.eq(event.id))
                    .filter(event_people::person_id.eq(person.id))
                    .filter(event_people::event_role.eq(EventRole::Collaborator)),
            )
            .execute(conn)?;
        }
    }

    // Only resolved emails are persisted; the rest go back to the caller.
    let stored = if valid.is_empty() {
        None
    } else {
        Some(valid.join(","))
    };
    diesel::update(events::table.find(event.id))
        .set(events::other_presenters.eq(stored))
        .execute(conn)?;

    Ok((added, invalid))
}

/// Move an event through the lifecycle table. The row is locked so the
/// check-then-write on the state column is serial; an unknown
/// (state, transition) pair fails without touching the row.
pub fn apply_transition(
    conn: &mut PgConnection,
    event_id: i32,
    transition: Transition,
    coordinator: &Person,
) -> Result<Event> {
    let coordinator_id = coordinator.id;

    conn.transaction(|conn| {
        use crate::schema::events;

        let event: Event = events::table
            .find(event_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("event"))?;

        let next = lifecycle::next_state(event.state, transition).ok_or_else(|| {
            ServiceError::InvalidTransition {
                state: event.state.as_str().to_string(),
                transition: transition.as_str().to_string(),
            }
        })?;

        if transition == Transition::Confirm {
            diesel::update(events::table.find(event_id))
                .set((
                    events::state.eq(next),
                    events::pad_url.eq(Some(lifecycle::pad_url(event_id))),
                ))
                .execute(conn)?;
        } else {
            diesel::update(events::table.find(event_id))
                .set(events::state.eq(next))
                .execute(conn)?;
        }

        info!(
            "event {} moved {} -> {} by coordinator {}",
            event_id,
            event.state.as_str(),
            next.as_str(),
            coordinator_id
        );

        let updated = events::table.find(event_id).first::<Event>(conn)?;

        Ok(updated)
    })
}

/// Everyone attached to an event, with their roles, for the people tab.
pub fn list_event_people(
    conn: &mut PgConnection,
    event_id: i32,
) -> Result<Vec<(models::EventPerson, Person)>> {
    use crate::schema::{event_people, persons};

    let rows = event_people::table
        .inner_join(persons::table)
        .filter(event_people::event_id.eq(event_id))
        .order(event_people::id.asc())
        .load::<(models::EventPerson, Person)>(conn)?;

    Ok(rows)
}

/// Emails of the event's submitter and speakers, for transition notifications.
pub fn presenter_emails(conn: &mut PgConnection, event_id: i32) -> Result<Vec<String>> {
    use crate::schema::{event_people, persons};

    let emails: Vec<String> = event_people::table
        .inner_join(persons::table)
        .filter(event_people::event_id.eq(event_id))
        .filter(event_people::event_role.eq_any(vec![EventRole::Submitter, EventRole::Speaker]))
        .select(persons::email)
        .load(conn)?;

    let mut unique = Vec::new();
    for email in emails {
        if !unique.contains(&email) {
            unique.push(email);
        }
    }

    Ok(unique)
}

/// Stamp default notification texts onto the presenter rows of an event in a
/// notifiable (review outcome) state.
pub fn set_default_notifications(conn: &mut PgConnection, event_id: i32) -> Result<usize> {
    conn.transaction(|conn| {
        use crate::schema::{event_people, events};

        let event: Event = events::table
            .find(event_id)
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("event"))?;

        let phase = lifecycle::notification_phase(event.state)
            .ok_or_else(|| ServiceError::Validation("Event not in a notifiable state".to_string()))?;

        let (subject, body) = match phase {
            "accept" => (
                format!("Your session '{}' has been accepted", event.title),
                format!(
                    "Good news: your session '{}' has been accepted. Please confirm your participation.",
                    event.title
                ),
            ),
            "reject" => (
                format!("Your session '{}' could not be accepted", event.title),
                format!(
                    "We are sorry: your session '{}' could not be accepted for this edition.",
                    event.title
                ),
            ),
            _ => (
                format!("Your session '{}' has been scheduled", event.title),
                format!(
                    "Your session '{}' is confirmed and has been scheduled.",
                    event.title
                ),
            ),
        };

        let count = diesel::update(
            event_people::table
                .filter(event_people::event_id.eq(event_id))
                .filter(event_people::event_role.eq_any(vec![EventRole::Submitter, EventRole::Speaker])),
        )
        .set((
            event_people::notification_subject.eq(Some(subject)),
            event_people::notification_body.eq(Some(body)),
        ))
        .execute(conn)?;

        Ok(count)
    })
}

// ---------------------------------------------------------------------------
// Travel assistance

pub fn grant_travel_assistance(conn: &mut PgConnection, event_id: i32) -> Result<Event> {
    conn.transaction(|conn| {
        use crate::schema::events;

        let event: Event = events::table
            .find(event_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("event"))?;

        if !event.travel_assistance {
            return Err(ServiceError::Validation(
                "Event has no travel assistance request".to_string(),
            ));
        }

        diesel::update(events::table.find(event_id))
            .set(events::travel_assistance_status.eq(Some("granted".to_string())))
            .execute(conn)?;

        let updated = events::table.find(event_id).first::<Event>(conn)?;

        Ok(updated)
    })
}

pub fn list_travel_assistance(
    conn: &mut PgConnection,
    conference_id: i32,
) -> Result<Vec<TravelAssistanceRow>> {
    use crate::schema::{event_people, events, persons};

    let rows: Vec<TravelAssistanceRow> = events::table
        .inner_join(event_people::table.inner_join(persons::table))
        .filter(events::conference_id.eq(conference_id))
        .filter(events::travel_assistance.eq(true))
        .filter(event_people::event_role.eq(EventRole::Submitter))
        .select((
            events::id,
            events::title,
            persons::email,
            events::travel_stipend_recipient,
        ))
        .order(events::id.asc())
        .load(conn)?;

    Ok(rows)
}

pub fn destroy_event(conn: &mut PgConnection, event_id: i32) -> Result<()> {
    conn.transaction(|conn| {
        use crate::schema::{event_people, events};

        diesel::delete(event_people::table.filter(event_people::event_id.eq(event_id)))
            .execute(conn)?;

        let deleted = diesel::delete(events::table.find(event_id)).execute(conn)?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("event"));
        }

        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Ticket registration

/// Redeem an invitation into an attendee record. Profile update, attendee row
/// and attendance status move together in one transaction; any precondition
/// failure leaves everything untouched.
pub fn register_ticket(
    conn: &mut PgConnection,
    person_id: i32,
    conference: &Conference,
    profile: &TicketProfile,
) -> Result<Attendee> {
    let conference_id = conference.id;

    conn.transaction(|conn| {
        use crate::schema::{attendance_statuses, attendees, invites, persons};

        let person: Person = persons::table
            .find(person_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(ServiceError::NotFound("person"))?;

        let invited: Option<i32> = invites::table
            .filter(invites::conference_id.eq(conference_id))
            .filter(invites::email.eq(normalize_email(&person.email)))
            .select(invites::id)
            .first(conn)
            .optional()?;

        if invited.is_none() {
            return Err(ServiceError::NoInvitation);
        }

        let existing: Option<i32> = attendees::table
            .filter(attendees::person_id.eq(person_id))
            .filter(attendees::conference_id.eq(conference_id))
            .select(attendees::id)
            .first(conn)
            .optional()?;

        if existing.is_some() {
            return Err(ServiceError::AlreadyRegistered);
        }

        let missing = profile.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::IncompleteProfile { missing });
        }

        diesel::update(persons::table.find(person_id))
            .set((
                persons::public_name.eq(profile.public_name.clone()),
                persons::gender_pronoun.eq(profile.gender_pronoun.clone()),
                persons::prior_attendance.eq(profile.prior_attendance.clone()),
                persons::goals.eq(profile.goals.clone()),
                persons::attendance_days.eq(profile.attendance_days.clone()),
                persons::volunteer_interest.eq(profile.volunteer_interest),
            ))
            .execute(conn)?;

        let id: i32 = diesel::insert_into(attendees::table)
            .values(&NewAttendee {
                person_id,
                conference_id,
                status: "invited".to_string(),
            })
            .returning(attendees::id)
            .get_result(conn)?;

        // Holding a ticket is what "registered" means for invite eligibility.
        let status: Option<models::AttendanceStatus> = attendance_statuses::table
            .filter(attendance_statuses::person_id.eq(person_id))
            .filter(attendance_statuses::conference_id.eq(conference_id))
            .first(conn)
            .optional()?;

        match status {
            Some(row) => {
                diesel::update(attendance_statuses::table.find(row.id))
                    .set(attendance_statuses::status.eq(AttendanceState::Registered))
                    .execute(conn)?;
            }
            None => {
                diesel::insert_into(attendance_statuses::table)
                    .values(&NewAttendanceStatus {
                        person_id,
                        conference_id,
                        status: AttendanceState::Registered,
                    })
                    .execute(conn)?;
            }
        }

        let attendee = attendees::table.find(id).first::<Attendee>(conn)?;

        Ok(attendee)
    })
}
