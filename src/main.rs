#[macro_use]
extern crate diesel;

use actix_web::{delete, error, get, middleware, post, put, web, App, HttpResponse, HttpServer, Responder};
use diesel::{prelude::*, r2d2};
use regex::Regex;

mod actions;
mod config;
mod errors;
mod invites;
mod lifecycle;
mod mailer;
mod models;
mod policy;
mod presenters;
mod schema;

use errors::ServiceError;

type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

#[derive(Debug, serde::Serialize)]
struct Res {
    message: String,
}

/// Map a business error onto the HTTP surface. Validation-class errors carry
/// their message to the user; database faults stay opaque.
fn to_http_error(e: ServiceError) -> actix_web::Error {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    let response = if let ServiceError::Database(DieselError::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        _,
    )) = &e
    {
        HttpResponse::Conflict().json(Res { message: "record already exists".to_string() })
    } else if !e.is_user_visible() {
        log::error!("internal error: {:?}", e);
        HttpResponse::InternalServerError().json(Res { message: "internal error".to_string() })
    } else {
        match &e {
            ServiceError::Forbidden(_) => HttpResponse::Forbidden().json(Res { message: e.to_string() }),
            ServiceError::NotFound(_) => HttpResponse::NotFound().json(Res { message: e.to_string() }),
            ServiceError::DuplicateInvite | ServiceError::AlreadyRegistered => {
                HttpResponse::Conflict().json(Res { message: e.to_string() })
            }
            _ => HttpResponse::BadRequest().json(Res { message: e.to_string() }),
        }
    };

    error::InternalError::from_response(e, response).into()
}

#[post("/conference")]
async fn add_conference(
    pool: web::Data<DbPool>,
    form: web::Json<models::CreateConferenceRequest>,
) -> actix_web::Result<impl Responder> {
    let re = Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap();

    if re.captures(&form.acronym).is_none() {
        return Ok(HttpResponse::BadRequest().json(Res {
            message: "acronym should be lowercase alphanumeric, dashes and underscores allowed".to_string(),
        }));
    }
    if form.title.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(Res { message: "title is required".to_string() }));
    }

    let conference = web::block(move || -> Result<models::Conference, ServiceError> {
        let mut conn = pool.get()?;

        let actor = actions::get_person(&mut conn, form.person_id)?;
        if !policy::can(actor.role(), policy::Action::AdministrateConference) {
            return Err(ServiceError::Forbidden("You are not allowed to create conferences"));
        }

        actions::create_conference(
            &mut conn,
            &models::NewConference {
                acronym: form.acronym.clone(),
                title: form.title.clone(),
                alt_title: form.alt_title.clone(),
                user_invites_enabled: form.user_invites_enabled,
                default_recording_license: form.default_recording_license.clone(),
            },
        )
    })
    .await?
    .map_err(|e| match &e {
        ServiceError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => error::InternalError::from_response(
            e.to_string(),
            HttpResponse::BadRequest().json(Res { message: "conference already exists".to_owned() }),
        )
        .into(),
        _ => to_http_error(e),
    })?;

    Ok(HttpResponse::Created().json(conference))
}

#[post("/person")]
async fn register_person(
    pool: web::Data<DbPool>,
    form: web::Json<models::RegisterPersonRequest>,
) -> actix_web::Result<impl Responder> {
    let re = Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap();

    let email = invites::normalize_email(&form.email);
    if re.captures(&email).is_none() {
        return Ok(HttpResponse::BadRequest().json(Res { message: "email is not a valid address".to_string() }));
    }

    let person = web::block(move || -> Result<models::Person, ServiceError> {
        let mut conn = pool.get()?;

        let role = policy::Role::parse(form.role.as_deref().unwrap_or("submitter"));
        actions::create_person(&mut conn, &form.email, role.as_str())
    })
    .await?
    .map_err(|e| match &e {
        ServiceError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => error::InternalError::from_response(
            e.to_string(),
            HttpResponse::BadRequest().json(Res { message: "Person already exists".to_owned() }),
        )
        .into(),
        _ => to_http_error(e),
    })?;

    Ok(HttpResponse::Created().json(person))
}

#[post("/{acronym}/invites")]
async fn send_invite(
    pool: web::Data<DbPool>,
    mailer_service: web::Data<mailer::MailerService>,
    app_config: web::Data<config::Config>,
    path: web::Path<String>,
    form: web::Json<models::SendInviteRequest>,
) -> actix_web::Result<impl Responder> {
    let acronym = path.into_inner();

    let re = Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap();
    let email = invites::normalize_email(&form.email);
    if re.captures(&email).is_none() {
        return Ok(HttpResponse::BadRequest().json(Res { message: "email is not a valid address".to_string() }));
    }

    let base = app_config.regular_invites_per_user;
    let invite = web::block({
        let pool = pool.clone();
        let form = form.clone();
        let acronym = acronym.clone();
        move || -> Result<models::Invite, ServiceError> {
            let mut conn = pool.get()?;

            let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
            let person = actions::get_person(&mut conn, form.person_id)?;

            if !actions::can_send_invites(&mut conn, &person, &conference)? {
                return Err(ServiceError::Forbidden(
                    "You are not allowed to send invites for this conference",
                ));
            }

            // Portal invites never grant onward invite privileges; admins are
            // exempt from the quota, everyone else consumes one unit.
            let enforce_quota = person.role() != policy::Role::Admin;
            actions::send_invite(&mut conn, &person, &conference, &form.email, false, base, enforce_quota)
        }
    })
    .await?
    .map_err(to_http_error)?;

    if let Err(e) = mailer_service.send_invite_mail(&invite, &acronym).await {
        log::error!("invite {} created but mail dispatch failed: {:?}", invite.id, e);
    }

    Ok(HttpResponse::Created().json(Res {
        message: format!("We have sent an invite to {}", invite.email),
    }))
}

#[get("/{acronym}/invites/remaining")]
async fn remaining_invites(
    pool: web::Data<DbPool>,
    app_config: web::Data<config::Config>,
    path: web::Path<String>,
    query: web::Query<models::ActorQuery>,
) -> actix_web::Result<impl Responder> {
    let acronym = path.into_inner();
    let base = app_config.regular_invites_per_user;

    let response = web::block(move || -> Result<models::RemainingInvitesResponse, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let person = actions::get_person(&mut conn, query.person_id)?;
        let remaining = actions::remaining_invites(&mut conn, person.id, conference.id, base)?;

        Ok(models::RemainingInvitesResponse {
            person_id: person.id,
            conference_acronym: conference.acronym,
            remaining,
        })
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(response))
}

#[post("/{acronym}/people/{id}/invite")]
async fn invite_person(
    pool: web::Data<DbPool>,
    mailer_service: web::Data<mailer::MailerService>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::ActorRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, target_id) = path.into_inner();

    let (invite, resent) = web::block({
        let acronym = acronym.clone();
        move || -> Result<(models::Invite, bool), ServiceError> {
            let mut conn = pool.get()?;

            let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
            let actor = actions::get_person(&mut conn, form.person_id)?;
            if !policy::can(actor.role(), policy::Action::InvitePerson) {
                return Err(ServiceError::Forbidden("You are not allowed to invite people"));
            }

            let target = actions::get_person(&mut conn, target_id)?;
            actions::invite_person(&mut conn, &actor, &target, &conference)
        }
    })
    .await?
    .map_err(to_http_error)?;

    // Re-invites resend the mail on purpose; see the feedback message below.
    if let Err(e) = mailer_service.send_invite_mail(&invite, &acronym).await {
        log::error!("invite {} created but mail dispatch failed: {:?}", invite.id, e);
    }

    let message = if resent {
        "This person was already invited but we've sent the invitation again.".to_string()
    } else {
        "Person was invited.".to_string()
    };

    Ok(HttpResponse::Ok().json(Res { message }))
}

#[post("/{acronym}/people/{id}/assign-invites")]
async fn assign_invites(
    pool: web::Data<DbPool>,
    app_config: web::Data<config::Config>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::AssignInvitesRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, target_id) = path.into_inner();
    let base = app_config.regular_invites_per_user;

    let assignation = web::block(move || -> Result<models::InvitesAssignation, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let actor = actions::get_person(&mut conn, form.person_id)?;
        if !policy::can(actor.role(), policy::Action::AssignInvites) {
            return Err(ServiceError::Forbidden("You are not allowed to assign invites"));
        }

        let target = actions::get_person(&mut conn, target_id)?;

        // Only people already holding an invite can be granted packages.
        if actions::get_invite_for_email(&mut conn, &target.email, conference.id)?.is_none() {
            return Err(ServiceError::Validation("Person has not been invited yet".to_string()));
        }

        actions::assign_invites(&mut conn, target.id, conference.id, form.delta, base)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(assignation))
}

#[post("/{acronym}/events")]
async fn add_event(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    form: web::Json<models::CreateEventRequest>,
) -> actix_web::Result<impl Responder> {
    let acronym = path.into_inner();

    if form.title.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(Res { message: "title is required".to_string() }));
    }
    if form.event_type.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(Res { message: "event type is required".to_string() }));
    }

    let event = web::block(move || -> Result<models::Event, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let submitter = actions::get_person(&mut conn, form.person_id)?;
        if !policy::can(submitter.role(), policy::Action::SubmitEvent) {
            return Err(ServiceError::Forbidden("You are not allowed to submit events"));
        }

        actions::create_event(&mut conn, &conference, &submitter, &form)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Created().json(event))
}

#[get("/{acronym}/events")]
async fn list_events(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    query: web::Query<models::ListEventsQuery>,
) -> actix_web::Result<impl Responder> {
    let acronym = path.into_inner();

    let events = web::block(move || -> Result<Vec<models::Event>, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let viewer = actions::get_person(&mut conn, query.person_id)?;

        let state = match query.state.as_deref() {
            Some(raw) => Some(parse_state(raw)?),
            None => None,
        };
        let events =
            actions::list_events(&mut conn, conference.id, state, query.event_type.as_deref())?;

        if policy::can(viewer.role(), policy::Action::ViewInternal) {
            Ok(events)
        } else {
            Ok(events.into_iter().map(models::Event::redacted).collect())
        }
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(events))
}

#[get("/{acronym}/events/{id}")]
async fn show_event(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    query: web::Query<models::ActorQuery>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let event = web::block(move || -> Result<models::Event, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let viewer = actions::get_person(&mut conn, query.person_id)?;

        let event = actions::get_event(&mut conn, event_id)?;
        if event.conference_id != conference.id {
            return Err(ServiceError::NotFound("event"));
        }

        if policy::can(viewer.role(), policy::Action::ViewInternal) {
            Ok(event)
        } else {
            Ok(event.redacted())
        }
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(event))
}

#[get("/{acronym}/events/{id}/people")]
async fn event_people(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    query: web::Query<models::ActorQuery>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let result = web::block(move || -> Result<Vec<serde_json::Value>, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let _viewer = actions::get_person(&mut conn, query.person_id)?;

        let event = actions::get_event(&mut conn, event_id)?;
        if event.conference_id != conference.id {
            return Err(ServiceError::NotFound("event"));
        }

        let rows = actions::list_event_people(&mut conn, event_id)?;

        let people: Vec<serde_json::Value> = rows
            .into_iter()
            .map(|(event_person, person)| {
                serde_json::json!({
                    "person_id": person.id,
                    "email": person.email,
                    "public_name": person.public_name,
                    "event_role": event_person.event_role,
                    "notification_subject": event_person.notification_subject,
                })
            })
            .collect();

        Ok(people)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(result))
}

#[put("/{acronym}/events/{id}")]
async fn update_event(
    pool: web::Data<DbPool>,
    mailer_service: web::Data<mailer::MailerService>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::UpdateEventRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let (event, added, invalid) = web::block({
        let acronym = acronym.clone();
        move || -> Result<(models::Event, Vec<models::Person>, Vec<String>), ServiceError> {
            let mut conn = pool.get()?;

            let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
            let actor = actions::get_person(&mut conn, form.person_id)?;
            if !policy::can(actor.role(), policy::Action::UpdateEvent) {
                return Err(ServiceError::Forbidden("You are not allowed to update events"));
            }

            let existing = actions::get_event(&mut conn, event_id)?;
            if existing.conference_id != conference.id {
                return Err(ServiceError::NotFound("event"));
            }

            // Non-privileged people may only edit their own submissions.
            let privileged = matches!(
                actor.role(),
                policy::Role::Admin | policy::Role::Coordinator
            );
            if !privileged && !actions::is_event_submitter(&mut conn, event_id, actor.id)? {
                return Err(ServiceError::Forbidden("You are not allowed to update this event"));
            }

            let start_time = match form.start_time.as_deref() {
                Some(raw) => Some(
                    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map_err(|_| {
                        ServiceError::Validation("start timestamp not in correct format".to_string())
                    })?,
                ),
                None => None,
            };

            let changes = models::EventChanges {
                title: form.title.clone(),
                subtitle: form.subtitle.clone(),
                event_type: form.event_type.clone(),
                abstract_text: form.abstract_text.clone(),
                description: form.description.clone(),
                note: form.note.clone(),
                submission_note: form.submission_note.clone(),
                recording_license: form.recording_license.clone(),
                start_time,
                track_id: form.track_id,
                room_id: form.room_id,
                public: form.public,
                travel_assistance: form.travel_assistance,
                travel_stipend_recipient: form.travel_stipend_recipient.clone(),
            };

            actions::update_event(&mut conn, event_id, &changes, form.other_presenters.as_deref())
        }
    })
    .await?
    .map_err(to_http_error)?;

    for person in &added {
        if let Err(e) = mailer_service
            .send_collaborator_added_mail(person, &event, &acronym)
            .await
        {
            log::error!(
                "collaborator {} added to event {} but mail dispatch failed: {:?}",
                person.email,
                event.id,
                e
            );
        }
    }

    let message = if invalid.is_empty() {
        "Event was successfully updated".to_string()
    } else {
        format!(
            "Event was updated, but these emails do not exist in our database: {}",
            invalid.join(", ")
        )
    };

    Ok(HttpResponse::Ok().json(models::UpdateEventResponse {
        message,
        event,
        invalid_presenters: invalid,
    }))
}

#[post("/{acronym}/events/{id}/transition")]
async fn update_event_state(
    pool: web::Data<DbPool>,
    mailer_service: web::Data<mailer::MailerService>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::TransitionRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let transition = match lifecycle::Transition::parse(&form.transition) {
        Some(transition) => transition,
        None => {
            return Ok(HttpResponse::BadRequest().json(Res {
                message: format!("Cannot update state: unknown transition '{}'", form.transition),
            }))
        }
    };
    let send_mail = form.send_mail;

    let (event, recipients) = web::block({
        let acronym = acronym.clone();
        move || -> Result<(models::Event, Vec<String>), ServiceError> {
            let mut conn = pool.get()?;

            let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
            let coordinator = actions::get_person(&mut conn, form.person_id)?;
            if !policy::can(coordinator.role(), policy::Action::TransitionEvent) {
                return Err(ServiceError::Forbidden("You are not allowed to update event states"));
            }

            let existing = actions::get_event(&mut conn, event_id)?;
            if existing.conference_id != conference.id {
                return Err(ServiceError::NotFound("event"));
            }

            let event = actions::apply_transition(&mut conn, event_id, transition, &coordinator)?;

            let recipients = if send_mail {
                actions::presenter_emails(&mut conn, event_id)?
            } else {
                Vec::new()
            };

            Ok((event, recipients))
        }
    })
    .await?
    .map_err(to_http_error)?;

    if send_mail && !recipients.is_empty() {
        if let Err(e) = mailer_service
            .send_event_transition_mail(&event, &acronym, transition, recipients)
            .await
        {
            log::error!(
                "event {} transitioned but mail dispatch failed: {:?}",
                event.id,
                e
            );
        }
    }

    Ok(HttpResponse::Ok().json(event))
}

#[post("/{acronym}/events/{id}/notifications/defaults")]
async fn set_default_notifications(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::ActorRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let count = web::block(move || -> Result<usize, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let actor = actions::get_person(&mut conn, form.person_id)?;
        if !policy::can(actor.role(), policy::Action::TransitionEvent) {
            return Err(ServiceError::Forbidden("You are not allowed to manage notifications"));
        }

        let event = actions::get_event(&mut conn, event_id)?;
        if event.conference_id != conference.id {
            return Err(ServiceError::NotFound("event"));
        }

        actions::set_default_notifications(&mut conn, event_id)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(Res {
        message: format!("Default notifications set for {} presenters", count),
    }))
}

#[post("/{acronym}/events/{id}/travel-assistance/grant")]
async fn grant_travel_assistance(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::ActorRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    let event = web::block(move || -> Result<models::Event, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let actor = actions::get_person(&mut conn, form.person_id)?;
        if !policy::can(actor.role(), policy::Action::GrantTravelAssistance) {
            return Err(ServiceError::Forbidden("You are not allowed to grant travel assistance"));
        }

        let event = actions::get_event(&mut conn, event_id)?;
        if event.conference_id != conference.id {
            return Err(ServiceError::NotFound("event"));
        }

        actions::grant_travel_assistance(&mut conn, event_id)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(event))
}

#[get("/{acronym}/travel-assistance")]
async fn list_travel_assistance(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    query: web::Query<models::ActorQuery>,
) -> actix_web::Result<impl Responder> {
    let acronym = path.into_inner();

    let rows = web::block(move || -> Result<Vec<models::TravelAssistanceRow>, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let actor = actions::get_person(&mut conn, query.person_id)?;
        if !policy::can(actor.role(), policy::Action::GrantTravelAssistance) {
            return Err(ServiceError::Forbidden("You are not allowed to view travel assistance requests"));
        }

        actions::list_travel_assistance(&mut conn, conference.id)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(rows))
}

#[delete("/{acronym}/events/{id}")]
async fn destroy_event(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    query: web::Query<models::ActorQuery>,
) -> actix_web::Result<impl Responder> {
    let (acronym, event_id) = path.into_inner();

    web::block(move || -> Result<(), ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        let actor = actions::get_person(&mut conn, query.person_id)?;
        if !policy::can(actor.role(), policy::Action::DestroyEvent) {
            return Err(ServiceError::Forbidden("You are not allowed to destroy events"));
        }

        let event = actions::get_event(&mut conn, event_id)?;
        if event.conference_id != conference.id {
            return Err(ServiceError::NotFound("event"));
        }

        actions::destroy_event(&mut conn, event_id)
    })
    .await?
    .map_err(to_http_error)?;

    Ok(HttpResponse::Ok().json(Res { message: "Event was successfully deleted".to_string() }))
}

#[post("/{acronym}/ticketing/{person_id}")]
async fn register_ticket(
    pool: web::Data<DbPool>,
    path: web::Path<(String, i32)>,
    form: web::Json<models::TicketingRequest>,
) -> actix_web::Result<impl Responder> {
    let (acronym, target_id) = path.into_inner();

    // The acting person must be registering themselves.
    if form.person_id != target_id {
        return Ok(HttpResponse::Forbidden().json(Res {
            message: "You cannot register to the conference without a valid invitation".to_string(),
        }));
    }

    let attendee = web::block(move || -> Result<models::Attendee, ServiceError> {
        let mut conn = pool.get()?;

        let conference = actions::get_conference_by_acronym(&mut conn, &acronym)?;
        actions::register_ticket(&mut conn, target_id, &conference, &form.profile)
    })
    .await?
    .map_err(to_http_error)?;

    log::info!(
        "person {} registered for conference {} (attendee {})",
        target_id,
        attendee.conference_id,
        attendee.id
    );

    Ok(HttpResponse::Created().json(Res {
        message: "You've been successfully registered".to_string(),
    }))
}

fn parse_state(raw: &str) -> Result<lifecycle::EventState, ServiceError> {
    match raw {
        "new" => Ok(lifecycle::EventState::New),
        "submitted" => Ok(lifecycle::EventState::Submitted),
        "accepting" => Ok(lifecycle::EventState::Accepting),
        "rejecting" => Ok(lifecycle::EventState::Rejecting),
        "confirmed" => Ok(lifecycle::EventState::Confirmed),
        "canceled" => Ok(lifecycle::EventState::Canceled),
        other => Err(ServiceError::Validation(format!("unknown event state '{}'", other))),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = config::Config::from_env();

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = initialize_db_pool(&app_config);

    let mut mailer_service = mailer::MailerService::new(&app_config);
    mailer_service.initialize().await.unwrap();
    let mailer_service = web::Data::new(mailer_service);

    let bind = (app_config.bind_addr.clone(), app_config.bind_port);
    let app_config = web::Data::new(app_config);

    log::info!("starting HTTP server at http://{}:{}", bind.0, bind.1);

    let http = HttpServer::new(move || {
        App::new()
            // add DB pool handle to app data; enables use of `web::Data<DbPool>` extractor
            .app_data(web::Data::new(pool.clone()))
            .app_data(mailer_service.clone())
            .app_data(app_config.clone())
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let detail = err.to_string();
                let response = match err {
                    error::JsonPayloadError::ContentType => {
                        HttpResponse::UnsupportedMediaType().body("Unsupported Media Type")
                    }
                    error::JsonPayloadError::Deserialize(ref err) => {
                        HttpResponse::BadRequest().json(Res { message: err.to_string() })
                    }

                    _ => HttpResponse::BadRequest().json(Res { message: detail }),
                };
                error::InternalError::from_response(err, response).into()
            }))
            .service(add_conference)
            .service(register_person)
            .service(send_invite)
            .service(remaining_invites)
            .service(invite_person)
            .service(assign_invites)
            .service(add_event)
            .service(list_events)
            .service(show_event)
            .service(event_people)
            .service(update_event)
            .service(update_event_state)
            .service(set_default_notifications)
            .service(grant_travel_assistance)
            .service(list_travel_assistance)
            .service(destroy_event)
            .service(register_ticket)
    })
    .bind(bind).unwrap()
    .run();

    http.await
}

fn initialize_db_pool(app_config: &config::Config) -> DbPool {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(&app_config.database_url);
    r2d2::Pool::builder()
        .build(manager)
        .expect("database URL should be a valid Postgres connection string")
}
