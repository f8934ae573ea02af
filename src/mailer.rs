use amqprs::{
    callbacks::{DefaultChannelCallback, DefaultConnectionCallback},
    channel::{BasicPublishArguments, Channel, QueueDeclareArguments},
    connection::{Connection, OpenConnectionArguments},
    BasicProperties,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ServiceError;
use crate::lifecycle::Transition;
use crate::models::{Event, Invite, Person};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Outbound notification handed to the external mail worker. One message is
/// published per triggering action; delivery itself happens out of process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMail {
    Invite {
        to: String,
        conference: String,
        invite_id: i32,
    },
    EventTransition {
        to: Vec<String>,
        conference: String,
        event_id: i32,
        event_title: String,
        transition: String,
    },
    CollaboratorAdded {
        to: String,
        conference: String,
        event_id: i32,
        event_title: String,
    },
}

impl OutboundMail {
    pub fn invite(invite: &Invite, conference_acronym: &str) -> OutboundMail {
        OutboundMail::Invite {
            to: invite.email.clone(),
            conference: conference_acronym.to_string(),
            invite_id: invite.id,
        }
    }

    pub fn event_transition(
        event: &Event,
        conference_acronym: &str,
        transition: Transition,
        recipients: Vec<String>,
    ) -> OutboundMail {
        OutboundMail::EventTransition {
            to: recipients,
            conference: conference_acronym.to_string(),
            event_id: event.id,
            event_title: event.title.clone(),
            transition: transition.as_str().to_string(),
        }
    }

    pub fn collaborator_added(person: &Person, event: &Event, conference_acronym: &str) -> OutboundMail {
        OutboundMail::CollaboratorAdded {
            to: person.email.clone(),
            conference: conference_acronym.to_string(),
            event_id: event.id,
            event_title: event.title.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MailJob {
    message_id: Uuid,
    #[serde(flatten)]
    mail: OutboundMail,
}

pub struct MailerService {
    connection: Option<Arc<Connection>>,
    amqp_host: String,
    amqp_port: u16,
    amqp_user: String,
    amqp_password: String,
    outbound_queue: String,
}

impl MailerService {
    pub fn new(config: &Config) -> Self {
        Self {
            connection: None,
            amqp_host: config.amqp_host.clone(),
            amqp_port: config.amqp_port,
            amqp_user: config.amqp_user.clone(),
            amqp_password: config.amqp_password.clone(),
            outbound_queue: "mailer.outbound".to_string(),
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        info!("Connecting to RabbitMQ for outbound mail...");

        let connection = Connection::open(&OpenConnectionArguments::new(
            &self.amqp_host,
            self.amqp_port,
            &self.amqp_user,
            &self.amqp_password,
        ))
        .await?;

        connection
            .register_callback(DefaultConnectionCallback)
            .await?;

        let setup_channel = connection.open_channel(None).await?;
        setup_channel
            .register_callback(DefaultChannelCallback)
            .await?;

        setup_channel
            .queue_declare(
                QueueDeclareArguments::new(&self.outbound_queue)
                    .durable(true)
                    .finish(),
            )
            .await?;

        self.connection = Some(Arc::new(connection));

        let _ = setup_channel.close().await;

        info!("Connected to RabbitMQ and declared the outbound mail queue");

        Ok(())
    }

    async fn get_fresh_channel(&self) -> Result<Channel> {
        if let Some(connection) = &self.connection {
            let channel = connection.open_channel(None).await?;
            channel.register_callback(DefaultChannelCallback).await?;
            Ok(channel)
        } else {
            Err("RabbitMQ connection not initialized".into())
        }
    }

    async fn publish(&self, payload: Vec<u8>) -> Result<()> {
        let channel = self.get_fresh_channel().await?;

        channel
            .queue_declare(
                QueueDeclareArguments::new(&self.outbound_queue)
                    .durable(true)
                    .finish(),
            )
            .await?;

        let properties = BasicProperties::default()
            .with_delivery_mode(2) // persistent
            .finish();

        let args = BasicPublishArguments::new("", &self.outbound_queue);

        channel.basic_publish(properties, payload, args).await?;

        let _ = channel.close().await;

        Ok(())
    }

    /// Publish one mail job, retrying transient broker failures. A failure
    /// here never rolls back the data mutation that triggered the mail; the
    /// caller logs the returned error and carries on.
    pub async fn deliver(&self, mail: OutboundMail) -> std::result::Result<(), ServiceError> {
        let job = MailJob {
            message_id: Uuid::new_v4(),
            mail,
        };
        let payload =
            serde_json::to_vec(&job).map_err(|e| ServiceError::MailDelivery(e.to_string()))?;

        let max_retries = 2;
        let mut delay_ms = 25;
        let mut last_error = String::new();

        for attempt in 1..=max_retries {
            match self.publish(payload.clone()).await {
                Ok(()) => {
                    info!("Dispatched mail job {}", job.message_id);
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_retries {
                        warn!(
                            "Mail publish failed (attempt {}/{}), retrying: {:?}",
                            attempt, max_retries, e
                        );
                        tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                        delay_ms *= 2;
                    }
                }
            }
        }

        error!(
            "Failed to dispatch mail job {} after {} attempts: {}",
            job.message_id, max_retries, last_error
        );
        Err(ServiceError::MailDelivery(last_error))
    }

    pub async fn send_invite_mail(
        &self,
        invite: &Invite,
        conference_acronym: &str,
    ) -> std::result::Result<(), ServiceError> {
        self.deliver(OutboundMail::invite(invite, conference_acronym)).await
    }

    pub async fn send_event_transition_mail(
        &self,
        event: &Event,
        conference_acronym: &str,
        transition: Transition,
        recipients: Vec<String>,
    ) -> std::result::Result<(), ServiceError> {
        self.deliver(OutboundMail::event_transition(
            event,
            conference_acronym,
            transition,
            recipients,
        ))
        .await
    }

    pub async fn send_collaborator_added_mail(
        &self,
        person: &Person,
        event: &Event,
        conference_acronym: &str,
    ) -> std::result::Result<(), ServiceError> {
        self.deliver(OutboundMail::collaborator_added(person, event, conference_acronym))
            .await
    }
}

impl Clone for MailerService {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            amqp_host: self.amqp_host.clone(),
            amqp_port: self.amqp_port,
            amqp_user: self.amqp_user.clone(),
            amqp_password: self.amqp_password.clone(),
            outbound_queue: self.outbound_queue.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::EventState;

    fn person(id: i32, email: &str) -> Person {
        Person {
            id,
            email: email.to_string(),
            role: "submitter".to_string(),
            public_name: None,
            gender_pronoun: None,
            prior_attendance: None,
            goals: None,
            attendance_days: None,
            volunteer_interest: false,
            created_at: None,
        }
    }

    fn event(id: i32, title: &str) -> Event {
        Event {
            id,
            conference_id: 1,
            title: title.to_string(),
            subtitle: None,
            event_type: "talk".to_string(),
            state: EventState::Submitted,
            abstract_text: None,
            description: None,
            note: None,
            submission_note: None,
            other_presenters: None,
            recording_license: None,
            start_time: None,
            track_id: None,
            room_id: None,
            public: true,
            pad_url: None,
            travel_assistance: false,
            travel_stipend_recipient: None,
            travel_assistance_status: None,
            created_at: None,
        }
    }

    #[test]
    fn invite_mail_targets_the_invited_address() {
        let invite = Invite {
            id: 7,
            conference_id: 1,
            person_id: Some(2),
            email: "user@email.com".to_string(),
            sharing_allowed: false,
            created_at: None,
        };

        match OutboundMail::invite(&invite, "rustconf26") {
            OutboundMail::Invite { to, conference, invite_id } => {
                assert_eq!(to, "user@email.com");
                assert_eq!(conference, "rustconf26");
                assert_eq!(invite_id, 7);
            }
            other => panic!("unexpected mail: {:?}", other),
        }
    }

    #[test]
    fn one_collaborator_mail_per_added_person() {
        let added = vec![person(1, "a@x.org"), person(2, "b@x.org")];
        let talk = event(9, "Intro");
        let mails: Vec<OutboundMail> = added
            .iter()
            .map(|p| OutboundMail::collaborator_added(p, &talk, "rustconf26"))
            .collect();
        assert_eq!(mails.len(), 2);
        match &mails[0] {
            OutboundMail::CollaboratorAdded { to, event_id, .. } => {
                assert_eq!(to, "a@x.org");
                assert_eq!(*event_id, 9);
            }
            other => panic!("unexpected mail: {:?}", other),
        }
    }

    #[test]
    fn transition_mail_carries_the_transition_name() {
        let mail = OutboundMail::event_transition(
            &event(3, "Keynote"),
            "rustconf26",
            Transition::Accept,
            vec!["speaker@x.org".to_string()],
        );
        match mail {
            OutboundMail::EventTransition { transition, to, event_title, .. } => {
                assert_eq!(transition, "accept");
                assert_eq!(to, vec!["speaker@x.org"]);
                assert_eq!(event_title, "Keynote");
            }
            other => panic!("unexpected mail: {:?}", other),
        }
    }
}
