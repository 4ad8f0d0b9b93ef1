use super::Engine;

use std::sync::Arc;

use sqlx::{Executor, Row};
use uuid::Uuid;

use crate::{entities::Trip, error::Error, external::mailer::Mailer};

#[derive(Clone, Copy, Debug)]
pub enum TripEvent {
    Accepted,
    Completed,
    Cancelled,
}

impl TripEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Accepted => "Your trip has been accepted",
            Self::Completed => "Your trip is complete",
            Self::Cancelled => "Your trip has been cancelled",
        }
    }

    fn describe(&self, trip: &Trip) -> String {
        let leg = format!(
            "{} to {}",
            trip.pickup.address, trip.dropoff.address
        );

        match self {
            Self::Accepted => format!("A driver has accepted the trip from {}.", leg),
            Self::Completed => format!(
                "The trip from {} is complete. The agreed amount of {} will be settled.",
                leg, trip.bid
            ),
            Self::Cancelled => format!("The trip from {} has been cancelled.", leg),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// One notification per known party. Parties without a directory entry
/// are silently skipped; notification is best-effort by design.
pub fn trip_event_notifications(
    trip: &Trip,
    event: TripEvent,
    user_email: Option<String>,
    driver_email: Option<String>,
) -> Vec<Notification> {
    [user_email, driver_email]
        .into_iter()
        .flatten()
        .map(|recipient| Notification {
            recipient,
            subject: event.subject().to_string(),
            body: event.describe(trip),
        })
        .collect()
}

async fn deliver(mailer: Arc<dyn Mailer>, notification: Notification) {
    if let Err(err) = mailer
        .send(
            &notification.recipient,
            &notification.subject,
            &notification.body,
        )
        .await
    {
        tracing::error!(
            error = %err,
            recipient = %notification.recipient,
            "notification delivery failed"
        );
    }
}

/// Detaches delivery from the caller so mail-transport latency never sits
/// on a state transition's critical path.
fn spawn_deliveries(mailer: Arc<dyn Mailer>, notifications: Vec<Notification>) {
    for notification in notifications {
        tokio::spawn(deliver(Arc::clone(&mailer), notification));
    }
}

impl Engine {
    #[tracing::instrument(skip(self, trip))]
    pub(super) async fn notify_trip_event(&self, trip: &Trip, event: TripEvent) {
        let (user_email, driver_email) = match self.party_emails(trip).await {
            Ok(emails) => emails,
            Err(err) => {
                tracing::error!(error = %err, trip_id = %trip.id, "could not resolve notification recipients");
                return;
            }
        };

        spawn_deliveries(
            Arc::clone(&self.mailer),
            trip_event_notifications(trip, event, user_email, driver_email),
        );
    }

    async fn party_emails(&self, trip: &Trip) -> Result<(Option<String>, Option<String>), Error> {
        let mut conn = self.pool.acquire().await?;

        let user_email = email_for(&mut conn, trip.user_id).await?;

        let driver_email = match trip.driver_id {
            Some(driver_id) => email_for(&mut conn, driver_id).await?,
            None => None,
        };

        Ok((user_email, driver_email))
    }
}

async fn email_for(
    conn: &mut sqlx::pool::PoolConnection<super::Database>,
    id: Uuid,
) -> Result<Option<String>, Error> {
    let maybe_row = conn
        .fetch_optional(
            sqlx::query("SELECT data->>'email' AS email FROM directory WHERE id = $1").bind(&id),
        )
        .await?;

    match maybe_row {
        Some(row) => Ok(Some(row.try_get("email")?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ContactPoint, TripRequest, VehicleClass};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), Error> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), Error> {
            Err(Error::Delivery("relay unreachable".to_string()))
        }
    }

    fn trip() -> Trip {
        Trip::new(
            Uuid::new_v4(),
            TripRequest {
                pickup: ContactPoint {
                    address: "2 Quay Rd".into(),
                    phone: "+27215550131".into(),
                },
                dropoff: ContactPoint {
                    address: "88 Loop St".into(),
                    phone: "+27215550132".into(),
                },
                pickup_time: Utc::now(),
                cargo_description: "building sand".into(),
                vehicle_type: VehicleClass::EightTon,
                bid: dec!(420.00),
                floor_count: 0,
            },
        )
    }

    #[test]
    fn both_parties_are_notified_when_known() {
        let notifications = trip_event_notifications(
            &trip(),
            TripEvent::Completed,
            Some("user@example.com".into()),
            Some("driver@example.com".into()),
        );

        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].recipient, "user@example.com");
        assert_eq!(notifications[1].recipient, "driver@example.com");
        assert!(notifications[0].body.contains("2 Quay Rd"));
        assert!(notifications[0].body.contains("420.00"));
    }

    #[test]
    fn unknown_parties_are_skipped() {
        let notifications =
            trip_event_notifications(&trip(), TripEvent::Accepted, Some("user@example.com".into()), None);

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient, "user@example.com");
    }

    #[test]
    fn delivery_failures_are_swallowed() {
        let notification = Notification {
            recipient: "user@example.com".into(),
            subject: "Your trip is complete".into(),
            body: "done".into(),
        };

        // must not panic or propagate
        tokio_test::block_on(deliver(Arc::new(FailingMailer), notification));
    }

    #[test]
    fn deliveries_reach_the_mailer() {
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
        });

        let notification = Notification {
            recipient: "driver@example.com".into(),
            subject: "Your trip has been accepted".into(),
            body: "on the way".into(),
        };

        tokio_test::block_on(deliver(mailer.clone(), notification));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "driver@example.com");
    }
}
