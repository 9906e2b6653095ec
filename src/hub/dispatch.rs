//! Typed broadcast helpers.
//!
//! Thin wrappers that build a [`HubMessage`] with the right [`Scope`] so
//! callers such as REST handlers never construct scopes by hand.

use super::control::Hub;
use crate::domain::{EventType, HubMessage, Scope, UserId};

impl Hub {
    /// Sends an event to every connected client.
    pub async fn broadcast_to_all(
        &self,
        event_type: impl Into<EventType>,
        payload: serde_json::Value,
    ) {
        self.broadcast(HubMessage::new(event_type, payload), Scope::Broadcast)
            .await;
    }

    /// Sends an event to every connection owned by `user_id`.
    pub async fn broadcast_to_user(
        &self,
        user_id: UserId,
        event_type: impl Into<EventType>,
        payload: serde_json::Value,
    ) {
        self.broadcast(HubMessage::new(event_type, payload), Scope::ToUser(user_id))
            .await;
    }

    /// Sends an event to every connection holding `role`.
    pub async fn broadcast_to_role(
        &self,
        role: impl Into<String>,
        event_type: impl Into<EventType>,
        payload: serde_json::Value,
    ) {
        self.broadcast(
            HubMessage::new(event_type, payload),
            Scope::ToRole(role.into()),
        )
        .await;
    }
}
