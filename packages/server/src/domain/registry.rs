//! Session Registry
//!
//! Maps ephemeral connection identities to durable usernames.
//!
//! Invariants:
//! - at most one [`Session`] per username;
//! - a session's `connection_id` is the most recently registered connection;
//! - the reverse index holds exactly one entry per open, registered, current
//!   connection. Superseded connections lose their entry.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use super::{
    ConnectionId, RegistryError, RemovedUser, Session, SessionView, Timestamp, Username,
};

#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    sessions: HashMap<Username, Session>,
    connections: HashMap<ConnectionId, Username>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `username` on `connection_id` with must-be-new semantics.
    ///
    /// Fails with [`RegistryError::DuplicateUsername`] when the username is
    /// online on a different connection. An offline session is refreshed.
    pub fn register(
        &mut self,
        connection_id: &ConnectionId,
        username: &Username,
        now: Timestamp,
    ) -> Result<SessionView, RegistryError> {
        if let Some(session) = self.sessions.get(username)
            && session.is_online
            && session.connection_id.as_ref() != Some(connection_id)
        {
            return Err(RegistryError::DuplicateUsername(username.clone()));
        }

        Ok(self.install(connection_id, username, now))
    }

    /// Point `username`'s session at `new_connection_id` (new tab or reconnect).
    ///
    /// Creates the session when it does not exist yet. Never fails on an
    /// existing session; the previous connection simply stops being current.
    pub fn reassociate(
        &mut self,
        username: &Username,
        new_connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<SessionView, RegistryError> {
        if !self.sessions.contains_key(username) {
            return self.register(new_connection_id, username, now);
        }

        Ok(self.install(new_connection_id, username, now))
    }

    /// Mark the session owning `connection_id` offline.
    ///
    /// Returns [`RegistryError::NotActive`] when the connection is not the
    /// current connection of any session; presence is left untouched then.
    pub fn unregister(
        &mut self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<RemovedUser, RegistryError> {
        let Some(username) = self.connections.get(connection_id).cloned() else {
            return Err(RegistryError::NotActive(connection_id.clone()));
        };

        match self.sessions.get_mut(&username) {
            Some(session) if session.is_current(connection_id) => {
                session.is_online = false;
                session.last_seen_at = now;
                self.connections.remove(connection_id);
                Ok(RemovedUser {
                    username,
                    connection_id: connection_id.clone(),
                })
            }
            _ => {
                // orphaned index entry
                self.connections.remove(connection_id);
                Err(RegistryError::NotActive(connection_id.clone()))
            }
        }
    }

    /// Online usernames, de-duplicated and sorted
    pub fn list_online_usernames(&self) -> BTreeSet<Username> {
        self.sessions
            .values()
            .filter(|s| s.is_online)
            .map(|s| s.username.clone())
            .collect()
    }

    /// Current connection of an online user; `None` when offline or unknown
    pub fn resolve_connection_for(&self, username: &Username) -> Option<ConnectionId> {
        self.sessions
            .get(username)
            .filter(|s| s.is_online)
            .and_then(|s| s.connection_id.clone())
    }

    /// Username registered on a current connection
    pub fn username_for(&self, connection_id: &ConnectionId) -> Option<&Username> {
        self.connections.get(connection_id)
    }

    /// Registered at least once and not yet swept
    pub fn is_known(&self, username: &Username) -> bool {
        self.sessions.contains_key(username)
    }

    pub fn session(&self, username: &Username) -> Option<&Session> {
        self.sessions.get(username)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn online_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_online).count()
    }

    pub fn known_count(&self) -> usize {
        self.sessions.len()
    }

    /// Delete offline sessions whose `last_seen_at` is older than `max_idle`.
    ///
    /// Online sessions are kept regardless of age. Returns the removed names.
    pub fn sweep_idle_sessions(&mut self, now: Timestamp, max_idle: Duration) -> Vec<Username> {
        let max_idle_millis = i64::try_from(max_idle.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.value().saturating_sub(max_idle_millis);

        let mut removed: Vec<Username> = self
            .sessions
            .values()
            .filter(|s| !s.is_online && s.last_seen_at.value() < cutoff)
            .map(|s| s.username.clone())
            .collect();
        for username in &removed {
            self.sessions.remove(username);
        }
        removed.sort();
        removed
    }

    /// Replace all sessions with offline copies of `sessions`.
    ///
    /// Connections never survive a restore, so the reverse index is cleared.
    pub fn restore(&mut self, sessions: impl IntoIterator<Item = Session>) {
        self.connections.clear();
        self.sessions = sessions
            .into_iter()
            .map(|mut s| {
                s.is_online = false;
                s.connection_id = None;
                (s.username.clone(), s)
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.connections.clear();
    }

    /// Make `connection_id` the current connection of `username`.
    fn install(
        &mut self,
        connection_id: &ConnectionId,
        username: &Username,
        now: Timestamp,
    ) -> SessionView {
        self.detach_from_other_user(connection_id, username, now);

        let session = self
            .sessions
            .entry(username.clone())
            .or_insert_with(|| Session::new(username.clone(), connection_id.clone(), now));

        if let Some(old) = session.connection_id.replace(connection_id.clone())
            && old != *connection_id
            && self.connections.get(&old) == Some(username)
        {
            self.connections.remove(&old);
        }
        session.is_online = true;
        session.last_seen_at = now;

        self.connections
            .insert(connection_id.clone(), username.clone());
        session.view()
    }

    /// A connection speaks for one user. If it was current for someone else,
    /// that user goes offline.
    fn detach_from_other_user(
        &mut self,
        connection_id: &ConnectionId,
        username: &Username,
        now: Timestamp,
    ) {
        let Some(previous) = self.connections.get(connection_id).cloned() else {
            return;
        };
        if &previous == username {
            return;
        }
        self.connections.remove(connection_id);
        if let Some(session) = self.sessions.get_mut(&previous)
            && session.is_current(connection_id)
        {
            session.is_online = false;
            session.last_seen_at = now;
        }
    }
}
