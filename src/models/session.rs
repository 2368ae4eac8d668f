use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{MovieId, Seed};

/// Players a room can hold
pub const MAX_PLAYERS: usize = 2;

/// A room shared by up to two players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Shared timeline of seeds; index 0 identifies the room. Append-only.
    pub seed_sequence: Vec<Seed>,
    /// Movies liked by both attached players
    pub common_likes: BTreeSet<MovieId>,
    /// Player session ids currently attached, at most [`MAX_PLAYERS`]
    pub players: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(first_seed: Seed, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed_sequence: vec![first_seed],
            common_likes: BTreeSet::new(),
            players: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn first_seed(&self) -> Option<&Seed> {
        self.seed_sequence.first()
    }

    pub fn last_seed(&self) -> Option<&Seed> {
        self.seed_sequence.last()
    }

    pub fn has_player(&self, player_session_id: &str) -> bool {
        self.players.iter().any(|p| p == player_session_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Adds a player id if not already attached
    pub fn attach(&mut self, player_session_id: &str) {
        if !self.has_player(player_session_id) {
            self.players.push(player_session_id.to_string());
        }
    }

    pub fn detach(&mut self, player_session_id: &str) {
        self.players.retain(|p| p != player_session_id);
    }

    /// The attached player that is not `player_session_id`
    pub fn other_player(&self, player_session_id: &str) -> Option<&str> {
        self.players
            .iter()
            .map(String::as_str)
            .find(|p| *p != player_session_id)
    }
}

/// One participant, identified by a client-generated session id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_session_id: String,
    /// Room the player is attached to, if any
    pub session_id: Option<Uuid>,
    /// Cursor into the room's seed sequence
    pub seed_index: usize,
    pub likes: BTreeSet<MovieId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn new(player_session_id: &str, session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            player_session_id: player_session_id.to_string(),
            session_id: Some(session_id),
            seed_index: 0,
            likes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.session_id.is_some()
    }
}

/// Snapshot of a record changed by a room operation, queued for persistence
#[derive(Debug, Clone, PartialEq)]
pub enum RoomChange {
    Session(Session),
    Player(Player),
}
