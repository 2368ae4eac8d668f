use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::Journal,
    error::{AppError, AppResult},
    models::{
        LikeRequest, MovieId, MovieResponse, Player, RoomChange, RoomRequest, Seed, Session,
    },
    services::selector::MovieSelector,
};

/// In-memory state of every room and player.
///
/// All methods are synchronous; callers serialize access (see [`RoomService`]).
/// Records touched by a mutation are remembered until [`take_changes`] drains
/// them for persistence.
///
/// [`take_changes`]: RoomRegistry::take_changes
#[derive(Debug, Default)]
pub struct RoomRegistry {
    sessions: HashMap<Uuid, Session>,
    /// First seed → session id
    rooms: HashMap<Seed, Uuid>,
    players: HashMap<String, Player>,
    dirty_sessions: BTreeSet<Uuid>,
    dirty_players: BTreeSet<String>,
}

fn check_player_id(player_session_id: &str) -> AppResult<()> {
    if player_session_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "playerSessionId must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted records.
    ///
    /// Session player lists are derived from each player's session reference.
    pub fn restore(sessions: Vec<Session>, players: Vec<Player>) -> AppResult<Self> {
        let mut registry = Self::new();

        for mut session in sessions {
            let first = session.first_seed().cloned().ok_or_else(|| {
                AppError::SequenceCorrupt(format!("session {} has no seeds", session.id))
            })?;
            if registry.rooms.insert(first.clone(), session.id).is_some() {
                return Err(AppError::SequenceCorrupt(format!(
                    "seed {} opens more than one session",
                    first
                )));
            }
            session.players.clear();
            registry.sessions.insert(session.id, session);
        }

        for mut player in players {
            match player.session_id.and_then(|id| registry.sessions.get_mut(&id)) {
                Some(session) if !session.is_full() => {
                    session.attach(&player.player_session_id);
                    player.seed_index = player.seed_index.min(session.seed_sequence.len() - 1);
                }
                _ => player.session_id = None,
            }
            registry
                .players
                .insert(player.player_session_id.clone(), player);
        }

        Ok(registry)
    }

    pub fn session_by_seed(&self, seed: &Seed) -> Option<&Session> {
        self.rooms.get(seed).and_then(|id| self.sessions.get(id))
    }

    pub fn player(&self, player_session_id: &str) -> Option<&Player> {
        self.players.get(player_session_id)
    }

    pub fn room_exists(&self, seed: &Seed) -> bool {
        self.rooms.contains_key(seed)
    }

    /// Opens a room on `seed` with its creator. Returns the seed to show.
    pub fn create_room(
        &mut self,
        seed: &Seed,
        player_session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Seed> {
        check_player_id(player_session_id)?;

        if self
            .players
            .get(player_session_id)
            .is_some_and(Player::is_attached)
        {
            return Err(AppError::PlayerAlreadyExists(player_session_id.to_string()));
        }
        if self.rooms.contains_key(seed) {
            return Err(AppError::SeedAlreadyInUse(seed.to_string()));
        }

        let mut session = Session::new(seed.clone(), now);
        session.attach(player_session_id);

        // A detached player keeps its likes; only the cursor restarts
        let player = match self.players.remove(player_session_id) {
            Some(mut existing) => {
                existing.session_id = Some(session.id);
                existing.seed_index = 0;
                existing.updated_at = now;
                existing
            }
            None => Player::new(player_session_id, session.id, now),
        };

        tracing::info!(
            seed = %seed,
            session_id = %session.id,
            player_session_id = %player_session_id,
            "Created room"
        );

        self.rooms.insert(seed.clone(), session.id);
        self.mark_session(session.id);
        self.sessions.insert(session.id, session);
        self.mark_player(player_session_id);
        self.players.insert(player_session_id.to_string(), player);

        Ok(seed.clone())
    }

    /// Adds a player to the room opened on `seed`. Returns the seed to show.
    ///
    /// A known player is moved here with its likes and cursor; a player already
    /// in this room is simply reconnected. The moved cursor is clamped to the
    /// last index of this room's sequence, which may be shorter than the old one.
    pub fn join_room(
        &mut self,
        seed: &Seed,
        player_session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Seed> {
        check_player_id(player_session_id)?;

        let session_id = *self
            .rooms
            .get(seed)
            .ok_or_else(|| AppError::RoomNotFound(seed.to_string()))?;
        let session = self
            .sessions
            .get(&session_id)
            .ok_or_else(|| AppError::RoomNotFound(seed.to_string()))?;

        if session.has_player(player_session_id) {
            tracing::info!(
                seed = %seed,
                player_session_id = %player_session_id,
                "Player reconnected to its room"
            );
            return Ok(seed.clone());
        }
        if session.is_full() {
            return Err(AppError::RoomFull(seed.to_string()));
        }
        let sequence_len = session.seed_sequence.len();

        let previous = match self.players.get_mut(player_session_id) {
            Some(player) => {
                let previous = player.session_id.replace(session_id);
                player.seed_index = player.seed_index.min(sequence_len.saturating_sub(1));
                player.updated_at = now;
                tracing::info!(
                    seed = %seed,
                    player_session_id = %player_session_id,
                    "Moved existing player into room"
                );
                previous
            }
            None => {
                self.players.insert(
                    player_session_id.to_string(),
                    Player::new(player_session_id, session_id, now),
                );
                tracing::info!(
                    seed = %seed,
                    player_session_id = %player_session_id,
                    "Added new player to room"
                );
                None
            }
        };

        if let Some(old) = previous.and_then(|id| self.sessions.get_mut(&id)) {
            old.detach(player_session_id);
            old.updated_at = now;
            let old_id = old.id;
            self.mark_session(old_id);
        }

        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.attach(player_session_id);
            session.updated_at = now;
        }
        self.mark_session(session_id);
        self.mark_player(player_session_id);

        Ok(seed.clone())
    }

    /// Advances the player's cursor and returns the seed it now points at,
    /// extending the room's sequence when the player is the first to get there.
    pub fn fetch_more(
        &mut self,
        seed: &Seed,
        player_session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Seed> {
        let session_id = self.attached_session(seed, player_session_id)?;
        let (Some(session), Some(player)) = (
            self.sessions.get_mut(&session_id),
            self.players.get_mut(player_session_id),
        ) else {
            return Err(not_in_session(seed, player_session_id));
        };

        let len = session.seed_sequence.len();
        let cursor = player.seed_index + 1;

        let next = if cursor < len {
            let reused = session.seed_sequence[cursor].clone();
            tracing::info!(
                seed = %seed,
                player_session_id = %player_session_id,
                cursor,
                next_seed = %reused,
                "Replaying seed already in sequence"
            );
            reused
        } else if cursor == len {
            let last = session.last_seed().ok_or_else(|| {
                AppError::SequenceCorrupt(format!("session {} has no seeds", session_id))
            })?;
            let minted = last.successor();
            session.seed_sequence.push(minted.clone());
            session.updated_at = now;
            tracing::info!(
                seed = %seed,
                player_session_id = %player_session_id,
                cursor,
                next_seed = %minted,
                "Extended seed sequence"
            );
            minted
        } else {
            return Err(AppError::SequenceCorrupt(format!(
                "cursor {} of player {} is past the end of a {}-seed sequence",
                player.seed_index, player_session_id, len
            )));
        };

        player.seed_index = cursor;
        player.updated_at = now;
        self.mark_session(session_id);
        self.mark_player(player_session_id);

        Ok(next)
    }

    /// Records a like and reports whether the other player in the room
    /// already liked the same movie.
    pub fn add_like(
        &mut self,
        seed: &Seed,
        player_session_id: &str,
        movie_id: MovieId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let session_id = self.attached_session(seed, player_session_id)?;

        let player = self
            .players
            .get_mut(player_session_id)
            .ok_or_else(|| not_in_session(seed, player_session_id))?;
        if !player.likes.insert(movie_id) {
            return Err(AppError::AlreadyLiked {
                movie_id,
                player_session_id: player_session_id.to_string(),
            });
        }
        player.updated_at = now;
        self.mark_player(player_session_id);

        let Some(session) = self.sessions.get_mut(&session_id) else {
            return Err(not_in_session(seed, player_session_id));
        };

        let other_liked = session
            .other_player(player_session_id)
            .and_then(|other| self.players.get(other))
            .is_some_and(|other| other.likes.contains(&movie_id));

        if other_liked {
            session.common_likes.insert(movie_id);
            session.updated_at = now;
            self.mark_session(session_id);
            tracing::info!(
                seed = %seed,
                player_session_id = %player_session_id,
                movie_id,
                "Common like found"
            );
        } else {
            tracing::debug!(
                seed = %seed,
                player_session_id = %player_session_id,
                movie_id,
                "Like recorded"
            );
        }

        Ok(other_liked)
    }

    pub fn can_rejoin(&self, player_session_id: &str) -> bool {
        self.players
            .get(player_session_id)
            .is_some_and(Player::is_attached)
    }

    /// Movies both players of the player's room liked
    pub fn common_likes(&self, player_session_id: &str) -> AppResult<Vec<MovieId>> {
        let session = self.session_of(player_session_id)?;
        Ok(session.common_likes.iter().copied().collect())
    }

    /// Detaches a player from its room; the player record is kept
    pub fn leave_room(&mut self, player_session_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        let session_id = self.session_of(player_session_id)?.id;

        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.detach(player_session_id);
            session.updated_at = now;
        }
        if let Some(player) = self.players.get_mut(player_session_id) {
            player.session_id = None;
            player.updated_at = now;
        }
        self.mark_session(session_id);
        self.mark_player(player_session_id);

        tracing::info!(player_session_id = %player_session_id, "Player left room");
        Ok(())
    }

    /// Snapshots of records changed since the last call, sessions first
    pub fn take_changes(&mut self) -> Vec<RoomChange> {
        let sessions = std::mem::take(&mut self.dirty_sessions)
            .into_iter()
            .filter_map(|id| self.sessions.get(&id).cloned())
            .map(RoomChange::Session);
        let players = std::mem::take(&mut self.dirty_players)
            .into_iter()
            .filter_map(|id| self.players.get(&id).cloned())
            .map(RoomChange::Player);
        sessions.chain(players).collect()
    }

    /// Session the player is attached to, provided it was opened on `seed`
    fn attached_session(&self, seed: &Seed, player_session_id: &str) -> AppResult<Uuid> {
        self.players
            .get(player_session_id)
            .and_then(|player| player.session_id)
            .and_then(|id| self.sessions.get(&id))
            .filter(|session| session.first_seed() == Some(seed))
            .map(|session| session.id)
            .ok_or_else(|| not_in_session(seed, player_session_id))
    }

    fn session_of(&self, player_session_id: &str) -> AppResult<&Session> {
        let player = self
            .players
            .get(player_session_id)
            .ok_or_else(|| AppError::PlayerNotFound(player_session_id.to_string()))?;
        player
            .session_id
            .and_then(|id| self.sessions.get(&id))
            .ok_or_else(|| AppError::PlayerDetached(player_session_id.to_string()))
    }

    fn mark_session(&mut self, id: Uuid) {
        self.dirty_sessions.insert(id);
    }

    fn mark_player(&mut self, player_session_id: &str) {
        self.dirty_players.insert(player_session_id.to_string());
    }
}

fn not_in_session(seed: &Seed, player_session_id: &str) -> AppError {
    AppError::SessionNotFound {
        seed: seed.to_string(),
        player_session_id: player_session_id.to_string(),
    }
}

/// Room operations behind one lock.
///
/// Each operation validates and mutates the registry under the write lock,
/// queues the changed records to the journal while still holding it, then
/// releases the lock before asking the selector for movies. Two players
/// exhausting the sequence at once therefore append exactly one seed.
pub struct RoomService {
    registry: RwLock<RoomRegistry>,
    selector: MovieSelector,
    journal: Option<Journal>,
}

impl RoomService {
    pub fn new(selector: MovieSelector, registry: RoomRegistry, journal: Option<Journal>) -> Self {
        Self {
            registry: RwLock::new(registry),
            selector,
            journal,
        }
    }

    pub fn selector(&self) -> &MovieSelector {
        &self.selector
    }

    pub async fn create_room(&self, request: &RoomRequest) -> AppResult<Vec<MovieResponse>> {
        let seed = Seed::parse(&request.seed)?;
        let batch_seed = self
            .mutate(|registry, now| registry.create_room(&seed, &request.player_session_id, now))
            .await?;
        self.selector.select(&batch_seed, &request.filters()).await
    }

    pub async fn join_room(&self, request: &RoomRequest) -> AppResult<Vec<MovieResponse>> {
        let seed = Seed::parse(&request.seed)?;
        let batch_seed = self
            .mutate(|registry, now| registry.join_room(&seed, &request.player_session_id, now))
            .await?;
        self.selector.select(&batch_seed, &request.filters()).await
    }

    pub async fn fetch_more(&self, request: &RoomRequest) -> AppResult<Vec<MovieResponse>> {
        let seed = Seed::parse(&request.seed)?;
        let batch_seed = self
            .mutate(|registry, now| registry.fetch_more(&seed, &request.player_session_id, now))
            .await?;
        self.selector.select(&batch_seed, &request.filters()).await
    }

    pub async fn add_like(&self, request: &LikeRequest) -> AppResult<bool> {
        let seed = Seed::parse(&request.seed)?;
        self.mutate(|registry, now| {
            registry.add_like(&seed, &request.player_session_id, request.movie_id, now)
        })
        .await
    }

    pub async fn leave_room(&self, player_session_id: &str) -> AppResult<()> {
        self.mutate(|registry, now| registry.leave_room(player_session_id, now))
            .await
    }

    pub async fn can_rejoin(&self, player_session_id: &str) -> bool {
        self.registry.read().await.can_rejoin(player_session_id)
    }

    pub async fn common_likes(&self, player_session_id: &str) -> AppResult<Vec<MovieId>> {
        self.registry.read().await.common_likes(player_session_id)
    }

    pub async fn room_exists(&self, seed: &str) -> AppResult<bool> {
        let seed = Seed::parse(seed)?;
        Ok(self.registry.read().await.room_exists(&seed))
    }

    /// Copy of the room opened on `seed`
    pub async fn session(&self, seed: &Seed) -> Option<Session> {
        self.registry.read().await.session_by_seed(seed).cloned()
    }

    pub async fn player(&self, player_session_id: &str) -> Option<Player> {
        self.registry.read().await.player(player_session_id).cloned()
    }

    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut RoomRegistry, DateTime<Utc>) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut registry = self.registry.write().await;
        let result = op(&mut *registry, Utc::now());

        let changes = registry.take_changes();
        if let Some(journal) = &self.journal {
            for change in changes {
                journal.record(change);
            }
        }

        result
    }
}
