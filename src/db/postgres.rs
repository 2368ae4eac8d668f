use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    db::journal::RoomSink,
    error::{AppError, AppResult},
    models::{Player, Seed, Session},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Sessions and players stored in the `sessions` and `players` tables
#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every stored session and player, for rebuilding the registry at startup
    pub async fn load_all(&self) -> AppResult<(Vec<Session>, Vec<Player>)> {
        let session_rows = sqlx::query(
            r#"
            SELECT id, seed_sequence, common_likes, created_at, updated_at
            FROM sessions
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(session_rows.len());
        for row in session_rows {
            let tokens: Vec<String> = row.try_get("seed_sequence")?;
            let seed_sequence = tokens
                .iter()
                .map(|token| Seed::parse(token))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::SequenceCorrupt(e.to_string()))?;
            let common_likes: Vec<i64> = row.try_get("common_likes")?;

            sessions.push(Session {
                id: row.try_get("id")?,
                seed_sequence,
                common_likes: common_likes.into_iter().collect(),
                players: Vec::new(),
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            });
        }

        let player_rows = sqlx::query(
            r#"
            SELECT player_session_id, session_id, seed_index, likes, created_at, updated_at
            FROM players
            ORDER BY updated_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut players = Vec::with_capacity(player_rows.len());
        for row in player_rows {
            let seed_index: i32 = row.try_get("seed_index")?;
            let likes: Vec<i64> = row.try_get("likes")?;

            players.push(Player {
                player_session_id: row.try_get("player_session_id")?,
                session_id: row.try_get("session_id")?,
                seed_index: usize::try_from(seed_index).map_err(|_| {
                    AppError::SequenceCorrupt(format!("negative seed index {}", seed_index))
                })?,
                likes: likes.into_iter().collect(),
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            });
        }

        tracing::info!(
            sessions = sessions.len(),
            players = players.len(),
            "Loaded rooms from database"
        );

        Ok((sessions, players))
    }
}

#[async_trait::async_trait]
impl RoomSink for RoomRepository {
    async fn upsert_session(&self, session: &Session) -> AppResult<()> {
        let seed_sequence: Vec<String> = session
            .seed_sequence
            .iter()
            .map(|seed| seed.to_string())
            .collect();
        let common_likes: Vec<i64> = session.common_likes.iter().copied().collect();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, seed_sequence, common_likes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET seed_sequence = EXCLUDED.seed_sequence,
                common_likes = EXCLUDED.common_likes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(session.id)
        .bind(&seed_sequence)
        .bind(&common_likes)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_player(&self, player: &Player) -> AppResult<()> {
        let seed_index = i32::try_from(player.seed_index)
            .map_err(|_| AppError::Internal(format!("seed index {} too large", player.seed_index)))?;
        let likes: Vec<i64> = player.likes.iter().copied().collect();

        sqlx::query(
            r#"
            INSERT INTO players (player_session_id, session_id, seed_index, likes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (player_session_id) DO UPDATE
            SET session_id = EXCLUDED.session_id,
                seed_index = EXCLUDED.seed_index,
                likes = EXCLUDED.likes,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&player.player_session_id)
        .bind(player.session_id)
        .bind(seed_index)
        .bind(&likes)
        .bind(player.created_at)
        .bind(player.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
