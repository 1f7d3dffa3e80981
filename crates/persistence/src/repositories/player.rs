//! Player repository.

use sqlx::PgPool;

use crate::entities::PlayerEntity;
use crate::metrics::QueryTimer;

const PLAYER_COLUMNS: &str = "id, name, password_hash, game_balance, donate_balance, \
                              referral_code, is_admin, created_at, updated_at";

/// Repository for player account operations.
#[derive(Clone)]
pub struct PlayerRepository {
    pool: PgPool,
}

impl PlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a player account. Fails with a unique violation if the name
    /// or referral code is taken.
    pub async fn create(
        &self,
        name: &str,
        password_hash: &str,
        referral_code: &str,
    ) -> Result<PlayerEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_player");

        let result = sqlx::query_as::<_, PlayerEntity>(&format!(
            r#"
            INSERT INTO players (name, password_hash, referral_code)
            VALUES ($1, $2, $3)
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(password_hash)
        .bind(referral_code)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_player_by_id");

        let result = sqlx::query_as::<_, PlayerEntity>(&format!(
            r#"SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Exact-case name lookup (text comparison in Postgres is case
    /// sensitive, which is what canonical in-game names require).
    pub async fn find_by_name(&self, name: &str) -> Result<Option<PlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_player_by_name");

        let result = sqlx::query_as::<_, PlayerEntity>(&format!(
            r#"SELECT {PLAYER_COLUMNS} FROM players WHERE name = $1"#
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn find_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<PlayerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_player_by_referral_code");

        let result = sqlx::query_as::<_, PlayerEntity>(&format!(
            r#"SELECT {PLAYER_COLUMNS} FROM players WHERE referral_code = $1"#
        ))
        .bind(referral_code)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }
}
