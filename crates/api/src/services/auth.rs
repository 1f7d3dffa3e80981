//! Player authentication service: registration, login, token refresh.

use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use domain::models::player::{Player, RegisterRequest, TokenPair};
use persistence::repositories::{PlayerRepository, ReferralRepository};
use shared::crypto::generate_referral_code;
use shared::jwt::{extract_player_id, JwtConfig};
use shared::password::{hash_password, verify_password};

use crate::error::ApiError;

/// Service handling the credential side of player accounts.
pub struct AuthService {
    players: PlayerRepository,
    referrals: ReferralRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            players: PlayerRepository::new(pool.clone()),
            referrals: ReferralRepository::new(pool),
            jwt,
        }
    }

    /// Registers a new player.
    ///
    /// When a referral code is supplied and resolves to another player,
    /// the referral is confirmed and the referrer's discount bumped; a
    /// bad code does not fail the registration.
    pub async fn register(&self, request: RegisterRequest) -> Result<(Player, TokenPair), ApiError> {
        let password_hash = hash_password(&request.password)?;
        let referral_code = generate_referral_code(&request.name);

        let player = self
            .players
            .create(&request.name, &password_hash, &referral_code)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    ApiError::Conflict("Player name is already taken".into())
                }
                other => other.into(),
            })?;

        if let Some(code) = request.referral_code.as_deref() {
            self.confirm_referral(code, player.id, &player.name).await;
        }

        let tokens = self.issue_tokens(player.id, &player.name, player.is_admin)?;
        info!(player_id = player.id, name = %player.name, "Player registered");

        Ok((player.into_model(), tokens))
    }

    /// Verifies credentials and issues a token pair.
    pub async fn login(&self, name: &str, password: &str) -> Result<(Player, TokenPair), ApiError> {
        let player = self
            .players
            .find_by_name(name)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid name or password".into()))?;

        if !verify_password(password, &player.password_hash)? {
            return Err(ApiError::Unauthorized("Invalid name or password".into()));
        }

        let tokens = self.issue_tokens(player.id, &player.name, player.is_admin)?;
        Ok((player.into_model(), tokens))
    }

    /// Exchanges a valid refresh token for a fresh token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let player_id = extract_player_id(&claims)?;

        // Re-read the account so a revoked admin flag or rename takes
        // effect at refresh time.
        let player = self
            .players
            .find_by_id(player_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))?;

        self.issue_tokens(player.id, &player.name, player.is_admin)
    }

    async fn confirm_referral(&self, code: &str, referred_id: i64, referred_name: &str) {
        match self.players.find_by_referral_code(code).await {
            Ok(Some(referrer)) if referrer.id != referred_id => {
                if let Err(e) = self
                    .referrals
                    .confirm_referral(referrer.id, referred_id, referred_name)
                    .await
                {
                    warn!(code, error = %e, "Failed to confirm referral");
                }
            }
            Ok(_) => {
                warn!(code, "Referral code did not resolve to another player");
            }
            Err(e) => {
                warn!(code, error = %e, "Referral lookup failed");
            }
        }
    }

    fn issue_tokens(&self, player_id: i64, name: &str, admin: bool) -> Result<TokenPair, ApiError> {
        let (access_token, _) = self.jwt.generate_access_token(player_id, name, admin)?;
        let (refresh_token, _) = self.jwt.generate_refresh_token(player_id, name, admin)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
