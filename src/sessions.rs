use redis::{Client, RedisError, aio::ConnectionManager};
use std::time::Duration;
use uuid::Uuid;

/// Redis-backed store for opaque refresh tokens.
///
/// Each token maps to the admin user id it was issued for and expires on its
/// own. Rotation consumes the old token with `GETDEL`, so a token can be
/// exchanged at most once.
#[derive(Clone)]
pub struct RefreshStore {
    connection: ConnectionManager,
    ttl: Duration,
}

impl RefreshStore {
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new refresh token for `user_id`.
    pub async fn issue(&self, user_id: Uuid) -> redis::RedisResult<String> {
        let token = new_token();

        let _: () = redis::cmd("SET")
            .arg(keys::refresh_token(&token))
            .arg(user_id.to_string())
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut self.connection.clone())
            .await?;

        Ok(token)
    }

    /// Consume `token`, returning the user it belonged to. `None` when the
    /// token is unknown, expired or already used.
    pub async fn consume(&self, token: &str) -> redis::RedisResult<Option<Uuid>> {
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(keys::refresh_token(token))
            .query_async(&mut self.connection.clone())
            .await?;

        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    /// Revoke a token (logout). Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> redis::RedisResult<()> {
        redis::cmd("DEL")
            .arg(keys::refresh_token(token))
            .query_async(&mut self.connection.clone())
            .await
    }
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Redis key generators
pub mod keys {
    pub fn refresh_token(token: &str) -> String {
        format!("refresh:{}", token)
    }
}
