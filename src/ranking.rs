use crate::errors::AppError;
use crate::schema::users::dsl as users_dsl;
use async_trait::async_trait;
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::debug;
use uuid::Uuid;

/// Leaderboard position lookup. The ordering definition belongs to the
/// platform, not to the profile view; absence of a rank is a valid answer.
#[async_trait]
pub trait RankingService: Send + Sync {
    async fn get_rank(&self, user_id: Uuid) -> Result<Option<i64>, AppError>;
}

/// Ranks users by `points` descending. Ties share the better ordinal:
/// rank = 1 + number of users with strictly more points.
pub struct PointsRanking {
    pool: Pool,
}

impl PointsRanking {
    pub fn new(pool: Pool) -> Self {
        PointsRanking { pool }
    }
}

#[async_trait]
impl RankingService for PointsRanking {
    async fn get_rank(&self, user_id: Uuid) -> Result<Option<i64>, AppError> {
        let conn = self.pool.get().await?;
        let rank = conn
            .interact(move |conn| {
                let points = users_dsl::users
                    .find(user_id)
                    .select(users_dsl::points)
                    .first::<i32>(conn)
                    .optional()?;

                let Some(points) = points else {
                    return Ok(None);
                };

                let ahead = users_dsl::users
                    .filter(users_dsl::points.gt(points))
                    .count()
                    .get_result::<i64>(conn)?;

                Ok::<_, diesel::result::Error>(Some(ahead + 1))
            })
            .await??;

        debug!("Resolved rank {:?} for user {}", rank, user_id);
        Ok(rank)
    }
}
