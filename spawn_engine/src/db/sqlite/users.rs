use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User, UserId},
    rating::SellerRating,
    traits::MarketplaceError,
};

const USER_COLUMNS: &str = "id, username, email, rating, rating_count, payout_recipient, created_at, updated_at";

pub async fn fetch_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, MarketplaceError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, MarketplaceError> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
            INSERT INTO users (username, email, payout_recipient) VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS};
        "#
    ))
    .bind(user.username)
    .bind(user.email)
    .bind(user.payout_recipient)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User {} ({}) created", user.id, user.username);
    Ok(user)
}

/// Writes the new aggregate rating for a seller, as long as nobody else has rated them since `previous` was read.
///
/// Returns `false` if the rating count has moved on, in which case nothing was written.
pub async fn compare_and_set_rating(
    seller: UserId,
    previous: SellerRating,
    next: SellerRating,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE users SET rating = $1, rating_count = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND rating_count = $4
        "#,
    )
    .bind(next.average)
    .bind(next.count)
    .bind(seller)
    .bind(previous.count)
    .execute(conn)
    .await?;
    let updated = result.rows_affected() == 1;
    trace!("🗃️ Rating update for seller {seller} from {previous} to {next}. Applied: {updated}");
    Ok(updated)
}
