use anyhow::Result;

use rugby_types::models::SubscribeOutcome;

use crate::{Database, OptionalExt, now_timestamp};

impl Database {
    /// Subscribe `email`. An inactive row is reactivated in place rather than
    /// duplicated; an active one is left alone.
    pub fn subscribe(&self, email: &str) -> Result<SubscribeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<(i64, bool)> = tx
                .query_row(
                    "SELECT id, active FROM newsletter_subscriptions WHERE email = ?1",
                    [email],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let outcome = match existing {
                Some((_, true)) => SubscribeOutcome::AlreadyActive,
                Some((id, false)) => {
                    tx.execute(
                        "UPDATE newsletter_subscriptions SET active = 1, subscribed_at = ?1 WHERE id = ?2",
                        (now_timestamp(), id),
                    )?;
                    SubscribeOutcome::Reactivated
                }
                None => {
                    tx.execute(
                        "INSERT INTO newsletter_subscriptions (email, active, subscribed_at) VALUES (?1, 1, ?2)",
                        (email, now_timestamp()),
                    )?;
                    SubscribeOutcome::Created
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Mark an active subscription inactive. Returns false when no active
    /// row matches, which covers unknown emails and repeat unsubscribes.
    pub fn unsubscribe(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let matched = conn.execute(
                "UPDATE newsletter_subscriptions SET active = 0 WHERE email = ?1 AND active = 1",
                [email],
            )?;
            Ok(matched > 0)
        })
    }
}
