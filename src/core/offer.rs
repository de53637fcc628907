//! Offer business logic - expiry resolution, discount math and offer management.
//!
//! An offer's end is supplied either as a bare calendar date (plus an `HH:MM`
//! end time), as a full datetime, or as a relative duration. All three are
//! resolved once into a single expiry instant when the offer is written, and
//! activity is evaluated lazily against an injected [`Clock`] at read time.

use crate::{
    core::clock::Clock,
    entities::{Offer, Product, offer, product},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// End time applied to bare dates when none (or a malformed one) is given.
pub const DEFAULT_END_TIME: &str = "23:59";

/// The end of an offer as entered by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferEnd {
    /// A calendar date; the end time of day is supplied separately
    Date(NaiveDate),
    /// A date that already carries its time of day
    DateTime(NaiveDateTime),
}

impl FromStr for OfferEnd {
    type Err = Error;

    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]`
    /// and RFC 3339 timestamps (converted to local time).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Date(date));
        }
        for format in [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self::DateTime(datetime));
            }
        }
        if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::DateTime(datetime.with_timezone(&Local).naive_local()));
        }
        Err(Error::Config {
            message: format!("Unrecognised offer end date: {s}"),
        })
    }
}

/// Parses an `HH:MM` end time, falling back to 23:59 when absent or malformed.
#[must_use]
pub fn parse_end_time(end_time: Option<&str>) -> NaiveTime {
    let fallback = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
    match end_time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M").unwrap_or_else(|_| {
            tracing::debug!(end_time = raw, "malformed offer end time, using end of day");
            fallback
        }),
        None => fallback,
    }
}

/// Builds the absolute expiry instant of an offer.
///
/// A datetime governs on its own and `end_time` is ignored; a bare date gets
/// `end_time` applied to it in local time.
#[must_use]
pub fn resolve_expiry(end: OfferEnd, end_time: Option<&str>) -> NaiveDateTime {
    match end {
        OfferEnd::DateTime(datetime) => datetime,
        OfferEnd::Date(date) => date.and_time(parse_end_time(end_time)),
    }
}

/// Whether an offer ending at `end` is still running. The expiry instant itself
/// is already outside the offer.
#[must_use]
pub fn is_offer_active(end: OfferEnd, end_time: Option<&str>, clock: &dyn Clock) -> bool {
    clock.now() < resolve_expiry(end, end_time)
}

/// Whether a stored offer currently applies: switched on and not yet expired.
#[must_use]
pub fn offer_applies(offer: &offer::Model, clock: &dyn Clock) -> bool {
    offer.is_active && is_offer_active(OfferEnd::DateTime(offer.ends_at), None, clock)
}

/// Applies a whole-number percentage discount, rounding to the nearest rupee.
///
/// A zero discount leaves the price untouched.
#[must_use]
pub fn calculate_discounted_price(original: f64, discount_percentage: i32) -> f64 {
    if discount_percentage == 0 {
        return original;
    }
    let discount = original * f64::from(discount_percentage) / 100.0;
    (original - discount).round()
}

/// Rounds an admin-entered percentage and checks it lies in 1..=99.
pub fn round_discount(percentage: f64) -> Result<i32> {
    let rounded = percentage.round();
    if !rounded.is_finite() || !(1.0..=99.0).contains(&rounded) {
        return Err(Error::InvalidDiscount { percentage });
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(rounded as i32)
}

/// Relative offer lengths offered as admin shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferDuration {
    /// 24 hours from now
    #[serde(rename = "tomorrow")]
    Tomorrow,
    /// 48 hours from now
    #[serde(rename = "2days")]
    TwoDays,
    /// 168 hours from now
    #[serde(rename = "1week")]
    OneWeek,
}

impl OfferDuration {
    /// Length of the offer in hours
    #[must_use]
    pub const fn hours(self) -> i64 {
        match self {
            Self::Tomorrow => 24,
            Self::TwoDays => 48,
            Self::OneWeek => 168,
        }
    }
}

/// When an offer ends, in any of the forms an admin can enter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferWindow {
    /// Ends at an explicit date or datetime
    Until {
        /// End date, optionally with time of day
        end: OfferEnd,
        /// `HH:MM` applied to a bare date
        end_time: Option<String>,
    },
    /// Ends a fixed number of hours after creation
    Lasting(OfferDuration),
}

impl OfferWindow {
    /// Builds a window from loosely-typed request fields. A duration wins over
    /// an explicit end date.
    pub fn from_parts(
        end_date: Option<&str>,
        end_time: Option<&str>,
        duration: Option<OfferDuration>,
    ) -> Result<Self> {
        if let Some(duration) = duration {
            return Ok(Self::Lasting(duration));
        }
        let end_date = end_date.ok_or_else(|| Error::Config {
            message: "Offer needs an end date or a duration".to_string(),
        })?;
        Ok(Self::Until {
            end: end_date.parse()?,
            end_time: end_time.map(ToString::to_string),
        })
    }

    /// Resolves the window to its expiry instant and `HH:MM` label.
    #[must_use]
    pub fn resolve(&self, now: NaiveDateTime) -> (NaiveDateTime, String) {
        let ends_at = match self {
            Self::Until { end, end_time } => resolve_expiry(*end, end_time.as_deref()),
            Self::Lasting(duration) => now + Duration::hours(duration.hours()),
        };
        (ends_at, ends_at.format("%H:%M").to_string())
    }
}

/// Fields an admin supplies when creating or editing an offer
#[derive(Debug, Clone)]
pub struct OfferInput {
    /// Offer name
    pub name: String,
    /// Discount percentage, rounded before storage
    pub discount_percentage: f64,
    /// When the offer ends
    pub window: OfferWindow,
    /// On/off switch. `None` means on for a new offer and unchanged on edit.
    pub is_active: Option<bool>,
}

fn validated_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: "Offer name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Retrieves every offer, newest first, together with the products it applies to.
pub async fn list_offers(
    db: &DatabaseConnection,
) -> Result<Vec<(offer::Model, Vec<product::Model>)>> {
    Offer::find()
        .order_by_desc(offer::Column::CreatedAt)
        .find_with_related(Product)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific offer by its id.
pub async fn get_offer_by_id(
    db: &DatabaseConnection,
    offer_id: &str,
) -> Result<Option<offer::Model>> {
    Offer::find_by_id(offer_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an offer by its exact name.
pub async fn get_offer_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<offer::Model>> {
    Offer::find()
        .filter(offer::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new offer, switched on unless the input says otherwise.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The rounded discount is outside 1..=99
/// - The database insert fails
pub async fn create_offer(
    db: &DatabaseConnection,
    input: OfferInput,
    clock: &dyn Clock,
) -> Result<offer::Model> {
    let name = validated_name(&input.name)?;
    let discount = round_discount(input.discount_percentage)?;

    let now = clock.now();
    let (ends_at, end_time) = input.window.resolve(now);

    let offer = offer::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name),
        discount_percentage: Set(discount),
        ends_at: Set(ends_at),
        end_time: Set(end_time),
        is_active: Set(input.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(
        offer_id = %offer.id,
        name = %offer.name,
        discount = offer.discount_percentage,
        ends_at = %offer.ends_at,
        is_active = offer.is_active,
        "offer created"
    );
    Ok(offer)
}

/// Updates an offer in place. The on/off switch is only touched when the
/// input sets it.
///
/// # Errors
/// Returns an error if validation fails, the offer does not exist, or the
/// database update fails.
pub async fn update_offer(
    db: &DatabaseConnection,
    offer_id: &str,
    input: OfferInput,
    clock: &dyn Clock,
) -> Result<offer::Model> {
    let name = validated_name(&input.name)?;
    let discount = round_discount(input.discount_percentage)?;

    let mut offer: offer::ActiveModel = Offer::find_by_id(offer_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::OfferNotFound {
            id: offer_id.to_string(),
        })?
        .into();

    let now = clock.now();
    let (ends_at, end_time) = input.window.resolve(now);

    offer.name = Set(name);
    offer.discount_percentage = Set(discount);
    offer.ends_at = Set(ends_at);
    offer.end_time = Set(end_time);
    if let Some(is_active) = input.is_active {
        offer.is_active = Set(is_active);
    }
    offer.updated_at = Set(now);

    let offer = offer.update(db).await?;
    tracing::info!(offer_id = %offer.id, is_active = offer.is_active, "offer updated");
    Ok(offer)
}

/// Deletes an offer after detaching it from every product that references it.
/// Both steps run in one transaction. Returns the number of detached products.
pub async fn delete_offer(db: &DatabaseConnection, offer_id: &str) -> Result<u64> {
    let txn = db.begin().await?;

    let offer = Offer::find_by_id(offer_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::OfferNotFound {
            id: offer_id.to_string(),
        })?;

    let detached = Product::update_many()
        .col_expr(product::Column::OfferId, Expr::value(Option::<String>::None))
        .filter(product::Column::OfferId.eq(offer_id))
        .exec(&txn)
        .await?;

    offer.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        offer_id,
        detached = detached.rows_affected,
        "offer deleted"
    );
    Ok(detached.rows_affected)
}
