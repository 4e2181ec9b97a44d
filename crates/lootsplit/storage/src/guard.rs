//! Input checks shared by every adapter, run before anything is written.

use crate::{StorageError, StorageResult};
use lootsplit_types::{NewItem, ParticipantShare, UserId};
use std::collections::HashSet;

pub(crate) fn check_new_item(item: &NewItem) -> StorageResult<()> {
    if item.participants.is_empty() {
        return Err(StorageError::InvalidInput(
            "an item needs at least one participant".to_string(),
        ));
    }
    if !item.participants.contains(&item.seller) {
        return Err(StorageError::InvalidInput(format!(
            "seller {} is not a participant",
            item.seller
        )));
    }
    Ok(())
}

/// The mapping must name each participant exactly once and sum to the sale.
pub(crate) fn check_share_mapping(
    participants: &[UserId],
    sale_amount: i64,
    shares: &[ParticipantShare],
) -> StorageResult<()> {
    if sale_amount < 0 {
        return Err(StorageError::InvalidInput(format!(
            "sale amount {sale_amount} is negative"
        )));
    }

    let mut seen = HashSet::with_capacity(shares.len());
    let mut total: i64 = 0;
    for share in shares {
        if share.amount < 0 {
            return Err(StorageError::InvalidInput(format!(
                "share for {} is negative",
                share.user_id
            )));
        }
        if !seen.insert(&share.user_id) {
            return Err(StorageError::InvalidInput(format!(
                "share for {} listed twice",
                share.user_id
            )));
        }
        total = total.checked_add(share.amount).ok_or_else(|| {
            StorageError::InvalidInput("share total overflows".to_string())
        })?;
    }

    if shares.len() != participants.len() || participants.iter().any(|p| !seen.contains(p)) {
        return Err(StorageError::InvalidInput(
            "share mapping must cover every participant exactly once".to_string(),
        ));
    }
    if total != sale_amount {
        return Err(StorageError::InvalidInput(format!(
            "shares sum to {total}, sale amount is {sale_amount}"
        )));
    }
    Ok(())
}
