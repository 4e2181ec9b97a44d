//! Profit-share allocation.
//!
//! Splits an integer sale amount across an item's participants so the shares
//! add up to the sale exactly. Everyone gets `sale / n`; the indivisible
//! remainder is handed out one unit at a time, seller first, then to
//! non-sellers drawn at random without replacement.
//!
//! The random draw uses the caller's [`rand::Rng`], so a seeded generator
//! always produces the same split.

#![deny(unsafe_code)]

use lootsplit_types::{ParticipantShare, UserId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Reasons an allocation request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("cannot split a sale across zero participants")]
    NoParticipants,

    #[error("participant {0} listed more than once")]
    DuplicateParticipant(UserId),

    #[error("seller {0} is not a participant")]
    SellerNotParticipant(UserId),

    #[error("sale amount {0} is negative")]
    NegativeAmount(i64),
}

/// Result of splitting one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAllocation {
    pub sale_amount: i64,
    /// `sale_amount / n`.
    pub base_share: i64,
    /// `sale_amount % n`, before any bonus was handed out.
    pub remainder: i64,
    pub seller: UserId,
    /// Whether the seller took the first remainder unit.
    pub seller_bonus: bool,
    /// Non-sellers that drew one of the remaining units, in draw order.
    pub random_bonus: Vec<UserId>,
    /// One entry per participant, in participant order.
    pub shares: Vec<ParticipantShare>,
}

impl ShareAllocation {
    pub fn share_of(&self, user_id: &UserId) -> Option<i64> {
        self.shares
            .iter()
            .find(|share| &share.user_id == user_id)
            .map(|share| share.amount)
    }

    pub fn total(&self) -> i64 {
        self.shares.iter().map(|share| share.amount).sum()
    }

    pub fn has_remainder(&self) -> bool {
        self.remainder > 0
    }
}

/// Split `sale_amount` across `participants`.
///
/// `participants` must be non-empty, free of duplicates and contain `seller`.
pub fn allocate_shares<R>(
    sale_amount: i64,
    participants: &[UserId],
    seller: &UserId,
    rng: &mut R,
) -> Result<ShareAllocation, AllocationError>
where
    R: Rng + ?Sized,
{
    if participants.is_empty() {
        return Err(AllocationError::NoParticipants);
    }
    if sale_amount < 0 {
        return Err(AllocationError::NegativeAmount(sale_amount));
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for user_id in participants {
        if !seen.insert(user_id) {
            return Err(AllocationError::DuplicateParticipant(user_id.clone()));
        }
    }
    if !seen.contains(seller) {
        return Err(AllocationError::SellerNotParticipant(seller.clone()));
    }

    let count = participants.len() as i64;
    let base_share = sale_amount / count;
    let remainder = sale_amount % count;
    let mut left = remainder;

    let seller_bonus = left > 0;
    if seller_bonus {
        left -= 1;
    }

    // left < n - 1, so there are always enough non-sellers to draw from.
    let others = participants
        .iter()
        .filter(|user_id| *user_id != seller)
        .collect::<Vec<_>>();
    let random_bonus = others
        .choose_multiple(rng, left as usize)
        .map(|user_id| (*user_id).clone())
        .collect::<Vec<_>>();

    let shares = participants
        .iter()
        .map(|user_id| {
            let bonus = if user_id == seller {
                seller_bonus
            } else {
                random_bonus.contains(user_id)
            };
            ParticipantShare::new(user_id.clone(), base_share + i64::from(bonus))
        })
        .collect();

    Ok(ShareAllocation {
        sale_amount,
        base_share,
        remainder,
        seller: seller.clone(),
        seller_bonus,
        random_bonus,
        shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn users(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn seller_takes_single_remainder() {
        let participants = users(&["a", "b", "c"]);
        let split = allocate_shares(100, &participants, &UserId::new("a"), &mut seeded()).unwrap();

        assert_eq!(split.base_share, 33);
        assert_eq!(split.remainder, 1);
        assert!(split.seller_bonus);
        assert!(split.random_bonus.is_empty());
        assert_eq!(split.share_of(&UserId::new("a")), Some(34));
        assert_eq!(split.share_of(&UserId::new("b")), Some(33));
        assert_eq!(split.share_of(&UserId::new("c")), Some(33));
    }

    #[test]
    fn second_remainder_unit_goes_to_one_non_seller() {
        let participants = users(&["a", "b", "c"]);
        let split = allocate_shares(101, &participants, &UserId::new("a"), &mut seeded()).unwrap();

        assert_eq!(split.total(), 101);
        assert_eq!(split.share_of(&UserId::new("a")), Some(34));
        assert_eq!(split.random_bonus.len(), 1);
        let lucky = &split.random_bonus[0];
        assert_ne!(lucky, &UserId::new("a"));
        assert_eq!(split.share_of(lucky), Some(34));
        let others_at_base = split.shares.iter().filter(|s| s.amount == 33).count();
        assert_eq!(others_at_base, 1);
    }

    #[test]
    fn lone_seller_gets_everything() {
        let split = allocate_shares(7, &users(&["a"]), &UserId::new("a"), &mut seeded()).unwrap();
        assert_eq!(split.shares, vec![ParticipantShare::new(UserId::new("a"), 7)]);
        assert!(!split.seller_bonus);
    }

    #[test]
    fn zero_sale_gives_zero_shares() {
        let split =
            allocate_shares(0, &users(&["a", "b"]), &UserId::new("b"), &mut seeded()).unwrap();
        assert!(split.shares.iter().all(|share| share.amount == 0));
        assert!(!split.has_remainder());
    }

    #[test]
    fn same_seed_same_split() {
        let participants = users(&["a", "b", "c", "d", "e", "f", "g"]);
        let seller = UserId::new("d");
        let first = allocate_shares(1_000_005, &participants, &seller, &mut seeded()).unwrap();
        let second = allocate_shares(1_000_005, &participants, &seller, &mut seeded()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shares_follow_participant_order() {
        let participants = users(&["c", "a", "b"]);
        let split = allocate_shares(9, &participants, &UserId::new("a"), &mut seeded()).unwrap();
        let order = split.shares.iter().map(|s| s.user_id.clone()).collect::<Vec<_>>();
        assert_eq!(order, participants);
    }

    #[test]
    fn rejects_malformed_requests() {
        let mut rng = seeded();
        assert_eq!(
            allocate_shares(10, &[], &UserId::new("a"), &mut rng),
            Err(AllocationError::NoParticipants)
        );
        assert_eq!(
            allocate_shares(10, &users(&["a", "a"]), &UserId::new("a"), &mut rng),
            Err(AllocationError::DuplicateParticipant(UserId::new("a")))
        );
        assert_eq!(
            allocate_shares(10, &users(&["a", "b"]), &UserId::new("z"), &mut rng),
            Err(AllocationError::SellerNotParticipant(UserId::new("z")))
        );
        assert_eq!(
            allocate_shares(-1, &users(&["a"]), &UserId::new("a"), &mut rng),
            Err(AllocationError::NegativeAmount(-1))
        );
    }

    proptest! {
        #[test]
        fn property_split_is_exact_and_bounded(
            sale in 0i64..10_000_000,
            count in 1usize..40,
            seller_index in 0usize..40,
            seed in any::<u64>(),
        ) {
            let participants = (0..count).map(|i| UserId::new(format!("user-{i}"))).collect::<Vec<_>>();
            let seller = participants[seller_index % count].clone();
            let mut rng = StdRng::seed_from_u64(seed);
            let split = allocate_shares(sale, &participants, &seller, &mut rng).unwrap();

            let base = sale / count as i64;
            let remainder = sale % count as i64;
            prop_assert_eq!(split.total(), sale);
            prop_assert_eq!(split.shares.len(), count);
            prop_assert!(split.shares.iter().all(|s| s.amount == base || s.amount == base + 1));
            prop_assert!(split.share_of(&seller).unwrap() >= base);

            let bonus_count = split.shares.iter().filter(|s| s.amount == base + 1).count() as i64;
            prop_assert_eq!(bonus_count, remainder);
            prop_assert_eq!(split.seller_bonus, remainder > 0);
            prop_assert_eq!(split.random_bonus.len() as i64, (remainder - 1).max(0));
            prop_assert!(!split.random_bonus.contains(&seller));
        }
    }
}
