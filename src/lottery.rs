// Balance-weighted random account selection
//
// Picks one account with probability proportional to its balance. The draw
// is a 64-bit fixed-point fraction and the cumulative comparison runs in
// integer arithmetic, so very large balances do not lose precision the way
// a floating-point multiply would.

use rand::Rng;
use serde::Deserialize;

use crate::error::{AppResult, IndexerError, SelectionError};
use crate::ledger::models::PlatformAddress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: PlatformAddress,
    pub balance: u64,
}

/// A uniform draw from [0, 1), kept as the numerator of x / 2^64
#[derive(Debug, Clone, Copy)]
pub struct WeightedDraw(u64);

impl WeightedDraw {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random())
    }

    /// Lossy construction from a float fraction, for deterministic choices.
    pub fn from_fraction(fraction: f64) -> Self {
        debug_assert!((0.0..1.0).contains(&fraction));
        Self((fraction * 18_446_744_073_709_551_616.0) as u64)
    }
}

/// First account whose cumulative balance exceeds `draw * total`; the last
/// account absorbs the numerical tail.
pub fn pick_weighted<'a>(
    accounts: &'a [AccountBalance],
    draw: WeightedDraw,
) -> AppResult<&'a AccountBalance> {
    let last = accounts.last().ok_or(SelectionError::NoCandidates)?;
    let total: u128 = accounts.iter().map(|a| a.balance as u128).sum();
    if total == 0 {
        return Err(SelectionError::ZeroTotalBalance.into());
    }

    // draw/2^64 * total < cum  <=>  draw * total < cum * 2^64
    let scaled = (draw.0 as u128).saturating_mul(total);
    let mut cum: u128 = 0;
    for account in accounts {
        cum += account.balance as u128;
        if cum.saturating_mul(1u128 << 64) > scaled {
            return Ok(account);
        }
    }
    Ok(last)
}

/// Weighted choice over all accounts except the paying one.
pub fn choose_recipient(
    accounts: Vec<AccountBalance>,
    payer: &PlatformAddress,
    draw: WeightedDraw,
) -> AppResult<AccountBalance> {
    let candidates: Vec<AccountBalance> = accounts
        .into_iter()
        .filter(|account| account.address != *payer)
        .collect();
    pick_weighted(&candidates, draw).map(Clone::clone)
}

/// Fetches the (address, balance) listing the selection runs over.
pub async fn fetch_accounts(
    client: &reqwest::Client,
    url: &str,
) -> AppResult<Vec<AccountBalance>> {
    #[derive(Deserialize)]
    struct Item {
        address: String,
        balance: String,
    }

    let items: Vec<Item> = client
        .get(url)
        .send()
        .await
        .map_err(IndexerError::Transport)?
        .json()
        .await
        .map_err(IndexerError::Transport)?;

    items
        .into_iter()
        .map(|item| {
            let balance = item.balance.parse::<u64>().map_err(|_| {
                IndexerError::InvalidRecord(format!(
                    "bad balance {:?} for {}",
                    item.balance, item.address
                ))
            })?;
            Ok(AccountBalance {
                address: PlatformAddress::new(item.address),
                balance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn accounts() -> Vec<AccountBalance> {
        vec![
            AccountBalance {
                address: PlatformAddress::new("cccx"),
                balance: 10,
            },
            AccountBalance {
                address: PlatformAddress::new("cccy"),
                balance: 30,
            },
            AccountBalance {
                address: PlatformAddress::new("cccz"),
                balance: 60,
            },
        ]
    }

    #[test]
    fn draw_lands_proportionally_to_balance() {
        let accounts = accounts();

        // 39.999% of 100 falls inside the second bin (10 < 39.999 < 40)
        let picked = pick_weighted(&accounts, WeightedDraw::from_fraction(0.39999)).unwrap();
        assert_eq!(picked.address, PlatformAddress::new("cccy"));

        let picked = pick_weighted(&accounts, WeightedDraw::from_fraction(0.09)).unwrap();
        assert_eq!(picked.address, PlatformAddress::new("cccx"));

        let picked = pick_weighted(&accounts, WeightedDraw::from_fraction(0.999)).unwrap();
        assert_eq!(picked.address, PlatformAddress::new("cccz"));
    }

    #[test]
    fn payer_is_never_picked() {
        let payer = PlatformAddress::new("cccz");
        for fraction in [0.0, 0.25, 0.5, 0.75, 0.999] {
            let picked = choose_recipient(
                accounts(),
                &payer,
                WeightedDraw::from_fraction(fraction),
            )
            .unwrap();
            assert_ne!(picked.address, payer);
        }
    }

    #[test]
    fn zero_total_balance_is_rejected() {
        let accounts = vec![AccountBalance {
            address: PlatformAddress::new("cccx"),
            balance: 0,
        }];
        assert!(matches!(
            pick_weighted(&accounts, WeightedDraw::from_fraction(0.5)),
            Err(AppError::Selection(SelectionError::ZeroTotalBalance))
        ));
    }

    #[test]
    fn empty_candidate_pool_is_rejected() {
        assert!(matches!(
            pick_weighted(&[], WeightedDraw::from_fraction(0.5)),
            Err(AppError::Selection(SelectionError::NoCandidates))
        ));
    }
}
