//! Liquidity share accounting: joins and exits
//!
//! A single-asset deposit mints shares through the same invariant solver the
//! swap path uses: share supply is linear in the invariant value under weight
//! normalization, so solving with the share side's weight fixed at one yields
//! the issuance directly. Proportional exits redeem shares pro rata across
//! every asset, with the exit fee's share forfeit burned in favor of the
//! remaining holders.

use rust_decimal::Decimal;

use crate::decimal_math::truncate_amount;
use crate::error::AmmError;
use crate::pool::{Coin, Pool};
use crate::weighted_math::solve_constant_function_invariant;

/// Untruncated share issuance for a lone deposited asset
///
/// The fee applies only to the portion of the deposit that is conceptually
/// swapped into the other assets; the slice matching the asset's own
/// normalized weight enters fee-free:
/// `effective_fee = swap_fee * (1 - normalized_weight_in)`.
///
/// The solver's delta is negative here (share supply grows), so the result
/// is negated into a positive issuance.
pub fn calc_shares_given_single_in(
    balance_in: Decimal,
    normalized_weight_in: Decimal,
    total_shares: Decimal,
    amount_in: Decimal,
    swap_fee: Decimal,
) -> Result<Decimal, AmmError> {
    let effective_fee = swap_fee * (Decimal::ONE - normalized_weight_in);
    let amount_in_after_fee = amount_in * (Decimal::ONE - effective_fee);

    Ok(-solve_constant_function_invariant(
        balance_in + amount_in_after_fee,
        balance_in,
        normalized_weight_in,
        total_shares,
        Decimal::ONE,
    )?)
}

impl Pool {
    fn single_asset_join(&mut self, token_in: &Coin, swap_fee: Decimal) -> Result<Decimal, AmmError> {
        if token_in.amount <= Decimal::ZERO {
            return Err(AmmError::NonPositive {
                what: "join deposit amount",
                value: token_in.amount,
            });
        }
        let normalized_weight = self.normalized_weight(&token_in.denom)?;
        let balance_in = self.asset(&token_in.denom)?.balance;

        let shares_out = truncate_amount(calc_shares_given_single_in(
            balance_in,
            normalized_weight,
            self.total_shares,
            token_in.amount,
            swap_fee,
        )?);
        if shares_out <= Decimal::ZERO {
            return Err(AmmError::InvalidMathApprox);
        }

        self.asset_mut(&token_in.denom)?.balance += token_in.amount;
        self.total_shares += shares_out;
        Ok(shares_out)
    }

    /// Deposit liquidity and mint shares
    ///
    /// Exactly one supplied asset takes the single-asset path. Supplying all
    /// pool assets is the reserved proportional join, which is deliberately
    /// not implemented; any other shape is rejected outright.
    pub fn join_pool(&mut self, tokens_in: &[Coin], swap_fee: Decimal) -> Result<Decimal, AmmError> {
        match tokens_in.len() {
            1 => self.single_asset_join(&tokens_in[0], swap_fee),
            n if n == self.assets.len() => Err(AmmError::NotImplemented),
            n => Err(AmmError::UnsupportedJoinShape {
                supplied: n,
                pool_assets: self.assets.len(),
            }),
        }
    }

    /// Burn `exiting_shares` and withdraw pro rata across every asset
    ///
    /// The exit fee reduces the refunded share of the reserves but the full
    /// exiting amount is burned, so the forfeited value accrues to the
    /// remaining share-holders. Assets whose computed payout truncates to
    /// zero are skipped.
    pub fn exit_pool(
        &mut self,
        exiting_shares: Decimal,
        exit_fee: Decimal,
    ) -> Result<Vec<Coin>, AmmError> {
        if exiting_shares <= Decimal::ZERO {
            return Err(AmmError::NonPositive {
                what: "exiting shares",
                value: exiting_shares,
            });
        }
        if exiting_shares >= self.total_shares {
            return Err(AmmError::ExcessiveShareRedemption {
                requested: exiting_shares,
                total: self.total_shares,
            });
        }

        // Skip the multiplication entirely at zero fee so a fee-free exit
        // carries no truncation artifact.
        let refunded_shares = if exit_fee.is_zero() {
            exiting_shares
        } else {
            truncate_amount(exiting_shares * (Decimal::ONE - exit_fee))
        };
        let share_out_ratio = refunded_shares / self.total_shares;

        let mut exited = Vec::with_capacity(self.assets.len());
        for asset in &mut self.assets {
            let exit_amount = truncate_amount(share_out_ratio * asset.balance);
            if exit_amount <= Decimal::ZERO {
                continue;
            }
            asset.balance -= exit_amount;
            exited.push(Coin::new(asset.denom.clone(), exit_amount));
        }

        self.total_shares -= exiting_shares;
        Ok(exited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolAsset;
    use rust_decimal_macros::dec;

    fn three_asset_pool() -> Pool {
        Pool::new(
            7,
            vec![
                PoolAsset::new("atom", dec!(1000), dec!(100)),
                PoolAsset::new("osmo", dec!(1000), dec!(100)),
                PoolAsset::new("juno", dec!(500), dec!(200)),
            ],
            dec!(100),
            dec!(0.003),
            dec!(0.01),
            None,
        )
        .unwrap()
    }

    fn two_asset_pool() -> Pool {
        Pool::new(
            1,
            vec![
                PoolAsset::new("atom", dec!(1000), dec!(100)),
                PoolAsset::new("osmo", dec!(1000), dec!(100)),
            ],
            dec!(100),
            dec!(0.003),
            Decimal::ZERO,
            None,
        )
        .unwrap()
    }

    #[test]
    fn single_asset_join_mints_shares() {
        let mut pool = two_asset_pool();
        let shares = pool
            .join_pool(&[Coin::new("atom", dec!(100))], Decimal::ZERO)
            .unwrap();

        // 100 * (sqrt(1.1) - 1) = 4.88088481...
        assert!((shares - dec!(4.880884)).abs() < dec!(0.00001));
        assert_eq!(pool.asset("atom").unwrap().balance, dec!(1100));
        assert_eq!(pool.total_shares(), dec!(100) + shares);
    }

    #[test]
    fn join_fee_applies_only_to_swapped_portion() {
        let shares_free = two_asset_pool()
            .join_pool(&[Coin::new("atom", dec!(100))], Decimal::ZERO)
            .unwrap();
        let shares_taxed = two_asset_pool()
            .join_pool(&[Coin::new("atom", dec!(100))], dec!(0.003))
            .unwrap();

        assert!(shares_taxed < shares_free);
        // Effective fee is half the swap fee at normalized weight 0.5, so the
        // issuance cannot drop by the full fee
        let full_fee_floor = two_asset_pool()
            .join_pool(&[Coin::new("atom", dec!(99.7))], Decimal::ZERO)
            .unwrap();
        assert!(shares_taxed > full_fee_floor);
    }

    #[test]
    fn join_shapes_are_enforced() {
        let mut pool = three_asset_pool();

        // Two assets on a three-asset pool is neither accepted shape
        let err = pool
            .join_pool(
                &[Coin::new("atom", dec!(10)), Coin::new("osmo", dec!(10))],
                dec!(0.003),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AmmError::UnsupportedJoinShape {
                supplied: 2,
                pool_assets: 3
            }
        ));

        // The all-asset proportional join is reserved, not computed
        let err = pool
            .join_pool(
                &[
                    Coin::new("atom", dec!(10)),
                    Coin::new("osmo", dec!(10)),
                    Coin::new("juno", dec!(5)),
                ],
                dec!(0.003),
            )
            .unwrap_err();
        assert!(matches!(err, AmmError::NotImplemented));

        // No mutation on either rejection
        assert_eq!(pool.total_shares(), dec!(100));
        assert_eq!(pool.asset("atom").unwrap().balance, dec!(1000));
    }

    #[test]
    fn join_rejects_unknown_denom_and_dust() {
        let mut pool = two_asset_pool();
        assert!(matches!(
            pool.join_pool(&[Coin::new("juno", dec!(10))], dec!(0.003)),
            Err(AmmError::UnknownDenomination { .. })
        ));
        assert!(matches!(
            pool.join_pool(&[Coin::new("atom", Decimal::ZERO)], dec!(0.003)),
            Err(AmmError::NonPositive { .. })
        ));
    }

    #[test]
    fn exit_without_fee_is_pro_rata() {
        let mut pool = three_asset_pool();
        let exited = pool.exit_pool(dec!(10), Decimal::ZERO).unwrap();

        assert_eq!(exited.len(), 3);
        assert_eq!(exited[0], Coin::new("atom", dec!(100)));
        assert_eq!(exited[1], Coin::new("osmo", dec!(100)));
        assert_eq!(exited[2], Coin::new("juno", dec!(50)));
        assert_eq!(pool.total_shares(), dec!(90));
        assert_eq!(pool.asset("juno").unwrap().balance, dec!(450));
    }

    #[test]
    fn exit_fee_reduces_payout_but_burns_full_shares() {
        let mut pool = three_asset_pool();
        let exited = pool.exit_pool(dec!(10), dec!(0.01)).unwrap();

        // refunded = 10 * 0.99 = 9.9 -> ratio 0.099
        assert_eq!(exited[0], Coin::new("atom", dec!(99)));
        assert_eq!(exited[2], Coin::new("juno", dec!(49.5)));
        // The forfeited 0.1 share is burned with no matching withdrawal
        assert_eq!(pool.total_shares(), dec!(90));
        assert_eq!(pool.asset("atom").unwrap().balance, dec!(901));
    }

    #[test]
    fn exit_monotonicity_in_fee() {
        let mut fee_free = three_asset_pool();
        let mut taxed = three_asset_pool();
        let free_out = fee_free.exit_pool(dec!(25), Decimal::ZERO).unwrap();
        let taxed_out = taxed.exit_pool(dec!(25), dec!(0.01)).unwrap();

        for (free, paid) in free_out.iter().zip(&taxed_out) {
            assert_eq!(free.denom, paid.denom);
            assert!(paid.amount < free.amount);
        }
    }

    #[test]
    fn exit_cannot_redeem_entire_supply() {
        let mut pool = three_asset_pool();
        assert!(matches!(
            pool.exit_pool(dec!(100), Decimal::ZERO),
            Err(AmmError::ExcessiveShareRedemption { .. })
        ));
        assert!(matches!(
            pool.exit_pool(dec!(101), Decimal::ZERO),
            Err(AmmError::ExcessiveShareRedemption { .. })
        ));

        // One share unit below the full supply still pays out every asset
        let exited = pool.exit_pool(dec!(99.999999), Decimal::ZERO).unwrap();
        assert_eq!(exited.len(), 3);
        for coin in &exited {
            assert!(coin.amount > Decimal::ZERO);
        }
        assert_eq!(pool.total_shares(), dec!(0.000001));
    }

    #[test]
    fn exit_skips_dust_payouts() {
        let mut pool = Pool::new(
            2,
            vec![
                PoolAsset::new("atom", dec!(1000), dec!(100)),
                PoolAsset::new("osmo", dec!(0.000001), dec!(100)),
            ],
            dec!(100),
            Decimal::ZERO,
            Decimal::ZERO,
            None,
        )
        .unwrap();

        let exited = pool.exit_pool(dec!(10), Decimal::ZERO).unwrap();
        // The osmo payout truncates to zero and is omitted entirely
        assert_eq!(exited, vec![Coin::new("atom", dec!(100))]);
        assert_eq!(pool.asset("osmo").unwrap().balance, dec!(0.000001));
    }
}
