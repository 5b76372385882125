/// Commission split of a booking's total between the platform and the spot
/// owner. Integer arithmetic in major currency units; the owner keeps the
/// division remainder, so the two parts always sum back to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub total_amount: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
}

impl CommissionSplit {
    pub fn compute(total_amount: i64, commission_percent: i64) -> Self {
        let platform_fee = total_amount * commission_percent / 100;
        Self {
            total_amount,
            platform_fee,
            owner_earnings: total_amount - platform_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        // 200 at 15% -> fee 30, earnings 170.
        let split = CommissionSplit::compute(200, 15);
        assert_eq!(split.platform_fee, 30);
        assert_eq!(split.owner_earnings, 170);
    }

    #[test]
    fn test_parts_always_sum_to_total() {
        for total in [1, 7, 99, 200, 1001, 86_400] {
            for percent in [0, 1, 15, 33, 50, 100] {
                let split = CommissionSplit::compute(total, percent);
                assert_eq!(split.owner_earnings + split.platform_fee, total);
                assert!(split.platform_fee >= 0);
                assert!(split.owner_earnings >= 0);
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_owner() {
        // 15% of 99 is 14.85; integer division keeps the fee at 14.
        let split = CommissionSplit::compute(99, 15);
        assert_eq!(split.platform_fee, 14);
        assert_eq!(split.owner_earnings, 85);
    }
}
