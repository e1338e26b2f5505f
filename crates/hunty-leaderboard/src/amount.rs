use alloy_primitives::U256;

/// cUSD uses 18 decimals.
pub const CUSD_DECIMALS: usize = 18;

/// Formats a cUSD base-unit amount for display, trimming trailing zeros
/// from the fraction: `1_500_000_000_000_000_000` -> `"1.5"`.
pub fn format_cusd(amount: U256) -> String {
    let divisor = U256::from(10u64).pow(U256::from(CUSD_DECIMALS));
    let whole = amount / divisor;
    let fraction = amount % divisor;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction.to_string(), width = CUSD_DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
