use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{json, Value};

/// 按二进制真实值做银行家舍入
pub fn round_dp(v: f64, dp: u32) -> f64 {
    if !v.is_finite() {
        return v;
    }
    Decimal::from_f64_retain(v)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(v)
}

fn is_integral(v: f64) -> bool {
    v == v.trunc()
}

/// 统计表与 JSON 共用的显示规则：保留两位，整数不带小数
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let rounded = round_dp(v, 2);
    if rounded == 0.0 {
        "0".to_string()
    } else if is_integral(rounded) {
        format!("{:.0}", rounded)
    } else {
        format!("{:.2}", rounded)
    }
}

/// 同一规则下的 JSON 数值：整数输出为整数，非有限值输出 null
pub fn json_number(v: f64, dp: u32) -> Value {
    if !v.is_finite() {
        return Value::Null;
    }
    let rounded = round_dp(v, dp);
    match Decimal::from_f64(rounded).filter(|_| is_integral(rounded)).and_then(|d| d.to_i64()) {
        Some(int) => json!(int),
        None => json!(rounded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(10.0, "10")]
    #[case(10.256, "10.26")]
    #[case(10.5, "10.50")]
    #[case(0.001, "0")]
    #[case(-0.001, "0")]
    #[case(-3.333, "-3.33")]
    #[case(0.125, "0.12")]
    #[case(f64::NAN, "-")]
    fn formats_values(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(format_value(input), expected);
    }

    #[test]
    fn rounds_half_to_even_on_exact_ties() {
        assert_eq!(round_dp(0.125, 2), 0.12);
        assert_eq!(round_dp(0.375, 2), 0.38);
        assert_eq!(round_dp(120.04, 1), 120.0);
    }

    #[test]
    fn json_numbers_drop_integral_decimals() {
        assert_eq!(json_number(20.0, 2), json!(20));
        assert_eq!(json_number(85.349, 1), json!(85.3));
        assert_eq!(json_number(f64::INFINITY, 2), Value::Null);
    }
}
