//! Avanza API wire models
//!
//! Only the fields the summaries need are typed; everything else is kept in `extra` so
//! debug echoes and raw dumps carry the full upstream payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Account list with overview figures
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(default)]
    pub accounts: Vec<AccountInfo>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One account as listed in the overview
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,

    #[serde(default)]
    pub name: String,

    pub account_type: Option<String>,
    pub own_capital: Option<f64>,
    pub total_profit_percent: Option<f64>,
    pub total_profit: Option<f64>,
    /// Year-to-date performance percentage
    pub performance_percent: Option<f64>,
    /// Year-to-date performance amount
    pub performance: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Extended per-account overview
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub performance_since_one_week: Option<f64>,
    pub performance_since_one_week_percent: Option<f64>,
    pub performance_since_one_month: Option<f64>,
    pub performance_since_one_month_percent: Option<f64>,
    pub performance_since_three_months: Option<f64>,
    pub performance_since_three_months_percent: Option<f64>,
    pub performance_since_six_months: Option<f64>,
    pub performance_since_six_months_percent: Option<f64>,
    pub performance_since_one_year: Option<f64>,
    pub performance_since_one_year_percent: Option<f64>,
    pub performance_since_three_years: Option<f64>,
    pub performance_since_three_years_percent: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Open positions grouped by instrument type
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Positions {
    #[serde(default)]
    pub instrument_positions: Vec<InstrumentPositions>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentPositions {
    #[serde(default)]
    pub instrument_type: String,

    #[serde(default)]
    pub positions: Vec<PositionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub orderbook_id: Option<String>,

    pub last_price: Option<f64>,
    pub last_price_updated: Option<String>,
    pub change_percent: Option<f64>,
    pub value: Option<f64>,
    pub profit: Option<f64>,
    pub profit_percent: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user watchlist; `orderbooks` holds orderbook ids
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "vec_string_or_number")]
    pub orderbooks: Vec<String>,
}

/// Orderbook detail as returned by the orderbook list endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orderbook {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub instrument_type: String,

    pub change_percent: Option<f64>,
    pub last_price: Option<f64>,
    pub updated: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Instrument detail; which change figure is populated depends on the instrument type
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,

    pub ticker_symbol: Option<String>,
    pub change_percent: Option<f64>,
    pub change_since_one_day: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to the credential step of the login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsResponse {
    pub two_factor_login: Option<TwoFactorLogin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorLogin {
    pub transaction_id: String,
    pub method: String,
}

/// Response to the TOTP step of the login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpResponse {
    pub authentication_session: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub customer_id: Option<String>,
}

/// Authenticated session headers
#[derive(Debug, Clone)]
pub struct Session {
    pub authentication_session: String,
    pub security_token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

fn vec_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Option::<Vec<StringOrNumber>>::deserialize(deserializer)?;
    Ok(ids.unwrap_or_default().into_iter().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_decoding() {
        let json = r#"{
            "accounts": [{
                "accountId": "1234567",
                "name": "ISK",
                "accountType": "Investeringssparkonto",
                "ownCapital": 10000.0,
                "totalProfitPercent": 5.234,
                "totalProfit": 497.5,
                "performancePercent": 1.2,
                "performance": 120.0,
                "depositable": true
            }],
            "totalOwnCapital": 10000.0
        }"#;

        let overview: Overview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.accounts.len(), 1);

        let account = &overview.accounts[0];
        assert_eq!(account.account_id, "1234567");
        assert_eq!(account.own_capital, Some(10000.0));
        assert_eq!(account.total_profit_percent, Some(5.234));
        assert_eq!(account.extra.get("depositable"), Some(&Value::Bool(true)));
        assert!(overview.extra.contains_key("totalOwnCapital"));
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let json = r#"{"accountId": 42, "name": "KF"}"#;
        let account: AccountInfo = serde_json::from_str(json).unwrap();
        assert_eq!(account.account_id, "42");
        assert_eq!(account.own_capital, None);

        let watchlist: Watchlist =
            serde_json::from_str(r#"{"name": "Tech", "orderbooks": [5361, "26268"]}"#).unwrap();
        assert_eq!(watchlist.orderbooks, vec!["5361".to_string(), "26268".to_string()]);
    }

    #[test]
    fn test_null_figures_decode_as_none() {
        let json = r#"{"performanceSinceOneWeek": null, "performanceSinceOneWeekPercent": 0.0}"#;
        let overview: AccountOverview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.performance_since_one_week, None);
        assert_eq!(overview.performance_since_one_week_percent, Some(0.0));
        assert_eq!(overview.performance_since_three_years, None);
    }

    #[test]
    fn test_positions_decoding() {
        let json = r#"{
            "instrumentPositions": [{
                "instrumentType": "STOCK",
                "positions": [{
                    "accountId": "1234567",
                    "name": "Volvo B",
                    "orderbookId": "5269",
                    "lastPrice": 212.35,
                    "lastPriceUpdated": "2024-05-03T17:29:59.000+0200",
                    "changePercent": -0.54,
                    "value": 4247.0,
                    "profit": 512.3,
                    "profitPercent": 13.72,
                    "volume": 20
                }]
            }]
        }"#;

        let positions: Positions = serde_json::from_str(json).unwrap();
        let group = &positions.instrument_positions[0];
        assert_eq!(group.instrument_type, "STOCK");
        assert_eq!(group.positions[0].orderbook_id.as_deref(), Some("5269"));
        assert_eq!(group.positions[0].change_percent, Some(-0.54));
    }

    #[test]
    fn test_watchlist_without_orderbooks() {
        let watchlist: Watchlist = serde_json::from_str(r#"{"name": "Empty"}"#).unwrap();
        assert!(watchlist.orderbooks.is_empty());

        let watchlist: Watchlist =
            serde_json::from_str(r#"{"name": "Empty", "orderbooks": null}"#).unwrap();
        assert!(watchlist.orderbooks.is_empty());
    }

    #[test]
    fn test_totp_response_ignores_unused_fields() {
        let json = r#"{
            "authenticationSession": "abc-123",
            "customerId": 987654,
            "pushSubscriptionId": "push-1",
            "registrationComplete": true
        }"#;

        let totp: TotpResponse = serde_json::from_str(json).unwrap();
        assert_eq!(totp.authentication_session, "abc-123");
        assert_eq!(totp.customer_id.as_deref(), Some("987654"));

        let totp: TotpResponse =
            serde_json::from_str(r#"{"authenticationSession": "abc-123"}"#).unwrap();
        assert!(totp.customer_id.is_none());
    }
}
