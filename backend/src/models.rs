use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of a monitored device. Only `active` and `running`
/// devices draw fluctuating power during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Standby,
    Running,
    Offline,
}

impl DeviceStatus {
    /// Whether the simulator should perturb this device's power draw.
    pub fn is_drawing(&self) -> bool {
        matches!(self, DeviceStatus::Active | DeviceStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Argon2 hash, never the plaintext password.
    pub password: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub location: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: DeviceStatus,
    /// Instantaneous draw in watts, never negative.
    pub current_power: f64,
    /// Cumulative kWh for the current day.
    pub today_usage: f64,
    pub is_high_power: bool,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub user_id: i32,
    pub name: String,
    pub location: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: DeviceStatus,
    pub current_power: f64,
    pub today_usage: f64,
    pub is_high_power: bool,
    pub icon: String,
}

/// One immutable point-in-time reading of the household aggregates.
/// The log is append-only; "current" means newest by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyUsage {
    pub id: i32,
    pub user_id: i32,
    pub timestamp: DateTime<Utc>,
    /// Aggregate household draw in kW.
    pub power: f64,
    /// Running kWh total for the day.
    pub daily_total: f64,
    /// Running cost for the month, in currency units.
    pub monthly_cost: f64,
    /// Running kg CO2 for the month.
    pub carbon_footprint: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyUsage {
    pub user_id: i32,
    pub timestamp: DateTime<Utc>,
    pub power: f64,
    pub daily_total: f64,
    pub monthly_cost: f64,
    pub carbon_footprint: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i32,
    pub user_id: i32,
    pub daily_kwh: f64,
    pub monthly_budget: f64,
    pub carbon_target: f64,
}

/// Upsert payload; keyed by user, at most one budget per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetInput {
    pub user_id: i32,
    pub daily_kwh: f64,
    pub monthly_budget: f64,
    pub carbon_target: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i32,
    pub user_id: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub user_id: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub read: bool,
}

/// One calendar day of hourly readings for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyHistory {
    pub id: i32,
    pub user_id: i32,
    pub date: DateTime<Utc>,
    /// 24 hourly kWh readings.
    pub hourly_data: Vec<f64>,
    pub total_kwh: f64,
    pub average_kwh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyHistory {
    pub user_id: i32,
    pub date: DateTime<Utc>,
    pub hourly_data: Vec<f64>,
    pub total_kwh: f64,
    pub average_kwh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Active).unwrap(),
            r#""active""#
        );
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Offline).unwrap(),
            r#""offline""#
        );
    }

    #[test]
    fn test_device_status_is_drawing() {
        assert!(DeviceStatus::Active.is_drawing());
        assert!(DeviceStatus::Running.is_drawing());
        assert!(!DeviceStatus::Standby.is_drawing());
        assert!(!DeviceStatus::Offline.is_drawing());
    }

    #[test]
    fn test_device_serializes_camel_case_with_type_field() {
        let device = Device {
            id: 1,
            user_id: 1,
            name: "Refrigerator".to_string(),
            location: "Kitchen".to_string(),
            device_type: "refrigerator".to_string(),
            status: DeviceStatus::Active,
            current_power: 120.0,
            today_usage: 2.88,
            is_high_power: false,
            icon: "fa-refrigerator".to_string(),
        };

        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["type"], "refrigerator");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["currentPower"], 120.0);
        assert_eq!(json["todayUsage"], 2.88);
        assert_eq!(json["isHighPower"], false);
    }

    #[test]
    fn test_alert_severity_round_trip() {
        let json = r#""warning""#;
        let severity: AlertSeverity = serde_json::from_str(json).unwrap();
        assert_eq!(severity, AlertSeverity::Warning);
        assert_eq!(serde_json::to_string(&severity).unwrap(), json);
    }

    #[test]
    fn test_energy_usage_serializes_camel_case() {
        let usage = EnergyUsage {
            id: 1,
            user_id: 1,
            timestamp: Utc::now(),
            power: 3.42,
            daily_total: 18.7,
            monthly_cost: 87.32,
            carbon_footprint: 104.5,
        };

        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["dailyTotal"], 18.7);
        assert_eq!(json["monthlyCost"], 87.32);
        assert_eq!(json["carbonFootprint"], 104.5);
    }

    #[test]
    fn test_budget_input_deserialization() {
        let json = r#"{"userId": 1, "dailyKwh": 25.0, "monthlyBudget": 120.0, "carbonTarget": 150.0}"#;
        let input: BudgetInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.daily_kwh, 25.0);
        assert_eq!(input.monthly_budget, 120.0);
        assert_eq!(input.carbon_target, 150.0);
    }
}
