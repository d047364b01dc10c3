use crate::models::{
    AlertSeverity, DeviceStatus, NewAlert, NewDevice, NewEnergyHistory, NewEnergyUsage, NewUser,
};
use crate::services::auth;
use crate::services::simulator::round2;
use crate::storage::Storage;
use chrono::{Duration, Utc};
use rand::Rng;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password123";

/// Populates a fresh store with the demo account the simulator drives:
/// one user, four devices, a usage baseline, a few alerts and a week of
/// hourly history. Returns the demo user's id.
pub async fn seed_demo_data(storage: &dyn Storage) -> Result<i32, String> {
    let password = auth::hash_password(DEMO_PASSWORD)?;

    // create_user also provisions the default budget (25 kWh / $120 / 150 kg)
    let user = storage
        .create_user(NewUser {
            username: DEMO_USERNAME.to_string(),
            password,
            name: "Shri Harsha Angadi".to_string(),
            email: "shriharsha@example.com".to_string(),
        })
        .await
        .map_err(|e| e.to_string())?;

    let devices = [
        ("Refrigerator", "Kitchen", "refrigerator", DeviceStatus::Active, 120.0, 2.88, false, "fa-refrigerator"),
        ("TV", "Living Room", "tv", DeviceStatus::Standby, 5.0, 1.45, false, "fa-tv"),
        ("Washing Machine", "Laundry Room", "washer", DeviceStatus::Running, 850.0, 3.20, true, "fa-washing-machine"),
        ("Smart Lights", "Whole House", "lights", DeviceStatus::Active, 75.0, 1.05, false, "fa-lightbulb"),
    ];
    for (name, location, device_type, status, power, usage, high_power, icon) in devices {
        storage
            .create_device(NewDevice {
                user_id: user.id,
                name: name.to_string(),
                location: location.to_string(),
                device_type: device_type.to_string(),
                status,
                current_power: power,
                today_usage: usage,
                is_high_power: high_power,
                icon: icon.to_string(),
            })
            .await
            .map_err(|e| e.to_string())?;
    }

    let now = Utc::now();
    storage
        .add_energy_usage(NewEnergyUsage {
            user_id: user.id,
            timestamp: now,
            power: 3.42,
            daily_total: 18.7,
            monthly_cost: 87.32,
            carbon_footprint: 104.5,
        })
        .await
        .map_err(|e| e.to_string())?;

    let alerts = [
        (
            0i64,
            AlertSeverity::Error,
            "High Energy Usage Detected",
            "Air conditioner consumption exceeds normal levels by 35%",
            false,
        ),
        (
            3,
            AlertSeverity::Warning,
            "Approaching Daily Limit",
            "You've used 75% of your daily energy budget",
            false,
        ),
        (
            24,
            AlertSeverity::Info,
            "Device Offline",
            "Smart plug in home office disconnected",
            false,
        ),
        (
            36,
            AlertSeverity::Success,
            "Weekly Report Available",
            "Your energy savings report for last week is ready",
            true,
        ),
    ];
    for (hours_ago, severity, title, message, read) in alerts {
        storage
            .create_alert(NewAlert {
                user_id: user.id,
                timestamp: now - Duration::hours(hours_ago),
                severity,
                title: title.to_string(),
                message: message.to_string(),
                read,
            })
            .await
            .map_err(|e| e.to_string())?;
    }

    // A week of hourly buckets with a household-shaped load curve.
    let mut rng = rand::rng();
    for days_ago in 0..7 {
        let hourly_data: Vec<f64> = (0..24)
            .map(|hour| {
                let mut base = 0.7;
                if (7..=9).contains(&hour) {
                    base += 1.5; // morning peak
                } else if (18..=22).contains(&hour) {
                    base += 2.0; // evening peak
                } else if (10..=17).contains(&hour) {
                    base += 1.0;
                }
                round2(base + rng.random_range(-0.25..0.25))
            })
            .collect();

        let total_kwh = round2(hourly_data.iter().sum());
        let average_kwh = round2(total_kwh / 24.0);

        storage
            .add_energy_history(NewEnergyHistory {
                user_id: user.id,
                date: now - Duration::days(days_ago),
                hourly_data,
                total_kwh,
                average_kwh,
            })
            .await
            .map_err(|e| e.to_string())?;
    }

    log::info!("Seeded demo data for user '{}' (id {})", DEMO_USERNAME, user.id);
    Ok(user.id)
}
