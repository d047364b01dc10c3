use crate::models::{AlertSeverity, NewAlert, NewEnergyUsage};
use crate::storage::{Storage, StorageError};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Flat tariff applied to each simulated kWh.
pub const COST_PER_KWH: f64 = 0.15;
/// Grid carbon intensity, kg CO2 per kWh.
pub const CARBON_KG_PER_KWH: f64 = 0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Per-tick power fluctuation, as a fraction of current draw.
const FLUCTUATION_RATIO: f64 = 0.075;

/// Budget alerting: eligible from 70% of the daily budget, escalating to
/// `error` at 90%. Emission is sampled at 10% per tick so sustained
/// over-budget usage doesn't flood the alert log.
const ALERT_THRESHOLD: f64 = 0.7;
const ALERT_ERROR_THRESHOLD: f64 = 0.9;
const ALERT_SAMPLE_RATE: f64 = 0.1;

pub const ALERT_TITLE: &str = "Energy Budget Alert";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// New power reading for a drawing device: uniform fluctuation within
/// ±7.5% of the current draw, floored at zero.
pub fn fluctuate_power<R: Rng>(rng: &mut R, current_power: f64) -> f64 {
    let ratio = rng.random_range(-FLUCTUATION_RATIO..FLUCTUATION_RATIO);
    round2((current_power + current_power * ratio).max(0.0))
}

/// Decides whether a budget alert fires for the given cumulative usage.
/// `roll` is a uniform [0, 1) sample; below 70% of budget no roll can
/// produce an alert.
pub fn evaluate_budget_alert(daily_total: f64, daily_kwh: f64, roll: f64) -> Option<AlertSeverity> {
    if daily_total < ALERT_THRESHOLD * daily_kwh || roll >= ALERT_SAMPLE_RATE {
        return None;
    }
    if daily_total >= ALERT_ERROR_THRESHOLD * daily_kwh {
        Some(AlertSeverity::Error)
    } else {
        Some(AlertSeverity::Warning)
    }
}

/// Periodic IoT telemetry simulator. Each tick perturbs device power
/// draws, appends an aggregate usage snapshot and evaluates the budget
/// alert policy for one user.
pub struct TelemetrySimulator {
    storage: Arc<dyn Storage>,
    user_id: i32,
    tick_interval: Duration,
}

/// Stops the simulator loop when asked, or when dropped.
pub struct SimulatorHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

impl TelemetrySimulator {
    pub fn new(storage: Arc<dyn Storage>, user_id: i32, tick_interval: Duration) -> Self {
        TelemetrySimulator {
            storage,
            user_id,
            tick_interval,
        }
    }

    /// One simulation step. Device updates are applied even when no
    /// baseline snapshot exists; aggregation is skipped in that case.
    pub async fn tick(&self) -> Result<(), StorageError> {
        let devices = self.storage.get_devices(self.user_id).await?;

        // Sample all fluctuations up front; ThreadRng is not Send and
        // must not be held across an await point.
        let updates: Vec<(i32, crate::models::DeviceStatus, f64)> = {
            let mut rng = rand::rng();
            devices
                .iter()
                .filter(|d| d.status.is_drawing())
                .map(|d| (d.id, d.status, fluctuate_power(&mut rng, d.current_power)))
                .collect()
        };

        for (id, status, power) in updates {
            self.storage.update_device_status(id, status, power).await?;
        }

        let Some(baseline) = self.storage.get_current_energy_usage(self.user_id).await? else {
            log::debug!("No usage baseline for user {}, skipping aggregation", self.user_id);
            return Ok(());
        };

        // Aggregate draw across all devices, watts to kW.
        let updated_devices = self.storage.get_devices(self.user_id).await?;
        let total_power: f64 =
            updated_devices.iter().map(|d| d.current_power).sum::<f64>() / 1000.0;

        let increment = total_power * (self.tick_interval.as_secs_f64() / SECONDS_PER_DAY);

        self.storage
            .add_energy_usage(NewEnergyUsage {
                user_id: self.user_id,
                timestamp: Utc::now(),
                power: round2(total_power),
                daily_total: baseline.daily_total + increment,
                monthly_cost: baseline.monthly_cost + increment * COST_PER_KWH,
                carbon_footprint: baseline.carbon_footprint + increment * CARBON_KG_PER_KWH,
            })
            .await?;

        self.check_budget_alert().await
    }

    /// Budget-alert evaluation, run after each snapshot is appended.
    async fn check_budget_alert(&self) -> Result<(), StorageError> {
        let Some(budget) = self.storage.get_budget(self.user_id).await? else {
            return Ok(());
        };
        let Some(usage) = self.storage.get_current_energy_usage(self.user_id).await? else {
            return Ok(());
        };

        let roll: f64 = rand::rng().random();
        if let Some(severity) = evaluate_budget_alert(usage.daily_total, budget.daily_kwh, roll) {
            let percentage = (usage.daily_total / budget.daily_kwh * 100.0).round() as i64;
            self.storage
                .create_alert(NewAlert {
                    user_id: self.user_id,
                    timestamp: Utc::now(),
                    severity,
                    title: ALERT_TITLE.to_string(),
                    message: format!("You've used {}% of your daily energy budget", percentage),
                    read: false,
                })
                .await?;
            log::info!(
                "Budget alert for user {}: {}% of daily budget used",
                self.user_id,
                percentage
            );
        }

        Ok(())
    }

    /// Starts the tick loop on the runtime. A failed tick is logged and
    /// skipped; the loop continues until the handle stops it.
    pub fn spawn(self) -> SimulatorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // the first simulated tick lands one full interval after start.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        if let Err(e) = self.tick().await {
                            log::error!("Telemetry tick failed: {}", e);
                        }
                    }
                }
            }
        });

        SimulatorHandle {
            stop: stop_tx,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceStatus, NewDevice, NewEnergyUsage};
    use crate::storage::MemStorage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TICK: Duration = Duration::from_secs(10);

    fn device(user_id: i32, name: &str, status: DeviceStatus, power: f64) -> NewDevice {
        NewDevice {
            user_id,
            name: name.to_string(),
            location: "Test".to_string(),
            device_type: "other".to_string(),
            status,
            current_power: power,
            today_usage: 0.0,
            is_high_power: false,
            icon: "fa-plug".to_string(),
        }
    }

    fn baseline(user_id: i32, daily_total: f64) -> NewEnergyUsage {
        NewEnergyUsage {
            user_id,
            timestamp: Utc::now(),
            power: 1.0,
            daily_total,
            monthly_cost: 50.0,
            carbon_footprint: 80.0,
        }
    }

    fn simulator(storage: &Arc<dyn Storage>) -> TelemetrySimulator {
        TelemetrySimulator::new(storage.clone(), 1, TICK)
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(3.42001), 3.42);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_fluctuate_power_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let power = fluctuate_power(&mut rng, 850.0);
            // 2-decimal rounding can nudge the value past the raw bound.
            assert!(power >= 850.0 * (1.0 - FLUCTUATION_RATIO) - 0.01);
            assert!(power <= 850.0 * (1.0 + FLUCTUATION_RATIO) + 0.01);
        }
    }

    #[test]
    fn test_fluctuate_power_zero_stays_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(fluctuate_power(&mut rng, 0.0), 0.0);
        }
    }

    #[test]
    fn test_fluctuate_power_never_negative() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(fluctuate_power(&mut rng, 0.01) >= 0.0);
        }
    }

    #[test]
    fn test_no_alert_below_threshold_regardless_of_roll() {
        // 17.05 / 25 = 68.2%, below the 70% gate
        assert_eq!(evaluate_budget_alert(17.05, 25.0, 0.0), None);
        assert_eq!(evaluate_budget_alert(0.0, 25.0, 0.0), None);
        assert_eq!(evaluate_budget_alert(17.49, 25.0, 0.0), None);
    }

    #[test]
    fn test_alert_requires_winning_roll() {
        assert_eq!(evaluate_budget_alert(20.0, 25.0, 0.5), None);
        assert_eq!(evaluate_budget_alert(20.0, 25.0, 0.1), None);
        assert_eq!(
            evaluate_budget_alert(20.0, 25.0, 0.09),
            Some(AlertSeverity::Warning)
        );
    }

    #[test]
    fn test_alert_severity_boundaries() {
        // 22.0 / 25 = 88% -> warning only
        assert_eq!(
            evaluate_budget_alert(22.0, 25.0, 0.0),
            Some(AlertSeverity::Warning)
        );
        // exactly 90% escalates to error
        assert_eq!(
            evaluate_budget_alert(22.5, 25.0, 0.0),
            Some(AlertSeverity::Error)
        );
        assert_eq!(
            evaluate_budget_alert(25.0, 25.0, 0.0),
            Some(AlertSeverity::Error)
        );
        // exactly 70% is eligible, warning severity
        assert_eq!(
            evaluate_budget_alert(17.5, 25.0, 0.0),
            Some(AlertSeverity::Warning)
        );
    }

    #[actix_rt::test]
    async fn test_tick_perturbs_only_drawing_devices() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let active = storage
            .create_device(device(1, "Fridge", DeviceStatus::Active, 120.0))
            .await
            .unwrap();
        let running = storage
            .create_device(device(1, "Washer", DeviceStatus::Running, 850.0))
            .await
            .unwrap();
        let standby = storage
            .create_device(device(1, "TV", DeviceStatus::Standby, 5.0))
            .await
            .unwrap();
        let offline = storage
            .create_device(device(1, "Heater", DeviceStatus::Offline, 0.0))
            .await
            .unwrap();
        storage.add_energy_usage(baseline(1, 5.0)).await.unwrap();

        simulator(&storage).tick().await.unwrap();

        let after_active = storage.get_device(active.id).await.unwrap().unwrap();
        assert!(after_active.current_power >= 120.0 * 0.925 - 0.01);
        assert!(after_active.current_power <= 120.0 * 1.075 + 0.01);

        let after_running = storage.get_device(running.id).await.unwrap().unwrap();
        assert!(after_running.current_power >= 850.0 * 0.925 - 0.01);
        assert!(after_running.current_power <= 850.0 * 1.075 + 0.01);

        let after_standby = storage.get_device(standby.id).await.unwrap().unwrap();
        assert_eq!(after_standby.current_power, 5.0);
        let after_offline = storage.get_device(offline.id).await.unwrap().unwrap();
        assert_eq!(after_offline.current_power, 0.0);
    }

    #[actix_rt::test]
    async fn test_tick_appends_snapshot_with_monotonic_totals() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        storage
            .create_device(device(1, "Fridge", DeviceStatus::Active, 120.0))
            .await
            .unwrap();
        storage.add_energy_usage(baseline(1, 5.0)).await.unwrap();

        let sim = simulator(&storage);
        let mut previous = storage.get_current_energy_usage(1).await.unwrap().unwrap();
        for _ in 0..5 {
            sim.tick().await.unwrap();
            let current = storage.get_current_energy_usage(1).await.unwrap().unwrap();
            assert!(current.id > previous.id, "snapshots must be appended");
            assert!(current.daily_total >= previous.daily_total);
            assert!(current.monthly_cost >= previous.monthly_cost);
            assert!(current.carbon_footprint >= previous.carbon_footprint);
            previous = current;
        }
    }

    #[actix_rt::test]
    async fn test_tick_increment_matches_interval_fraction() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        // Standby device: power never changes, so the increment is exact.
        storage
            .create_device(device(1, "TV", DeviceStatus::Standby, 2000.0))
            .await
            .unwrap();
        storage.add_energy_usage(baseline(1, 5.0)).await.unwrap();

        simulator(&storage).tick().await.unwrap();

        let current = storage.get_current_energy_usage(1).await.unwrap().unwrap();
        // 2 kW for 10s of a day = 2 * 10/86400 kWh
        let expected = 2.0 * (10.0 / 86_400.0);
        assert!((current.daily_total - (5.0 + expected)).abs() < 1e-9);
        assert!((current.monthly_cost - (50.0 + expected * COST_PER_KWH)).abs() < 1e-9);
        assert!((current.carbon_footprint - (80.0 + expected * CARBON_KG_PER_KWH)).abs() < 1e-9);
        assert_eq!(current.power, 2.0);
    }

    #[actix_rt::test]
    async fn test_tick_without_baseline_skips_aggregation() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        storage
            .create_device(device(1, "Fridge", DeviceStatus::Active, 120.0))
            .await
            .unwrap();

        simulator(&storage).tick().await.unwrap();

        assert!(storage.get_current_energy_usage(1).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_no_alerts_emitted_below_budget_threshold() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        storage
            .create_device(device(1, "Fridge", DeviceStatus::Active, 120.0))
            .await
            .unwrap();
        storage
            .upsert_budget(crate::models::BudgetInput {
                user_id: 1,
                daily_kwh: 25.0,
                monthly_budget: 120.0,
                carbon_target: 150.0,
            })
            .await
            .unwrap();
        // Well below 70% of 25 kWh; ~0.12 kW ticks add micro-increments.
        storage.add_energy_usage(baseline(1, 1.0)).await.unwrap();

        let sim = simulator(&storage);
        for _ in 0..50 {
            sim.tick().await.unwrap();
        }

        assert!(storage.get_alerts(1, None).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_simulator_handle_stops_loop() {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let sim = TelemetrySimulator::new(storage.clone(), 1, Duration::from_millis(10));
        let handle = sim.spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.stop().await;
    }
}
