use crate::models::{
    Alert, Budget, BudgetInput, Device, DeviceStatus, EnergyHistory, EnergyUsage, NewAlert,
    NewDevice, NewEnergyHistory, NewEnergyUsage, NewUser, User,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Error types for record store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    LockPoisoned,
    DuplicateUsername(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::LockPoisoned => write!(f, "Storage lock poisoned"),
            StorageError::DuplicateUsername(name) => {
                write!(f, "Username already taken: {}", name)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Record store contract shared by the API handlers and the telemetry
/// simulator. Implementations must serialize access internally; handlers
/// run on a multi-threaded runtime.
#[async_trait]
pub trait Storage: Send + Sync {
    // User methods
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    /// Creates the user and their default budget. Fails without consuming
    /// an id if the username is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    // Device methods
    async fn get_devices(&self, user_id: i32) -> Result<Vec<Device>, StorageError>;
    async fn get_device(&self, id: i32) -> Result<Option<Device>, StorageError>;
    async fn create_device(&self, device: NewDevice) -> Result<Device, StorageError>;
    async fn update_device_status(
        &self,
        id: i32,
        status: DeviceStatus,
        current_power: f64,
    ) -> Result<Option<Device>, StorageError>;

    // Energy usage methods
    async fn get_current_energy_usage(
        &self,
        user_id: i32,
    ) -> Result<Option<EnergyUsage>, StorageError>;
    async fn add_energy_usage(&self, usage: NewEnergyUsage) -> Result<EnergyUsage, StorageError>;

    // Budget methods
    async fn get_budget(&self, user_id: i32) -> Result<Option<Budget>, StorageError>;
    async fn upsert_budget(&self, budget: BudgetInput) -> Result<Budget, StorageError>;

    // Alert methods
    async fn get_alerts(
        &self,
        user_id: i32,
        limit: Option<usize>,
    ) -> Result<Vec<Alert>, StorageError>;
    async fn get_alert(&self, id: i32) -> Result<Option<Alert>, StorageError>;
    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StorageError>;
    async fn mark_alert_read(&self, id: i32) -> Result<Option<Alert>, StorageError>;

    // Energy history methods
    async fn get_energy_history(
        &self,
        user_id: i32,
        days: i64,
    ) -> Result<Vec<EnergyHistory>, StorageError>;
    async fn add_energy_history(
        &self,
        history: NewEnergyHistory,
    ) -> Result<EnergyHistory, StorageError>;
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<i32, User>,
    devices: HashMap<i32, Device>,
    energy_usages: HashMap<i32, EnergyUsage>,
    budgets: HashMap<i32, Budget>,
    alerts: HashMap<i32, Alert>,
    energy_histories: HashMap<i32, EnergyHistory>,

    next_user_id: i32,
    next_device_id: i32,
    next_energy_usage_id: i32,
    next_budget_id: i32,
    next_alert_id: i32,
    next_energy_history_id: i32,
}

impl StoreInner {
    fn new() -> Self {
        StoreInner {
            next_user_id: 1,
            next_device_id: 1,
            next_energy_usage_id: 1,
            next_budget_id: 1,
            next_alert_id: 1,
            next_energy_history_id: 1,
            ..Default::default()
        }
    }

    fn budget_for_user(&self, user_id: i32) -> Option<Budget> {
        self.budgets.values().find(|b| b.user_id == user_id).cloned()
    }

    fn upsert_budget(&mut self, input: BudgetInput) -> Budget {
        if let Some(existing) = self.budget_for_user(input.user_id) {
            let updated = Budget {
                id: existing.id,
                user_id: input.user_id,
                daily_kwh: input.daily_kwh,
                monthly_budget: input.monthly_budget,
                carbon_target: input.carbon_target,
            };
            self.budgets.insert(existing.id, updated.clone());
            updated
        } else {
            let id = self.next_budget_id;
            self.next_budget_id += 1;
            let budget = Budget {
                id,
                user_id: input.user_id,
                daily_kwh: input.daily_kwh,
                monthly_budget: input.monthly_budget,
                carbon_target: input.carbon_target,
            };
            self.budgets.insert(id, budget.clone());
            budget
        }
    }
}

/// In-memory record store. Ids are monotonic per entity type and never
/// reused. A single mutex serializes all access, preserving the
/// read-modify-write semantics the simulator relies on.
pub struct MemStorage {
    inner: Mutex<StoreInner>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage {
            inner: Mutex::new(StoreInner::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Default budget created alongside every new user.
pub const DEFAULT_DAILY_KWH: f64 = 25.0;
pub const DEFAULT_MONTHLY_BUDGET: f64 = 120.0;
pub const DEFAULT_CARBON_TARGET: f64 = 150.0;

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut inner = self.lock()?;

        // Uniqueness is checked under the same lock as the insert so a
        // rejected registration never advances the id counter.
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::DuplicateUsername(user.username));
        }

        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let stored = User {
            id,
            username: user.username,
            password: user.password,
            name: user.name,
            email: user.email,
        };
        inner.users.insert(id, stored.clone());

        // Every user starts with a default budget.
        inner.upsert_budget(BudgetInput {
            user_id: id,
            daily_kwh: DEFAULT_DAILY_KWH,
            monthly_budget: DEFAULT_MONTHLY_BUDGET,
            carbon_target: DEFAULT_CARBON_TARGET,
        });

        Ok(stored)
    }

    async fn get_devices(&self, user_id: i32) -> Result<Vec<Device>, StorageError> {
        let inner = self.lock()?;
        let mut devices: Vec<Device> = inner
            .devices
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        devices.sort_by_key(|d| d.id);
        Ok(devices)
    }

    async fn get_device(&self, id: i32) -> Result<Option<Device>, StorageError> {
        Ok(self.lock()?.devices.get(&id).cloned())
    }

    async fn create_device(&self, device: NewDevice) -> Result<Device, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_device_id;
        inner.next_device_id += 1;
        let stored = Device {
            id,
            user_id: device.user_id,
            name: device.name,
            location: device.location,
            device_type: device.device_type,
            status: device.status,
            current_power: device.current_power,
            today_usage: device.today_usage,
            is_high_power: device.is_high_power,
            icon: device.icon,
        };
        inner.devices.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_device_status(
        &self,
        id: i32,
        status: DeviceStatus,
        current_power: f64,
    ) -> Result<Option<Device>, StorageError> {
        let mut inner = self.lock()?;
        let Some(device) = inner.devices.get_mut(&id) else {
            return Ok(None);
        };
        device.status = status;
        device.current_power = current_power;
        Ok(Some(device.clone()))
    }

    async fn get_current_energy_usage(
        &self,
        user_id: i32,
    ) -> Result<Option<EnergyUsage>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .energy_usages
            .values()
            .filter(|u| u.user_id == user_id)
            .max_by_key(|u| (u.timestamp, u.id))
            .cloned())
    }

    async fn add_energy_usage(&self, usage: NewEnergyUsage) -> Result<EnergyUsage, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_energy_usage_id;
        inner.next_energy_usage_id += 1;
        let stored = EnergyUsage {
            id,
            user_id: usage.user_id,
            timestamp: usage.timestamp,
            power: usage.power,
            daily_total: usage.daily_total,
            monthly_cost: usage.monthly_cost,
            carbon_footprint: usage.carbon_footprint,
        };
        inner.energy_usages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_budget(&self, user_id: i32) -> Result<Option<Budget>, StorageError> {
        Ok(self.lock()?.budget_for_user(user_id))
    }

    async fn upsert_budget(&self, budget: BudgetInput) -> Result<Budget, StorageError> {
        Ok(self.lock()?.upsert_budget(budget))
    }

    async fn get_alerts(
        &self,
        user_id: i32,
        limit: Option<usize>,
    ) -> Result<Vec<Alert>, StorageError> {
        let inner = self.lock()?;
        let mut alerts: Vec<Alert> = inner
            .alerts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; id breaks ties between same-instant alerts.
        alerts.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        if let Some(limit) = limit {
            alerts.truncate(limit);
        }
        Ok(alerts)
    }

    async fn get_alert(&self, id: i32) -> Result<Option<Alert>, StorageError> {
        Ok(self.lock()?.alerts.get(&id).cloned())
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_alert_id;
        inner.next_alert_id += 1;
        let stored = Alert {
            id,
            user_id: alert.user_id,
            timestamp: alert.timestamp,
            severity: alert.severity,
            title: alert.title,
            message: alert.message,
            read: alert.read,
        };
        inner.alerts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn mark_alert_read(&self, id: i32) -> Result<Option<Alert>, StorageError> {
        let mut inner = self.lock()?;
        let Some(alert) = inner.alerts.get_mut(&id) else {
            return Ok(None);
        };
        alert.read = true;
        Ok(Some(alert.clone()))
    }

    async fn get_energy_history(
        &self,
        user_id: i32,
        days: i64,
    ) -> Result<Vec<EnergyHistory>, StorageError> {
        // `days` comes straight from the query string; out-of-range values
        // must widen the window, not panic the arithmetic.
        let cutoff = Duration::try_days(days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        let inner = self.lock()?;
        let mut history: Vec<EnergyHistory> = inner
            .energy_histories
            .values()
            .filter(|h| h.user_id == user_id && h.date >= cutoff)
            .cloned()
            .collect();
        history.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));
        Ok(history)
    }

    async fn add_energy_history(
        &self,
        history: NewEnergyHistory,
    ) -> Result<EnergyHistory, StorageError> {
        let mut inner = self.lock()?;
        let id = inner.next_energy_history_id;
        inner.next_energy_history_id += 1;
        let stored = EnergyHistory {
            id,
            user_id: history.user_id,
            date: history.date,
            hourly_data: history.hourly_data,
            total_kwh: history.total_kwh,
            average_kwh: history.average_kwh,
        };
        inner.energy_histories.insert(id, stored.clone());
        Ok(stored)
    }
}
