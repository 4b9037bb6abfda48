use serde::{Deserialize, Serialize};

/// The driver and vehicle allocated to a booking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverAssignment {
    pub driver_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle_id: String,
    pub vehicle_number: Option<String>,
    pub rating: Option<f64>,
}

impl DriverAssignment {
    pub fn new(driver_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
