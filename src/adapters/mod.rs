//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                  |
//! |-------------|--------------|------------------------------|
//! | `mqtt`      | BrokerPort   | ESP-IDF MQTT client / sim    |
//! | `time`      | ClockPort    | ESP32 high-resolution timer  |
//! | `device_id` | (none)       | eFuse factory MAC            |
//! | `wifi`      | (none)       | station link supervision     |

pub mod device_id;
pub mod mqtt;
pub mod time;
pub mod wifi;
