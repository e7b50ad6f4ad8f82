//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                          | Connects to              |
//! |------------|-------------------------------------|--------------------------|
//! | `hardware` | LightPort, StatusIndicator,         | LEDC PWM, GPIO,          |
//! |            | BlinkTimerPort, ButtonInput,        | esp_timer                |
//! |            | TimePort, DelayNs                   |                          |
//! | `log_sink` | EventSink                           | Serial log output        |
//! | `nvs`      | ConfigPort, StoragePort             | NVS / in-memory store    |
//! | `stack`    | StackPort                           | Connectivity + clusters  |
//! | `time`     | TimePort                            | ESP32 system timer       |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod stack;
pub mod time;
