//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                |
//! |----------------|--------------------|----------------------------|
//! | `console`      | DisplayPort        | Log output (text view)     |
//! | `json_config`  | ConfigPort         | JSON file on disk          |
//! | `log_sink`     | EventSink          | Log output                 |
//! | `scripted`     | CameraPort         | Synthetic frames           |
//! |                | ClassifierPort     | Operator-chosen scene      |
//! | `time`         | TimePort           | `std::time::Instant`       |

pub mod console;
pub mod json_config;
pub mod log_sink;
pub mod scripted;
pub mod time;
