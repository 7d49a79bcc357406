//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `ready`   | `Ready`          |
//! | `run`     | `Run`            |
//! | `submit`  | `Submit`         |
//! | `wait`    | `Wait`           |
//! | `config`  | `Config`         |

pub mod config;
pub mod ready;
pub mod run;
pub mod submit;
pub mod wait;

pub use config::cmd_config;
pub use ready::cmd_ready;
pub use run::cmd_run;
pub use submit::cmd_submit;
pub use wait::cmd_wait;

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T] ");
