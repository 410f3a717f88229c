//! Order Pipeline - 多租户餐厅订单状态引擎
//!
//! Bridges POS systems and order-intake platforms: translates vendor POS
//! statuses into one canonical vocabulary, projects them back onto each
//! aggregator, and books or re-bids 3PL couriers.
//!
//! # 模块结构
//!
//! ```text
//! order-pipeline/src/
//! ├── pos/          # POS status tables (StatusTranslator)
//! ├── aggregator/   # projection, actions, client registry
//! ├── pipeline/     # queue check, guards, OrderStatusWorkflow
//! ├── dispatch/     # 3PL selector, delivery worker, cron scans
//! ├── notify/       # notifiers, operator alerts
//! ├── repository/   # storage contracts + in-memory store
//! ├── api/          # axum routes
//! ├── core/         # config, state, background tasks
//! └── utils/        # logger, HTTP errors
//! ```

pub mod aggregator;
pub mod api;
pub mod core;
pub mod dispatch;
pub mod notify;
pub mod pipeline;
pub mod pos;
pub mod repository;
pub mod utils;

// Re-export 公共类型
pub use self::core::{BackgroundTasks, Collaborators, Config, PipelineState};
pub use pipeline::{OrderStatusWorkflow, Outcome, StatusEvent, WorkflowError};
pub use utils::logger::init_logger;
pub use utils::{AppError, AppResult};

pub fn print_banner() {
    println!(
        r#"
   ____           __             ____  _            ___
  / __ \_________/ /__  _____   / __ \(_)___  ___  / (_)___  ___
 / / / / ___/ __  / _ \/ ___/  / /_/ / / __ \/ _ \/ / / __ \/ _ \
/ /_/ / /  / /_/ /  __/ /     / ____/ / /_/ /  __/ / / / / /  __/
\____/_/   \__,_/\___/_/     /_/   /_/ .___/\___/_/_/_/ /_/\___/
                                    /_/
    "#
    );
}
