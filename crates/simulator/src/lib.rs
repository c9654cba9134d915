//! HyperCore Simulator
//!
//! A long-running workload simulator for the HyperCore ledger.
//! Provides tools for stress testing the action queue and checking that
//! value is conserved under a realistic mix of actions.
//!
//! # Architecture
//!
//! The simulator drives `hypercore-node` through its state machine
//! interface and provides:
//!
//! - **Account Management**: Deterministic accounts created and funded before the first block
//! - **Workload Generation**: A weighted mix of every action type, including ones that will be dropped
//! - **Metrics Collection**: Outcomes per kind, drop reasons, settle latency percentiles
//! - **Configuration**: TOML files with defaults for every key
//!
//! # Example
//!
//! ```ignore
//! use hypercore_simulator::{Simulator, SimulatorConfig, WorkloadConfig};
//! use std::time::Duration;
//!
//! let config = SimulatorConfig::default()
//!     .with_accounts(100)
//!     .with_workload(WorkloadConfig::default().with_batch_size(50));
//!
//! let mut simulator = Simulator::new(config)?;
//! let report = simulator.run_for(Duration::from_secs(3_600));
//! report.print();
//! ```

pub mod accounts;
pub mod config;
pub mod metrics;
pub mod runner;
pub mod workload;

pub use accounts::{AccountPool, AccountPoolError, AccountUsageStats};
pub use config::{AccountDistribution, ConfigError, SimulatorConfig, WorkloadConfig, WorkloadMix};
pub use metrics::{KindStats, MetricsCollector, SimulationReport, SupplySnapshot};
pub use runner::{Simulator, SimulatorError};
pub use workload::{MixedWorkload, Submission, WorkloadGenerator, WorkloadKind, WorkloadTokens};
