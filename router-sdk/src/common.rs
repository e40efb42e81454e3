//! Shared helpers used across provider configuration and gateway config types.

pub mod duration_serde {
    pub use crate::providers::duration_serde::{deserialize, serialize};
}
