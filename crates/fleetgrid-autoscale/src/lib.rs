//! fleetgrid-autoscale: throughput-driven worker scaling.
//!
//! The decision itself is a pure function over a throughput sample, a
//! worker count, and the scaling bounds. [`Recommender`] feeds it from
//! the estimator and the registry and is the single implementation
//! behind both the on-demand recommendation endpoint and the periodic
//! evaluation loop. Acting on a recommendation is the caller's job.

pub mod decision;
pub mod recommender;

pub use decision::{ScaleAction, ScaleReason, ScalingConfig, ScalingRecommendation, evaluate};
pub use recommender::Recommender;
