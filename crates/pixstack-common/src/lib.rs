//! Shared engine protocol types for pixstack.
//!
//! The orchestrator and whatever hosts the image-processing engine agree on
//! these types only. Every request is a single JSON document on the engine's
//! stdin; every reply is a single JSON document on its stdout.

pub mod policy;
pub mod protocol;

pub use policy::{
    CalibrationPolicy, Combination, IntegrationPolicy, Normalization, Rejection,
    RejectionNormalization, SaveOptions,
};
pub use protocol::{
    CalibrationRequest, EngineReply, EngineRequest, FrameDescriptor, IntegrationRequest,
    ResultHandle, SaveRequest,
};
