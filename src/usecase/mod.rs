pub mod participants;
pub mod readiness;
