//! PharmaAI - Virtual Pharmacist Assistant Backend
//!
//! This crate implements a guided symptom-intake conversation and a
//! structured diagnosis pipeline backed by a hosted chat-completion model.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
