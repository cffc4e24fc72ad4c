//! Fuel stop planner server.
//!
//! A web service that answers: "I'm driving from here to there, where
//! should I stop for fuel, and what will it cost?"

pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod geocode;
pub mod planner;
pub mod routing;
pub mod web;
