//! A game alarm clock: count down, then ring until the user has caught a
//! wandering button enough times.

pub mod alarm;
pub mod config;
pub mod controllers;
pub mod envelope;
pub mod error;
pub mod mixer;
pub mod oscillatorbank;
pub mod output;
pub mod pattern;
pub mod screen;
pub mod session;
pub mod tapgame;
pub mod timers;
pub mod tone;
