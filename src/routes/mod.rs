//! HTTP routes outside the authentication module.

pub mod health;
