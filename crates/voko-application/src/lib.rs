//! Voko application: session orchestration over the core domain.

pub mod controller;

#[cfg(test)]
mod controller_test;

pub use controller::SessionController;
