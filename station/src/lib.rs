//! Wake-cycle core of the e-paper weather station.
//!
//! Everything here is hardware independent: provider documents, the mapping
//! from documents to display fields, the fixed widget layout and its drawing,
//! IoT Hub credentials and the publish recovery policy. The firmware binary
//! plugs the ESP-IDF drivers in through the traits in [`cycle`] and
//! [`publish`].

pub mod assets;
pub mod config;
pub mod cycle;
pub mod documents;
pub mod fields;
pub mod hub;
pub mod icons;
pub mod publish;
pub mod session;
pub mod units;
pub mod widgets;
