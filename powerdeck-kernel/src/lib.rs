//! Powerdeck kernel : allumer et éteindre les hôtes ESXi depuis Slack.
//!
//! `@bot shutdown` liste les hôtes vivants du vCenter, `@bot boot` le catalogue
//! configuré ; le choix d'un hôte demande confirmation, puis Confirm lance soit
//! un `ShutdownHost_Task` forcé, soit un magic packet Wake-on-LAN.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod hosts;
pub mod http;
pub mod models;
pub mod power;
pub mod prompts;
pub mod signature;
pub mod slack;
pub mod state;
pub mod vsphere;
pub mod wol;

pub use error::{Error, Result};
