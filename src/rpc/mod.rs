//! Transport-agnostic command link.
//!
//! Line-delimited JSON over a byte stream, plus telemetry datagrams.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Command Link                          │
//! │                                                            │
//! │  ┌───────────┐   ┌───────────┐   ┌──────────────────────┐  │
//! │  │ Transport │──▶│  Codec    │──▶│ Router (dispatcher)  │  │
//! │  │ (trait)   │   │ (lines)   │   │  → AppService        │  │
//! │  └───────────┘   └───────────┘   └──────────────────────┘  │
//! │       ▲                                    │               │
//! │       │            ┌───────────────────────┘               │
//! │       │            ▼                                       │
//! │  ┌───────────┐   ┌───────────┐                             │
//! │  │ Transport │◀──│ Protocol  │  (responses + telemetry)    │
//! │  │ (write)   │   │ (serde)   │                             │
//! │  └───────────┘   └───────────┘                             │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod protocol;
pub mod router;
pub mod transport;
