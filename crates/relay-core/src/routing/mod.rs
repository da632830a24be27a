//! Task analysis, scoring, and routing
//!
//! ```text
//! description ──► analyze_complexity ──► score_agent (per profile) ──► TaskRouter
//!                                                                        │
//!                                                  RoutingResult ◄───────┘
//!                                                  (agent, confidence, prompt)
//! ```

pub mod analyzer;
pub mod router;
pub mod scorer;

pub use analyzer::analyze_complexity;
pub use router::{RouteOptions, TaskRouter};
pub use scorer::{score_agent, AgentScore};
