// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway exposing the modelmux routing engine.
//!
//! Routes split into an unauthenticated public pair (`/health`, `/metrics`)
//! and the tenant-scoped `/api/v1` surface guarded by optional bearer-token
//! auth. Tenant identity rides the `x-user-id` header.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, UserId};
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};
