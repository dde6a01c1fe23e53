//! Testing utilities for the specsplit workspace
//!
//! Shared fixtures, a pinned-date decomposer and tracing setup.

#![allow(missing_docs)]

use chrono::NaiveDate;
use specsplit_core::{DecompositionConfig, SpecDecomposer};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the test log filter
pub const LOG_ENV: &str = "SPECSPLIT_LOG";

/// Three features: registration, authentication (which requires
/// registration) and password reset
pub const REGISTRATION_SPEC: &str = "\
# Account Service

## User Registration

As a visitor, I want to create an account so that I can use the Account Service.

POST /users
GET /users/{id}

- Given a new email when the User submits the form then an Account is created
- Given a taken email when the User submits the form then an error is shown
- Given a short password when the User submits the form then a validation error is shown

## User Authentication

Login requires User Registration.

As a member, I want to sign in so that I can reach my Account.

POST /sessions
DELETE /sessions/{id}
GET /sessions/current

- Given valid credentials when the User signs in then a Session is created
- Given a wrong password when the User signs in then access is denied
- Given an active Session when the User signs out then the Session ends

## Password Reset

As a member, I want to reset my password so that I regain access.

POST /password-resets
PUT /password-resets/{token}

- Given a known email when the User requests a reset then a Reset Token is emailed
- Given an expired Reset Token when the User submits it then it is rejected
";

/// Five headings but only two criteria and one endpoint
pub const SMALL_SPEC: &str = "\
## Intro
A tiny tweak to the profile page.
## Context
Nothing else changes.
## Change
PATCH /profile
## Criteria
- Given a profile when the name is edited then it is saved
- Given a profile when the name is blank then it is rejected
## Rollout
Ship it.
";

/// Two features that each require the other
pub const CYCLE_SPEC: &str = "\
## Alpha Service
The alpha module requires Beta Service.
GET /alpha
GET /alpha/{id}
- Given an alpha request when it is valid then it is stored

## Beta Service
The beta module requires Alpha Service.
GET /beta
- Given a beta request when it is valid then it is stored
- Given a beta request when it is invalid then it is rejected
";

/// A feature with sub-sections suitable for splitting
pub const STOREFRONT_SPEC: &str = "\
---
title: Storefront
domain: E-commerce
---
# Storefront

## Catalog

### Browsing
GET /products
- Given products when the Shopper browses then a page of Products is shown

### Search Page
GET /products/search
- Given a query when the Shopper searches then matching Products are shown

## Checkout
POST /orders
- Given a cart when the Shopper pays then an Order is created
- Given a failed payment when the Shopper pays then no Order is created
";

/// Date stamped on every result built by [`test_decomposer`]
#[must_use]
pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}

/// Default configuration with the analysis date pinned
#[must_use]
pub fn test_config() -> DecompositionConfig {
    DecompositionConfig::default().with_analysis_date(fixed_date())
}

/// Decomposer with default rules and a pinned analysis date
#[must_use]
pub fn test_decomposer() -> SpecDecomposer {
    init_test_tracing();
    SpecDecomposer::new(test_config())
}

/// Install a fmt subscriber filtered by `SPECSPLIT_LOG` (default `warn`).
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
