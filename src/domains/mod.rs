//! Domains module containing business logic organized by bounded contexts.
//!
//! Tools are the only capability this server exposes; the registry and
//! the tool contract live in [`tools`], the concrete tools in
//! [`tools::definitions`].

pub mod tools;
