//! Access-control service for idrelay
//!
//! The relay writes each typed identifier to the `idRecebido` attribute of an
//! Orion entity. This service polls that entity, checks the identifier
//! against a table of authorized people, records the attempt and PATCHes its
//! verdict (`statusAcesso`, `nomeUsuario`, `departamento`) back onto the same
//! entity. A small JSON API exposes the last access, the history and
//! statistics to a dashboard.
//!
//! Requests to Orion reuse the HTTP codec and NGSI payloads of
//! `idrelay-core`.

pub mod access;
pub mod api;
pub mod config;
pub mod monitor;
pub mod orion;
pub mod registry;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
