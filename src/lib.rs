//! Medical-Imaging Portal Backend
//!
//! This library provides the core functionality of the pacs-portal service:
//! email + one-time-code authentication, a small news feed, and a proxy for
//! DICOM operations against an Orthanc-compatible PACS, including live
//! tracking of remote archive jobs over WebSocket sessions.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
